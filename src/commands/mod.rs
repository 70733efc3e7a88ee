pub mod converge;
pub mod destroy;
pub mod ssh;
pub mod status;
pub mod verify;

use anyhow::Result;
use std::path::Path;
use vagrantkit::VagrantBackend;

use crate::Context;
use crate::config::Config;
use crate::project::Project;
use crate::ui;

/// A loaded configuration with its project layout and Vagrant backend.
pub struct Workspace {
    pub config: Config,
    pub project: Project,
    pub machines: VagrantBackend,
}

/// Load and validate `config_path`, and make sure `vagrant` is installed.
pub fn open(ctx: &Context, config_path: &Path) -> Result<Workspace> {
    let project = Project::for_config(config_path)?;
    let config = Config::load(config_path)?;
    let machines = vagrantkit::default_backend(&project.dir)?;

    if ctx.verbose > 0 && !ctx.quiet {
        ui::kv("config", &config_path.display().to_string());
        ui::kv("project", &project.dir.display().to_string());
    }
    Ok(Workspace {
        config,
        project,
        machines,
    })
}
