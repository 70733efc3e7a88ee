use super::*;
use crate::testing::{EventLog, MockConnector, MockMachines, MockRunner};
use tempfile::TempDir;

const WEB: &str = r#"
nodes:
  - name: web
    provider:
      name: vagrant
      box: ubuntu/jammy64
    files:
      - path: /etc/motd
        content: hello
        user: root
        group: root
        mode: 644
      - path: /etc/issue
        content: plain
    provisioner:
      - name: shell
        content: echo a
      - name: ansible
        playbook: site.yml
        groups: [web, db]
        extra_vars: ["a=1", "b=2"]
      - name: shell
        content: echo c
"#;

struct Fixture {
    _dir: TempDir,
    project: Project,
    config: Config,
    log: EventLog,
    machines: MockMachines,
    connector: MockConnector,
    runner: MockRunner,
}

impl Fixture {
    fn new(yaml: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let project = Project::for_config(&dir.path().join("clover.yml")).unwrap();
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        let log = EventLog::default();
        Self {
            machines: MockMachines::new(&log),
            connector: MockConnector::new(&log),
            runner: MockRunner::new(&log),
            _dir: dir,
            project,
            config,
            log,
        }
    }

    fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator {
            project: &self.project,
            config: &self.config,
            machines: &self.machines,
            connector: &self.connector,
            runner: &self.runner,
        }
    }

    fn converge(&self) -> Result<()> {
        self.orchestrator().converge_all(None)
    }

    fn position(&self, needle: &str) -> usize {
        self.log
            .position(needle)
            .unwrap_or_else(|| panic!("no event containing {needle:?} in {:#?}", self.log.events()))
    }
}

#[test]
fn test_fresh_node_is_created_booted_and_provisioned() {
    let fx = Fixture::new(WEB);
    fx.converge().unwrap();

    assert!(fx.position("create") < fx.position("boot web"));
    assert!(!fx.log.contains("reapply"));
    assert_eq!(fx.log.count("connect "), 1);
    assert!(fx.log.contains("mkdir .clover"));
    assert!(fx.log.contains("run sudo chown root:root /etc/motd"));
    assert!(fx.log.contains("run sudo chmod 644 /etc/motd"));

    let vagrantfile = fx.machines.created_with.borrow().clone().unwrap();
    assert!(vagrantfile.contains("config.vm.define \"web\""));

    assert_eq!(
        fs::read_to_string(fx.project.shell_script("web", 0)).unwrap(),
        "echo a"
    );
    assert!(fx.project.inventory("web").exists());
}

#[test]
fn test_second_run_does_no_uploads_or_regeneration() {
    let fx = Fixture::new(WEB);
    fx.converge().unwrap();

    fs::write(fx.project.shell_script("web", 0), "edited").unwrap();
    fs::write(fx.project.inventory("web"), "edited").unwrap();
    fx.log.clear();

    fx.converge().unwrap();

    assert!(fx.log.contains("reapply web"));
    assert!(!fx.log.contains("create"));
    assert!(!fx.log.contains("boot"));
    assert_eq!(fx.log.count("write .clover/upload-"), 0);
    assert!(!fx.log.contains("sudo mv"));
    assert!(!fx.log.contains("mkdir .clover"));
    assert_eq!(
        fs::read_to_string(fx.project.shell_script("web", 0)).unwrap(),
        "edited"
    );
    assert_eq!(fs::read_to_string(fx.project.inventory("web")).unwrap(), "edited");
    assert!(fx.log.contains("run sudo bash .clover/2.sh"));
}

#[test]
fn test_provisioners_run_in_declared_order() {
    let fx = Fixture::new(WEB);
    fx.converge().unwrap();

    let a = fx.position("run sudo bash .clover/0.sh");
    let b = fx.position("local ansible-playbook");
    let c = fx.position("run sudo bash .clover/2.sh");
    assert!(a < b && b < c, "{:#?}", fx.log.events());
    assert!(fx.position("write .clover/0.sh") < a);
}

#[test]
fn test_files_uploaded_only_when_missing() {
    let fx = Fixture::new(WEB);
    fx.connector.files.insert("/etc/motd");
    fx.converge().unwrap();

    assert_eq!(fx.log.count("write .clover/upload-"), 1);
    assert_eq!(fx.log.count("run sudo mv "), 1);
    assert!(fx.log.contains("/etc/issue"));
    assert!(!fx.log.contains("chown"));
    assert!(!fx.log.contains("chmod"));
}

#[test]
fn test_running_machine_is_reapplied() {
    let fx = Fixture::new(WEB);
    fx.machines.set_status("web", MachineStatus::Running);
    fx.converge().unwrap();

    assert!(fx.log.contains("reapply web"));
    assert!(!fx.log.contains("create"));
    assert!(!fx.log.contains("boot"));
}

#[test]
fn test_other_status_aborts_without_touching_machine() {
    let fx = Fixture::new(WEB);
    fx.machines
        .set_status("web", MachineStatus::Other("poweroff".into()));

    let err = fx.converge().unwrap_err();
    match err.downcast_ref::<ConvergeError>() {
        Some(ConvergeError::UnrecoverableState { node, state }) => {
            assert_eq!(node, "web");
            assert_eq!(state, "poweroff");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(format!("{err:#}").contains("destroy it and run converge again"));
    assert_eq!(fx.log.events(), ["status web"]);
}

#[test]
fn test_inventory_uses_first_ansible_groups() {
    let fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
    provisioner:
      - { name: ansible, playbook: one.yml, groups: [web, db] }
      - { name: ansible, playbook: two.yml, groups: [other] }
",
    );
    fx.converge().unwrap();

    let host = "default ansible_host=127.0.0.1 ansible_user=vagrant ansible_port=2222 ansible_ssh_private_key_file=/k";
    assert_eq!(
        fs::read_to_string(fx.project.inventory("web")).unwrap(),
        format!("{host}\n\n[web]\n{host}\n\n[db]\n{host}\n")
    );
    assert_eq!(fx.log.count("ssh-config web"), 1);
    assert_eq!(fx.log.count("connect "), 0);
}

#[test]
fn test_ansible_invocation_shape() {
    let fx = Fixture::new(WEB);
    fx.converge().unwrap();

    let inventory = fx.project.inventory("web");
    let expected = format!(
        "local ansible-playbook -i {} site.yml --extra-vars a=1 --extra-vars b=2",
        inventory.display()
    );
    assert!(fx.log.events().contains(&expected), "{:#?}", fx.log.events());
}

#[test]
fn test_missing_ansible_playbook_stops_provisioning() {
    let mut fx = Fixture::new(WEB);
    fx.runner.available = false;

    let err = fx.converge().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConvergeError>(),
        Some(ConvergeError::MissingExecutable("ansible-playbook"))
    ));
    assert!(fx.log.contains("run sudo bash .clover/0.sh"));
    assert!(!fx.log.contains(".clover/2.sh"));
    assert!(!fx.project.inventory("web").exists());
}

#[test]
fn test_failure_aborts_later_stages_and_nodes() {
    let mut fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
    provisioner:
      - { name: shell, content: 'echo one' }
      - { name: shell, content: 'exit 1' }
      - { name: shell, content: 'echo three' }
  - name: db
    provider: { name: vagrant, box: b }
",
    );
    fx.connector.fail_on = Some(".clover/1.sh".into());

    let err = fx.converge().unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("node web: provisioning"), "{chain}");
    assert!(chain.contains("provisioner 1 (shell)"), "{chain}");
    assert_eq!(
        err.downcast_ref::<sshkit::Error>().and_then(sshkit::Error::exit_code),
        Some(1)
    );

    assert!(fx.log.contains("run sudo bash .clover/0.sh"));
    assert!(!fx.log.contains(".clover/2.sh"));
    assert!(!fx.log.contains("status db"));
}

#[test]
fn test_ansible_local_bootstraps_once() {
    let fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
    provisioner:
      - { name: ansible-local, playbook: /clover/site.yml }
",
    );
    fx.converge().unwrap();

    assert_eq!(
        fs::read_to_string(fx.project.ansible_script("web")).unwrap(),
        ansible::BOOTSTRAP
    );
    let bootstrap = fx.position("run sudo bash .clover/upload-");
    let marker = fx.position(" .clover/ansible.sh");
    let playbook = fx.position("run sudo ansible-playbook /clover/site.yml");
    assert!(bootstrap < marker && marker < playbook);
    assert!(fx.log.events()[marker].starts_with("run mv .clover/upload-"));
    assert!(fx.connector.files.contains(".clover/ansible.sh"));

    fx.log.clear();
    fx.converge().unwrap();
    assert!(!fx.log.contains("sudo bash"));
    assert!(fx.log.contains("run sudo ansible-playbook /clover/site.yml"));
}

#[test]
fn test_ansible_local_without_playbook_only_bootstraps() {
    let fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
    provisioner:
      - { name: ansible-local }
",
    );
    fx.converge().unwrap();
    assert!(fx.log.contains("sudo bash .clover/upload-"));
    assert!(!fx.log.contains("ansible-playbook"));
}

#[test]
fn test_failed_bootstrap_leaves_no_marker() {
    let mut fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
    provisioner:
      - { name: ansible-local }
",
    );
    fx.connector.fail_on = Some("sudo bash".into());
    assert!(fx.converge().is_err());
    assert!(!fx.connector.files.contains(".clover/ansible.sh"));
}

#[test]
fn test_existing_vagrantfile_is_reused() {
    let fx = Fixture::new(WEB);
    fs::create_dir_all(&fx.project.dir).unwrap();
    fs::write(fx.project.vagrantfile(), "# hand edited\n").unwrap();

    fx.converge().unwrap();
    assert_eq!(
        fx.machines.created_with.borrow().as_deref(),
        Some("# hand edited\n")
    );
}

#[test]
fn test_single_node_selection() {
    let fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
  - name: db
    provider: { name: vagrant, box: b }
",
    );
    fx.orchestrator().converge_all(Some("db")).unwrap();
    assert!(fx.log.contains("boot db"));
    assert!(!fx.log.contains("web"));

    let err = fx.orchestrator().converge_all(Some("cache")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConvergeError>(),
        Some(ConvergeError::NodeNotFound(name)) if name == "cache"
    ));
}

#[test]
fn test_node_without_remote_work_never_connects() {
    let fx = Fixture::new(
        r"
nodes:
  - name: web
    provider: { name: vagrant, box: b }
",
    );
    fx.converge().unwrap();
    assert_eq!(fx.log.count("connect "), 0);
    assert_eq!(fx.log.count("ssh-config"), 0);
}

#[test]
fn test_stage_names() {
    assert_eq!(Stage::FilesDeployed.to_string(), "deploying files");
    assert_eq!(Stage::ConfigReady.to_string(), "preparing machine configuration");
}
