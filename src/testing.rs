//! Recording mocks for the machine driver, the SSH connector and the host
//! command runner. All of them append to one shared [`EventLog`] so tests can
//! assert on cross-component ordering.

use anyhow::Result;
use sshkit::{CommandOutput, Endpoint, FileChannel, Remote, Session};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use vagrantkit::{Backend, LogLines, MachineStatus, SshDetails};

use crate::converge::Connector;
use crate::runner::CommandRunner;

#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.borrow_mut().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Number of events starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.starts_with(prefix)).count()
    }

    /// Index of the first event containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e.contains(needle))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }
}

pub struct MockMachines {
    log: EventLog,
    statuses: RefCell<HashMap<String, MachineStatus>>,
    pub created_with: RefCell<Option<String>>,
}

impl MockMachines {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            statuses: RefCell::new(HashMap::new()),
            created_with: RefCell::new(None),
        }
    }

    pub fn set_status(&self, machine: &str, status: MachineStatus) {
        self.statuses
            .borrow_mut()
            .insert(machine.to_string(), status);
    }

    pub fn details() -> SshDetails {
        SshDetails {
            host: "127.0.0.1".into(),
            user: "vagrant".into(),
            port: 2222,
            identity_file: PathBuf::from("/k"),
        }
    }
}

impl Backend for MockMachines {
    fn status(&self, machine: &str) -> vagrantkit::Result<MachineStatus> {
        self.log.push(format!("status {machine}"));
        Ok(self
            .statuses
            .borrow()
            .get(machine)
            .cloned()
            .unwrap_or(MachineStatus::NotCreated))
    }

    fn create(&self, config: &str) -> vagrantkit::Result<()> {
        self.log.push("create");
        *self.created_with.borrow_mut() = Some(config.to_string());
        Ok(())
    }

    fn boot(&self, machine: &str) -> vagrantkit::Result<LogLines> {
        self.log.push(format!("boot {machine}"));
        self.set_status(machine, MachineStatus::Running);
        let lines = vec![Ok(format!("{machine}: Importing base box")), Ok(format!("{machine}: Booting VM"))];
        Ok(Box::new(lines.into_iter()))
    }

    fn reapply(&self, machine: &str) -> vagrantkit::Result<()> {
        self.log.push(format!("reapply {machine}"));
        Ok(())
    }

    fn ssh_config(&self, machine: &str) -> vagrantkit::Result<SshDetails> {
        self.log.push(format!("ssh-config {machine}"));
        Ok(Self::details())
    }

    fn destroy(&self) -> vagrantkit::Result<LogLines> {
        self.log.push("destroy");
        for status in self.statuses.borrow_mut().values_mut() {
            *status = MachineStatus::NotCreated;
        }
        Ok(Box::new(vec![Ok("Destroying VM".to_string())].into_iter()))
    }

    fn ssh(&self, machine: &str) -> vagrantkit::Result<()> {
        self.log.push(format!("ssh {machine}"));
        Ok(())
    }
}

/// Remote filesystem shared by every connection a [`MockConnector`] opens.
#[derive(Clone, Default)]
pub struct RemoteFiles(Rc<RefCell<HashSet<String>>>);

impl RemoteFiles {
    pub fn insert(&self, path: &str) {
        self.0.borrow_mut().insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.borrow().contains(path)
    }
}

struct MockRemote {
    log: EventLog,
    files: RemoteFiles,
    fail_on: Option<String>,
}

impl Session for MockRemote {
    fn run(&self, command: &str, _echo: bool) -> sshkit::Result<CommandOutput> {
        self.log.push(format!("run {command}"));
        if self.fail_on.as_deref().is_some_and(|f| command.contains(f)) {
            return Err(sshkit::Error::Command {
                command: command.to_string(),
                exit_code: 1,
                output: String::new(),
            });
        }

        let words: Vec<&str> = command.split_whitespace().collect();
        if let [.., "mv", from, to] = words.as_slice() {
            self.files.0.borrow_mut().remove(*from);
            self.files.insert(to);
        }
        Ok(CommandOutput::default())
    }
}

impl FileChannel for MockRemote {
    fn exists(&self, path: &str) -> sshkit::Result<bool> {
        Ok(self.files.contains(path))
    }

    fn mkdir(&self, path: &str) -> sshkit::Result<()> {
        self.log.push(format!("mkdir {path}"));
        self.files.insert(path);
        Ok(())
    }

    fn write(&self, path: &str, _content: &[u8]) -> sshkit::Result<()> {
        self.log.push(format!("write {path}"));
        self.files.insert(path);
        Ok(())
    }
}

pub struct MockConnector {
    log: EventLog,
    pub files: RemoteFiles,
    /// Remote commands containing this substring exit 1.
    pub fail_on: Option<String>,
}

impl MockConnector {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            files: RemoteFiles::default(),
            fail_on: None,
        }
    }
}

impl Connector for MockConnector {
    fn connect(&self, endpoint: &Endpoint) -> sshkit::Result<Box<dyn Remote>> {
        self.log.push(format!("connect {endpoint}"));
        Ok(Box::new(MockRemote {
            log: self.log.clone(),
            files: self.files.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

pub struct MockRunner {
    log: EventLog,
    pub available: bool,
}

impl MockRunner {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            available: true,
        }
    }
}

impl CommandRunner for MockRunner {
    fn exists(&self, _program: &str) -> bool {
        self.available
    }

    fn run(&self, program: &str, args: &[String], _cwd: &Path) -> Result<()> {
        self.log.push(format!("local {program} {}", args.join(" ")));
        Ok(())
    }
}
