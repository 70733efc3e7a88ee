use thiserror::Error;

/// Convergence failures that are not configuration, transport or command errors.
#[derive(Debug, Error)]
pub enum ConvergeError {
    #[error("node {node} is in state {state}; destroy it and run converge again")]
    UnrecoverableState { node: String, state: String },

    #[error("{0} is required on this host but was not found on PATH")]
    MissingExecutable(&'static str),

    #[error("no node named {0} in the configuration")]
    NodeNotFound(String),
}

/// A follow-up suggestion for failures the operator can act on.
pub fn hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<sshkit::Error>())
        .any(sshkit::Error::is_connection)
        .then_some("check that the machine is running with `clover status`")
}
