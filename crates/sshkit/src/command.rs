//! Remote command line construction.
//!
//! Every argument is quoted for a POSIX shell, the program name is not.

use shell_words::quote;

/// Build `program arg...` with each argument shell-quoted.
pub fn shell_command(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg));
    }
    line
}

/// Build `sudo program arg...` with each argument shell-quoted.
pub fn sudo(program: &str, args: &[&str]) -> String {
    format!("sudo {}", shell_command(program, args))
}

/// Join a remote directory and a file name with a single `/`.
pub fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Parent directory of a remote path, if it has one worth creating.
///
/// Bare names resolve against the login directory and have no parent.
pub fn remote_parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", _)) => Some("/"),
        Some((parent, _)) => Some(parent),
        None => None,
    }
}
