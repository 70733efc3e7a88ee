//! Temp-then-move uploads.
//!
//! Content is first written under a working directory the login user owns,
//! then moved onto the destination with elevated rights. An interrupted
//! write never leaves a partial file at the destination; an interrupted move
//! can leave the temporary file behind, which is harmless.
//!
//! This module performs no existence check on the destination. Callers
//! decide whether an upload is needed.

use uuid::Uuid;

use crate::channel::FileChannel;
use crate::command::{remote_join, remote_parent, sudo};
use crate::error::{Error, Result, UploadStep};
use crate::session::Session;

/// One file to place on the remote host.
#[derive(Debug, Clone, Copy)]
pub struct FileUpload<'a> {
    /// Destination path
    pub path: &'a str,
    /// Bytes to write
    pub content: &'a [u8],
    /// Owner to apply after the move
    pub user: Option<&'a str>,
    /// Group to apply after the move
    pub group: Option<&'a str>,
    /// Permission bits; `0` keeps whatever `mv` produced
    pub mode: u32,
}

/// `chown` argument for the given user and group, if either is set.
pub fn owner_spec(user: Option<&str>, group: Option<&str>) -> Option<String> {
    let user = user.filter(|u| !u.is_empty());
    let group = group.filter(|g| !g.is_empty());
    match (user, group) {
        (Some(u), Some(g)) => Some(format!("{u}:{g}")),
        (Some(u), None) => Some(u.to_string()),
        (None, Some(g)) => Some(format!(":{g}")),
        (None, None) => None,
    }
}

/// Fresh temporary path under `workdir`.
pub fn temp_path(workdir: &str) -> String {
    remote_join(workdir, &format!("upload-{}", Uuid::new_v4().simple()))
}

/// Upload `file` through `workdir`.
///
/// Steps, in order: write temp file, create the destination directory if it
/// is missing, move into place, `chown` if a user or group is given, `chmod`
/// if the mode is non-zero. The first failing step aborts the rest.
pub fn upload<H>(host: &H, workdir: &str, file: &FileUpload<'_>) -> Result<()>
where
    H: Session + FileChannel + ?Sized,
{
    let path = file.path;
    let tmp = temp_path(workdir);

    log::debug!("uploading {} bytes to {} via {}", file.content.len(), path, tmp);
    host.write(&tmp, file.content)
        .map_err(|e| Error::upload(path, UploadStep::WriteTemp, e))?;

    if let Some(parent) = remote_parent(path) {
        let present = host
            .exists(parent)
            .map_err(|e| Error::upload(path, UploadStep::CreateDir, e))?;
        if !present {
            host.run(&sudo("mkdir", &["-p", parent]), false)
                .map_err(|e| Error::upload(path, UploadStep::CreateDir, e))?;
        }
    }

    host.run(&sudo("mv", &[&tmp, path]), false)
        .map_err(|e| Error::upload(path, UploadStep::Move, e))?;

    if let Some(owner) = owner_spec(file.user, file.group) {
        host.run(&sudo("chown", &[&owner, path]), false)
            .map_err(|e| Error::upload(path, UploadStep::Chown, e))?;
    }

    if file.mode != 0 {
        let mode = format!("{:o}", file.mode);
        host.run(&sudo("chmod", &[&mode, path]), false)
            .map_err(|e| Error::upload(path, UploadStep::Chmod, e))?;
    }

    Ok(())
}
