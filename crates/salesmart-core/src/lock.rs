use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::error::{EtlError, Result};

pub const LOCK_FILE_NAME: &str = ".salesmart.lock";

/// Exclusive marker file held for the duration of a run. Removed on drop.
///
/// The file records the owner's pid. A marker left by a process that no longer
/// exists is reclaimed, so a killed run does not block later ones.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE_NAME);

        let file = match create_marker(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if !holder_is_gone(&path) {
                    return Err(EtlError::RunInProgress { path });
                }
                warn!(path = %path.display(), "Reclaiming run lock left by a dead process");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
                // Another process may win the race for the freed marker.
                match create_marker(&path) {
                    Ok(file) => file,
                    Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                        return Err(EtlError::RunInProgress { path });
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        };

        // Release the marker if the pid cannot be written.
        let lock = Self { path };
        write_owner(file)?;

        debug!(path = %lock.path.display(), "Acquired run lock");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "Failed to release run lock: {err}");
        }
    }
}

fn create_marker(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

fn write_owner(mut file: File) -> std::io::Result<()> {
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()
}

/// True only when the marker names a pid with no running process. An unreadable
/// or half-written marker counts as held.
fn holder_is_gone(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(owner) = contents.trim().parse::<u32>() else {
        return false;
    };
    if owner == std::process::id() {
        return false;
    }

    let pid = Pid::from_u32(owner);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_none()
}
