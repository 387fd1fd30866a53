//! Pseudo-terminals and pipes for tests that need real descriptors

use std::fs::File;
use std::path::PathBuf;

use rustix::fd::OwnedFd;
use rustix::pty::{grantpt, openpt, ptsname, unlockpt, OpenptFlags};

/// Allocate a pty; returns the master side and the path of the slave node.
pub fn open_pty() -> (File, PathBuf) {
    let master = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY | OpenptFlags::CLOEXEC).unwrap();
    grantpt(&master).unwrap();
    unlockpt(&master).unwrap();
    let name = ptsname(&master, Vec::new()).unwrap();
    let path = PathBuf::from(name.to_str().unwrap());
    (File::from(master), path)
}

/// A connected (read end, write end) pipe
pub fn pipe() -> (File, File) {
    let (rx, tx): (OwnedFd, OwnedFd) = rustix::pipe::pipe().unwrap();
    (File::from(rx), File::from(tx))
}
