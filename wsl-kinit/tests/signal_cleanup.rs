//! Runs alone in its own binary: the termination handlers and the path they
//! remove are process-wide.
#![cfg(unix)]

use nix::{
    libc,
    sys::{
        signal::{raise, Signal},
        wait::{waitpid, WaitStatus},
    },
    unistd::{fork, ForkResult},
};
use std::fs;
use wsl_kinit::TransientFile;

#[test]
fn termination_removes_the_armed_file() {
    let dir = tempfile::tempdir().unwrap();
    let (transient, file) = TransientFile::create(dir.path(), "wsl-kinit-", ".sh").unwrap();
    drop(file);
    let transient = transient.guard_against_signals();
    let path = transient.path().to_owned();
    assert!(path.exists());

    // The child only raises, so it makes no allocation after the fork.
    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            let _ = raise(Signal::SIGTERM);
            unsafe { libc::_exit(0) }
        }
        ForkResult::Parent { child } => {
            let status = waitpid(child, None).unwrap();
            assert_eq!(status, WaitStatus::Exited(child, 128 + libc::SIGTERM));
            assert!(!path.exists());
            assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
            transient.close().unwrap();
        }
    }
}
