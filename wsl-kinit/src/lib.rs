pub mod context;
pub mod credential;
pub mod driver;
pub mod error;
pub mod path;
pub mod principal;
pub mod script;
mod signal;
pub mod subsystem;
pub mod transient;

pub use self::{
    context::{Context, Profile},
    credential::{Credential, CredentialVault, HostVault, MemoryVault},
    driver::{kinit, KinitRequest},
    error::Error,
    principal::Principal,
    script::KinitScript,
    subsystem::{BashLocator, CommandSpec, Launcher, NativeRunner, ProcessRunner},
    transient::TransientFile,
};

const GENERIC_FAILURE: i32 = 1;

/// Turns the outcome of a run into the process exit status, printing a
/// one-line diagnostic for failures.
pub fn exit_status(progname: &str, result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(status) => status,
        Err(err) => {
            eprintln!("{}: {:#}", progname, err);
            Error::code_of(&err).unwrap_or(GENERIC_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_status_passes_through() {
        assert_eq!(exit_status("wsl-kinit", Ok(0)), 0);
        assert_eq!(exit_status("wsl-kinit", Ok(1)), 1);
        assert_eq!(exit_status("wsl-kinit", Ok(42)), 42);
    }

    #[test]
    fn failures_map_to_their_codes() {
        let err = Error::SUBSYSTEM_NOT_FOUND.with_detail("searched nowhere");
        assert_eq!(exit_status("wsl-kinit", Err(err)), 4);
        assert_eq!(
            exit_status("wsl-kinit", Err(anyhow::anyhow!("bad config"))),
            GENERIC_FAILURE
        );
    }
}
