use crate::Error;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};
use tracing::debug;

/// Everything needed to spawn one process. Arguments are discrete argv
/// elements; nothing here is evaluated by a host shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Spawns a process, waits for it and returns its exit status.
pub trait ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> anyhow::Result<i32>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, spec: &CommandSpec) -> anyhow::Result<i32> {
        (**self).run(spec)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl ProcessRunner for NativeRunner {
    fn run(&self, spec: &CommandSpec) -> anyhow::Result<i32> {
        let mut command = spec.to_command();
        command.stdin(Stdio::null());
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            use windows::Win32::System::Threading::CREATE_NO_WINDOW;
            command.creation_flags(CREATE_NO_WINDOW.0);
        }
        let mut child = command.spawn().map_err(|e| {
            Error::LAUNCH_FAILED.with_detail(format!("{}: {}", spec.program.display(), e))
        })?;
        debug!(pid = child.id(), "waiting for child");
        let status = child.wait().map_err(|e| {
            Error::LAUNCH_FAILED.with_detail(format!("waiting for {}: {}", spec.program.display(), e))
        })?;
        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signo| 128 + signo))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
