mod runner;

pub use self::runner::{CommandSpec, NativeRunner, ProcessRunner};
use crate::{path::to_subsystem_path, Context, Error, TransientFile};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

const BASH_EXE: &str = "bash.exe";
// Which of these holds the 64-bit bash depends on the bitness of the caller.
const BASH_DIRS: [&str; 3] = ["SysWow64", "Sysnative", "System32"];
const REDIRECT_ALL: &str = "&>";
const OUTPUT_PREFIX: &str = "wsl-kinit-";
const OUTPUT_SUFFIX: &str = ".out";

#[derive(Debug, Clone)]
pub struct BashLocator {
    windir: PathBuf,
}

impl BashLocator {
    pub fn new(windir: impl Into<PathBuf>) -> Self {
        Self {
            windir: windir.into(),
        }
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        BASH_DIRS
            .iter()
            .map(|dir| self.windir.join(dir).join(BASH_EXE))
            .collect()
    }

    pub fn locate(&self) -> anyhow::Result<PathBuf> {
        let candidates = self.candidates();
        if let Some(bash) = candidates.iter().find(|path| path.is_file()) {
            debug!(bash = %bash.display(), "found bash");
            return Ok(bash.to_owned());
        }
        Err(Error::SUBSYSTEM_NOT_FOUND.with_detail(format!(
            "searched {}",
            candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// Runs bash scripts inside the subsystem and relays what they print.
pub struct Launcher<R> {
    bash: BashLocator,
    runner: R,
    temp_dir: PathBuf,
    working_dir: PathBuf,
}

impl<R: ProcessRunner> Launcher<R> {
    pub fn new(context: &Context, runner: R) -> Self {
        Self {
            bash: BashLocator::new(&context.windir),
            runner,
            temp_dir: context.temp_dir.clone(),
            working_dir: context.working_dir.clone(),
        }
    }

    /// Runs `<bash> <script> &> <output>`, copies the captured output to
    /// `out` and returns the child's exit status.
    pub fn run_script(&self, script: &Path, out: &mut dyn Write) -> anyhow::Result<i32> {
        let bash = self.bash.locate()?;
        let script = to_subsystem_path(script)?;
        let (output, file) = TransientFile::create(&self.temp_dir, OUTPUT_PREFIX, OUTPUT_SUFFIX)?;
        drop(file);
        let spec = CommandSpec::new(bash)
            .arg(&script)
            .arg(REDIRECT_ALL)
            .arg(to_subsystem_path(output.path())?)
            .current_dir(&self.working_dir);
        match to_subsystem_path(&self.working_dir) {
            Ok(dir) => debug!(working_dir = %dir, "subsystem working directory"),
            Err(e) => warn!(error = %format!("{:#}", e), "working directory has no subsystem view"),
        }

        info!(script = %script, "launching bash");
        let status = self.runner.run(&spec)?;
        info!(status, "bash exited");

        // Past this point the child's status is the result; I/O trouble is only logged.
        if let Err(e) = relay_output(output.path(), out) {
            warn!(
                output = %output.path().display(),
                error = %e,
                "could not relay bash output"
            );
        }
        if let Err(e) = output.close() {
            warn!(error = %format!("{:#}", e), "could not remove bash output");
        }
        Ok(status)
    }
}

/// Copies `path` to `out` line by line, normalizing line ends to `\n`.
fn relay_output(path: &Path, out: &mut dyn Write) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = vec![];
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        out.write_all(&line)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
