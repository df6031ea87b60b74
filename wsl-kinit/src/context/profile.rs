use crate::path::expand_env_vars;
use config::{Config, File, FileFormat};
use std::{env, fs, io};
use tracing::debug;

const ENV_CONFIG: &str = "WSL_KINIT_CONFIG";
const DEFAULT_PROFILE_PATH: &str = r"%APPDATA%\wsl-kinit\wsl-kinit.ini";
const PATH_SEP: char = ';';

/// Layered INI settings; the first file that defines a key wins.
#[derive(Debug, Default)]
pub struct Profile {
    files: Vec<ProfileFile>,
}

macro_rules! get_value {
    ($fn:ident, $type:ident) => {
        pub fn $fn(&self, key: &str) -> Option<$type> {
            for file in &self.files {
                if let Ok(value) = file.config.$fn(key) {
                    return Some(value);
                }
            }
            None
        }
    };
}

impl Profile {
    pub fn new() -> anyhow::Result<Self> {
        Self::from_files(&Self::default_config_files())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_files(files: &[String]) -> anyhow::Result<Self> {
        let mut profile_files = vec![];
        for file in files {
            profile_files.push(ProfileFile::new(file)?);
        }
        Ok(Self {
            files: profile_files,
        })
    }

    fn default_config_files() -> Vec<String> {
        let filepath = env::var(ENV_CONFIG).unwrap_or(DEFAULT_PROFILE_PATH.to_owned());
        filepath
            .split(PATH_SEP)
            .filter(|f| !f.trim().is_empty())
            .map(|f| expand_env_vars(f.trim()))
            .collect()
    }

    get_value!(get_string, String);

    get_value!(get_bool, bool);
}

#[derive(Debug)]
struct ProfileFile {
    config: Config,
}

impl ProfileFile {
    fn new(filename: &str) -> anyhow::Result<Self> {
        debug!(file = filename, "loading profile");
        let mut builder = Config::builder();
        if let Some(text) = Self::read(filename)? {
            let text = escape_backslashes(&text);
            builder = builder.add_source(File::from_str(&text, FileFormat::Ini));
        }
        Ok(Self {
            config: builder.build()?,
        })
    }

    fn read(filename: &str) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(filename) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("{}: {}", filename, e)),
        }
    }
}

/// The INI reader unescapes `\`; doubled, Windows paths read back intact.
fn escape_backslashes(text: &str) -> String {
    text.replace('\\', "\\\\")
}
