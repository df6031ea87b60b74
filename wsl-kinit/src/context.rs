mod profile;

pub use self::profile::Profile;
use crate::{path::expand_env_vars, Error};
use std::{env, path::PathBuf};

const DEFAULT_WINDIR: &str = "%windir%";
const FALLBACK_WINDIR: &str = r"C:\Windows";
const DEFAULT_FORWARDABLE: bool = true;
const DEFAULT_LIST: bool = false;

pub struct Conf;

macro_rules! conf {
    ($name:ident, $value:expr) => {
        pub const $name: &'static str = $value;
    };
}

impl Conf {
    conf!(DEFAULTS, "defaults");
    conf!(FORWARDABLE, "forwardable");
    conf!(LIST, "list");
    conf!(TEMP_DIR, "temp_dir");
    conf!(WINDIR, "windir");
}

/// Settings for one invocation, resolved once at start-up.
#[derive(Debug)]
pub struct Context {
    /// Root of the bash search.
    pub windir: PathBuf,
    /// Where the script and the captured output are written.
    pub temp_dir: PathBuf,
    pub working_dir: PathBuf,
    pub forwardable: bool,
    pub list: bool,
}

impl Context {
    pub fn init() -> anyhow::Result<Self> {
        Self::new(Profile::new()?)
    }

    pub fn new(profile: Profile) -> anyhow::Result<Self> {
        let windir = Self::get_windir(&profile);
        let temp_dir = Self::get_string(&profile, Conf::TEMP_DIR)
            .map(|dir| PathBuf::from(expand_env_vars(&dir)))
            .unwrap_or_else(env::temp_dir);
        let working_dir = env::current_dir().map_err(|e| {
            Error::SCRIPT_IO.with_detail(format!("reading the current directory: {}", e))
        })?;
        let forwardable = Self::get_bool(&profile, Conf::FORWARDABLE, DEFAULT_FORWARDABLE);
        let list = Self::get_bool(&profile, Conf::LIST, DEFAULT_LIST);

        Ok(Self {
            windir,
            temp_dir,
            working_dir,
            forwardable,
            list,
        })
    }

    fn get_windir(profile: &Profile) -> PathBuf {
        let windir = Self::get_string(profile, Conf::WINDIR).unwrap_or(DEFAULT_WINDIR.to_owned());
        let expanded = expand_env_vars(&windir);
        if expanded.contains('%') {
            PathBuf::from(FALLBACK_WINDIR)
        } else {
            PathBuf::from(expanded)
        }
    }

    fn get_bool(profile: &Profile, name: &str, default: bool) -> bool {
        profile
            .get_bool(&format!("{}.{}", Conf::DEFAULTS, name))
            .unwrap_or(default)
    }

    fn get_string(profile: &Profile, name: &str) -> Option<String> {
        profile.get_string(&format!("{}.{}", Conf::DEFAULTS, name))
    }
}
