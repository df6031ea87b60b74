use crate::Error;
use std::{env, path::Path};

const MOUNT_ROOT: &str = "/mnt/";
const VERBATIM_PREFIX: &str = r"\\?\";
const UNC_PREFIX: &str = r"\\";

/// Expands `%NAME%` references the way the host shell does: a variable that
/// is not set is left in place, `%` signs included.
pub fn expand_env_vars(path: &str) -> String {
    expand_env_vars_with(path, |name| env::var(name).ok())
}

fn expand_env_vars_with(path: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut buf = String::with_capacity(path.len());
    let mut path_remained = path;
    while !path_remained.is_empty() {
        let token_begin = match path_remained.find('%') {
            Some(token_begin) => {
                buf.push_str(&path_remained[..token_begin]);
                token_begin
            }
            None => {
                buf.push_str(path_remained);
                break;
            }
        };
        let token_end = match path_remained[token_begin + 1..].find('%') {
            Some(token_end) => token_begin + 1 + token_end,
            None => {
                buf.push_str(&path_remained[token_begin..]);
                break;
            }
        };
        let name = &path_remained[token_begin + 1..token_end];
        match lookup(name).filter(|_| !name.is_empty()) {
            Some(value) => {
                buf.push_str(&value);
                path_remained = &path_remained[token_end + 1..];
            }
            None => {
                // Keep the opening `%` and rescan from the closing one, which
                // may start the next reference.
                buf.push_str(&path_remained[token_begin..token_end]);
                path_remained = &path_remained[token_end..];
            }
        }
    }
    buf
}

/// Maps a host path `X:\a\b` to the subsystem's view `/mnt/x/a/b`.
///
/// Absolute POSIX paths are already in subsystem coordinates and are returned
/// as they are. UNC paths and anything without a drive letter fail.
pub fn to_subsystem_path(path: &Path) -> anyhow::Result<String> {
    let path = path
        .to_str()
        .ok_or_else(|| Error::UNSUPPORTED_PATH.with_detail(format!("{:?} is not valid UTF-8", path)))?;
    translate(&expand_env_vars(path))
}

fn translate(path: &str) -> anyhow::Result<String> {
    if path.starts_with('/') {
        return Ok(path.to_owned());
    }
    let path = path.strip_prefix(VERBATIM_PREFIX).unwrap_or(path);
    if path.starts_with(UNC_PREFIX) {
        return Err(Error::UNSUPPORTED_PATH
            .with_detail(format!("UNC path {} has no mount in the subsystem", path)));
    }
    match path.as_bytes() {
        [drive, b':', b'\\', ..] if drive.is_ascii_alphabetic() => Ok(format!(
            "{}{}/{}",
            MOUNT_ROOT,
            drive.to_ascii_lowercase() as char,
            path[3..].replace('\\', "/")
        )),
        _ => Err(Error::UNSUPPORTED_PATH
            .with_detail(format!("{} is not an absolute drive-letter path", path))),
    }
}
