//! Generic credentials from the Windows Credential Manager.
//!
//! All unsafe Win32 calls of the crate's vault access live here.

use super::{Credential, CredentialVault};
use crate::Error;
use std::{ffi::OsStr, os::windows::ffi::OsStrExt, slice};
use tracing::debug;
use zeroize::Zeroizing;
use windows::{
    core::{PCWSTR, PWSTR},
    Win32::{
        Foundation::ERROR_NOT_FOUND,
        Security::Credentials::{
            CredEnumerateW, CredFree, CREDENTIALW, CRED_ENUMERATE_FLAGS, CRED_TYPE_GENERIC,
        },
    },
};

/// Reads generic credentials with `CredEnumerateW`. Never writes.
#[derive(Debug, Default)]
pub struct WindowsCredentialManager;

impl WindowsCredentialManager {
    pub fn new() -> Self {
        WindowsCredentialManager
    }
}

impl CredentialVault for WindowsCredentialManager {
    fn lookup(&self, target: &str, username: &str) -> anyhow::Result<Option<Credential>> {
        let filter: Vec<u16> = OsStr::new(target)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let mut count = 0u32;
        let mut credentials: *mut *mut CREDENTIALW = std::ptr::null_mut();

        // SAFETY: `filter` is NUL terminated and outlives the call; on success
        // `credentials` points at `count` entries owned by the system until
        // `CredFree`.
        let enumerated = unsafe {
            CredEnumerateW(
                PCWSTR::from_raw(filter.as_ptr()),
                CRED_ENUMERATE_FLAGS(0),
                &mut count,
                &mut credentials,
            )
        };
        if let Err(e) = enumerated {
            if e.code() == ERROR_NOT_FOUND.to_hresult() {
                debug!(target_name = target, "no generic credentials for target");
                return Ok(None);
            }
            return Err(Error::VAULT_UNAVAILABLE
                .with_detail(format!("CredEnumerateW failed for '{}': {}", target, e)));
        }

        // SAFETY: see above; the array is released before returning.
        let found = unsafe {
            let entries = slice::from_raw_parts(credentials, count as usize);
            let found = entries
                .iter()
                .map(|entry| &**entry)
                .filter(|entry| entry.Type == CRED_TYPE_GENERIC)
                .filter(|entry| {
                    wide_to_string(entry.TargetName)
                        .is_some_and(|name| name.eq_ignore_ascii_case(target))
                })
                .find(|entry| wide_to_string(entry.UserName).as_deref() == Some(username))
                .map(|entry| decode_blob(entry.CredentialBlob, entry.CredentialBlobSize));
            CredFree(credentials as *const _);
            found
        };

        debug!(
            target_name = target,
            entries = count,
            matched = found.is_some(),
            "enumerated generic credentials"
        );
        match found {
            None => Ok(None),
            Some(Ok(password)) => Ok(Some(Credential::with_password(username, password))),
            Some(Err(e)) => Err(Error::VAULT_UNAVAILABLE.with_detail(format!(
                "password stored for '{}' under '{}' is not valid UTF-16: {}",
                username, target, e
            ))),
        }
    }
}

unsafe fn wide_to_string(value: PWSTR) -> Option<String> {
    if value.is_null() {
        None
    } else {
        value.to_string().ok()
    }
}

/// The blob holds the password as little-endian UTF-16 without a terminator,
/// though some writers append one. Every copy made here is wiped on drop.
unsafe fn decode_blob(
    blob: *const u8,
    size: u32,
) -> Result<Zeroizing<String>, std::string::FromUtf16Error> {
    if blob.is_null() || size == 0 {
        return Ok(Zeroizing::new(String::new()));
    }
    let bytes = slice::from_raw_parts(blob, size as usize);
    let wide: Zeroizing<Vec<u16>> = Zeroizing::new(
        bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect(),
    );
    let mut password = Zeroizing::new(String::from_utf16(&wide)?);
    let len = password.trim_end_matches('\0').len();
    password.truncate(len);
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf16_blob() {
        let wide: Vec<u8> = "p@ss\0"
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        let password = unsafe { decode_blob(wide.as_ptr(), wide.len() as u32) }.unwrap();
        assert_eq!(password.as_str(), "p@ss");
    }

    #[test]
    fn only_trailing_nuls_are_dropped() {
        let wide: Vec<u8> = "p\0ss\0\0"
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        let password = unsafe { decode_blob(wide.as_ptr(), wide.len() as u32) }.unwrap();
        assert_eq!(password.as_str(), "p\0ss");
        assert!(unsafe { decode_blob(std::ptr::null(), 0) }.unwrap().is_empty());
    }

    #[test]
    fn unknown_target_is_not_found() {
        let vault = WindowsCredentialManager::new();
        let found = vault
            .lookup("wsl-kinit.test.invalid.realm", "nobody")
            .unwrap();
        assert!(found.is_none());
    }
}
