use super::{error, Error};

impl Error {
    error!(MALFORMED_PRINCIPAL, 2, "Malformed principal");
    error!(CREDENTIAL_MISSING, 3, "Credential not found in the vault");
    error!(SUBSYSTEM_NOT_FOUND, 4, "Could not find a path to bash");
    error!(SCRIPT_IO, 5, "Transient file I/O failure");
    error!(UNSUPPORTED_PATH, 6, "Path cannot be mapped into the subsystem");
    error!(VAULT_UNAVAILABLE, 7, "Credential vault unavailable");
    error!(LAUNCH_FAILED, 8, "Failed to launch bash");
    error!(UNSAFE_PASSWORD, 9, "Password cannot be carried on a single line");
}
