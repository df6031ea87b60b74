mod kinit_error;

use std::fmt::Display;

pub type ErrorCode = i32;

#[derive(Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub message: &'static str,
}

impl Error {
    /// Wraps the error with a human readable detail, keeping it reachable
    /// through `anyhow::Error::downcast_ref::<&'static Error>()`.
    pub fn with_detail(&'static self, detail: impl Display) -> anyhow::Error {
        anyhow::Error::new(self).context(detail.to_string())
    }

    /// Finds the error code carried anywhere in the chain.
    pub fn code_of(err: &anyhow::Error) -> Option<ErrorCode> {
        err.downcast_ref::<&'static Error>().map(|e| e.code)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

macro_rules! error {
    ($error:ident, $code:expr, $message:expr) => {
        pub const $error: &'static Error = &Error {
            code: $code,
            message: $message,
        };
    };
}

pub(self) use error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_keeps_code_reachable() {
        let err = Error::CREDENTIAL_MISSING.with_detail("no entry for alice");
        assert_eq!(Error::code_of(&err), Some(3));
        assert_eq!(
            format!("{:#}", err),
            "no entry for alice: Credential not found in the vault"
        );
    }

    #[test]
    fn propagated_constant_keeps_code() {
        fn fails() -> anyhow::Result<()> {
            Err(Error::SCRIPT_IO)?
        }
        let err = fails().unwrap_err();
        assert_eq!(Error::code_of(&err), Some(Error::SCRIPT_IO.code));
    }

    #[test]
    fn foreign_errors_carry_no_code() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(Error::code_of(&err), None);
    }
}
