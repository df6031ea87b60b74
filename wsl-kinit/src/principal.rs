use crate::Error;
use std::fmt;

const REALM_SEP: char = '@';

/// A Kerberos identity split at its realm separator.
///
/// Only non-emptiness is checked here; `kinit` inside the subsystem is the
/// authority on what a valid name looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub realm: String,
}

impl Principal {
    pub fn parse_name(name: &str) -> anyhow::Result<Self> {
        let parts = name.trim().split(REALM_SEP).collect::<Vec<&str>>();
        match parts[..] {
            [username, realm] if !username.is_empty() && !realm.is_empty() => Ok(Self {
                username: username.to_owned(),
                realm: realm.to_owned(),
            }),
            _ => Err(Error::MALFORMED_PRINCIPAL.with_detail(format!(
                "The credential ({}) must be in the format user@REALM",
                name
            ))),
        }
    }

    /// The name handed to `kinit`; equal to the trimmed input.
    pub fn unparse_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.username, REALM_SEP, self.realm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_user_and_realm() {
        let principal = Principal::parse_name("alice@EXAMPLE.ORG").unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.realm, "EXAMPLE.ORG");
    }

    #[test]
    fn trims_outer_whitespace_once() {
        let principal = Principal::parse_name("  alice@EXAMPLE.ORG\t\n").unwrap();
        assert_eq!(principal.unparse_name(), "alice@EXAMPLE.ORG");
    }

    #[test]
    fn keeps_case_and_inner_characters() {
        let input = "Alice.Smith/admin@Example.Org";
        let principal = Principal::parse_name(input).unwrap();
        assert_eq!(principal.username, "Alice.Smith/admin");
        assert_eq!(principal.realm, "Example.Org");
        assert_eq!(principal.unparse_name(), input);
    }

    #[test]
    fn rejects_missing_separator() {
        let err = Principal::parse_name("alice").unwrap_err();
        assert_eq!(Error::code_of(&err), Some(Error::MALFORMED_PRINCIPAL.code));
        let message = format!("{:#}", err);
        assert!(message.contains("(alice)"));
        assert!(message.contains("user@REALM"));
    }

    #[test]
    fn rejects_empty_halves_and_extra_separators() {
        for input in ["@EXAMPLE.ORG", "alice@", "@", "a@b@c", "", "   "] {
            let err = Principal::parse_name(input).unwrap_err();
            assert_eq!(
                Error::code_of(&err),
                Some(Error::MALFORMED_PRINCIPAL.code),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn accepted_names_rejoin_to_trimmed_input() {
        for input in ["bob@R", " x@Y.Z ", "svc-1@CORP.EXAMPLE.COM", "a b@C D"] {
            let principal = Principal::parse_name(input).unwrap();
            assert_eq!(
                format!("{}@{}", principal.username, principal.realm),
                input.trim()
            );
        }
    }
}
