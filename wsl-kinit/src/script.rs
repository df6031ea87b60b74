use crate::{Credential, Error, Principal, TransientFile};
use std::{fmt::Write as _, io::Write, path::Path};
use tracing::debug;
use zeroize::Zeroizing;

pub const HEREDOC_DELIMITER: &str = "MYEOF";
const SCRIPT_PREFIX: &str = "wsl-kinit-";
const SCRIPT_SUFFIX: &str = ".sh";

/// The bash program that feeds a password to `kinit` on its standard input:
///
/// ```text
/// kinit -f <principal> << MYEOF
/// <password>
/// MYEOF
/// klist
/// ```
pub struct KinitScript<'a> {
    principal: &'a Principal,
    credential: &'a Credential,
    forwardable: bool,
    list: bool,
}

impl<'a> KinitScript<'a> {
    pub fn new(principal: &'a Principal, credential: &'a Credential) -> Self {
        Self {
            principal,
            credential,
            forwardable: true,
            list: false,
        }
    }

    pub fn forwardable(mut self, forwardable: bool) -> Self {
        self.forwardable = forwardable;
        self
    }

    pub fn list(mut self, list: bool) -> Self {
        self.list = list;
        self
    }

    pub fn render(&self) -> anyhow::Result<Zeroizing<String>> {
        let password = self.credential.password();
        if password.contains(['\n', '\r']) {
            return Err(Error::UNSAFE_PASSWORD.with_detail(format!(
                "the vault entry for '{}' holds a line break",
                self.principal
            )));
        }
        let body = escape_heredoc_body(password);
        let delimiter = pick_delimiter(&body);

        let mut script = Zeroizing::new(String::with_capacity(body.len() + 64));
        // Writing to a String cannot fail.
        let _ = write!(script, "kinit");
        if self.forwardable {
            let _ = write!(script, " -f");
        }
        let _ = writeln!(
            script,
            " {} << {}",
            quote_word(&self.principal.unparse_name()),
            delimiter
        );
        let _ = writeln!(script, "{}", body.as_str());
        let _ = writeln!(script, "{}", delimiter);
        if self.list {
            let _ = writeln!(script, "klist");
        }
        Ok(script)
    }

    /// Writes the script to a private temp file in `dir`. The returned guard
    /// deletes it, and also does so if writing fails.
    pub fn materialize(&self, dir: &Path) -> anyhow::Result<TransientFile> {
        let script = self.render()?;
        let (transient, mut file) = TransientFile::create(dir, SCRIPT_PREFIX, SCRIPT_SUFFIX)?;
        let transient = transient.guard_against_signals();
        file.write_all(script.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| {
                Error::SCRIPT_IO.with_detail(format!(
                    "writing {}: {}",
                    transient.path().display(),
                    e
                ))
            })?;
        debug!(path = %transient.path().display(), list = self.list, "materialized kinit script");
        Ok(transient)
    }
}

/// Inside an unquoted here-document bash still expands `$`, `` ` `` and `\`;
/// escaping them hands the password to `kinit` unchanged.
fn escape_heredoc_body(password: &str) -> Zeroizing<String> {
    let mut body = Zeroizing::new(String::with_capacity(password.len()));
    for c in password.chars() {
        if matches!(c, '\\' | '$' | '`') {
            body.push('\\');
        }
        body.push(c);
    }
    body
}

fn pick_delimiter(body: &str) -> String {
    let mut delimiter = HEREDOC_DELIMITER.to_owned();
    let mut n = 0;
    while body == delimiter {
        n += 1;
        delimiter = format!("{}_{}", HEREDOC_DELIMITER, n);
    }
    delimiter
}

fn quote_word(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@._-/+=:,".contains(c));
    if safe {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(principal: &str, password: &str, list: bool) -> anyhow::Result<String> {
        let principal = Principal::parse_name(principal).unwrap();
        let credential = Credential::new(principal.username.clone(), password);
        let script = KinitScript::new(&principal, &credential).list(list).render()?;
        Ok(script.as_str().to_owned())
    }

    #[test]
    fn renders_heredoc_with_unix_line_endings() {
        let script = render("alice@EXAMPLE.ORG", "p@ss", false).unwrap();
        assert_eq!(script, "kinit -f alice@EXAMPLE.ORG << MYEOF\np@ss\nMYEOF\n");
        assert!(!script.contains('\r'));
    }

    #[test]
    fn appends_klist_when_listing() {
        let script = render("alice@EXAMPLE.ORG", "p@ss", true).unwrap();
        assert_eq!(
            script,
            "kinit -f alice@EXAMPLE.ORG << MYEOF\np@ss\nMYEOF\nklist\n"
        );
    }

    #[test]
    fn omits_forwardable_flag_when_disabled() {
        let principal = Principal::parse_name("alice@EXAMPLE.ORG").unwrap();
        let credential = Credential::new("alice", "pw");
        let script = KinitScript::new(&principal, &credential)
            .forwardable(false)
            .render()
            .unwrap();
        assert!(script.starts_with("kinit alice@EXAMPLE.ORG << MYEOF\n"));
    }

    #[test]
    fn escapes_shell_expansion_in_password() {
        let script = render("alice@EXAMPLE.ORG", r"a$HOME`id`\z", false).unwrap();
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines[1], r"a\$HOME\`id\`\\z");
    }

    #[test]
    fn rerolls_delimiter_on_collision() {
        let script = render("alice@EXAMPLE.ORG", "MYEOF", false).unwrap();
        assert_eq!(
            script,
            "kinit -f alice@EXAMPLE.ORG << MYEOF_1\nMYEOF\nMYEOF_1\n"
        );
        assert_eq!(pick_delimiter("MYEOF_1"), "MYEOF");
    }

    #[test]
    fn rejects_line_breaks_in_password() {
        for password in ["p\nMYEOF", "p\r", "\n"] {
            let err = render("alice@EXAMPLE.ORG", password, false).unwrap_err();
            assert_eq!(Error::code_of(&err), Some(Error::UNSAFE_PASSWORD.code));
            assert!(!format!("{:#}", err).contains(password));
        }
    }

    #[test]
    fn quotes_principal_with_shell_metacharacters() {
        let script = render("o'brien@EX ORG", "pw", false).unwrap();
        assert!(script.starts_with(r"kinit -f 'o'\''brien@EX ORG' << MYEOF"));
        assert_eq!(quote_word("svc/host.example.org@R"), "svc/host.example.org@R");
        assert_eq!(quote_word("a;b@R"), "'a;b@R'");
    }

    #[test]
    fn materialized_file_matches_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let principal = Principal::parse_name("alice@EXAMPLE.ORG").unwrap();
        let credential = Credential::new("alice", "p@ss");
        let script = KinitScript::new(&principal, &credential).list(true);
        let transient = script.materialize(dir.path()).unwrap();
        let written = std::fs::read_to_string(transient.path()).unwrap();
        assert_eq!(written, script.render().unwrap().as_str());
        let path = transient.path().to_owned();
        transient.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn render_failure_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let principal = Principal::parse_name("alice@EXAMPLE.ORG").unwrap();
        let credential = Credential::new("alice", "a\nb");
        assert!(KinitScript::new(&principal, &credential)
            .materialize(dir.path())
            .is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
