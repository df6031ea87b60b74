use super::{Credential, CredentialVault};

/// An in-process table of generic credentials. Targets match without regard
/// to ASCII case, as in the Windows vault; usernames must match exactly.
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Vec<(String, Credential)>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: &str, username: &str, password: &str) {
        self.entries
            .push((target.to_owned(), Credential::new(username, password)));
    }

    pub fn with_entry(mut self, target: &str, username: &str, password: &str) -> Self {
        self.insert(target, username, password);
        self
    }
}

impl CredentialVault for MemoryVault {
    fn lookup(&self, target: &str, username: &str) -> anyhow::Result<Option<Credential>> {
        Ok(self
            .entries
            .iter()
            .filter(|(entry_target, _)| entry_target.eq_ignore_ascii_case(target))
            .map(|(_, credential)| credential)
            .find(|credential| credential.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_entry_wins() {
        let vault = MemoryVault::new()
            .with_entry("R", "alice", "first")
            .with_entry("R", "alice", "second");
        let credential = vault.lookup("R", "alice").unwrap().unwrap();
        assert_eq!(credential.password(), "first");
    }

    #[test]
    fn username_must_match_exactly() {
        let vault = MemoryVault::new().with_entry("R", "alice", "pw");
        assert!(vault.lookup("R", "Alice").unwrap().is_none());
        assert!(vault.lookup("R", "alice").unwrap().is_some());
    }

    #[test]
    fn target_ignores_ascii_case() {
        let vault = MemoryVault::new().with_entry("EXAMPLE.ORG", "alice", "pw");
        let credential = vault.lookup("example.org", "alice").unwrap().unwrap();
        assert_eq!(credential.password(), "pw");
        assert!(vault.lookup("Example.Org", "alice").unwrap().is_some());
        assert!(vault.lookup("EXAMPLE.NET", "alice").unwrap().is_none());
    }
}
