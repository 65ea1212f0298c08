//! Credential presence and operating mode

use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};
use tracing::debug;

/// Something that may hold an API credential
pub trait CredentialSource: Send + Sync {
    /// The current token, if one is stored
    fn token(&self) -> Option<String>;

    /// Whether a usable credential is currently stored
    fn is_present(&self) -> bool {
        self.token().is_some_and(|token| !token.trim().is_empty())
    }
}

/// Credential kept in a token file. The file is read on every call, so a
/// login or logout by another process is observed immediately.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CredentialSource for TokenFile {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) => {
                debug!("No token at {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// In-memory credential slot
#[derive(Debug, Default)]
pub struct MemoryCredential {
    token: RwLock<Option<String>>,
}

impl MemoryCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

impl CredentialSource for MemoryCredential {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }
}

/// Where responses come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Talk to the assistant service
    Remote,
    /// Demo mode: no credential, answers come from the simulated responder
    Local,
}

/// Picks the operating mode from credential presence. Never cached: every
/// call looks at the credential again.
#[derive(Clone)]
pub struct ModeResolver {
    credentials: Arc<dyn CredentialSource>,
}

impl ModeResolver {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self { credentials }
    }

    pub fn resolve(&self) -> Mode {
        if self.credentials.is_present() {
            Mode::Remote
        } else {
            Mode::Local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_credential_switches_mode() {
        let credentials = Arc::new(MemoryCredential::empty());
        let resolver = ModeResolver::new(credentials.clone());
        assert_eq!(resolver.resolve(), Mode::Local);

        credentials.set("secret");
        assert_eq!(resolver.resolve(), Mode::Remote);

        credentials.clear();
        assert_eq!(resolver.resolve(), Mode::Local);
    }

    #[test]
    fn test_blank_token_is_absent() {
        let credentials = MemoryCredential::new("   ");
        assert!(!credentials.is_present());
    }

    #[test]
    fn test_token_file_is_read_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        let resolver = ModeResolver::new(Arc::new(TokenFile::new(&path)));

        assert_eq!(resolver.resolve(), Mode::Local);

        std::fs::write(&path, "abc123\n").unwrap();
        assert_eq!(resolver.resolve(), Mode::Remote);
        assert_eq!(TokenFile::new(&path).token().as_deref(), Some("abc123"));

        std::fs::write(&path, "").unwrap();
        assert_eq!(resolver.resolve(), Mode::Local);
    }
}
