use crate::error::{Error, Result};
use crate::oauth::OAuthTokens;
use std::fs;
use std::path::{Path, PathBuf};

/// The token cache: one JSON file holding the current tokens for one
/// credential set. Read at most once and written at most once (on refresh
/// or initial grant) per invocation. Concurrent invocations are not
/// coordinated; last writer wins.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<OAuthTokens>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let tokens = serde_json::from_str(&data).map_err(|err| {
            Error::authorization_with_hint(
                format!("token cache at {} is unreadable: {err}", self.path.display()),
                "delete the file and re-run to repeat the consent flow",
            )
        })?;
        Ok(Some(tokens))
    }

    pub fn save(&self, tokens: &OAuthTokens) -> Result<()> {
        use std::io::Write as _;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(tokens)?;

        // the file must never exist with looser permissions, so 0600 is
        // set at creation rather than after the write
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tokens() -> OAuthTokens {
        OAuthTokens {
            access_token: String::from("at-1").into(),
            refresh_token: String::from("rt-1").into(),
            expires_at: Utc::now(),
            scopes: vec!["https://www.googleapis.com/auth/gmail.modify".into()],
        }
    }

    #[test]
    fn missing_cache_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        store.save(&tokens()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token.as_str(), "at-1");
        assert_eq!(loaded.refresh_token.as_str(), "rt-1");
        assert_eq!(loaded.scopes.len(), 1);
    }

    #[test]
    fn corrupt_cache_suggests_reauthorization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{not json").unwrap();
        let err = TokenStore::new(path).load().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Authorization);
    }

    #[cfg(unix)]
    #[test]
    fn cache_file_is_owner_only_from_creation() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&tokens()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // rewriting on refresh keeps the mode
        store.save(&tokens()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
