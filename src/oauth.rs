pub mod client;
mod server;

use crate::error::{Error, Result};
use crate::macros::{impl_from_string, impl_str_wrapper};
use crate::store::TokenStore;
use chrono::{DateTime, Utc};
use client::OAuthClient;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fs::File, io::BufReader, path::Path, sync::Arc};

pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.compose",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.settings.basic",
];

/// Owns the cached tokens for one credential set and keeps them valid:
/// unexpired tokens are handed out as-is, expired ones are refreshed once
/// and written back to the store before use.
pub struct TokenManager {
    client: OAuthClient,
    store: TokenStore,
}

impl TokenManager {
    pub fn new(client: OAuthClient, store: TokenStore) -> Self {
        Self { client, store }
    }

    /// Loads the token cache, or runs the interactive consent flow when the
    /// cache is empty, persisting the initial grant.
    pub async fn bootstrap(creds: ClientCredentials, store: TokenStore) -> Result<Self> {
        let client = match store.load()? {
            Some(tokens) => {
                tracing::debug!(path = %store.path().display(), "token cache loaded");
                OAuthClient::new(creds, tokens)
            }
            None => {
                tracing::info!("no cached token, starting interactive authorization");
                let client = OAuthClient::authorize(creds).await?;
                store.save(client.tokens())?;
                tracing::info!(path = %store.path().display(), "authorization granted, token cached");
                client
            }
        };
        Ok(Self::new(client, store))
    }

    pub async fn ensure_valid_token(&mut self) -> Result<AccessToken> {
        if self.client.check_access_token().await? {
            tracing::debug!("access token refreshed, updating cache");
            self.store.save(self.client.tokens())?;
        }
        Ok(self.client.access_token().clone())
    }
}

impl_str_wrapper!(
    ClientId,
    ClientSecret,
    AuthzCode,
    AccessToken,
    RefreshToken,
    State
);
impl_from_string!(ClientId, ClientSecret, AccessToken, RefreshToken);

#[derive(Clone, Debug, Deserialize)]
pub struct ClientId(String);

#[derive(Clone, Deserialize)]
pub struct ClientSecret(String);

// never let the secret end up in logs or assertion output
impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientSecret(<redacted>)")
    }
}

#[derive(Clone, Debug)]
pub struct ClientCredentials {
    pub id: ClientId,
    pub secret: ClientSecret,
}

impl ClientCredentials {
    /// Reads a Google "client secrets" file (the JSON downloaded from the
    /// Cloud Console for a desktop app).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::authorization_with_hint(
                format!("credentials file not found at {}", path.display()),
                "download OAuth desktop-app credentials from the Google Cloud Console \
                 and save them there, or pass --credentials",
            ),
            _ => Error::Io(err),
        })?;
        let reader = BufReader::new(file);
        let secrets = serde_json::from_reader::<_, secrets_file::SecretsFile>(reader)
            .map_err(|err| {
                Error::Validation(format!(
                    "{} is not a client secrets file: {err}",
                    path.display()
                ))
            })?
            .into_inner();
        Ok(Self {
            id: secrets.client_id,
            secret: secrets.client_secret,
        })
    }
}

mod secrets_file {
    use super::{ClientId, ClientSecret};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum SecretsFile {
        Installed(ApplicationSecrets),
        Web(ApplicationSecrets),
    }

    impl SecretsFile {
        pub fn into_inner(self) -> ApplicationSecrets {
            match self {
                SecretsFile::Installed(inner) => inner,
                SecretsFile::Web(inner) => inner,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct ApplicationSecrets {
        pub client_id: ClientId,
        pub client_secret: ClientSecret,
    }
}

pub struct CodeVerifier([u8; 128]);

impl CodeVerifier {
    const VALID_CHARS: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

    pub fn new() -> Self {
        use rand::seq::IndexedRandom;
        let mut rng = rand::rng();
        Self(std::array::from_fn(|_| {
            Self::VALID_CHARS.choose(&mut rng).copied().unwrap()
        }))
    }

    pub fn to_s256(&self) -> String {
        use base64::prelude::*;

        let hashed = Sha256::digest(self.0);
        BASE64_URL_SAFE_NO_PAD.encode(hashed)
    }

    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.0).expect("verifier is ascii")
    }
}

impl Default for CodeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize, PartialEq, Eq)]
pub struct State(String);

impl State {
    fn new() -> Self {
        use rand::{Rng, distr::Alphanumeric};
        Self(
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(32)
                .map(char::from)
                .collect(),
        )
    }
}

#[derive(Deserialize)]
pub struct AuthzCode(String);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccessToken(Arc<str>);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshToken(String);

/// The persisted shape of the token cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
}
