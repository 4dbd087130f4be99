use super::{
    AUTH_ENDPOINT, AccessToken, AuthzCode, ClientCredentials, CodeVerifier, OAuthTokens, SCOPES,
    State, TOKEN_ENDPOINT, server,
};
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Refresh this far ahead of the recorded expiry so a token does not lapse
/// mid-request.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

const REAUTH_HINT: &str = "delete the token cache file and re-run to repeat the consent flow";

pub struct OAuthClient {
    creds: ClientCredentials,
    tokens: OAuthTokens,
    http_client: reqwest::Client,
    token_endpoint: Url,
}

impl OAuthClient {
    pub fn new(creds: ClientCredentials, tokens: OAuthTokens) -> Self {
        Self {
            creds,
            tokens,
            http_client: reqwest::Client::new(),
            token_endpoint: Url::parse(TOKEN_ENDPOINT).expect("valid url"),
        }
    }

    pub fn with_token_endpoint(mut self, token_endpoint: Url) -> Self {
        self.token_endpoint = token_endpoint;
        self
    }

    pub fn tokens(&self) -> &OAuthTokens {
        &self.tokens
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.tokens.access_token
    }

    /// Runs the desktop authorization-code flow: opens the consent URL in a
    /// browser and waits for the loopback redirect to deliver the code.
    pub async fn authorize(creds: ClientCredentials) -> Result<Self> {
        let verifier = CodeVerifier::new();
        let state = State::new();
        let consent_url = consent_url(&creds, &state, &verifier);

        tracing::info!("waiting for authorization in the browser");
        if webbrowser::open(consent_url.as_str()).is_err() {
            eprintln!("Open this URL in a browser to authorize:\n{consent_url}");
        }

        let tokens = server::wait_response(creds.clone(), state, verifier).await?;
        Ok(Self::new(creds, tokens))
    }

    /// Returns true when the access token was refreshed and the caller
    /// should persist the new tokens.
    pub async fn check_access_token(&mut self) -> Result<bool> {
        if Utc::now() + EXPIRY_LEEWAY < self.tokens.expires_at {
            return Ok(false);
        }
        tracing::debug!("access token expired, refreshing");
        self.refresh().await?;
        Ok(true)
    }

    async fn refresh(&mut self) -> Result<()> {
        #[derive(Deserialize)]
        struct RefreshResponse {
            access_token: String,
            expires_in: u64,
            refresh_token: Option<String>,
            scope: Option<String>,
        }

        let response = self
            .http_client
            .post(self.token_endpoint.clone())
            .form(&[
                ("client_id", self.creds.id.as_str()),
                ("client_secret", self.creds.secret.as_str()),
                ("refresh_token", self.tokens.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_oauth_error(&body)
                .unwrap_or_else(|| format!("token refresh failed with status {status}"));
            return Err(Error::authorization_with_hint(message, REAUTH_HINT));
        }

        let parsed: RefreshResponse = response.json().await?;
        let now = Utc::now();
        self.tokens.access_token = parsed.access_token.into();
        self.tokens.expires_at = now + Duration::from_secs(parsed.expires_in);
        if let Some(refresh_token) = parsed.refresh_token {
            self.tokens.refresh_token = refresh_token.into();
        }
        if let Some(scope) = parsed.scope {
            self.tokens.scopes = scope.split_whitespace().map(str::to_owned).collect();
        }
        Ok(())
    }
}

/// The pre-token half of the flow, held by the redirect listener until the
/// authorization code arrives.
pub(super) struct PendingExchange {
    creds: ClientCredentials,
    verifier: CodeVerifier,
    http_client: reqwest::Client,
}

impl PendingExchange {
    pub fn new(creds: ClientCredentials, verifier: CodeVerifier) -> Self {
        Self {
            creds,
            verifier,
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn exchange_code_for_tokens(&self, code: AuthzCode) -> Result<OAuthTokens> {
        #[derive(Deserialize)]
        struct TokensResponse {
            access_token: String,
            expires_in: u64,
            refresh_token: String,
            scope: Option<String>,
        }

        let response = self
            .http_client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code.as_str()),
                ("code_verifier", self.verifier.as_str()),
                ("client_id", self.creds.id.as_str()),
                ("client_secret", self.creds.secret.as_str()),
                ("redirect_uri", server::REDIRECT_URI),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_oauth_error(&body)
                .unwrap_or_else(|| format!("code exchange failed with status {status}"));
            return Err(Error::authorization(message));
        }

        let parsed: TokensResponse = response.json().await?;
        let now = Utc::now();
        Ok(OAuthTokens {
            access_token: parsed.access_token.into(),
            refresh_token: parsed.refresh_token.into(),
            expires_at: now + Duration::from_secs(parsed.expires_in),
            scopes: parsed
                .scope
                .map(|s| s.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
        })
    }
}

fn consent_url(creds: &ClientCredentials, state: &State, verifier: &CodeVerifier) -> Url {
    let mut url = Url::parse(AUTH_ENDPOINT).expect("valid url");
    url.query_pairs_mut()
        .append_pair("client_id", creds.id.as_str())
        .append_pair("redirect_uri", server::REDIRECT_URI)
        .append_pair("response_type", "code")
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("state", state.as_str())
        .append_pair("code_challenge", &verifier.to_s256())
        .append_pair("code_challenge_method", "S256")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    url
}

fn parse_oauth_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: String,
        error_description: Option<String>,
    }

    let parsed = serde_json::from_str::<ErrorResponse>(body).ok()?;
    Some(match parsed.error_description {
        Some(description) => format!("{}: {description}", parsed.error),
        None => parsed.error,
    })
}
