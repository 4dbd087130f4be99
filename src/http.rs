use crate::error::{Error, Result};
use crate::oauth::AccessToken;
use bon::bon;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Thin wrapper over reqwest: a base URL, path segments, bearer auth and
/// JSON in/out. Failures are classified into the crate error taxonomy, and
/// there are deliberately no transport retries; the caller owns retry policy.
#[derive(Clone)]
pub struct GenericClient {
    base_url: Url,
    http_client: reqwest::Client,
}

#[bon]
impl GenericClient {
    #[builder]
    pub fn new(
        #[builder(start_fn)] base_url: Url,
        #[builder(default)] http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url,
            http_client,
        }
    }

    #[builder(finish_fn = send)]
    pub async fn request<T: DeserializeOwned>(
        &self,
        #[builder(start_fn)] path: impl IntoIterator<Item = &str>,
        #[builder(default = Method::GET)] method: Method,
        query: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
        access_token: Option<AccessToken>,
    ) -> Result<T> {
        let url = {
            let mut url = self.base_url.clone();
            url.path_segments_mut().expect("valid base url").extend(path);
            url
        };

        let mut request_builder = self.http_client.request(method, url);
        if let Some(access_token) = access_token {
            request_builder = request_builder.bearer_auth(access_token.as_str());
        }
        if let Some(query) = query {
            request_builder = request_builder.query(query);
        }
        if let Some(body) = body {
            request_builder = request_builder.json(body);
        }

        let request = request_builder.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "executing request");
        let response = self.http_client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let data = response.bytes().await?;
        if data.is_empty() {
            // DELETE endpoints answer 204 with no body; let `()` deserialize
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_slice(&data)?)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> Error {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {body}")
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => Error::authorization(message),
        StatusCode::FORBIDDEN => Error::authorization_with_hint(
            message,
            "the granted scopes may not permit this operation",
        ),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST => Error::Validation(message),
        _ => Error::Remote {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> GenericClient {
        GenericClient::builder(Url::parse(&server.uri()).unwrap()).build()
    }

    #[tokio::test]
    async fn missing_resource_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Requested entity was not found."}
            })))
            .mount(&server)
            .await;

        let result: Result<serde_json::Value> = client(&server)
            .await
            .request(["users", "me", "messages", "nope"])
            .send()
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Requested entity was not found.");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"code": 401, "message": "Invalid Credentials"}
            })))
            .mount(&server)
            .await;

        let result: Result<serde_json::Value> = client(&server)
            .await
            .request(["users", "me", "labels"])
            .send()
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn empty_body_deserializes_to_unit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result: Result<()> = client(&server)
            .await
            .request(["users", "me", "messages", "abc"])
            .method(Method::DELETE)
            .send()
            .await;
        result.unwrap();
    }
}
