use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use gmail_cli::cli::{BatchArgs, DraftArgs, MessageArgs, SendArgs};
use gmail_cli::client::GmailClient;
use gmail_cli::commands::{batch, drafts, messages};
use gmail_cli::error::ErrorKind;
use gmail_cli::oauth::{ClientCredentials, OAuthTokens, TokenManager, client::OAuthClient};
use gmail_cli::store::TokenStore;
use reqwest::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, dir: &tempfile::TempDir) -> GmailClient {
    let creds = ClientCredentials {
        id: String::from("client-id").into(),
        secret: String::from("client-secret").into(),
    };
    let tokens = OAuthTokens {
        access_token: String::from("at-1").into(),
        refresh_token: String::from("rt-1").into(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        scopes: Vec::new(),
    };
    let manager = TokenManager::new(
        OAuthClient::new(creds, tokens),
        TokenStore::new(dir.path().join("token.json")),
    );
    GmailClient::with_base_url(manager, Url::parse(&server.uri()).unwrap())
}

fn send_args() -> SendArgs {
    SendArgs {
        draft_id: None,
        to: Some("bob@example.com".into()),
        cc: None,
        bcc: None,
        subject: Some("Hello".into()),
        body: Some("hi there".into()),
        html: false,
        attachments: Vec::new(),
    }
}

#[tokio::test]
async fn send_composes_and_reports_the_sent_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "m-sent",
            "threadId": "t-sent",
            "labelIds": ["SENT"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = drafts::send(&client(&server, &dir), send_args())
        .await
        .unwrap();

    assert_eq!(output["status"], "sent");
    assert_eq!(output["message_id"], "m-sent");
    assert_eq!(output["thread_id"], "t-sent");
    assert_eq!(output["label_ids"], serde_json::json!(["SENT"]));

    // the raw payload reached the API as base64url
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let raw = general_purpose::URL_SAFE
        .decode(body["raw"].as_str().unwrap())
        .unwrap();
    let rendered = String::from_utf8(raw).unwrap();
    assert!(rendered.contains("To: bob@example.com\r\n"));
    assert!(rendered.contains("Subject: Hello\r\n"));
}

#[tokio::test]
async fn send_without_draft_or_composition_is_a_validation_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut args = send_args();
    args.body = None;
    let err = drafts::send(&client(&server, &dir), args).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn send_rejects_draft_id_combined_with_composition_flags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/me/drafts/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "m-sent",
            "threadId": "t-sent",
        })))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut args = send_args();
    args.draft_id = Some("d-9".into());
    let err = drafts::send(&client(&server, &dir), args).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn draft_reply_inherits_subject_recipient_and_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/m-orig"))
        .and(query_param("format", "metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "m-orig",
            "threadId": "t-9",
            "payload": {
                "headers": [
                    {"name": "From", "value": "alice@example.com"},
                    {"name": "Subject", "value": "Quarterly report"},
                    {"name": "Message-ID", "value": "<orig@mail.example.com>"},
                ]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/me/drafts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "d-1",
            "message": {"id": "m-draft", "threadId": "t-9"},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = DraftArgs {
        to: None,
        cc: None,
        bcc: None,
        subject: None,
        body: "thanks, looks good".into(),
        html: false,
        reply_to: Some("m-orig".into()),
        attachments: Vec::new(),
    };
    let output = drafts::draft(&client(&server, &dir), args).await.unwrap();

    assert_eq!(output["status"], "created");
    assert_eq!(output["draft_id"], "d-1");
    assert_eq!(output["thread_id"], "t-9");

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.url.path() == "/users/me/drafts")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
    assert_eq!(body["message"]["threadId"], "t-9");

    let raw = general_purpose::URL_SAFE
        .decode(body["message"]["raw"].as_str().unwrap())
        .unwrap();
    let rendered = String::from_utf8(raw).unwrap();
    assert!(rendered.contains("To: alice@example.com\r\n"));
    assert!(rendered.contains("Subject: Re: Quarterly report\r\n"));
    assert!(rendered.contains("In-Reply-To: <orig@mail.example.com>\r\n"));
}

#[tokio::test]
async fn missing_message_is_a_not_found_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "Requested entity was not found."}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = MessageArgs { id: "nope".into() };
    let err = messages::get(&client(&server, &dir), args)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn batch_with_no_matches_reports_zero_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultSizeEstimate": 0,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = BatchArgs {
        query: "from:nobody@example.com".into(),
        limit: 50,
    };
    let output = batch::archive(&client(&server, &dir), args).await.unwrap();
    assert_eq!(output["status"], "archived");
    assert_eq!(output["count"], 0);
    assert_eq!(output["failed"], 0);
}

#[tokio::test]
async fn batch_continues_past_a_failing_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [
                {"id": "m-1", "threadId": "t-1"},
                {"id": "m-2", "threadId": "t-2"},
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/m-1/modify"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "Requested entity was not found."}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/m-2/modify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "m-2",
            "labelIds": ["UNREAD"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = BatchArgs {
        query: "older_than:1y".into(),
        limit: 50,
    };
    let output = batch::archive(&client(&server, &dir), args).await.unwrap();
    assert_eq!(output["count"], 1);
    assert_eq!(output["failed"], 1);
}

#[tokio::test]
async fn star_is_idempotent_from_the_caller_side() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/m-1/modify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "m-1",
            "labelIds": ["STARRED", "INBOX"],
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, &dir);
    for _ in 0..2 {
        let args = MessageArgs { id: "m-1".into() };
        let output = messages::star(&client, args).await.unwrap();
        assert_eq!(output["status"], "starred");
        assert_eq!(output["id"], "m-1");
    }
}
