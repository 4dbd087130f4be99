use crate::{
    error::Result,
    http::GenericClient,
    model::{
        Attachment, AttachmentId, Draft, DraftId, Filter, FilterAction, FilterCriteria, FilterId,
        FilterList, Label, LabelId, LabelList, Message, MessageId, MinimalDraft, MinimalMessage,
        ModifiedMessage, PageToken, SentMessage, Thread, ThreadId,
    },
    oauth::{AccessToken, TokenManager},
};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tokio::sync::{Mutex, mpsc};
use tokio_stream::{Stream, wrappers::ReceiverStream};

static BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://gmail.googleapis.com/gmail/v1").expect("valid url"));

/// Upper bound per list page; consumers stop the stream once they have
/// taken their limit.
const LIST_PAGE_SIZE: usize = 100;

/// Headers fetched for message summaries.
pub const SUMMARY_HEADERS: &[&str] = &["From", "To", "Subject", "Date"];
/// Headers fetched when resolving a message being replied to.
pub const REPLY_HEADERS: &[&str] = &["From", "Subject", "Message-ID"];

#[derive(Clone, Copy)]
pub enum MessageFormat {
    Full,
    Metadata(&'static [&'static str]),
}

impl MessageFormat {
    fn query(self) -> Vec<(&'static str, &'static str)> {
        match self {
            MessageFormat::Full => vec![("format", "full")],
            MessageFormat::Metadata(headers) => {
                let mut query = vec![("format", "metadata")];
                query.extend(headers.iter().map(|h| ("metadataHeaders", *h)));
                query
            }
        }
    }
}

#[derive(Clone)]
pub struct GmailClient {
    inner: Arc<GmailClientInner>,
}

struct GmailClientInner {
    http_client: GenericClient,
    token_manager: Mutex<TokenManager>,
}

impl GmailClient {
    pub fn new(token_manager: TokenManager) -> Self {
        Self::with_base_url(token_manager, BASE_URL.clone())
    }

    /// Mainly for tests, which point the client at a local mock server.
    pub fn with_base_url(token_manager: TokenManager, base_url: Url) -> Self {
        Self {
            inner: Arc::new(GmailClientInner {
                http_client: GenericClient::builder(base_url).build(),
                token_manager: Mutex::new(token_manager),
            }),
        }
    }

    async fn access_token(&self) -> Result<AccessToken> {
        let mut guard = self.inner.token_manager.lock().await;
        guard.ensure_valid_token().await
    }

    pub fn list_messages(
        &self,
        query: Option<String>,
        limit: usize,
    ) -> impl Stream<Item = Result<MinimalMessage>> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MessagesPage {
            // absent entirely when nothing matches
            #[serde(default)]
            messages: Vec<MinimalMessage>,
            next_page_token: Option<PageToken>,
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(self.clone().result_wrapper(tx, move |this, tx| async move {
            let mut remaining = limit;
            let mut page_token: Option<PageToken> = None;
            while remaining > 0 {
                let page_size = remaining.min(LIST_PAGE_SIZE).to_string();
                let mut params: Vec<(&str, &str)> = vec![("maxResults", page_size.as_str())];
                if let Some(q) = query.as_deref() {
                    params.push(("q", q));
                }
                if let Some(token) = page_token.as_ref() {
                    params.push(("pageToken", token.as_str()));
                }

                let page: MessagesPage = this
                    .inner
                    .http_client
                    .request(["users", "me", "messages"])
                    .access_token(this.access_token().await?)
                    .query(params.as_slice())
                    .send()
                    .await?;

                for msg in page.messages {
                    if remaining == 0 {
                        return Ok(());
                    }
                    remaining -= 1;
                    if tx.send(Ok(msg)).await.is_err() {
                        return Ok(());
                    }
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => return Ok(()),
                }
            }
            Ok(())
        }));
        ReceiverStream::new(rx)
    }

    pub async fn get_message(&self, id: &MessageId, format: MessageFormat) -> Result<Message> {
        let query = format.query();
        self.inner
            .http_client
            .request(["users", "me", "messages", id.as_str()])
            .access_token(self.access_token().await?)
            .query(query.as_slice())
            .send()
            .await
    }

    pub async fn modify_message(
        &self,
        id: &MessageId,
        add: &[&str],
        remove: &[&str],
    ) -> Result<ModifiedMessage> {
        let body = label_changes(add, remove);
        self.inner
            .http_client
            .request(["users", "me", "messages", id.as_str(), "modify"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub async fn trash_message(&self, id: &MessageId) -> Result<ModifiedMessage> {
        self.message_state_change(id, "trash").await
    }

    pub async fn untrash_message(&self, id: &MessageId) -> Result<ModifiedMessage> {
        self.message_state_change(id, "untrash").await
    }

    async fn message_state_change(&self, id: &MessageId, verb: &str) -> Result<ModifiedMessage> {
        self.inner
            .http_client
            .request(["users", "me", "messages", id.as_str(), verb])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn delete_message(&self, id: &MessageId) -> Result<()> {
        self.inner
            .http_client
            .request(["users", "me", "messages", id.as_str()])
            .method(Method::DELETE)
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn send_message(
        &self,
        raw: String,
        thread_id: Option<&ThreadId>,
    ) -> Result<SentMessage> {
        let mut body = json!({ "raw": raw });
        if let Some(thread_id) = thread_id {
            body["threadId"] = json!(thread_id);
        }
        self.inner
            .http_client
            .request(["users", "me", "messages", "send"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub fn list_drafts(
        &self,
        query: Option<String>,
        limit: usize,
    ) -> impl Stream<Item = Result<MinimalDraft>> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DraftsPage {
            #[serde(default)]
            drafts: Vec<MinimalDraft>,
            next_page_token: Option<PageToken>,
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(self.clone().result_wrapper(tx, move |this, tx| async move {
            let mut remaining = limit;
            let mut page_token: Option<PageToken> = None;
            while remaining > 0 {
                let page_size = remaining.min(LIST_PAGE_SIZE).to_string();
                let mut params: Vec<(&str, &str)> = vec![("maxResults", page_size.as_str())];
                if let Some(q) = query.as_deref() {
                    params.push(("q", q));
                }
                if let Some(token) = page_token.as_ref() {
                    params.push(("pageToken", token.as_str()));
                }

                let page: DraftsPage = this
                    .inner
                    .http_client
                    .request(["users", "me", "drafts"])
                    .access_token(this.access_token().await?)
                    .query(params.as_slice())
                    .send()
                    .await?;

                for draft in page.drafts {
                    if remaining == 0 {
                        return Ok(());
                    }
                    remaining -= 1;
                    if tx.send(Ok(draft)).await.is_err() {
                        return Ok(());
                    }
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => return Ok(()),
                }
            }
            Ok(())
        }));
        ReceiverStream::new(rx)
    }

    pub async fn get_draft(&self, id: &DraftId) -> Result<Draft> {
        self.inner
            .http_client
            .request(["users", "me", "drafts", id.as_str()])
            .access_token(self.access_token().await?)
            .query(&[("format", "metadata")])
            .send()
            .await
    }

    pub async fn create_draft(
        &self,
        raw: String,
        thread_id: Option<&ThreadId>,
    ) -> Result<Draft> {
        let mut message = json!({ "raw": raw });
        if let Some(thread_id) = thread_id {
            message["threadId"] = json!(thread_id);
        }
        let body = json!({ "message": message });
        self.inner
            .http_client
            .request(["users", "me", "drafts"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub async fn send_draft(&self, id: &DraftId) -> Result<SentMessage> {
        let body = json!({ "id": id });
        self.inner
            .http_client
            .request(["users", "me", "drafts", "send"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub async fn delete_draft(&self, id: &DraftId) -> Result<()> {
        self.inner
            .http_client
            .request(["users", "me", "drafts", id.as_str()])
            .method(Method::DELETE)
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn list_labels(&self) -> Result<LabelList> {
        self.inner
            .http_client
            .request(["users", "me", "labels"])
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn create_label(&self, name: &str) -> Result<Label> {
        let body = json!({
            "name": name,
            "labelListVisibility": "labelShow",
            "messageListVisibility": "show",
        });
        self.inner
            .http_client
            .request(["users", "me", "labels"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub async fn delete_label(&self, id: &LabelId) -> Result<()> {
        self.inner
            .http_client
            .request(["users", "me", "labels", id.as_str()])
            .method(Method::DELETE)
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn get_thread(&self, id: &ThreadId, format: MessageFormat) -> Result<Thread> {
        let query = format.query();
        self.inner
            .http_client
            .request(["users", "me", "threads", id.as_str()])
            .access_token(self.access_token().await?)
            .query(query.as_slice())
            .send()
            .await
    }

    pub async fn modify_thread(
        &self,
        id: &ThreadId,
        add: &[&str],
        remove: &[&str],
    ) -> Result<Thread> {
        let body = label_changes(add, remove);
        self.inner
            .http_client
            .request(["users", "me", "threads", id.as_str(), "modify"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub async fn trash_thread(&self, id: &ThreadId) -> Result<Thread> {
        self.inner
            .http_client
            .request(["users", "me", "threads", id.as_str(), "trash"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn list_filters(&self) -> Result<FilterList> {
        self.inner
            .http_client
            .request(["users", "me", "settings", "filters"])
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn get_filter(&self, id: &FilterId) -> Result<Filter> {
        self.inner
            .http_client
            .request(["users", "me", "settings", "filters", id.as_str()])
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn create_filter(
        &self,
        criteria: &FilterCriteria,
        action: &FilterAction,
    ) -> Result<Filter> {
        let body = json!({ "criteria": criteria, "action": action });
        self.inner
            .http_client
            .request(["users", "me", "settings", "filters"])
            .method(Method::POST)
            .access_token(self.access_token().await?)
            .body(&body)
            .send()
            .await
    }

    pub async fn delete_filter(&self, id: &FilterId) -> Result<()> {
        self.inner
            .http_client
            .request(["users", "me", "settings", "filters", id.as_str()])
            .method(Method::DELETE)
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    pub async fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &AttachmentId,
    ) -> Result<Attachment> {
        self.inner
            .http_client
            .request([
                "users",
                "me",
                "messages",
                message_id.as_str(),
                "attachments",
                attachment_id.as_str(),
            ])
            .access_token(self.access_token().await?)
            .send()
            .await
    }

    async fn result_wrapper<T, F>(
        self,
        tx: mpsc::Sender<Result<T>>,
        maker: impl FnOnce(Self, mpsc::Sender<Result<T>>) -> F,
    ) where
        F: Future<Output = Result<()>>,
    {
        if let Err(err) = maker(self, tx.clone()).await {
            let _ = tx.send(Err(err)).await;
        }
    }
}

fn label_changes(add: &[&str], remove: &[&str]) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if !add.is_empty() {
        body.insert("addLabelIds".into(), json!(add));
    }
    if !remove.is_empty() {
        body.insert("removeLabelIds".into(), json!(remove));
    }
    serde_json::Value::Object(body)
}
