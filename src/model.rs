use crate::macros::{impl_id, impl_str_wrapper};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

impl_str_wrapper!(PageToken);
impl_id!(MessageId, ThreadId, LabelId, DraftId, FilterId, AttachmentId);

/// Label ids Gmail reserves for mailbox state.
pub mod system_labels {
    pub const INBOX: &str = "INBOX";
    pub const UNREAD: &str = "UNREAD";
    pub const STARRED: &str = "STARRED";
}

#[derive(Debug, Deserialize)]
pub struct PageToken(String);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessageId(Arc<str>);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ThreadId(Arc<str>);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LabelId(String);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DraftId(String);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilterId(String);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AttachmentId(String);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
}

/// A message as returned by `messages.get`. Which fields are populated
/// depends on the requested format; `metadata` omits part bodies.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    #[serde(default)]
    pub label_ids: Vec<LabelId>,
    #[serde(default)]
    pub snippet: String,
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub mime_type: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
    #[serde(default)]
    pub size: usize,
    pub attachment_id: Option<AttachmentId>,
    #[serde(default, deserialize_with = "deserialize_optional_base64")]
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Result of `messages.send` and `drafts.send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: MessageId,
    pub thread_id: Option<ThreadId>,
    #[serde(default)]
    pub label_ids: Vec<LabelId>,
}

/// Result of `messages.modify`, `messages.trash` and `messages.untrash`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedMessage {
    pub id: MessageId,
    #[serde(default)]
    pub label_ids: Vec<LabelId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalDraft {
    pub id: DraftId,
    pub message: MinimalMessage,
}

#[derive(Debug, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub message: Message,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub message_list_visibility: Option<MessageListVisibility>,
    pub label_list_visibility: Option<LabelListVisibility>,
    pub r#type: Option<LabelType>,
}

#[derive(Debug, Deserialize)]
pub struct LabelList {
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum MessageListVisibility {
    Show,
    Hide,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum LabelListVisibility {
    #[serde(rename = "labelShow")]
    Show,
    #[serde(rename = "labelShowIfUnread")]
    ShowIfUnread,
    #[serde(rename = "labelHide")]
    Hide,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum LabelType {
    System,
    User,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Filter {
    pub id: FilterId,
    #[serde(default)]
    pub criteria: FilterCriteria,
    #[serde(default)]
    pub action: FilterAction,
}

/// The list endpoint nests filters under a singular `filter` key.
#[derive(Debug, Deserialize)]
pub struct FilterList {
    #[serde(default, rename = "filter")]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.subject.is_none()
            && self.query.is_none()
            && self.has_attachment.is_none()
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterAction {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_label_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
}

impl FilterAction {
    pub fn is_empty(&self) -> bool {
        self.add_label_ids.is_empty() && self.remove_label_ids.is_empty() && self.forward.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub size: usize,
    #[serde(deserialize_with = "deserialize_base64")]
    pub data: Vec<u8>,
}

fn deserialize_optional_base64<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    use base64::{Engine as _, engine::general_purpose::URL_SAFE};
    let Some(s) = <Option<String>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let data = URL_SAFE.decode(s).map_err(serde::de::Error::custom)?;
    Ok(Some(data))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    use base64::{Engine as _, engine::general_purpose::URL_SAFE};
    let s = String::deserialize(deserializer)?;
    let data = URL_SAFE.decode(s).map_err(serde::de::Error::custom)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_part_body_decodes_base64url() {
        let body: MessagePartBody =
            serde_json::from_str(r#"{"size": 5, "data": "aGVsbG8="}"#).unwrap();
        assert_eq!(body.data.as_deref(), Some(b"hello".as_slice()));
    }

    // from_value yields owned strings, not borrowed slices
    #[test]
    fn message_part_body_decodes_from_owned_json() {
        let body: MessagePartBody =
            serde_json::from_value(serde_json::json!({"size": 3, "data": "dG9w"})).unwrap();
        assert_eq!(body.data.as_deref(), Some(b"top".as_slice()));

        let attachment: Attachment =
            serde_json::from_value(serde_json::json!({"size": 3, "data": "dG9w"})).unwrap();
        assert_eq!(attachment.data, b"top");
    }

    #[test]
    fn filter_list_uses_singular_key() {
        let list: FilterList = serde_json::from_value(serde_json::json!({
            "filter": [{"id": "f1", "criteria": {"from": "x@y.com"}, "action": {"addLabelIds": ["L1"]}}]
        }))
        .unwrap();
        assert_eq!(list.filters.len(), 1);
        assert_eq!(list.filters[0].criteria.from.as_deref(), Some("x@y.com"));
    }

    #[test]
    fn filter_action_serializes_without_empty_fields() {
        let action = FilterAction {
            add_label_ids: vec!["STARRED".into()],
            ..Default::default()
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json, serde_json::json!({"addLabelIds": ["STARRED"]}));
    }
}
