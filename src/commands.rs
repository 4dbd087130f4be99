pub mod attachments;
pub mod batch;
pub mod drafts;
pub mod filters;
pub mod labels;
pub mod messages;
pub mod threads;

use crate::model::{Header, Message, MessagePart};
use serde::Serialize;

/// The summary shape every message-printing command emits; field names
/// mirror the wire format so ids can be pasted back into other commands.
#[derive(Debug, Serialize)]
pub struct MessageSummary {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "labelIds", skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentInfo>>,
}

#[derive(Debug, Serialize)]
pub struct AttachmentInfo {
    pub filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: usize,
    #[serde(rename = "attachmentId")]
    pub attachment_id: String,
}

pub(crate) fn summarize(message: &Message, full: bool) -> MessageSummary {
    let headers = message
        .payload
        .as_ref()
        .map(|p| p.headers.as_slice())
        .unwrap_or_default();
    let header = |name| header_value(headers, name).unwrap_or_default().to_owned();

    let mut summary = MessageSummary {
        id: message.id.as_str().to_owned(),
        thread_id: message.thread_id.as_str().to_owned(),
        from: header("From"),
        to: header("To"),
        subject: header("Subject"),
        date: header("Date"),
        snippet: message.snippet.clone(),
        body: None,
        label_ids: None,
        attachments: None,
    };

    if full {
        summary.body = Some(
            message
                .payload
                .as_ref()
                .and_then(plain_text_body)
                .unwrap_or_default(),
        );
        summary.label_ids = Some(
            message
                .label_ids
                .iter()
                .map(|l| l.as_str().to_owned())
                .collect(),
        );
        summary.attachments = Some(
            message
                .payload
                .as_ref()
                .map(attachment_inventory)
                .unwrap_or_default(),
        );
    }
    summary
}

pub(crate) fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Finds the plain-text body: the top-level body if it carries data,
/// otherwise the first text/plain leaf, recursing into nested multiparts.
pub(crate) fn plain_text_body(payload: &MessagePart) -> Option<String> {
    if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
        return Some(String::from_utf8_lossy(data).into_owned());
    }
    for part in &payload.parts {
        if part.mime_type.as_deref() == Some("text/plain") {
            if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                return Some(String::from_utf8_lossy(data).into_owned());
            }
        } else if !part.parts.is_empty() {
            if let Some(body) = plain_text_body(part) {
                return Some(body);
            }
        }
    }
    None
}

pub(crate) fn attachment_inventory(payload: &MessagePart) -> Vec<AttachmentInfo> {
    fn walk(parts: &[MessagePart], out: &mut Vec<AttachmentInfo>) {
        for part in parts {
            if !part.filename.is_empty() {
                out.push(AttachmentInfo {
                    filename: part.filename.clone(),
                    mime_type: part.mime_type.clone().unwrap_or_default(),
                    size: part.body.as_ref().map(|b| b.size).unwrap_or_default(),
                    attachment_id: part
                        .body
                        .as_ref()
                        .and_then(|b| b.attachment_id.as_ref())
                        .map(|id| id.as_str().to_owned())
                        .unwrap_or_default(),
                });
            }
            walk(&part.parts, out);
        }
    }

    let mut out = Vec::new();
    walk(&payload.parts, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(json: serde_json::Value) -> MessagePart {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = vec![Header {
            name: "Message-ID".into(),
            value: "<abc@mail>".into(),
        }];
        assert_eq!(header_value(&headers, "message-id"), Some("<abc@mail>"));
        assert_eq!(header_value(&headers, "Subject"), None);
    }

    #[test]
    fn body_prefers_top_level_data() {
        // "dG9w" == "top"
        let payload = part(serde_json::json!({
            "mimeType": "text/plain",
            "body": {"size": 3, "data": "dG9w"},
        }));
        assert_eq!(plain_text_body(&payload).as_deref(), Some("top"));
    }

    #[test]
    fn body_recurses_into_nested_multiparts() {
        // "bmVzdGVk" == "nested"
        let payload = part(serde_json::json!({
            "mimeType": "multipart/mixed",
            "body": {"size": 0},
            "parts": [
                {
                    "mimeType": "multipart/alternative",
                    "body": {"size": 0},
                    "parts": [
                        {"mimeType": "text/html", "body": {"size": 4, "data": "aHRtbA=="}},
                        {"mimeType": "text/plain", "body": {"size": 6, "data": "bmVzdGVk"}}
                    ]
                }
            ]
        }));
        assert_eq!(plain_text_body(&payload).as_deref(), Some("nested"));
    }

    #[test]
    fn inventory_collects_named_parts_at_any_depth() {
        let payload = part(serde_json::json!({
            "mimeType": "multipart/mixed",
            "body": {"size": 0},
            "parts": [
                {"mimeType": "text/plain", "body": {"size": 2, "data": "aGk="}},
                {
                    "mimeType": "application/pdf",
                    "filename": "report.pdf",
                    "body": {"size": 12345, "attachmentId": "att-1"}
                },
                {
                    "mimeType": "multipart/related",
                    "body": {"size": 0},
                    "parts": [
                        {"mimeType": "image/png", "filename": "logo.png", "body": {"size": 99, "attachmentId": "att-2"}}
                    ]
                }
            ]
        }));
        let inventory = attachment_inventory(&payload);
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].filename, "report.pdf");
        assert_eq!(inventory[0].attachment_id, "att-1");
        assert_eq!(inventory[1].filename, "logo.png");
    }
}
