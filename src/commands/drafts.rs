use super::header_value;
use crate::cli::{DraftArgs, DraftRefArgs, ListDraftsArgs, SendArgs};
use crate::client::{GmailClient, MessageFormat, REPLY_HEADERS};
use crate::error::{Error, Result};
use crate::mime::OutgoingMessage;
use crate::model::{DraftId, MessageId, ThreadId};
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio_stream::StreamExt;

pub async fn draft(client: &GmailClient, args: DraftArgs) -> Result<Value> {
    let composition = compose(
        client,
        Compose {
            to: args.to,
            cc: args.cc,
            bcc: args.bcc,
            subject: args.subject,
            body: args.body,
            html: args.html,
            attachments: args.attachments,
            reply_to: args.reply_to,
        },
    )
    .await?;

    let created = client
        .create_draft(composition.raw, composition.thread_id.as_ref())
        .await?;
    Ok(json!({
        "status": "created",
        "draft_id": created.id,
        "message_id": created.message.id,
        "thread_id": created.message.thread_id,
    }))
}

pub async fn send(client: &GmailClient, args: SendArgs) -> Result<Value> {
    let composing = args.to.is_some()
        || args.cc.is_some()
        || args.bcc.is_some()
        || args.subject.is_some()
        || args.body.is_some()
        || args.html
        || !args.attachments.is_empty();

    let sent = match args.draft_id {
        Some(_) if composing => {
            return Err(Error::Validation(
                "--draft-id cannot be combined with composition flags".into(),
            ));
        }
        Some(draft_id) => client.send_draft(&DraftId::from(draft_id)).await?,
        None if args.to.is_some() && args.subject.is_some() && args.body.is_some() => {
            let composition = compose(
                client,
                Compose {
                    to: args.to,
                    cc: args.cc,
                    bcc: args.bcc,
                    subject: args.subject,
                    body: args.body.unwrap_or_default(),
                    html: args.html,
                    attachments: args.attachments,
                    reply_to: None,
                },
            )
            .await?;
            client.send_message(composition.raw, None).await?
        }
        None => {
            return Err(Error::Validation(
                "provide --draft-id, or all of --to, --subject and --body".into(),
            ));
        }
    };

    Ok(json!({
        "status": "sent",
        "message_id": sent.id,
        "thread_id": sent.thread_id,
        "label_ids": sent.label_ids,
    }))
}

pub async fn list(client: &GmailClient, args: ListDraftsArgs) -> Result<Value> {
    let mut stream = client.list_drafts(args.query, args.limit);
    let mut drafts = Vec::new();
    while let Some(entry) = stream.next().await.transpose()? {
        let draft = client.get_draft(&entry.id).await?;
        let headers = draft
            .message
            .payload
            .as_ref()
            .map(|p| p.headers.as_slice())
            .unwrap_or_default();
        drafts.push(json!({
            "draft_id": draft.id,
            "message_id": draft.message.id,
            "to": header_value(headers, "To").unwrap_or_default(),
            "subject": header_value(headers, "Subject").unwrap_or_default(),
            "snippet": draft.message.snippet,
        }));
    }
    Ok(json!({"drafts": drafts, "count": drafts.len()}))
}

pub async fn delete(client: &GmailClient, args: DraftRefArgs) -> Result<Value> {
    let id = DraftId::from(args.draft_id);
    client.delete_draft(&id).await?;
    Ok(json!({"status": "deleted", "draft_id": id}))
}

struct Compose {
    to: Option<String>,
    cc: Option<String>,
    bcc: Option<String>,
    subject: Option<String>,
    body: String,
    html: bool,
    attachments: Vec<PathBuf>,
    reply_to: Option<String>,
}

struct Composition {
    raw: String,
    thread_id: Option<ThreadId>,
}

/// Assembles the raw message, resolving `--reply-to` first so the reply
/// inherits recipient, subject and thread from the original.
async fn compose(client: &GmailClient, args: Compose) -> Result<Composition> {
    let mut to = args.to;
    let mut subject = args.subject;
    let mut in_reply_to = None;
    let mut thread_id = None;

    if let Some(reply_to) = args.reply_to {
        let original = client
            .get_message(
                &MessageId::from(reply_to),
                MessageFormat::Metadata(REPLY_HEADERS),
            )
            .await?;
        let headers = original
            .payload
            .as_ref()
            .map(|p| p.headers.as_slice())
            .unwrap_or_default();

        thread_id = Some(original.thread_id.clone());
        if to.is_none() {
            to = header_value(headers, "From").map(str::to_owned);
        }
        if subject.is_none() {
            let original_subject = header_value(headers, "Subject").unwrap_or_default();
            subject = Some(reply_subject(original_subject));
        }
        in_reply_to = header_value(headers, "Message-ID").map(str::to_owned);
    }

    let to = to.ok_or_else(|| {
        Error::Validation("--to is required unless --reply-to is given".into())
    })?;
    let subject = subject.ok_or_else(|| {
        Error::Validation("--subject is required unless --reply-to is given".into())
    })?;

    let message = OutgoingMessage {
        to,
        cc: args.cc,
        bcc: args.bcc,
        subject,
        body: args.body,
        html: args.html,
        attachments: args.attachments,
        in_reply_to,
    };
    Ok(Composition {
        raw: message.encode()?,
        thread_id,
    })
}

fn reply_subject(original: &str) -> String {
    if original.to_ascii_lowercase().starts_with("re:") {
        original.to_owned()
    } else {
        format!("Re: {original}")
    }
}

#[cfg(test)]
mod tests {
    use super::reply_subject;

    #[test]
    fn reply_subject_gains_prefix_once() {
        assert_eq!(reply_subject("Quarterly report"), "Re: Quarterly report");
        assert_eq!(reply_subject("Re: Quarterly report"), "Re: Quarterly report");
        assert_eq!(reply_subject("RE: shouting"), "RE: shouting");
        assert_eq!(reply_subject(""), "Re: ");
    }
}
