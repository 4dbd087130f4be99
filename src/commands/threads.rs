use super::summarize;
use crate::cli::{GetThreadArgs, IdArgs};
use crate::client::{GmailClient, MessageFormat, SUMMARY_HEADERS};
use crate::error::Result;
use crate::model::{ThreadId, system_labels};
use serde_json::{Value, json};

pub async fn get(client: &GmailClient, args: GetThreadArgs) -> Result<Value> {
    let id = ThreadId::from(args.id);
    let format = if args.full {
        MessageFormat::Full
    } else {
        MessageFormat::Metadata(SUMMARY_HEADERS)
    };
    let thread = client.get_thread(&id, format).await?;
    let messages: Vec<_> = thread
        .messages
        .iter()
        .map(|msg| summarize(msg, args.full))
        .collect();
    Ok(json!({"thread_id": thread.id, "messages": messages, "count": messages.len()}))
}

pub async fn archive(client: &GmailClient, args: IdArgs) -> Result<Value> {
    let id = ThreadId::from(args.id);
    client
        .modify_thread(&id, &[], &[system_labels::INBOX])
        .await?;
    Ok(json!({"status": "archived", "thread_id": id}))
}

pub async fn trash(client: &GmailClient, args: IdArgs) -> Result<Value> {
    let id = ThreadId::from(args.id);
    client.trash_thread(&id).await?;
    Ok(json!({"status": "trashed", "thread_id": id}))
}
