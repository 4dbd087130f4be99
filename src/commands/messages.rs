use super::summarize;
use crate::cli::{MessageArgs, ModifyLabelsArgs, ReadArgs};
use crate::client::{GmailClient, MessageFormat, SUMMARY_HEADERS};
use crate::error::{Error, Result};
use crate::model::{MessageId, system_labels};
use serde_json::{Value, json};
use tokio_stream::StreamExt;

pub async fn read(client: &GmailClient, args: ReadArgs) -> Result<Value> {
    let format = if args.full {
        MessageFormat::Full
    } else {
        MessageFormat::Metadata(SUMMARY_HEADERS)
    };

    let mut stream = client.list_messages(args.query, args.limit);
    let mut summaries = Vec::new();
    while let Some(msg) = stream.next().await.transpose()? {
        let message = client.get_message(&msg.id, format).await?;
        summaries.push(summarize(&message, args.full));
    }
    Ok(json!({"messages": summaries, "count": summaries.len()}))
}

pub async fn get(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    let message = client.get_message(&id, MessageFormat::Full).await?;
    Ok(serde_json::to_value(summarize(&message, true))?)
}

pub async fn archive(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client
        .modify_message(&id, &[], &[system_labels::INBOX])
        .await?;
    Ok(json!({"status": "archived", "id": id}))
}

pub async fn trash(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client.trash_message(&id).await?;
    Ok(json!({"status": "trashed", "id": id}))
}

pub async fn untrash(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client.untrash_message(&id).await?;
    Ok(json!({"status": "untrashed", "id": id}))
}

pub async fn delete(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    match client.delete_message(&id).await {
        Ok(()) => Ok(json!({"status": "deleted", "id": id})),
        Err(Error::Authorization { message, .. }) => Err(Error::authorization_with_hint(
            message,
            "permanent deletion requires the full mailbox scope; use `trash` instead",
        )),
        Err(err) => Err(err),
    }
}

pub async fn mark_read(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client
        .modify_message(&id, &[], &[system_labels::UNREAD])
        .await?;
    Ok(json!({"status": "marked_read", "id": id}))
}

pub async fn mark_unread(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client
        .modify_message(&id, &[system_labels::UNREAD], &[])
        .await?;
    Ok(json!({"status": "marked_unread", "id": id}))
}

pub async fn star(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client
        .modify_message(&id, &[system_labels::STARRED], &[])
        .await?;
    Ok(json!({"status": "starred", "id": id}))
}

pub async fn unstar(client: &GmailClient, args: MessageArgs) -> Result<Value> {
    let id = MessageId::from(args.id);
    client
        .modify_message(&id, &[], &[system_labels::STARRED])
        .await?;
    Ok(json!({"status": "unstarred", "id": id}))
}

pub async fn modify_labels(client: &GmailClient, args: ModifyLabelsArgs) -> Result<Value> {
    if args.add.is_empty() && args.remove.is_empty() {
        return Err(Error::Validation(
            "at least one of --add or --remove is required".into(),
        ));
    }
    let id = MessageId::from(args.id);
    let add: Vec<&str> = args.add.iter().map(String::as_str).collect();
    let remove: Vec<&str> = args.remove.iter().map(String::as_str).collect();
    let modified = client.modify_message(&id, &add, &remove).await?;
    Ok(json!({"status": "modified", "id": id, "labelIds": modified.label_ids}))
}
