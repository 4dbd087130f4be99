use super::attachment_inventory;
use crate::cli::DownloadAttachmentArgs;
use crate::client::{GmailClient, MessageFormat};
use crate::error::Result;
use crate::model::{AttachmentId, MessageId};
use serde_json::{Value, json};
use std::path::PathBuf;

pub async fn download(client: &GmailClient, args: DownloadAttachmentArgs) -> Result<Value> {
    let message_id = MessageId::from(args.message_id);
    let attachment_id = AttachmentId::from(args.attachment_id);

    let attachment = client.get_attachment(&message_id, &attachment_id).await?;
    let path = match args.output {
        Some(path) => path,
        None => default_filename(client, &message_id, &attachment_id).await?,
    };

    std::fs::write(&path, &attachment.data)?;
    Ok(json!({
        "status": "downloaded",
        "path": std::path::absolute(&path)?,
        "size": attachment.data.len(),
    }))
}

/// Looks the attachment up in the message part tree to recover its
/// original filename.
async fn default_filename(
    client: &GmailClient,
    message_id: &MessageId,
    attachment_id: &AttachmentId,
) -> Result<PathBuf> {
    let message = client.get_message(message_id, MessageFormat::Full).await?;
    let name = message
        .payload
        .as_ref()
        .map(attachment_inventory)
        .unwrap_or_default()
        .into_iter()
        .find(|info| info.attachment_id == attachment_id.as_str())
        .map(|info| info.filename)
        .unwrap_or_else(|| "attachment".to_owned());
    Ok(PathBuf::from(name))
}
