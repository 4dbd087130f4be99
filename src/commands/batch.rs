use crate::cli::BatchArgs;
use crate::client::GmailClient;
use crate::error::Result;
use crate::model::{MessageId, system_labels};
use serde_json::{Value, json};
use tokio_stream::StreamExt;

pub async fn archive(client: &GmailClient, args: BatchArgs) -> Result<Value> {
    apply(client, args, "archived", async |client, id| {
        client
            .modify_message(id, &[], &[system_labels::INBOX])
            .await?;
        Ok(())
    })
    .await
}

pub async fn trash(client: &GmailClient, args: BatchArgs) -> Result<Value> {
    apply(client, args, "trashed", async |client, id| {
        client.trash_message(id).await?;
        Ok(())
    })
    .await
}

pub async fn mark_read(client: &GmailClient, args: BatchArgs) -> Result<Value> {
    apply(client, args, "marked_read", async |client, id| {
        client
            .modify_message(id, &[], &[system_labels::UNREAD])
            .await?;
        Ok(())
    })
    .await
}

/// Resolves the query to a set of message ids, then applies `op` to each
/// one in turn. A failure on one message is logged and counted but does
/// not stop the rest of the batch.
async fn apply<F>(client: &GmailClient, args: BatchArgs, verb: &str, op: F) -> Result<Value>
where
    F: AsyncFn(&GmailClient, &MessageId) -> Result<()>,
{
    let mut stream = client.list_messages(Some(args.query), args.limit);
    let mut ids = Vec::new();
    while let Some(msg) = stream.next().await.transpose()? {
        ids.push(msg.id);
    }

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for id in &ids {
        match op(client, id).await {
            Ok(()) => succeeded += 1,
            Err(err) => {
                failed += 1;
                tracing::warn!(%id, %err, "batch operation failed for message");
            }
        }
    }
    Ok(json!({"status": verb, "count": succeeded, "failed": failed}))
}
