use crate::cli::{CreateLabelArgs, IdArgs};
use crate::client::GmailClient;
use crate::error::Result;
use crate::model::LabelId;
use serde_json::{Value, json};

pub async fn list(client: &GmailClient) -> Result<Value> {
    let list = client.list_labels().await?;
    let labels: Vec<Value> = list
        .labels
        .iter()
        .map(|label| {
            json!({
                "id": label.id,
                "name": label.name,
                "type": label.r#type,
            })
        })
        .collect();
    Ok(json!({"labels": labels, "count": labels.len()}))
}

pub async fn create(client: &GmailClient, args: CreateLabelArgs) -> Result<Value> {
    let label = client.create_label(&args.name).await?;
    Ok(json!({"status": "created", "id": label.id, "name": label.name}))
}

pub async fn delete(client: &GmailClient, args: IdArgs) -> Result<Value> {
    let id = LabelId::from(args.id);
    client.delete_label(&id).await?;
    Ok(json!({"status": "deleted", "id": id}))
}
