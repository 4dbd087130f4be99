use crate::cli::{CreateFilterArgs, IdArgs};
use crate::client::GmailClient;
use crate::error::{Error, Result};
use crate::model::{FilterAction, FilterCriteria, FilterId, system_labels};
use serde_json::{Value, json};

pub async fn list(client: &GmailClient) -> Result<Value> {
    let list = client.list_filters().await?;
    let filters = serde_json::to_value(&list.filters)?;
    Ok(json!({"filters": filters, "count": list.filters.len()}))
}

pub async fn get(client: &GmailClient, args: IdArgs) -> Result<Value> {
    let filter = client.get_filter(&FilterId::from(args.id)).await?;
    Ok(serde_json::to_value(&filter)?)
}

pub async fn create(client: &GmailClient, args: CreateFilterArgs) -> Result<Value> {
    let (criteria, action) = assemble(args);
    if criteria.is_empty() {
        return Err(Error::Validation(
            "at least one matching criterion is required (--from, --to, --subject, --query or --has-attachment)".into(),
        ));
    }
    if action.is_empty() {
        return Err(Error::Validation(
            "at least one action is required (--add-label, --remove-label, --archive, --mark-read, --star or --forward)".into(),
        ));
    }

    let filter = client.create_filter(&criteria, &action).await?;
    Ok(json!({
        "status": "created",
        "id": filter.id,
        "criteria": filter.criteria,
        "action": filter.action,
    }))
}

pub async fn delete(client: &GmailClient, args: IdArgs) -> Result<Value> {
    let id = FilterId::from(args.id);
    client.delete_filter(&id).await?;
    Ok(json!({"status": "deleted", "id": id}))
}

fn assemble(args: CreateFilterArgs) -> (FilterCriteria, FilterAction) {
    let criteria = FilterCriteria {
        from: args.from,
        to: args.to,
        subject: args.subject,
        query: args.query,
        has_attachment: args.has_attachment.then_some(true),
    };

    let mut add_label_ids = args.add_labels;
    if args.star {
        add_label_ids.push(system_labels::STARRED.to_owned());
    }
    let mut remove_label_ids = args.remove_labels;
    if args.archive {
        remove_label_ids.push(system_labels::INBOX.to_owned());
    }
    if args.mark_read {
        remove_label_ids.push(system_labels::UNREAD.to_owned());
    }
    let action = FilterAction {
        add_label_ids,
        remove_label_ids,
        forward: args.forward,
    };
    (criteria, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CreateFilterArgs {
        CreateFilterArgs {
            from: None,
            to: None,
            subject: None,
            query: None,
            has_attachment: false,
            add_labels: Vec::new(),
            remove_labels: Vec::new(),
            archive: false,
            mark_read: false,
            star: false,
            forward: None,
        }
    }

    #[test]
    fn shorthand_flags_map_to_system_labels() {
        let mut flags = args();
        flags.from = Some("news@example.com".into());
        flags.archive = true;
        flags.mark_read = true;
        flags.star = true;
        let (criteria, action) = assemble(flags);
        assert!(!criteria.is_empty());
        assert_eq!(action.add_label_ids, vec!["STARRED"]);
        assert_eq!(action.remove_label_ids, vec!["INBOX", "UNREAD"]);
    }

    #[test]
    fn unset_has_attachment_stays_absent() {
        let mut flags = args();
        flags.query = Some("larger:10M".into());
        flags.archive = true;
        let (criteria, _) = assemble(flags);
        assert_eq!(criteria.has_attachment, None);
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(json, serde_json::json!({"query": "larger:10M"}));
    }

    #[test]
    fn empty_criteria_and_action_are_detected() {
        let (criteria, action) = assemble(args());
        assert!(criteria.is_empty());
        assert!(action.is_empty());
    }
}
