use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    version,
    name = "gmail-cli",
    about = "Gmail from the command line: read, draft, send and manage mail"
)]
pub struct Cli {
    /// OAuth client secrets file downloaded from the Google Cloud Console
    #[clap(long, env = "GMAIL_CREDENTIALS", global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Where cached OAuth tokens are kept between invocations
    #[clap(long, env = "GMAIL_TOKEN_CACHE", global = true, value_name = "PATH")]
    pub token_cache: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials
            .clone()
            .unwrap_or_else(|| default_config_dir().join("credentials.json"))
    }

    pub fn token_cache_path(&self) -> PathBuf {
        self.token_cache
            .clone()
            .unwrap_or_else(|| default_config_dir().join("token.json"))
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gmail-cli")
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read messages from the mailbox
    Read(ReadArgs),
    /// Get full details of one message
    Get(MessageArgs),
    /// Get all messages in a thread
    GetThread(GetThreadArgs),
    /// Create a draft
    Draft(DraftArgs),
    /// Send a draft or a directly composed message
    Send(SendArgs),
    /// Remove a message from the inbox
    Archive(MessageArgs),
    /// Move a message to the trash
    Trash(MessageArgs),
    /// Restore a message from the trash
    Untrash(MessageArgs),
    /// Permanently delete a message (cannot be undone)
    Delete(MessageArgs),
    /// Mark a message as read
    MarkRead(MessageArgs),
    /// Mark a message as unread
    MarkUnread(MessageArgs),
    /// Star a message
    Star(MessageArgs),
    /// Remove the star from a message
    Unstar(MessageArgs),
    /// List all labels
    ListLabels,
    /// Create a label
    CreateLabel(CreateLabelArgs),
    /// Delete a label
    DeleteLabel(IdArgs),
    /// Add or remove labels on a message
    ModifyLabels(ModifyLabelsArgs),
    /// List drafts
    ListDrafts(ListDraftsArgs),
    /// Delete a draft
    DeleteDraft(DraftRefArgs),
    /// Archive all messages in a thread
    ArchiveThread(IdArgs),
    /// Move all messages in a thread to the trash
    TrashThread(IdArgs),
    /// List all filters
    ListFilters,
    /// Get details of one filter
    GetFilter(IdArgs),
    /// Create a filter
    CreateFilter(CreateFilterArgs),
    /// Delete a filter
    DeleteFilter(IdArgs),
    /// Download an attachment from a message
    DownloadAttachment(DownloadAttachmentArgs),
    /// Archive every message matching a query
    BatchArchive(BatchArgs),
    /// Trash every message matching a query
    BatchTrash(BatchArgs),
    /// Mark every message matching a query as read
    BatchMarkRead(BatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    /// Number of messages to retrieve
    #[clap(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Gmail search query, e.g. 'is:unread' or 'from:x@y.com'
    #[clap(short = 'q', long)]
    pub query: Option<String>,

    /// Include the decoded message body
    #[clap(long)]
    pub full: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MessageArgs {
    /// Message ID
    #[clap(long)]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    /// Identifier of the entity to operate on
    #[clap(long)]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct GetThreadArgs {
    /// Thread ID
    #[clap(long)]
    pub id: String,

    /// Include full message bodies
    #[clap(long)]
    pub full: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DraftArgs {
    /// Recipient address
    #[clap(long)]
    pub to: Option<String>,

    /// CC recipients (comma separated)
    #[clap(long)]
    pub cc: Option<String>,

    /// BCC recipients (comma separated)
    #[clap(long)]
    pub bcc: Option<String>,

    /// Subject line
    #[clap(long)]
    pub subject: Option<String>,

    /// Body text
    #[clap(long)]
    pub body: String,

    /// Treat the body as HTML
    #[clap(long)]
    pub html: bool,

    /// Message ID to reply to; inherits recipient, subject and thread
    #[clap(long)]
    pub reply_to: Option<String>,

    /// File to attach; may be repeated
    #[clap(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Existing draft to send
    #[clap(long)]
    pub draft_id: Option<String>,

    /// Recipient address (for direct send without a draft)
    #[clap(long)]
    pub to: Option<String>,

    /// CC recipients (comma separated)
    #[clap(long)]
    pub cc: Option<String>,

    /// BCC recipients (comma separated)
    #[clap(long)]
    pub bcc: Option<String>,

    /// Subject line (for direct send)
    #[clap(long)]
    pub subject: Option<String>,

    /// Body text (for direct send)
    #[clap(long)]
    pub body: Option<String>,

    /// Treat the body as HTML
    #[clap(long)]
    pub html: bool,

    /// File to attach; may be repeated
    #[clap(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ListDraftsArgs {
    /// Maximum number of drafts to list
    #[clap(short = 'n', long, default_value_t = 100)]
    pub limit: usize,

    /// Only drafts matching this search query
    #[clap(short = 'q', long)]
    pub query: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DraftRefArgs {
    /// Draft ID
    #[clap(long)]
    pub draft_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct CreateLabelArgs {
    /// Name of the label to create
    #[clap(long)]
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct ModifyLabelsArgs {
    /// Message ID
    #[clap(long)]
    pub id: String,

    /// Label ID to add; may be repeated
    #[clap(long = "add", value_name = "LABEL_ID")]
    pub add: Vec<String>,

    /// Label ID to remove; may be repeated
    #[clap(long = "remove", value_name = "LABEL_ID")]
    pub remove: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CreateFilterArgs {
    /// Match mail from this address
    #[clap(long)]
    pub from: Option<String>,

    /// Match mail to this address
    #[clap(long)]
    pub to: Option<String>,

    /// Match mail with this subject
    #[clap(long)]
    pub subject: Option<String>,

    /// Match using a Gmail search query
    #[clap(long)]
    pub query: Option<String>,

    /// Match mail carrying attachments
    #[clap(long)]
    pub has_attachment: bool,

    /// Label ID to add to matches; may be repeated
    #[clap(long = "add-label", value_name = "LABEL_ID")]
    pub add_labels: Vec<String>,

    /// Label ID to remove from matches; may be repeated
    #[clap(long = "remove-label", value_name = "LABEL_ID")]
    pub remove_labels: Vec<String>,

    /// Archive matches (remove from INBOX)
    #[clap(long)]
    pub archive: bool,

    /// Mark matches as read
    #[clap(long)]
    pub mark_read: bool,

    /// Star matches
    #[clap(long)]
    pub star: bool,

    /// Forward matches to this address
    #[clap(long)]
    pub forward: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadAttachmentArgs {
    /// Message ID containing the attachment
    #[clap(long)]
    pub message_id: String,

    /// Attachment ID to download
    #[clap(long)]
    pub attachment_id: String,

    /// Output file path (default: the original filename in the current dir)
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Gmail search query selecting the messages to operate on
    #[clap(short = 'q', long)]
    pub query: String,

    /// Maximum number of messages to process
    #[clap(short = 'n', long, default_value_t = 50)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn read_defaults_match_documented_values() {
        let cli = Cli::parse_from(["gmail-cli", "read"]);
        match cli.command {
            Command::Read(args) => {
                assert_eq!(args.limit, 10);
                assert!(args.query.is_none());
                assert!(!args.full);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn batch_commands_require_a_query() {
        assert!(Cli::try_parse_from(["gmail-cli", "batch-archive"]).is_err());
        let cli = Cli::parse_from(["gmail-cli", "batch-archive", "-q", "is:unread"]);
        match cli.command {
            Command::BatchArchive(args) => assert_eq!(args.limit, 50),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn repeated_attach_flags_accumulate() {
        let cli = Cli::parse_from([
            "gmail-cli",
            "draft",
            "--to",
            "a@example.com",
            "--subject",
            "S",
            "--body",
            "B",
            "--attach",
            "a.pdf",
            "--attach",
            "b.png",
        ]);
        match cli.command {
            Command::Draft(args) => assert_eq!(args.attachments.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
