use clap::Parser;
use gmail_cli::{
    cli::{Cli, Command},
    client::GmailClient,
    commands::{attachments, batch, drafts, filters, labels, messages, threads},
    error::Result,
    oauth::{ClientCredentials, TokenManager},
    store::TokenStore,
};

#[tokio::main]
async fn main() {
    setup_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            // stdout carries exactly one JSON document per invocation
            println!("{output:#}");
        }
        Err(err) => {
            let envelope =
                serde_json::to_string(&err.envelope()).unwrap_or_else(|_| err.to_string());
            eprintln!("{envelope}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<serde_json::Value> {
    let creds = ClientCredentials::load_from_file(cli.credentials_path())?;
    let store = TokenStore::new(cli.token_cache_path());
    let token_manager = TokenManager::bootstrap(creds, store).await?;
    let client = GmailClient::new(token_manager);

    match cli.command {
        Command::Read(args) => messages::read(&client, args).await,
        Command::Get(args) => messages::get(&client, args).await,
        Command::GetThread(args) => threads::get(&client, args).await,
        Command::Draft(args) => drafts::draft(&client, args).await,
        Command::Send(args) => drafts::send(&client, args).await,
        Command::Archive(args) => messages::archive(&client, args).await,
        Command::Trash(args) => messages::trash(&client, args).await,
        Command::Untrash(args) => messages::untrash(&client, args).await,
        Command::Delete(args) => messages::delete(&client, args).await,
        Command::MarkRead(args) => messages::mark_read(&client, args).await,
        Command::MarkUnread(args) => messages::mark_unread(&client, args).await,
        Command::Star(args) => messages::star(&client, args).await,
        Command::Unstar(args) => messages::unstar(&client, args).await,
        Command::ListLabels => labels::list(&client).await,
        Command::CreateLabel(args) => labels::create(&client, args).await,
        Command::DeleteLabel(args) => labels::delete(&client, args).await,
        Command::ModifyLabels(args) => messages::modify_labels(&client, args).await,
        Command::ListDrafts(args) => drafts::list(&client, args).await,
        Command::DeleteDraft(args) => drafts::delete(&client, args).await,
        Command::ArchiveThread(args) => threads::archive(&client, args).await,
        Command::TrashThread(args) => threads::trash(&client, args).await,
        Command::ListFilters => filters::list(&client).await,
        Command::GetFilter(args) => filters::get(&client, args).await,
        Command::CreateFilter(args) => filters::create(&client, args).await,
        Command::DeleteFilter(args) => filters::delete(&client, args).await,
        Command::DownloadAttachment(args) => attachments::download(&client, args).await,
        Command::BatchArchive(args) => batch::archive(&client, args).await,
        Command::BatchTrash(args) => batch::trash(&client, args).await,
        Command::BatchMarkRead(args) => batch::mark_read(&client, args).await,
    }
}

/// Logging goes to stderr so stdout stays parseable.
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();
}
