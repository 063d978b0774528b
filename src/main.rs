use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use recordscope::config::{
    ConfigError, ConnectionConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS,
    InspectorConfig,
};
use recordscope::confirm::{Confirm, ConfirmPrompt, FixedAnswer};
use recordscope::inspector::{DeleteOutcome, FetchApplied, InspectorSession, RecordInspector};
use recordscope::net::{RpcExecutor, TransportError};
use recordscope::state::saveable::SaveOutcome;
use recordscope::util::resize::HeadlessSurface;
use recordscope::util::value::validate_body;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("`{0}` is not a record id")]
    InvalidRecord(String),
    #[error("record {0} does not exist")]
    NotFound(String),
    #[error("body must be a JSON object")]
    InvalidBody,
    #[error("{0}")]
    Failed(String),
}

#[derive(Parser, Debug)]
#[command(name = "recordscope", about = "Inspect, edit, and delete database records")]
struct Cli {
    #[arg(long, env = "SURREAL_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long, env = "SURREAL_NS")]
    namespace: String,

    #[arg(long, env = "SURREAL_DB")]
    database: String,

    #[arg(long, env = "SURREAL_USER")]
    username: Option<String>,

    #[arg(long, env = "SURREAL_PASS", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,

    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a record with its links.
    Show { record: String },
    /// Replace a record's content.
    Edit {
        record: String,
        #[arg(long)]
        body: String,
        /// Keep the inspector open and print the refetched record.
        #[arg(long)]
        apply: bool,
    },
    /// Delete a record.
    Delete {
        record: String,
        #[arg(long)]
        yes: bool,
    },
}

/// Asks on stdin; only "y"/"yes" confirm.
struct StdinConfirm;

#[async_trait::async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let mut stderr = tokio::io::stderr();
        let question = format!("{} {}? [y/N] ", prompt.message, prompt.confirm_text);
        if stderr.write_all(question.as_bytes()).await.is_err() {
            return false;
        }
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if stdin.read_line(&mut line).await.is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

type Session = InspectorSession<RpcExecutor>;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut connection = ConnectionConfig::new(&cli.endpoint, cli.namespace, cli.database)
        .with_credentials(cli.username, cli.password);
    connection.request_timeout_secs = cli.request_timeout;
    connection.connect_timeout_secs = cli.connect_timeout;

    let config = InspectorConfig::from_env()?;
    let executor = RpcExecutor::new(connection)?;
    tracing::info!(url = executor.url(), "recordscope connecting");

    let inspector = RecordInspector::new(config, Box::<HeadlessSurface>::default());
    let session = InspectorSession::new(inspector, executor);

    match cli.command {
        Command::Show { record } => run_show(&session, &record).await,
        Command::Edit { record, body, apply } => run_edit(&session, &record, &body, apply).await,
        Command::Delete { record, yes } => run_delete(&session, &record, yes).await,
    }
}

async fn load(session: &Session, record: &str) -> Result<(), CliError> {
    match session.goto_record(record).await {
        None => Err(CliError::InvalidRecord(record.to_owned())),
        Some(FetchApplied::Present) => {
            if let Some(table) = session.with_state(|s| s.current().map(|r| r.table().to_owned())) {
                session.with_explorer(|e| e.explore_table(table));
            }
            Ok(())
        }
        Some(FetchApplied::Failed) => Err(CliError::Failed(session.with_state(|s| s.error().unwrap_or_default().to_owned()))),
        Some(FetchApplied::Missing | FetchApplied::Stale) => Err(CliError::NotFound(record.to_owned())),
    }
}

async fn run_show(session: &Session, record: &str) -> Result<(), CliError> {
    load(session, record).await?;
    if let Some(table) = session.with_explorer(|e| e.active_table().map(str::to_owned)) {
        println!("table:    {table}");
    }
    session.with_state(|s| print_record(s));
    Ok(())
}

async fn run_edit(session: &Session, record: &str, body: &str, apply: bool) -> Result<(), CliError> {
    if validate_body(body).is_none() {
        return Err(CliError::InvalidBody);
    }
    load(session, record).await?;
    session.with_state(|s| s.edit_body(body));

    let Some(report) = session.save(apply).await else {
        eprintln!("no changes");
        return Ok(());
    };
    if report.outcome != SaveOutcome::Saved {
        return Err(CliError::Failed(session.with_state(|s| s.error().unwrap_or_default().to_owned())));
    }
    eprintln!("saved {record}");
    if apply {
        session.with_state(|s| print_record(s));
    }
    Ok(())
}

async fn run_delete(session: &Session, record: &str, yes: bool) -> Result<(), CliError> {
    load(session, record).await?;
    let outcome = if yes {
        session.delete_record(&FixedAnswer(true)).await
    } else {
        session.delete_record(&StdinConfirm).await
    };
    match outcome {
        DeleteOutcome::Deleted(reference) => {
            eprintln!("deleted {reference}");
            Ok(())
        }
        DeleteOutcome::Declined => {
            eprintln!("cancelled");
            Ok(())
        }
        DeleteOutcome::Unavailable => Err(CliError::NotFound(record.to_owned())),
        DeleteOutcome::Failed => Err(CliError::Failed(session.with_state(|s| s.error().unwrap_or_default().to_owned()))),
    }
}

fn print_record(inspector: &RecordInspector) {
    let record = inspector.record();
    if let Some(reference) = inspector.current() {
        println!("record:   {reference}");
    }
    println!("edge:     {}", record.is_edge);
    println!("inbound:  {}", join_links(&record.inbound_links));
    println!("outbound: {}", join_links(&record.outbound_links));
    println!("{}", inspector.body());
}

fn join_links(links: &[recordscope::state::record::RecordReference]) -> String {
    if links.is_empty() {
        return "-".to_owned();
    }
    links.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
