use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ragchat::cli::context::CliContext;
use ragchat::cli::output::{print_error, OutputMode};
use ragchat::cli::query::QueryOptions;
use ragchat::cli::{documents, query, session};

#[derive(Parser)]
#[command(name = "ragchat", version, about = "Upload documents to and chat with a RAG chatbot server")]
struct Cli {
    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session credentials
    Login {
        username: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "RAGCHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a new account
    Register {
        username: String,

        #[arg(long)]
        email: String,

        /// Password (prompted twice on stdin when omitted)
        #[arg(long, env = "RAGCHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show the account behind the current session
    Whoami,

    /// Forget the stored session credentials
    Logout,

    /// Show whether a session is stored locally
    Status,

    /// Upload documents for ingestion
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Label stored with the ingested chunks
        #[arg(long)]
        source: Option<String>,
    },

    /// Ask a question against the uploaded documents
    Query {
        text: String,

        /// Number of chunks to retrieve
        #[arg(long, default_value_t = 4)]
        top_k: u32,

        /// Sampling temperature for the generated answer
        #[arg(long, default_value_t = 0.7)]
        temperature: f64,

        /// Return retrieved chunks only, without generating an answer
        #[arg(long)]
        no_generate: bool,

        /// Restrict retrieval to one source label
        #[arg(long)]
        source: Option<String>,
    },

    /// Manage uploaded documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// List uploaded documents
    List,
    /// Delete an uploaded document
    Delete {
        /// Document id
        id: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RAGCHAT_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = OutputMode::from_flag(cli.json);

    if let Err(e) = run(cli).await {
        print_error(&e, mode);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ragchat::RagchatError> {
    let ctx = CliContext::load(cli.config.as_deref(), cli.json)?;
    match cli.command {
        Commands::Login { username, password } => {
            session::run_login(&ctx, &username, password.as_deref()).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => session::run_register(&ctx, &username, &email, password.as_deref()).await,
        Commands::Whoami => session::run_whoami(&ctx).await,
        Commands::Logout => session::run_logout(&ctx),
        Commands::Status => session::run_status(&ctx),
        Commands::Upload { files, source } => {
            documents::run_upload(&ctx, &files, source.as_deref()).await
        }
        Commands::Query {
            text,
            top_k,
            temperature,
            no_generate,
            source,
        } => {
            query::run_query(
                &ctx,
                &text,
                QueryOptions {
                    top_k,
                    temperature,
                    generate: !no_generate,
                    source,
                },
            )
            .await
        }
        Commands::Docs { action } => match action {
            DocsAction::List => documents::run_list(&ctx).await,
            DocsAction::Delete { id } => documents::run_delete(&ctx, id).await,
        },
    }
}
