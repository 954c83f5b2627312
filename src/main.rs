mod ai_sdk;
mod blog;
mod client;
mod contact;
mod error;
mod github;
mod llm;
mod logging;
mod persona;
mod protocol;
mod relay;
mod search;
mod server;
mod transcript;
mod ui;

use clap::{Args, Parser, Subcommand};
use client::ChatClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};

const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Parser)]
#[command(name = "folio", version, about = "Portfolio backend with a streaming AI chat relay")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true)]
    log_level: Option<Level>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Interactive terminal chat against a running server.
    Chat(ClientArgs),
    /// Send one message and print the streamed reply.
    Ask {
        #[command(flatten)]
        client: ClientArgs,
        #[arg(required = true)]
        message: Vec<String>,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "FOLIO_LISTEN", default_value = "0.0.0.0:5000")]
    listen: String,

    #[arg(long, env = "AZURE_ENDPOINT")]
    llm_endpoint: Option<String>,

    #[arg(long, env = "AZURE_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,

    #[arg(long, env = "AZURE_DEPLOYMENT_NAME", default_value = "gpt-4o")]
    model: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[arg(long, env = "FOLIO_GITHUB_USERNAME", default_value = github::DEFAULT_USERNAME)]
    github_username: String,

    #[arg(long, env = "FOLIO_MEDIUM_FEED", default_value = blog::DEFAULT_FEED_URL)]
    medium_feed: String,

    /// Directory holding the built frontend, served for non-API paths.
    #[arg(long, env = "FOLIO_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    #[arg(long, env = "FOLIO_MAX_CONCURRENT_CHATS", default_value_t = 32)]
    max_concurrent_chats: usize,

    #[arg(long, env = "FOLIO_UPSTREAM_TIMEOUT_SECS", default_value_t = 60)]
    upstream_timeout_secs: u64,

    /// Bound on each GitHub or Medium fetch.
    #[arg(long, env = "FOLIO_FETCH_TIMEOUT_SECS", default_value_t = 15)]
    fetch_timeout_secs: u64,

    #[arg(long, env = "FOLIO_SEARCH_DELAY_MS", default_value_t = 1000)]
    search_delay_ms: u64,

    /// Skip the web search provider and answer from the profile fallback.
    #[arg(long)]
    no_search: bool,
}

#[derive(Args)]
struct ClientArgs {
    #[arg(long, env = "FOLIO_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            logging::init_logging(cli.log_level.unwrap_or(Level::INFO));
            serve(args).await
        }
        Command::Chat(args) => {
            logging::init_logging(cli.log_level.unwrap_or(Level::WARN));
            ui::run_tui(ChatClient::new(&args.server), persona::GREETING)
        }
        Command::Ask { client, message } => {
            logging::init_logging(cli.log_level.unwrap_or(Level::WARN));
            ui::ask(&ChatClient::new(&client.server), &message.join(" ")).await
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let endpoint = args
        .llm_endpoint
        .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string());
    let api_key = args
        .llm_api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty());
    if api_key.is_none() {
        warn!("no LLM API key configured (AZURE_API_KEY or OPENAI_API_KEY); chat replies will fail");
    }
    info!(%endpoint, model = %args.model, "using completion provider");

    let provider = llm::OpenAiClient::new(llm::LlmConfig {
        endpoint,
        api_key,
        model: args.model,
    });

    let search = if args.no_search {
        info!("web search disabled");
        search::SearchChain::offline()
    } else {
        search::SearchChain::new(
            Some(Arc::new(search::DuckDuckGo::new())),
            search::SearchConfig {
                delay: Duration::from_millis(args.search_delay_ms),
                ..search::SearchConfig::default()
            },
        )
    };

    let relay = relay::Relay::new(
        Arc::new(provider),
        search,
        relay::RelayConfig {
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs),
            ..relay::RelayConfig::default()
        },
    );

    let fetch_timeout = Duration::from_secs(args.fetch_timeout_secs);
    let github = github::GithubClient::new(github::GithubConfig {
        username: args.github_username,
        token: args.github_token,
        timeout: fetch_timeout,
        ..github::GithubConfig::default()
    });
    let blog = blog::BlogClient::new(blog::BlogConfig {
        feed_url: args.medium_feed,
        default_author: persona::SUBJECT_NAME.to_string(),
        timeout: fetch_timeout,
    });

    let state = server::AppState::new(relay, github, blog, args.max_concurrent_chats);
    server::run(
        server::ServerConfig {
            listen: args.listen,
            static_dir: args.static_dir,
        },
        state,
    )
    .await
}
