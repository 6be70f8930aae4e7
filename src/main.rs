use anyhow::{Context, Result, bail};
use clap::Parser;
use futures_util::future::join_all;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use tokenflow::auth::PromptLogin;
use tokenflow::credential::mask_token;
use tokenflow::loading::LogIndicator;
use tokenflow::runtime::RealRuntime;
use tokenflow::storage::{FileStorage, MemoryStorage, Storage};
use tokenflow::transport::{Method, ReqwestTransport};
use tokenflow::{Client, ClientConfig, RequestOptions, ResponseEnvelope};

/// tokenflow - authenticated requests with automatic login and token refresh
///
/// The stored token lives in the storage directory (TOKENFLOW_STORAGE_DIR,
/// default: <config dir>/tokenflow). When a login is needed the one-time code
/// is read from TOKENFLOW_LOGIN_CODE or asked for on the terminal.
///
/// Examples:
///   tokenflow request /user/info
///   tokenflow request /orders --method POST --data '{"sku":"a"}'
///   tokenflow token show
#[derive(Parser, Debug)]
#[command(author, version = env!("TOKENFLOW_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server base URL (also via TOKENFLOW_BASE_URL)
    #[arg(long = "base-url", value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Directory holding the persisted token (also via TOKENFLOW_STORAGE_DIR)
    #[arg(long = "storage-dir", value_name = "PATH", global = true)]
    storage_dir: Option<PathBuf>,

    /// Keep the token in memory only
    #[arg(long = "ephemeral", global = true, conflicts_with = "storage_dir")]
    ephemeral: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a request and print the response envelope
    Request(RequestArgs),

    /// Log in and store a fresh token
    Login,

    /// Inspect or clear the stored token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Request path relative to the base URL
    #[arg(value_name = "PATH")]
    path: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    method: Method,

    /// JSON payload (query string for GET/DELETE, body otherwise)
    #[arg(long, short = 'd', value_name = "JSON")]
    data: Option<String>,

    /// Send without credentials
    #[arg(long = "no-auth")]
    no_auth: bool,

    /// Retry budget for this request
    #[arg(long, value_name = "N")]
    retry: Option<u32>,

    /// Report loading state on the log
    #[arg(long)]
    loading: bool,

    /// Send N identical requests concurrently
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    concurrency: u32,
}

#[derive(clap::Subcommand, Debug)]
enum TokenAction {
    /// Print the stored token (masked)
    Show,
    /// Remove the stored token
    Clear,
}

impl RequestArgs {
    fn to_options(&self) -> Result<RequestOptions> {
        let mut options = RequestOptions::new(self.method, self.path.as_str())
            .auth(!self.no_auth)
            .loading(self.loading);
        if let Some(retry) = self.retry {
            options = options.retry(retry);
        }
        if let Some(raw) = &self.data {
            let data: serde_json::Value =
                serde_json::from_str(raw).context("--data must be valid JSON")?;
            options = options.data(data);
        }
        Ok(options)
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env(&RealRuntime)?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = Some(dir.clone());
    }
    if cli.ephemeral {
        config.storage_dir = None;
    }
    Ok(config)
}

fn build_storage(config: &ClientConfig) -> Arc<dyn Storage> {
    match &config.storage_dir {
        Some(dir) => {
            debug!("Persisting token under {:?}", dir);
            Arc::new(FileStorage::new(RealRuntime, dir.clone()))
        }
        None => Arc::new(MemoryStorage::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let storage = build_storage(&config);
    let transport = ReqwestTransport::from_config(&config)?;
    let client = Client::new(config, transport, storage, PromptLogin::new(RealRuntime))
        .with_loading_indicator(Box::new(LogIndicator));

    match cli.command {
        Commands::Request(args) => {
            let options = args.to_options()?;
            let results = join_all(
                (0..args.concurrency)
                    .map(|_| client.request::<serde_json::Value>(options.clone())),
            )
            .await;

            let mut failed = 0;
            for result in results {
                match result {
                    Ok(envelope) => print_envelope(&envelope)?,
                    Err(e) => {
                        eprintln!("error: {}", e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} request(s) failed", failed, args.concurrency);
            }
        }
        Commands::Login => {
            let token = client.login().await?;
            println!("Logged in, token {}", mask_token(&token));
        }
        Commands::Token { action } => match action {
            TokenAction::Show => {
                let token = client.credentials().get_token();
                if token.is_empty() {
                    println!("No token stored");
                } else {
                    println!("{}", mask_token(&token));
                }
            }
            TokenAction::Clear => {
                client.credentials().clear_token();
                println!("Token cleared");
            }
        },
    }
    Ok(())
}

fn print_envelope(envelope: &ResponseEnvelope<serde_json::Value>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}
