use crate::auth::{AuthManager, AuthOutcome, CommandSigner, WalletSigner, is_expired};
use crate::client::{DEFAULT_LIMIT, DEFAULT_PAGE_SIZE, HistoricalQuery, PrecogClient, PredictionScope};
use crate::config::{Config, config_file_path, save_config};
use crate::errors::AppError;
use crate::traits::{Prompter, StdioPrompter};
use crate::utils::{format_expiry, parse_date_arg};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Precog API client - wallet authentication and prediction queries
#[derive(Parser, Debug)]
#[command(name = "precog", version)]
#[command(about = "Client for the Precog prediction API", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the config file)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Configure a wallet and authenticate with it
    Authenticate,

    /// Show the stake requirements for API access
    Requirements,

    /// Show the current configuration and token state
    Status,

    /// Fetch recent predictions
    Recent(RecentArgs),

    /// Fetch historical predictions
    Historical(HistoricalArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MinerArgs {
    /// Only predictions of the miner with this UID (0-255)
    #[arg(long, conflicts_with = "hotkey")]
    pub uid: Option<u32>,

    /// Only predictions of the miner with this hotkey (SS58 address)
    #[arg(long)]
    pub hotkey: Option<String>,
}

impl MinerArgs {
    fn scope(&self) -> PredictionScope {
        match (&self.uid, &self.hotkey) {
            (Some(uid), _) => PredictionScope::Uid(*uid),
            (None, Some(hotkey)) => PredictionScope::Hotkey(hotkey.clone()),
            (None, None) => PredictionScope::All,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RecentArgs {
    #[command(flatten)]
    pub miner: MinerArgs,

    /// Maximum number of predictions (1-10000)
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,
}

#[derive(Args, Debug, Clone)]
pub struct HistoricalArgs {
    #[command(flatten)]
    pub miner: MinerArgs,

    /// Start of the window (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: DateTime<Utc>,

    /// End of the window (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: DateTime<Utc>,

    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page (100-10000)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Follow pagination and print every page
    #[arg(long)]
    pub all: bool,
}

pub async fn handle_command(cli: Cli, mut config: Config) -> Result<(), AppError> {
    match cli.command {
        Commands::Authenticate => {
            handle_authenticate(&mut config, cli.config.as_deref(), &mut StdioPrompter).await?
        }
        Commands::Requirements => handle_requirements(&config).await?,
        Commands::Status => handle_status(&config, cli.config.as_deref()),
        Commands::Recent(args) => handle_recent(&config, args).await?,
        Commands::Historical(args) => handle_historical(&config, args).await?,
    }

    Ok(())
}

async fn handle_authenticate(
    config: &mut Config,
    config_path: Option<&Path>,
    prompter: &mut dyn Prompter,
) -> Result<(), AppError> {
    prompter.say("=== Precog API Authentication ===");

    if !configure_interactively(config, config_path, prompter)? {
        prompter.say("Authentication cancelled.");
        return Ok(());
    }

    save_config(config, config_path)?;
    prompter.say("");
    prompter.say("Configuration saved!");
    show_config(config, config_path, prompter);

    prompter.say("");
    prompter.say("Now authenticating with your wallet...");
    prompter.say("You may be prompted for your wallet password.");

    let auth = AuthManager::new(config)?;
    let signer = Arc::new(CommandSigner::from_config(&config.signer, config.wallet_path()));

    match run_authentication(&auth, signer).await {
        Ok(outcome) => {
            report_outcome(&outcome, &auth, prompter);
            prompter.say("");
            prompter.say("Authentication completed successfully!");
            Ok(())
        }
        Err(e) => {
            prompter.say("");
            prompter.say(&format!("Authentication failed: {}", e));
            prompter.say("Your configuration has been saved, but authentication was not successful.");
            prompter.say("You can try again by running: precog authenticate");
            Err(e)
        }
    }
}

async fn run_authentication(
    auth: &AuthManager,
    signer: Arc<dyn WalletSigner>,
) -> Result<AuthOutcome, AppError> {
    Ok(auth.authenticate(signer).await?)
}

fn report_outcome(outcome: &AuthOutcome, auth: &AuthManager, prompter: &mut dyn Prompter) {
    let record = outcome.record();
    match outcome {
        AuthOutcome::AlreadyAuthenticated(_) => {
            prompter.say(&format!(
                "Valid tokens found in {}",
                auth.token_storage().path().display()
            ));
        }
        AuthOutcome::Authenticated(_) => {
            prompter.say(&format!(
                "Tokens saved to: {}",
                auth.token_storage().path().display()
            ));
        }
    }
    if let Some(at) = record.access_token_expires_at {
        prompter.say(&format!(
            "  Access token expires: {} ({})",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_expiry(&at)
        ));
    }
    if let Some(at) = record.refresh_token_expires_at {
        prompter.say(&format!(
            "  Refresh token expires: {} ({})",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_expiry(&at)
        ));
    }
}

/// Asks for wallet name and token file. Returns false if the user declined or input ended.
fn configure_interactively(
    config: &mut Config,
    config_path: Option<&Path>,
    prompter: &mut dyn Prompter,
) -> Result<bool, AppError> {
    if config.is_configured() {
        prompter.say("Precog API is already configured");
        show_config(config, config_path, prompter);

        let answer = ask(prompter, "Do you want to re-authenticate? (y/N): ")?;
        if !matches!(answer.as_deref().map(str::to_lowercase).as_deref(), Some("y" | "yes")) {
            return Ok(false);
        }
    }

    prompter.say("Enter your wallet name.");
    prompter.say(&format!(
        "This should be the name of your wallet directory in {}",
        config.wallet.path
    ));

    let current_wallet = config.wallet.name.clone().filter(|n| !n.is_empty());
    let wallet_prompt = match &current_wallet {
        Some(current) => format!("Wallet name [{}]: ", current),
        None => "Wallet name: ".to_string(),
    };

    let wallets_dir = config.wallet_path();
    let wallet_name = loop {
        let Some(answer) = ask(prompter, &wallet_prompt)? else {
            return Ok(false);
        };

        let wallet_name = if answer.is_empty() {
            match &current_wallet {
                Some(current) => current.clone(),
                None => {
                    prompter.say("Wallet name is required.");
                    continue;
                }
            }
        } else {
            answer
        };

        let wallet_dir = wallets_dir.join(&wallet_name);
        if !wallet_dir.is_dir() {
            prompter.say(&format!("Wallet directory not found: {}", wallet_dir.display()));
            let available = list_wallets(&wallets_dir);
            if !available.is_empty() {
                prompter.say("Available wallets:");
                for wallet in available {
                    prompter.say(&format!("  - {}", wallet));
                }
            }
            continue;
        }

        let coldkey = wallet_dir.join("coldkey");
        if !coldkey.exists() {
            prompter.say(&format!("Coldkey not found in wallet: {}", coldkey.display()));
            continue;
        }

        break wallet_name;
    };

    prompter.say("");
    prompter.say("Token file location (optional). This is where your API tokens will be stored.");
    let token_answer = ask(
        prompter,
        &format!("Token file [{}]: ", config.auth.token_file),
    )?;
    if let Some(token_file) = token_answer.filter(|t| !t.is_empty()) {
        config.auth.token_file = token_file;
    }

    config.wallet.name = Some(wallet_name);
    Ok(true)
}

fn ask(prompter: &mut dyn Prompter, message: &str) -> Result<Option<String>, AppError> {
    prompter.prompt(message).map_err(|e| AppError::Generic {
        message: format!("Failed to read input: {}", e),
    })
}

fn list_wallets(wallets_dir: &Path) -> Vec<String> {
    let mut wallets: Vec<String> = std::fs::read_dir(wallets_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    wallets.sort();
    wallets
}

fn show_config(config: &Config, config_path: Option<&Path>, prompter: &mut dyn Prompter) {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    prompter.say("Current configuration:");
    prompter.say(&format!(
        "  Wallet name: {}",
        config.wallet.name.as_deref().unwrap_or("Not set")
    ));
    prompter.say(&format!("  Token file: {}", config.token_file().display()));
    prompter.say(&format!("  API URL: {}", config.api_base_url()));
    prompter.say(&format!("  Config file: {}", config_file.display()));
}

async fn handle_requirements(config: &Config) -> Result<(), AppError> {
    println!("=== Precog API Authentication Requirements ===");
    println!();

    let auth = AuthManager::new(config)?;
    match auth.fetch_requirements().await {
        Ok(requirements) => {
            println!("To access the Precog API, you need:");
            println!();
            if let Some(stake) = requirements.minimum_alpha_stake {
                println!("- Minimum Alpha Stake: {} Alpha", stake);
            }
            if let Some(netuid) = requirements.netuid {
                println!("- Netuid: {}", netuid);
            }
        }
        Err(e) => {
            tracing::warn!("Failed to fetch requirements: {}", e);
            println!("Failed to fetch requirements: {}", e);
            println!();
            println!("Default requirements:");
            println!("- Subnet: 55");
            println!("- Minimum Stake: 1000 Alpha");
        }
    }
    println!();
    Ok(())
}

fn handle_status(config: &Config, config_path: Option<&Path>) {
    let mut prompter = StdioPrompter;
    if config.is_configured() {
        prompter.say("Precog API is configured");
    } else {
        prompter.say("Precog API is not configured");
        prompter.say("Run 'precog authenticate' to get started");
    }
    show_config(config, config_path, &mut prompter);

    let record = crate::token_storage::TokenStorage::new(config.token_file()).load();
    if record.is_empty() {
        prompter.say("  Tokens: none");
        return;
    }

    let state = if is_expired(record.access_token_expires_at) {
        "expired"
    } else {
        "valid"
    };
    prompter.say(&format!("  Access token: {}", state));
    if let Some(at) = record.access_token_expires_at {
        prompter.say(&format!("  Access token expires {}", format_expiry(&at)));
    }
    if let Some(at) = record.refresh_token_expires_at {
        prompter.say(&format!("  Refresh token expires {}", format_expiry(&at)));
    }
}

async fn handle_recent(config: &Config, args: RecentArgs) -> Result<(), AppError> {
    let client = PrecogClient::new(config)?;
    let body = match args.miner.scope() {
        PredictionScope::All => client.get_recent_predictions(args.limit).await?,
        PredictionScope::Uid(uid) => client.get_recent_predictions_by_uid(uid, args.limit).await?,
        PredictionScope::Hotkey(hotkey) => {
            client
                .get_recent_predictions_by_hotkey(&hotkey, args.limit)
                .await?
        }
    };
    print_json(&body)
}

async fn handle_historical(config: &Config, args: HistoricalArgs) -> Result<(), AppError> {
    let client = PrecogClient::new(config)?;
    let query = HistoricalQuery::new(args.start, args.end)
        .with_page(args.page)
        .with_page_size(args.page_size);

    if args.all {
        let pages = client
            .get_all_historical_predictions(args.miner.scope(), &query)
            .await?;
        print_json(&serde_json::Value::Array(pages))
    } else {
        let body = client.historical(args.miner.scope(), &query).await?;
        print_json(&body)
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| AppError::Generic {
        message: format!("Failed to format response: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}
