// didvault - command line front end for the identity service

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use didvault::identity::{Address, EthrDid};
use didvault::jwt::SignerConfig;
use didvault::vault::{AutoConfirm, Confirmer, ProtectionLevel, VaultConfig};
use didvault::{Config, IdentityService};
use serde_json::{Map, Value};
use std::error::Error;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "didvault", version, about = "Manage ethr DIDs and sign claims")]
struct Cli {
    /// Directory holding the seed database
    #[arg(long, default_value = ".didvault")]
    data_dir: PathBuf,

    /// Protection level for new identities (simple, singleprompt, prompt, cloud)
    #[arg(long, default_value = "simple")]
    level: ProtectionLevel,

    /// Approve every confirmation without asking
    #[arg(long)]
    yes: bool,

    /// Seconds to wait for a confirmation before cancelling
    #[arg(long, default_value_t = 60)]
    confirm_timeout: u64,

    /// Allow cloud-backed identities
    #[arg(long)]
    allow_cloud: bool,

    /// BIP-32 derivation path for new identities
    #[arg(long)]
    derivation_path: Option<String>,

    /// Lifetime of signed tokens in seconds
    #[arg(long)]
    expires_in: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List identities
    List,
    /// Create a new identity
    Create,
    /// Import an identity from a seed phrase
    Import { phrase: String },
    /// Delete an identity
    Delete { address: Address },
    /// Show the seed phrase of an identity
    Reveal { address: Address },
    /// Sign a claim
    Sign {
        address: Address,
        /// Claim body as a JSON object
        #[arg(long, default_value = "{}")]
        claim: String,
        /// Subject DID (defaults to the issuer)
        #[arg(long)]
        subject: Option<EthrDid>,
    },
    /// Verify a signed token
    Verify { jwt: String },
}

/// Asks on the terminal and reads y/N from stdin
struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            eprint!("{} [y/N] ", prompt);
            let _ = io::stderr().flush();

            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

fn config_from(cli: &Cli) -> Config {
    let mut vault = VaultConfig::new().with_confirm_timeout_ms(cli.confirm_timeout.saturating_mul(1000));
    if cli.allow_cloud {
        vault = vault.with_cloud_backup();
    }
    if let Some(path) = &cli.derivation_path {
        vault = vault.with_derivation_path(path);
    }

    let mut signer = SignerConfig::new();
    if let Some(secs) = cli.expires_in {
        signer = signer.with_expires_in_secs(secs);
    }

    Config::new()
        .with_data_dir(&cli.data_dir)
        .with_default_level(cli.level)
        .with_vault(vault)
        .with_signer(signer)
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let confirmer: Arc<dyn Confirmer> = if cli.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TerminalConfirmer)
    };
    let service = IdentityService::open(&config_from(&cli), confirmer)?;

    match cli.command {
        Command::List => {
            let list = service.list_identities().await?;
            if list.identities.is_empty() {
                println!("No identities");
            }
            for record in list.identities {
                let marker = if record.is_selected { "*" } else { " " };
                println!("{} {}", marker, record.did);
            }
        }
        Command::Create => {
            let record = service.create_default_identity().await?;
            println!("{}", record.did);
        }
        Command::Import { phrase } => {
            let record = service.import_identity(&phrase, cli.level).await?;
            println!("{}", record.did);
        }
        Command::Delete { address } => {
            if service.delete_identity(&address).await? {
                println!("Deleted {}", EthrDid::from_address(address));
            } else {
                println!("No identity for {}", address);
            }
        }
        Command::Reveal { address } => {
            let record = service.reveal_identity(&address).await?;
            if let Some(seed) = record.seed {
                println!("{}", seed.expose());
            }
        }
        Command::Sign { address, claim, subject } => {
            let claim: Map<String, Value> = serde_json::from_str(&claim)
                .map_err(|e| format!("claim must be a JSON object: {}", e))?;
            let jwt = match subject {
                Some(subject) => service.sign_claim_about(&address, &subject, claim).await?,
                None => service.sign_claim(&address, claim).await?,
            };
            println!("{}", jwt);
        }
        Command::Verify { jwt } => {
            let verified = service.verify_claim(&jwt)?;
            println!("issuer:  {}", verified.issuer);
            println!("subject: {}", verified.payload.sub);
            println!("claim:   {}", Value::Object(verified.payload.claim));
        }
    }

    Ok(())
}

/// Drive `fut` to completion, then drop the runtime without waiting on
/// blocking tasks. A timed-out terminal prompt leaves its stdin read behind.
fn block_on_detached<F: Future>(fut: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(fut);
    runtime.shutdown_background();
    Ok(output)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match block_on_detached(run(cli)) {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
