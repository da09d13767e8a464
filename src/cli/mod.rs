//! Command-line interface for playgate.
//!
//! Provides operator commands for minting and verifying playback tokens,
//! resolving streams exactly as the stream endpoint would, maintaining the
//! resource catalog, and inspecting the resolved configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{CallerIdentity, JsonCatalog};
use crate::api::{self, ApiResponse, TokenBody};
use crate::config::{self, Settings};
use crate::core::{resolve, StreamPolicy, TokenEngine};
use crate::domain::ResourceRecord;

/// Caller identity used for tokens minted from the command line
const OPERATOR_SUBJECT: &str = "cli-operator";

/// playgate - Short-lived playback tokens and stream resolution
#[derive(Parser, Debug)]
#[command(name = "playgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog JSON file (overrides configuration)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mint a playback token for a resource
    Token {
        /// Resource ID
        resource_id: String,

        /// Token lifetime in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Verify a token and show the bound resource
    Verify {
        /// Token string
        token: String,
    },

    /// Resolve a stream URL the way the stream endpoint does
    Stream {
        /// Resource ID
        resource_id: String,

        /// Playback token
        #[arg(short, long)]
        token: String,
    },

    /// Manage the resource catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// Insert a resource, or update it if the id already exists
    Add {
        /// Resource ID
        resource_id: String,

        /// Direct http(s) media URL
        #[arg(long)]
        direct_url: Option<String>,

        /// External platform id used for embed fallback
        #[arg(long)]
        external_id: Option<String>,

        /// Display title
        #[arg(long, default_value = "")]
        title: String,

        /// Store the resource as inactive
        #[arg(long)]
        inactive: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Config => show_config(&Settings::load()?),
            Commands::Verify { token } => verify_token(&Settings::load()?, &token),
            Commands::Token { resource_id, ttl } => {
                let policy = build_policy(&Settings::load()?, self.catalog).await?;
                mint_token(&policy, &resource_id, ttl).await
            }
            Commands::Stream { resource_id, token } => {
                let policy = build_policy(&Settings::load()?, self.catalog).await?;
                resolve_stream(&policy, &resource_id, &token).await
            }
            // Catalog maintenance works before a signing secret is configured
            Commands::Catalog { command } => {
                let path = match self.catalog {
                    Some(path) => path,
                    None => config::load_catalog_path()?,
                };
                run_catalog(command, &path).await
            }
        }
    }
}

/// Wire the signing context and catalog into a policy
async fn build_policy(settings: &Settings, catalog: Option<PathBuf>) -> Result<StreamPolicy> {
    let context = Arc::new(settings.signing_context()?);
    let catalog_path = catalog.unwrap_or_else(|| settings.catalog.clone());
    let catalog = JsonCatalog::load(&catalog_path).await?;

    tracing::info!(
        catalog = %catalog_path.display(),
        resources = catalog.len(),
        key = context.key_fingerprint(),
        "Stream policy ready"
    );

    Ok(StreamPolicy::new(
        TokenEngine::new(context),
        Arc::new(catalog),
    ))
}

/// Mint a token as the local operator
async fn mint_token(policy: &StreamPolicy, resource_id: &str, ttl: Option<u64>) -> Result<()> {
    let caller = CallerIdentity::new(OPERATOR_SUBJECT);
    let ttl = ttl.unwrap_or_else(|| policy.engine().context().default_ttl_seconds());

    let response = match policy
        .mint_for_authenticated_caller(resource_id, &caller, ttl)
        .await
    {
        Ok(token) => {
            if let Some(expires) = token.expires_at_utc() {
                eprintln!("[Token expires at {}]", expires.to_rfc3339());
            }
            ApiResponse {
                status: 200,
                body: serde_json::to_value(TokenBody::from(token))?,
            }
        }
        Err(err) => err.into(),
    };

    print_response(&response)
}

/// Verify a token without touching the catalog
fn verify_token(settings: &Settings, token: &str) -> Result<()> {
    let engine = TokenEngine::new(Arc::new(settings.signing_context()?));

    match engine.inspect(token) {
        Ok(verified) => {
            println!("Resource: {}", verified.resource_id);
            println!("Expires:  {}", verified.expires_at);
            Ok(())
        }
        Err(reason) => {
            eprintln!("Invalid token: {}", reason);
            std::process::exit(1);
        }
    }
}

/// Resolve a stream and print the endpoint response
async fn resolve_stream(policy: &StreamPolicy, resource_id: &str, token: &str) -> Result<()> {
    let response = api::stream_endpoint(policy, resource_id, Some(token)).await;
    print_response(&response)
}

/// Run a catalog maintenance command against the file at `path`
async fn run_catalog(command: CatalogCommands, path: &Path) -> Result<()> {
    match command {
        CatalogCommands::Add {
            resource_id,
            direct_url,
            external_id,
            title,
            inactive,
        } => {
            let record = catalog_record(resource_id, direct_url, external_id, title, inactive);
            if let Err(err) = resolve(&record) {
                tracing::warn!(
                    resource_id = %record.id,
                    error = %err,
                    "Resource has no playable URL; the stream endpoint will fail for it"
                );
            }

            let id = record.id.clone();
            let inserted = JsonCatalog::upsert(path, record).await?;
            let action = if inserted { "Inserted" } else { "Updated" };
            println!("{} {} in {}", action, id, path.display());
            Ok(())
        }
    }
}

/// Build a catalog record from command-line fields
fn catalog_record(
    resource_id: String,
    direct_url: Option<String>,
    external_id: Option<String>,
    title: String,
    inactive: bool,
) -> ResourceRecord {
    let mut record = ResourceRecord::new(resource_id).with_title(title);
    if let Some(url) = direct_url {
        record = record.with_direct_url(url);
    }
    if let Some(id) = external_id {
        record = record.with_external_id(id);
    }
    if inactive {
        record = record.inactive();
    }
    record
}

/// Print a response body; non-2xx exits with status 1
fn print_response(response: &ApiResponse) -> Result<()> {
    let body =
        serde_json::to_string_pretty(&response.body).context("Failed to encode response")?;
    println!("{}", body);

    if !response.is_success() {
        eprintln!("[HTTP {}]", response.status);
        std::process::exit(1);
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(settings: &Settings) -> Result<()> {
    let context = settings.signing_context()?;

    println!("playgate configuration");
    println!("======================");
    println!();

    if let Some(ref path) = settings.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!("Config file: (none - using env vars / defaults)");
    }
    println!();

    println!("Signing:");
    println!("  salt:            {}", context.salt());
    println!("  ttl_seconds:     {}", context.default_ttl_seconds());
    println!("  key fingerprint: {}", context.key_fingerprint());
    println!();

    println!("Catalog: {}", settings.catalog.display());

    Ok(())
}
