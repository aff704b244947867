//! Folio CLI - post version history

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_core::config::Config;
use folio_core::storage::Database;
use folio_core::{Content, ContentRepository, Error, Version, VersionService};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Post version history for the Folio blog platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Database file (overrides FOLIO_DATABASE and the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage posts
    Posts {
        #[command(subcommand)]
        action: PostAction,
    },

    /// Inspect, compare, restore and prune post versions
    Versions {
        #[command(subcommand)]
        action: VersionAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum PostAction {
    /// Create a post and record its first version
    New {
        title: String,
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,
        /// Read the body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    /// List posts, most recently updated first
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a post's live content
    Show { id: Uuid },
    /// Edit a post and record the edit as a new version
    Edit {
        id: Uuid,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,
        /// Read the body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// List a post's versions, newest first
    List { post_id: Uuid },
    /// Show one version
    Show { post_id: Uuid, number: i64 },
    /// Compare two versions by number
    Diff { post_id: Uuid, from: i64, to: i64 },
    /// Restore a version onto the live post (recorded as a new version)
    Restore { post_id: Uuid, version_id: Uuid },
    /// Delete all but the newest versions
    Prune {
        post_id: Uuid,
        /// Versions to keep (defaults to versioning.keep_count)
        #[arg(short, long)]
        keep: Option<usize>,
    },
    /// Show version count and range
    Stats { post_id: Uuid },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `--format json` output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("folio=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        report_error(&err);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Posts { action } => {
            let (db, service) = open_service(cli.database.as_deref()).await?;
            let result = cmd_posts(&service, action, out).await;
            db.close().await;
            result
        }

        Commands::Versions { action } => {
            let (db, service) = open_service(cli.database.as_deref()).await?;
            let result = cmd_versions(&service, action, out).await;
            db.close().await;
            result
        }

        Commands::Config { action } => cmd_config(action, out),

        Commands::Doctor => cmd_doctor(cli.database.as_deref(), out).await,
    }
}

/// Print an error with its code and, when there is one, a suggestion
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<Error>() {
        Some(folio_err) => {
            eprintln!("Error [{}]: {}", folio_err.code(), folio_err);
            if let Some(suggestion) = folio_err.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

fn resolve_database_path(config: &Config, cli_database: Option<&Path>) -> PathBuf {
    cli_database
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.database_path())
}

async fn open_service(cli_database: Option<&Path>) -> anyhow::Result<(Database, VersionService)> {
    let config = Config::load()?;
    let path = resolve_database_path(&config, cli_database);
    debug!(path = %path.display(), "Opening database");

    let db = Database::open(&path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    let service = VersionService::new(db.pool().clone()).with_config(config.versioning);
    Ok((db, service))
}

/// Body from `--body` or `--body-file`, if either was given
fn read_body(body: Option<String>, body_file: Option<PathBuf>) -> anyhow::Result<Option<String>> {
    match (body, body_file) {
        (Some(body), _) => Ok(Some(body)),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read body file: {}", path.display())),
        (None, None) => Ok(None),
    }
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_posts(service: &VersionService, action: PostAction, out: Output) -> anyhow::Result<()> {
    let posts = ContentRepository::new(service.pool().clone());

    match action {
        PostAction::New {
            title,
            body,
            body_file,
        } => {
            let body = read_body(body, body_file)?.unwrap_or_default();
            let (post, version) = service.create_content(title, body).await?;

            if out.json() {
                out.print_json(&post)?;
            } else if out.quiet {
                println!("{}", post.id);
            } else {
                println!("Post created successfully!");
                println!("  ID: {}", post.id);
                println!("  Title: {}", post.title);
                println!("  Version: {}", version.version);
            }
        }
        PostAction::List { limit } => {
            let all = posts.list(limit).await?;
            if out.json() {
                out.print_json(&all)?;
            } else if all.is_empty() {
                if !out.quiet {
                    println!("No posts found.");
                    println!("\nCreate one with: folio posts new <title> --body <text>");
                }
            } else {
                if !out.quiet {
                    println!("Posts:");
                }
                for p in all {
                    println!(
                        "  {} - {} (updated {})",
                        p.id,
                        p.title,
                        p.updated_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
        PostAction::Show { id } => {
            let post = posts.get(id).await?.ok_or(Error::ContentNotFound(id))?;
            if out.json() {
                out.print_json(&post)?;
            } else {
                print_post(&post, out.quiet);
            }
        }
        PostAction::Edit {
            id,
            title,
            body,
            body_file,
        } => {
            let body = read_body(body, body_file)?;
            if title.is_none() && body.is_none() {
                return Err(Error::InvalidInput(
                    "nothing to change; pass --title, --body or --body-file".to_string(),
                )
                .into());
            }

            let (post, version) = service.record_partial_edit(id, title, body).await?;

            if out.json() {
                out.print_json(&version)?;
            } else if !out.quiet {
                println!("Post '{}' updated.", post.title);
                println!("  Recorded as version {}", version.version);
            }
        }
    }

    Ok(())
}

fn print_post(post: &Content, quiet: bool) {
    if quiet {
        println!("{}", post.body);
        return;
    }
    println!("Post: {}", post.title);
    println!("  ID: {}", post.id);
    println!("  Created: {}", post.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated: {}", post.updated_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{}", post.body);
}

fn print_version(version: &Version, quiet: bool) {
    if quiet {
        println!("{}", version.body);
        return;
    }
    println!("Version {} of post {}", version.version, version.content_id);
    println!("  ID: {}", version.id);
    println!("  Title: {}", version.title);
    println!("  Created: {}", version.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{}", version.body);
}

async fn cmd_versions(
    service: &VersionService,
    action: VersionAction,
    out: Output,
) -> anyhow::Result<()> {
    match action {
        VersionAction::List { post_id } => {
            let versions = service.list_versions(post_id).await?;
            if out.json() {
                out.print_json(&versions)?;
            } else if versions.is_empty() {
                if !out.quiet {
                    println!("No versions found for post {}.", post_id);
                }
            } else {
                if !out.quiet {
                    println!("Versions (newest first):");
                }
                for v in versions {
                    println!(
                        "  v{:<4} {}  {}  {}",
                        v.version,
                        v.id,
                        v.created_at.format("%Y-%m-%d %H:%M:%S"),
                        v.title
                    );
                }
            }
        }
        VersionAction::Show { post_id, number } => {
            let version = service.get_version(post_id, number).await?;
            if out.json() {
                out.print_json(&version)?;
            } else {
                print_version(&version, out.quiet);
            }
        }
        VersionAction::Diff { post_id, from, to } => {
            let diff = service.compare_versions(post_id, from, to).await?;
            if out.json() {
                out.print_json(&diff)?;
            } else if out.quiet {
                println!("{}", diff.summary);
            } else {
                println!("Comparing version {} -> {}", diff.from_version, diff.to_version);
                println!("  Title changed: {}", if diff.title_changed { "yes" } else { "no" });
                println!("  Lines added: {}", diff.added);
                println!("  Lines removed: {}", diff.removed);
                println!("  Summary: {}", diff.summary);
            }
        }
        VersionAction::Restore {
            post_id,
            version_id,
        } => {
            let result = service.restore(post_id, version_id).await?;
            if out.json() {
                out.print_json(&result)?;
            } else if !out.quiet {
                println!("{}", result.summary());
                println!("  New version ID: {}", short_id(&result.version.id));
            }
        }
        VersionAction::Prune { post_id, keep } => {
            let keep_count = keep.unwrap_or(service.config().keep_count);
            let deleted = service.clean_old_versions(post_id, Some(keep_count)).await?;
            if out.json() {
                out.print_json(&serde_json::json!({
                    "content_id": post_id,
                    "keep_count": keep_count,
                    "deleted": deleted,
                }))?;
            } else if !out.quiet {
                println!(
                    "Deleted {} version(s); keeping the newest {}.",
                    deleted, keep_count
                );
            }
        }
        VersionAction::Stats { post_id } => {
            let stats = service.version_stats(post_id).await?;
            if out.json() {
                out.print_json(&stats)?;
            } else {
                println!("Version statistics for post {}", post_id);
                println!("  Stored versions: {}", stats.total_count);
                if let (Some(oldest), Some(newest)) = (stats.oldest_version, stats.newest_version) {
                    println!("  Range: v{} .. v{}", oldest, newest);
                    println!("  Pruned: {}", newest - stats.total_count as i64);
                }
                if let Some(at) = stats.newest_created_at {
                    println!("  Last recorded: {}", at.format("%Y-%m-%d %H:%M:%S"));
                }
            }
        }
    }

    Ok(())
}

fn cmd_config(action: ConfigAction, out: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !out.quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if out.json() {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
                    .collect();
                out.print_json(&map)?;
            } else {
                for (key, value) in items {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !out.quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(cli_database: Option<&Path>, out: Output) -> anyhow::Result<()> {
    let quiet = out.quiet;
    if !quiet {
        println!("Folio Health Check");
        println!("==================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {:#}", e);
            }
            Config::default()
        }
    };

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    // Check database
    let path = resolve_database_path(&config, cli_database);
    match Database::open(&path).await {
        Ok(db) => {
            match db.health_check().await {
                Ok(()) => {
                    if !quiet {
                        println!("[OK] Database: {}", path.display());
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Database: {:#}", e);
                    }
                }
            }

            match db.migration_status().await {
                Ok(status) if !status.needs_migration => {
                    if !quiet {
                        println!("[OK] Schema: version {}", status.current_version);
                    }
                }
                Ok(status) => {
                    all_ok = false;
                    if !quiet {
                        println!(
                            "[!!] Schema: version {} (expected {})",
                            status.current_version, status.target_version
                        );
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Schema: Error - {:#}", e);
                    }
                }
            }
            db.close().await;
        }
        Err(e) => {
            all_ok = false;
            warn!(path = %path.display(), error = %e, "Database unavailable");
            if !quiet {
                println!("[!!] Database: {} - {:#}", path.display(), e);
            }
        }
    }

    if !quiet {
        println!(
            "[--] Retention: keep {} versions per post (auto prune: {})",
            config.versioning.keep_count,
            if config.versioning.auto_prune { "on" } else { "off" }
        );
        println!();
        if all_ok {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    if all_ok {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Health check failed"))
    }
}

#[cfg(test)]
mod main_tests;
