//! CLI administration tool for short-links.
//!
//! Inspects links and accounts and checks the database without going through
//! the web pages.
//!
//! # Usage
//!
//! ```bash
//! # List every link, optionally filtered by key, destination or owner
//! cargo run --bin admin -- links list --search docs
//!
//! # List accounts
//! cargo run --bin admin -- users list
//!
//! # Create an account
//! cargo run --bin admin -- users create --username alice --email alice@example.com --phone "+1 555 0100"
//!
//! # View totals
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`

use short_links::application::services::{AuthService, Registration};
use short_links::config::{Config, mask_connection_string};
use short_links::domain::repositories::{ShortLinkRepository, UserRepository};
use short_links::error::AppError;
use short_links::infrastructure::persistence::{
    PgSessionRepository, PgShortLinkRepository, PgUserRepository,
};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing short-links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect short links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Manage accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Show totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List all links with their owners
    List {
        /// Case-insensitive filter on key, destination URL or owner
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List all accounts
    List,

    /// Create an account
    Create {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Optional contact phone, up to 15 characters
        #[arg(long, default_value = "")]
        phone: String,

        /// Optional postal address
        #[arg(long, default_value = "")]
        address: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url().context("Database is not configured")?;
    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", mask_connection_string(&database_url)))?;
    let pool = Arc::new(pool);

    match cli.command {
        Commands::Links { action } => handle_links_action(action, pool).await?,
        Commands::Users { action } => handle_users_action(action, pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_links_action(action: LinksAction, pool: Arc<PgPool>) -> Result<()> {
    let repo = PgShortLinkRepository::new(pool);

    match action {
        LinksAction::List { search } => list_links(&repo, search).await,
    }
}

async fn handle_users_action(action: UsersAction, pool: Arc<PgPool>) -> Result<()> {
    match action {
        UsersAction::List => list_users(&PgUserRepository::new(pool)).await,
        UsersAction::Create {
            username,
            email,
            phone,
            address,
            yes,
        } => {
            let profile = Profile { phone, address };
            create_user(pool, username, email, profile, yes).await
        }
    }
}

/// Lists links with owner, clicks and expiry state.
///
/// # Output Format
///
/// ```text
/// Short links
///
///   ID   Key          Owner          Clicks  Created           Expires           Destination
///   ──────────────────────────────────────────────────────────────────────────────────────────
///   12   c            alice          41      2025-01-15 10:30  never             https://example.com/
/// ```
async fn list_links(repo: &PgShortLinkRepository, search: Option<String>) -> Result<()> {
    println!("{}", "🔗 Short links".bright_blue().bold());
    println!();

    let links = repo
        .list_all(search)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<12} {:<14} {:<7} {:<17} {:<17} {}",
        "ID".bright_white().bold(),
        "Key".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Created".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Destination".bright_white().bold()
    );
    println!("  {}", "─".repeat(110).bright_black());

    let now = Utc::now();
    for (link, owner) in &links {
        let expires = match link.expires_at {
            Some(at) if link.is_expired_at(now) => {
                at.format("%Y-%m-%d %H:%M").to_string().red()
            }
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string().normal(),
            None => "never".bright_black(),
        };

        println!(
            "  {:<5} {:<12} {:<14} {:<7} {:<17} {:<17} {}",
            link.id.to_string().bright_black(),
            link.key.cyan(),
            owner,
            link.clicks.to_string().bright_green(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            expires,
            link.original_url
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn list_users(repo: &PgUserRepository) -> Result<()> {
    println!("{}", "👤 Users".bright_blue().bold());
    println!();

    let users = repo
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

    if users.is_empty() {
        println!("{}", "  No users found".yellow());
        println!();
        println!(
            "  Create one with: {} admin users create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<5} {:<20} {:<30} {:<16} {:<17} {}",
        "ID".bright_white().bold(),
        "Username".bright_white().bold(),
        "Email".bright_white().bold(),
        "Phone".bright_white().bold(),
        "Joined".bright_white().bold(),
        "Address".bright_white().bold()
    );
    println!("  {}", "─".repeat(110).bright_black());

    for user in &users {
        println!(
            "  {:<5} {:<20} {:<30} {:<16} {:<17} {}",
            user.id.to_string().bright_black(),
            user.username.cyan(),
            user.email,
            or_dash(&user.phone),
            user.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            or_dash(&user.address)
        );
    }

    println!();
    println!("  Total: {}", users.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

fn or_dash(value: &str) -> ColoredString {
    if value.is_empty() {
        "-".bright_black()
    } else {
        value.normal()
    }
}

/// Optional contact details stored with an account.
struct Profile {
    phone: String,
    address: String,
}

/// Creates an account with the same rules as the sign-up page.
async fn create_user(
    pool: Arc<PgPool>,
    username: Option<String>,
    email: Option<String>,
    profile: Profile,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "👤 Create user".bright_blue().bold());
    println!();

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Create user '{username}'?"))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    // Registration never touches sessions, so the signing secret is unused.
    let auth = AuthService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgSessionRepository::new(pool)),
        String::new(),
        Duration::zero(),
    );

    let registration = Registration {
        username,
        email,
        password_confirm: password.clone(),
        password,
        phone: profile.phone,
        address: profile.address,
    };

    match auth.register(registration).await {
        Ok(user) => {
            println!();
            println!(
                "{} {}",
                "✅ Created user".green().bold(),
                user.username.cyan()
            );
            println!();
            Ok(())
        }
        Err(AppError::Validation { fields, .. }) => {
            println!();
            for (field, message) in fields.iter() {
                println!("  {} {}", format!("{field}:").red(), message);
            }
            anyhow::bail!("User was not created")
        }
        Err(e) => Err(anyhow::anyhow!("Failed to create user: {}", e)),
    }
}

async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let (links_count, clicks_total): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(clicks), 0)::bigint FROM short_links")
            .fetch_one(pool)
            .await?;

    let expired_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM short_links WHERE expires_at IS NOT NULL AND expires_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    println!(
        "  Users:         {}",
        users_count.to_string().bright_green().bold()
    );
    println!(
        "  Links:         {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Expired links: {}",
        expired_count.to_string().yellow().bold()
    );
    println!(
        "  Clicks:        {}",
        clicks_total.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", applied.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
