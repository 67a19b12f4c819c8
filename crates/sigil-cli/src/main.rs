//! Sigil CLI
//!
//! Entry point for the registry backend: serve the HTTP API, apply the
//! database schema, or bootstrap the first superadmin account.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use sigil_api::{AppState, Server};
use sigil_auth::token::DEFAULT_INVITE_TTL_HOURS;
use sigil_auth::{hash_password, TokenSigner};
use sigil_core::types::Role;
use sigil_core::util::validate;
use sigil_store::{NewUser, PgStore, Store};

/// Sigil - digital ID registry backend
#[derive(Parser, Debug)]
#[command(name = "sigil", version, about = "Sigil digital ID registry backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "SIGIL_LISTEN", default_value = "0.0.0.0:3001")]
        listen: SocketAddr,

        /// PostgreSQL connection URL.
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        /// Secret for signing access and invite tokens.
        #[arg(long, env = "SIGIL_JWT_SECRET")]
        jwt_secret: String,

        /// Access-token lifetime in hours.
        #[arg(long, env = "SIGIL_TOKEN_TTL_HOURS", default_value_t = 8)]
        token_ttl_hours: i64,
    },

    /// Apply the database schema, then exit.
    InitDb {
        /// PostgreSQL connection URL.
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },

    /// Create the first superadmin account.
    ///
    /// Refuses to run once any superadmin exists; later admins arrive
    /// through the invitation flow.
    Bootstrap {
        /// PostgreSQL connection URL.
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        /// Superadmin login email.
        #[arg(long)]
        email: String,

        /// Superadmin password.
        #[arg(long)]
        password: String,

        /// Optional display name.
        #[arg(long)]
        full_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            listen,
            database_url,
            jwt_secret,
            token_ttl_hours,
        } => serve(listen, &database_url, &jwt_secret, token_ttl_hours).await,
        Command::InitDb { database_url } => init_db(&database_url).await,
        Command::Bootstrap {
            database_url,
            email,
            password,
            full_name,
        } => bootstrap(&database_url, &email, &password, full_name).await,
    }
}

async fn connect(database_url: &str) -> Result<PgStore> {
    let store = PgStore::connect(database_url)
        .await
        .context("failed to connect to the database")?;
    store
        .run_migrations()
        .await
        .context("failed to apply the database schema")?;
    Ok(store)
}

async fn serve(
    listen: SocketAddr,
    database_url: &str,
    jwt_secret: &str,
    token_ttl_hours: i64,
) -> Result<()> {
    let store = connect(database_url).await?;
    let signer = TokenSigner::with_ttls(jwt_secret, token_ttl_hours, DEFAULT_INVITE_TTL_HOURS);
    let state = AppState::new(Arc::new(store), signer);

    tracing::info!(%listen, "starting sigil-api");
    Server::new(listen, state)
        .run()
        .await
        .context("server exited with an error")
}

async fn init_db(database_url: &str) -> Result<()> {
    connect(database_url).await?;
    tracing::info!("database schema is up to date");
    Ok(())
}

async fn bootstrap(
    database_url: &str,
    email: &str,
    password: &str,
    full_name: Option<String>,
) -> Result<()> {
    let email = sigil_core::normalize_email(email);
    validate::validate_email(&email)?;
    validate::validate_password(password)?;

    let store = connect(database_url).await?;
    if store.superadmin_exists().await? {
        bail!("a superadmin already exists; use the invitation flow for further accounts");
    }

    let user = store
        .create_user(NewUser {
            email,
            password_hash: hash_password(password)?,
            full_name,
            role: Role::Superadmin,
            is_invited: false,
            invited_by: None,
        })
        .await?;

    tracing::info!(id = %user.id, email = %user.email, "superadmin created");
    println!("superadmin {} created (id {})", user.email, user.id);
    Ok(())
}
