//! Command line interface: run the server, migrate, create a superuser

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::{
    api, db,
    models::user::{CreateUser, Role},
    AppConfig, AppState,
};

#[derive(Parser)]
#[command(name = "library-catalog")]
#[command(about = "Library catalog server and administration tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Create a superuser account
    CreateSuperuser {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: Option<String>,
        /// Password; read from the environment when not given
        #[arg(short, long, env = "LIBRARY_SUPERUSER_PASSWORD")]
        password: String,
        /// Role used by the page gates
        #[arg(short, long, default_value = "Admin")]
        role: Role,
    },
}

impl Cli {
    pub async fn run(self, config: AppConfig) -> Result<()> {
        match self.command.unwrap_or(Commands::Serve) {
            Commands::Serve => serve(config).await,
            Commands::Migrate => {
                let pool = db::connect(&config.database).await?;
                db::migrate(&pool).await?;
                Ok(())
            }
            Commands::CreateSuperuser {
                username,
                email,
                password,
                role,
            } => create_superuser(config, username, email, password, role).await,
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let pool = db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::migrate(&pool)
        .await
        .context("Failed to run database migrations")?;

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .context("Failed to create media root")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let app = api::create_router(AppState::new(config, pool));

    tracing::info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_superuser(
    config: AppConfig,
    username: String,
    email: Option<String>,
    password: String,
    role: Role,
) -> Result<()> {
    let pool = db::connect(&config.database).await?;
    db::migrate(&pool).await?;

    let state = AppState::new(config, pool);
    let user = state
        .services
        .users
        .create_superuser(CreateUser {
            username,
            email,
            password: Some(password),
            role: Some(role),
            ..CreateUser::default()
        })
        .await?;

    tracing::info!(user_id = user.id, "Superuser created");
    println!("Superuser {} created", user);
    Ok(())
}
