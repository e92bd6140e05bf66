//! feedme CLI - dashboards for admins, providers and customers.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is kept in FEEDME_SESSION_FILE)
//! feedme login -e provider@example.com
//!
//! # Provider dashboard
//! feedme orders list --search pasta
//! feedme orders stage 64f1c0 approved -m "Kitchen accepted"
//! feedme orders delete 64f1c0
//!
//! # Meal discovery
//! feedme meals --category Lunch --preference vegan --page 2
//!
//! # Admin overview
//! feedme stats
//! ```
//!
//! # Environment Variables
//!
//! - `FEEDME_API_URL` - Backend base URL
//! - `FEEDME_DIRECT_API_URL` - Base URL for direct calls (defaults to `FEEDME_API_URL`)
//! - `FEEDME_SESSION_FILE` - Session file path
//! - `FEEDME_PASSWORD` - Password for `login` when `--password` is not given
//! - `FEEDME_LOG_JSON` - Emit JSON logs when set
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Context, blogs, meals, newsletter, orders, reviews};

#[derive(Parser)]
#[command(name = "feedme")]
#[command(about = "feedme meal platform CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "FEEDME_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Provider order dashboard
    Orders {
        #[command(subcommand)]
        action: orders::OrdersAction,
    },

    /// Browse meals
    Meals(meals::MealsArgs),

    /// Meal reviews
    Reviews {
        #[command(subcommand)]
        action: reviews::ReviewsAction,
    },

    /// Blog posts
    Blogs {
        #[command(subcommand)]
        action: blogs::BlogsAction,
    },

    /// Newsletter subscriptions
    Newsletter {
        #[command(subcommand)]
        action: newsletter::NewsletterAction,
    },

    /// Admin overview: users, order volume and recent orders
    Stats {
        /// Number of recent orders to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before the log filter is read
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "feedme_client=info,feedme_cli=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var_os("FEEDME_LOG_JSON").is_some() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, password).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx)?,
        Commands::Orders { action } => orders::run(&ctx, action).await?,
        Commands::Meals(args) => meals::run(&ctx, &args).await?,
        Commands::Reviews { action } => reviews::run(&ctx, action).await?,
        Commands::Blogs { action } => blogs::run(&ctx, action).await?,
        Commands::Newsletter { action } => newsletter::run(&ctx, action).await?,
        Commands::Stats { limit } => commands::stats::run(&ctx, limit).await?,
    }

    Ok(())
}
