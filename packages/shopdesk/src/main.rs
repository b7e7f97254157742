use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

mod api;
mod chat;
mod commands;
mod config;
mod models;

use crate::config::ConsoleConfig;

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "Operator console for the storefront admin API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom config directory (defaults to ~/.shopdesk)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and store a session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// Interactive visitor chat console
    Chat,

    /// Show dashboard counters
    Stats(JsonArgs),

    /// Manage catalog categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage catalog products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Manage storefront reviews
    Reviews {
        #[command(subcommand)]
        command: ReviewCommands,
    },

    /// Inspect and clean up orders
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },
}

#[derive(Parser)]
struct LoginArgs {
    /// Admin login name
    login: String,
}

#[derive(Parser)]
struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    List(JsonArgs),
    /// Create a category
    Create {
        name: String,
        /// Parent category id
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename or re-parent a category
    Update {
        id: String,
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete a category
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List products
    List(JsonArgs),
    /// Create a product
    Create {
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
        /// Category id
        #[arg(long)]
        category: Option<String>,
    },
    /// Update a product
    Update {
        id: String,
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// List reviews
    List(JsonArgs),
    /// Publish a review
    Create {
        content: String,
        #[arg(long, default_value = "5")]
        rating: i32,
        #[arg(long)]
        author: Option<String>,
    },
    /// Delete a review
    Delete { id: String },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// List orders
    List(JsonArgs),
    /// Delete an order
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.debug {
        "shopdesk=debug,chat_sync=debug,info"
    } else {
        "shopdesk=info,chat_sync=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let config = ConsoleConfig::new(cli.config_dir)?;

    match cli.command {
        Commands::Login(args) => commands::login_command(&config, &args.login).await,
        Commands::Logout => commands::logout_command(&config),
        Commands::Chat => chat::chat_command(&config).await,
        Commands::Stats(args) => commands::stats_command(&config, args.json).await,
        Commands::Categories { command } => match command {
            CategoryCommands::List(args) => {
                commands::categories_list_command(&config, args.json).await
            }
            CategoryCommands::Create { name, parent } => {
                commands::category_create_command(&config, name, parent).await
            }
            CategoryCommands::Update { id, name, parent } => {
                commands::category_update_command(&config, &id, name, parent).await
            }
            CategoryCommands::Delete { id } => {
                commands::category_delete_command(&config, &id).await
            }
        },
        Commands::Products { command } => match command {
            ProductCommands::List(args) => {
                commands::products_list_command(&config, args.json).await
            }
            ProductCommands::Create {
                name,
                price,
                description,
                category,
            } => commands::product_create_command(&config, name, price, description, category).await,
            ProductCommands::Update {
                id,
                name,
                price,
                description,
                category,
            } => {
                commands::product_update_command(&config, &id, name, price, description, category)
                    .await
            }
            ProductCommands::Delete { id } => commands::product_delete_command(&config, &id).await,
        },
        Commands::Reviews { command } => match command {
            ReviewCommands::List(args) => commands::reviews_list_command(&config, args.json).await,
            ReviewCommands::Create {
                content,
                rating,
                author,
            } => commands::review_create_command(&config, content, rating, author).await,
            ReviewCommands::Delete { id } => commands::review_delete_command(&config, &id).await,
        },
        Commands::Orders { command } => match command {
            OrderCommands::List(args) => commands::orders_list_command(&config, args.json).await,
            OrderCommands::Delete { id } => commands::order_delete_command(&config, &id).await,
        },
    }
}
