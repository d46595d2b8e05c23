//! CLI entry point for folio

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Serve Markdown posts as a blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to the configured address)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// List posts, newest first
    List,

    /// Print the rendered HTML of a post
    Show {
        /// Slug of the post (file name without .md)
        slug: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = folio::Folio::new(&base_dir)?;
            let ip = ip.unwrap_or_else(|| site.config.ip.clone());
            let port = port.unwrap_or(site.config.port);

            tracing::info!("Serving posts from {:?}", site.content_dir);
            folio::server::start(&site, &ip, port).await?;
        }

        Commands::List => {
            let site = folio::Folio::new(&base_dir)?;
            folio::commands::list::run(&site)?;
        }

        Commands::Show { slug } => {
            let site = folio::Folio::new(&base_dir)?;
            folio::commands::show::run(&site, &slug)?;
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
