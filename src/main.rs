//! CLI entry point for folio-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_rs::commands::show::ShowFormat;

#[derive(Parser)]
#[command(name = "folio-rs")]
#[command(author = "Vineet Singh")]
#[command(version = "0.1.0")]
#[command(about = "Markdown blog pipeline with frontmatter posts and inline footnotes", long_about = None)]
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
    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// File name (without .md); defaults to the slugified title
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Build,

    /// Build, then serve the site with live reload
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Clean the public folder
    Clean,

    /// List posts, newest first
    List {
        /// Only posts with this tag (case-insensitive)
        #[arg(short, long)]
        tag: Option<String>,

        /// Only posts whose title or tags contain this text
        #[arg(short, long)]
        query: Option<String>,
    },

    /// List tags with post counts
    Tags,

    /// Show a single post
    Show {
        /// Post slug (file name without .md)
        slug: String,

        /// Print the post and its rendered document as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,

        /// Print the rendered HTML fragment
        #[arg(long)]
        html: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio_rs=debug,info"
    } else {
        "folio_rs=info"
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
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::New { title, slug } => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            folio.new_post(&title, slug.as_deref())?;
        }

        Commands::Build => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            tracing::info!("Generating static files...");
            folio.build().await?;
            println!("Generated successfully!");
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            let folio = folio_rs::Folio::new(&base_dir)?;

            // Generate first
            tracing::info!("Generating static files...");
            let repo = folio.build().await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio_rs::server::start(&folio, repo, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            folio.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { tag, query } => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            folio_rs::commands::list::run(&folio, tag.as_deref(), query.as_deref()).await?;
        }

        Commands::Tags => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            folio_rs::commands::tags::run(&folio).await?;
        }

        Commands::Show { slug, json, html } => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            let format = if json {
                ShowFormat::Json
            } else if html {
                ShowFormat::Html
            } else {
                ShowFormat::Text
            };
            folio_rs::commands::show::run(&folio, &slug, format).await?;
        }

        Commands::Version => {
            println!("folio-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
