//! Tree Filter Command Line Interface
//!
//! Renders tree filter markup from a term store document and inspects the
//! clause encoding of query strings.
//!
//! # Usage
//!
//! ```bash
//! # Render head/footer markup for a page
//! tree_filter render --store terms.yaml --query 'clauseSet[0][taxonomy]=tnc_tax_region&clauseSet[0][terms][0]=2'
//!
//! # Decode the clauses of a query string
//! tree_filter clauses --query 'clauseSet[0][taxonomy]=tnc_tax_region&clauseSet[0][terms][0]=2'
//!
//! # Rewrite a query string with a new clause list
//! tree_filter encode --query 'page=2' --clauses '[{"taxonomy":"tnc_tax_region","terms":[2,4]}]'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tree_filter::{InMemoryTermStore, PageContext, PageRenderer, TreeFilterConfig};
use tree_filter_types::{QueryClause, QueryParams};

#[derive(Parser)]
#[command(name = "tree_filter")]
#[command(version = "0.1.0")]
#[command(about = "Render sidebar tree filter markup and inspect taxonomy query clauses")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, short, global = true, env = "TREE_FILTER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page fragments for a request
    Render {
        /// Term store document (.json, .yaml or .yml)
        #[arg(long, short)]
        store: PathBuf,

        /// Request query string
        #[arg(long, short, default_value = "")]
        query: String,

        /// File holding the page content, used for activation signals
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Render as an administrative page
        #[arg(long)]
        admin: bool,

        /// Output format
        #[arg(long, short = 'o', default_value = "html", value_enum)]
        format: OutputFormat,
    },

    /// Decode the taxonomy clauses of a query string
    Clauses {
        #[arg(long, short)]
        query: String,
    },

    /// List the term ids a query string selects for one taxonomy
    Selected {
        #[arg(long, short)]
        taxonomy: String,

        #[arg(long, short)]
        query: String,
    },

    /// Rewrite a query string's clause namespace from a JSON clause list
    Encode {
        #[arg(long, short)]
        query: String,

        /// JSON array of clauses
        #[arg(long)]
        clauses: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tree_filter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TreeFilterConfig::from_file(path)?,
        None => TreeFilterConfig::default(),
    };
    let codec = config.codec()?;

    match cli.command {
        Commands::Render {
            store,
            query,
            content_file,
            admin,
            format,
        } => {
            let store = InMemoryTermStore::from_file(&store)?;
            let content = content_file
                .map(|path| {
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))
                })
                .transpose()?;
            let page = PageContext {
                is_admin: admin,
                content,
            };

            let renderer = PageRenderer::new(store, config)?;
            let Some(rendered) = renderer.render(&page, &QueryParams::parse(&query)) else {
                tracing::info!("tree filter is not active for this page");
                return Ok(());
            };

            match format {
                OutputFormat::Html => {
                    println!("{}", rendered.head);
                    println!("{}", rendered.footer);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&rendered.payload)?);
                }
            }
        }

        Commands::Clauses { query } => {
            let clauses = codec.decode(&QueryParams::parse(&query));
            println!("{}", serde_json::to_string_pretty(&clauses)?);
        }

        Commands::Selected { taxonomy, query } => {
            let selected = codec.selected_terms(&QueryParams::parse(&query), &taxonomy);
            println!("{}", serde_json::to_string(&selected)?);
        }

        Commands::Encode { query, clauses } => {
            let clauses: Vec<QueryClause> =
                serde_json::from_str(&clauses).context("clauses must be a JSON array")?;
            let mut params = QueryParams::parse(&query);
            codec.encode(&mut params, &clauses);
            println!("{}", params.to_query_string());
        }
    }

    Ok(())
}
