//! dfq: Document Filter Query - CLI for building filters and querying a local store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dfq")]
#[command(about = "Document Filter Query - build filter documents and run them against a local store")]
#[command(version)]
struct Cli {
    /// Store root (default: $DOCFILTER_ROOT or the platform data dir)
    #[arg(short = 'r', long = "root", global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the filter document for an expression
    #[command(visible_alias = "f")]
    Filter {
        /// Filter expression (e.g., 'age>=18 tags:all=[a,b] scores{>=80 <90}')
        expr: String,

        /// Print each condition's wire encoding instead
        #[arg(short = 'w', long = "wire")]
        wire: bool,
    },

    /// Insert documents (JSON object, JSON array, or JSON lines)
    #[command(visible_alias = "i")]
    Insert {
        /// Collection name
        collection: String,

        /// File to read documents from (reads stdin if not provided)
        file: Option<PathBuf>,
    },

    /// Find documents matching an expression
    #[command(visible_aliases = ["q", "query"])]
    Find {
        /// Collection name
        collection: String,

        /// Filter expression (matches everything when omitted)
        #[arg(default_value = "")]
        expr: String,

        /// Comma separated fields to return
        #[arg(short = 'f', long = "fields", value_delimiter = ',')]
        fields: Vec<String>,

        /// Sort spec, e.g. 'name,-age'
        #[arg(short = 's', long = "sort")]
        sort: Option<String>,

        /// Skip the first N matches
        #[arg(long = "skip", default_value = "0")]
        skip: usize,

        /// Return at most N documents
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,

        /// Return only the first match
        #[arg(long = "one", conflicts_with_all = ["sort", "skip", "limit"])]
        one: bool,
    },

    /// Count documents matching an expression
    #[command(visible_alias = "c")]
    Count {
        /// Collection name
        collection: String,

        /// Filter expression (matches everything when omitted)
        #[arg(default_value = "")]
        expr: String,
    },

    /// Set fields on documents matching an expression
    Update {
        /// Collection name
        collection: String,

        /// Filter expression
        expr: String,

        /// JSON object of fields to set
        #[arg(long = "set", required = true)]
        set: String,
    },

    /// Delete documents matching an expression
    Delete {
        /// Collection name
        collection: String,

        /// Filter expression
        expr: String,
    },

    /// Show the configuration
    Config {
        /// Write the configuration file if it does not exist
        #[arg(long = "init")]
        init: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let root = cli.root.as_deref();

    let result = match cli.command {
        Commands::Filter { expr, wire } => commands::filter(&expr, wire),
        Commands::Insert { collection, file } => {
            commands::insert(root, &collection, file.as_deref())
        }
        Commands::Find { collection, expr, fields, sort, skip, limit, one } => {
            let opts = commands::FindArgs {
                fields,
                sort,
                skip,
                limit,
                one,
            };
            commands::find(root, &collection, &expr, &opts)
        }
        Commands::Count { collection, expr } => commands::count(root, &collection, &expr),
        Commands::Update { collection, expr, set } => {
            commands::update(root, &collection, &expr, &set)
        }
        Commands::Delete { collection, expr } => commands::delete(root, &collection, &expr),
        Commands::Config { init } => commands::config(root, init),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
