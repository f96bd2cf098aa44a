//! Vessel CLI - render templated application config and manage redactors

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vessel_kube::RedactUpdate;

mod commands;
mod error;
mod exit_codes;

use commands::render::OutputFormat;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "vessel")]
#[command(author = "Vessel Contributors")]
#[command(version)]
#[command(about = "Render templated application config and manage support-bundle redactors", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every config item in dependency order and print the result
    Render {
        /// Config schema file
        config: PathBuf,

        /// ConfigValues file applied before rendering
        #[arg(short = 'f', long = "values")]
        values: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        output: OutputFormat,

        /// Render references to undefined variables as empty strings
        #[arg(long)]
        lenient: bool,

        /// Print the resolution batches to stderr
        #[arg(long)]
        show_batches: bool,
    },

    /// Show the dependency graph between config items
    Graph {
        /// Config schema file
        config: PathBuf,

        /// ConfigValues file applied before discovery
        #[arg(short = 'f', long = "values")]
        values: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage support-bundle redaction rules
    Redact {
        #[command(flatten)]
        store: StoreArgs,

        #[command(subcommand)]
        command: RedactCommands,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Namespace holding the redactor ConfigMap
    #[arg(short, long, env = "POD_NAMESPACE", default_value = "default", global = true)]
    namespace: String,

    /// Keep redactors in a local JSON file instead of a ConfigMap
    #[arg(long, global = true)]
    store_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum RedactCommands {
    /// List stored redactors
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one redactor's rule as YAML
    Get {
        /// Redactor slug
        slug: String,
    },

    /// Create or update a redactor from a YAML rule file
    Set {
        /// Rule file
        file: PathBuf,

        /// Display name (overrides the name in the file)
        #[arg(long, default_value = "")]
        name: String,

        /// Slug of the redactor to update
        #[arg(long, default_value = "")]
        slug: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Store the redactor disabled
        #[arg(long)]
        disabled: bool,

        /// Always create a new redactor
        #[arg(long)]
        new: bool,
    },

    /// Delete a redactor
    Delete {
        /// Redactor slug
        slug: String,
    },

    /// Print the combined redactor document
    Spec {
        /// Replace rules from a combined document instead
        #[arg(long)]
        set: Option<PathBuf>,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            config,
            values,
            output,
            lenient,
            show_batches,
        } => commands::render::run(&config, values.as_deref(), output, !lenient, show_batches),

        Commands::Graph {
            config,
            values,
            json,
        } => commands::graph::run(&config, values.as_deref(), json),

        Commands::Redact { store, command } => {
            let service =
                commands::redact::open_service(&store.namespace, store.store_file.as_deref())
                    .await?;

            match command {
                RedactCommands::List { json } => commands::redact::list(&service, json).await,
                RedactCommands::Get { slug } => commands::redact::get(&service, &slug).await,
                RedactCommands::Set {
                    file,
                    name,
                    slug,
                    description,
                    disabled,
                    new,
                } => {
                    if slug.is_empty() && !new {
                        return Err(CliError::validation_with_help(
                            "--slug is required unless --new is given",
                            "pass --new to create a redactor",
                        ));
                    }
                    let update = RedactUpdate {
                        name,
                        slug,
                        description,
                        enabled: !disabled,
                        is_new: new,
                    };
                    commands::redact::set(&service, &file, update).await
                }
                RedactCommands::Delete { slug } => {
                    commands::redact::delete(&service, &slug).await
                }
                RedactCommands::Spec { set } => {
                    commands::redact::spec(&service, set.as_deref()).await
                }
            }
        }
    }
}
