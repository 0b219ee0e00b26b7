//! armonik: administration CLI for ArmoniK clusters.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod logger;

#[derive(Parser)]
#[command(name = "armonik")]
#[command(about = "ArmoniK administration CLI")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Config file (overrides ARMONIK_CLI_CONFIG)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a filter expression and print the API filter
    Filter {
        /// Resource type: session, task, result or partition
        resource: String,

        /// Filter expression, e.g. "status = running and created_at > 2024-01-01"
        expression: String,

        /// Output format: json, yaml, table or text (default from config)
        #[arg(short = 'f', long = "format")]
        format: Option<String>,
    },

    /// Print the filter grammar of a resource type
    Grammar {
        /// Resource type: session, task, result or partition
        resource: String,
    },

    /// List the filterable fields of a resource type
    Fields {
        /// Resource type: session, task, result or partition
        resource: String,

        /// Output format: table, json or yaml
        #[arg(short = 'f', long = "format", default_value = "table")]
        format: String,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the config file location and contents
    Show,

    /// List all keys with their values
    List,

    /// Print the value of a key
    Get {
        /// Config key (endpoint, output)
        key: String,
    },

    /// Set the value of a key
    Set {
        /// Config key (endpoint, output)
        key: String,

        /// New value (an empty endpoint unsets it)
        value: String,
    },
}

/// Process exit status for each error kind.
fn exit_code(err: &akf::Error) -> i32 {
    use akf::Error;
    match err {
        Error::UnknownResourceType(_) => 2,
        Error::Syntax(_) => 3,
        Error::UnknownField(_) => 4,
        Error::InvalidLiteral { .. } => 5,
        Error::TooManyClauses { .. } => 6,
        Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Yaml(_) => 1,
        Error::UnsupportedFieldKind { .. }
        | Error::UnsupportedOperator { .. }
        | Error::NotNegatable(_) => 70,
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.debug);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Filter { resource, expression, format } => {
            commands::filter(config, &resource, &expression, format.as_deref())
        }
        Commands::Grammar { resource } => commands::grammar(&resource),
        Commands::Fields { resource, format } => commands::fields(&resource, &format),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(config),
            ConfigAction::List => commands::config_list(config),
            ConfigAction::Get { key } => commands::config_get(config, &key),
            ConfigAction::Set { key, value } => commands::config_set(config, &key, &value),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}
