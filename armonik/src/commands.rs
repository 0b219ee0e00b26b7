//! CLI command implementations.

use std::path::Path;

use akf::{Config, FType, FilterCompiler, OutputFormat, Predicate};
use log::debug;
use serde::Serialize;

fn load_config(path: Option<&Path>) -> akf::Result<Config> {
    let path = Config::locate(path)?;
    debug!("Loading config from {}", path.display());
    Config::load_from(&path)
}

/// Compile a filter and print it in the requested format.
pub fn filter(
    config_path: Option<&Path>,
    resource: &str,
    expression: &str,
    format: Option<&str>,
) -> akf::Result<()> {
    let compiler = FilterCompiler::compile(resource)?;
    let predicate = compiler.parse(expression)?;
    debug!("Compiled {} conditions for {}", predicate.len(), compiler.resource());

    let format = match format {
        Some(format) => format.parse()?,
        None => load_config(config_path)?.output,
    };
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&predicate.wire()?)?);
        }
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&predicate.wire()?)?),
        OutputFormat::Table => print_clauses(&predicate)?,
        OutputFormat::Text => println!("{}", predicate),
    }
    Ok(())
}

/// One row per condition, grouped by OR-clause.
fn print_clauses(predicate: &Predicate) -> akf::Result<()> {
    let clauses = predicate.to_disjunctive()?;
    println!("{:<7} {:<28} {:<12} VALUE", "CLAUSE", "FIELD", "OPERATOR");
    println!("{}", "-".repeat(72));
    for (i, clause) in clauses.iter().enumerate() {
        for condition in clause {
            println!(
                "{:<7} {:<28} {:<12} {}",
                i + 1,
                condition.field.to_string(),
                condition.op.symbol(),
                condition.value
            );
        }
    }
    Ok(())
}

pub fn grammar(resource: &str) -> akf::Result<()> {
    let compiler = FilterCompiler::compile(resource)?;
    print!("{}", compiler.grammar().render());
    Ok(())
}

#[derive(Serialize)]
struct FieldRow {
    name: String,
    kind: FType,
    operators: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
}

/// List filterable fields with their kinds and comparators.
pub fn fields(resource: &str, format: &str) -> akf::Result<()> {
    let compiler = FilterCompiler::compile(resource)?;
    let grammar = compiler.grammar();
    let statuses: Vec<String> = grammar
        .statuses()
        .iter()
        .map(|s| s.to_ascii_lowercase())
        .collect();

    let rows: Vec<FieldRow> = grammar
        .productions()
        .iter()
        .map(|p| FieldRow {
            name: if p.keyed {
                format!("{}.<key>", p.field)
            } else {
                p.field.to_string()
            },
            kind: p.kind,
            operators: p.comparators.ops().iter().map(|op| op.symbol()).collect(),
            values: if p.kind == FType::Status {
                statuses.clone()
            } else {
                Vec::new()
            },
        })
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        "yaml" | "yml" => print!("{}", serde_yaml_ng::to_string(&rows)?),
        "table" | "text" => {
            println!("{:<28} {:<10} OPERATORS", "FIELD", "KIND");
            println!("{}", "-".repeat(72));
            for row in &rows {
                println!("{:<28} {:<10} {}", row.name, row.kind.to_string(), row.operators.join(" "));
            }
            if !statuses.is_empty() {
                println!();
                println!("Status values: {}", statuses.join(", "));
            }
        }
        other => {
            return Err(akf::Error::Config(format!(
                "Unknown output format '{}' (expected table, json or yaml)",
                other
            )))
        }
    }
    Ok(())
}

pub fn config_show(config_path: Option<&Path>) -> akf::Result<()> {
    let config = load_config(config_path)?;
    let state = if config.path().exists() { "" } else { " (not created yet)" };
    println!("Config file: {}{}", config.path().display(), state);
    for (key, value) in config.entries() {
        println!("  {:<10} {}", key, value);
    }
    Ok(())
}

pub fn config_list(config_path: Option<&Path>) -> akf::Result<()> {
    let config = load_config(config_path)?;
    for (key, value) in config.entries() {
        println!("{}={}", key, value);
    }
    Ok(())
}

pub fn config_get(config_path: Option<&Path>, key: &str) -> akf::Result<()> {
    let config = load_config(config_path)?;
    println!("{}", config.get(key)?);
    Ok(())
}

pub fn config_set(config_path: Option<&Path>, key: &str, value: &str) -> akf::Result<()> {
    let mut config = load_config(config_path)?;
    config.set(key, value)?;
    config.save()?;
    debug!("Saved config to {}", config.path().display());
    println!("{} = {}", key, config.get(key)?);
    Ok(())
}

