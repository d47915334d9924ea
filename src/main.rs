//! samyama-sparql: evaluate a SPARQL expression tree over JSON solutions
//!
//! ```text
//! samyama-sparql eval --expr expr.json --bindings rows.json --group-by k
//! ```
//!
//! `expr.json` holds one expression tree. `rows.json` holds an array of
//! objects mapping variable names to terms in the compact syntax, e.g.
//! `[{"k": "\"a\"", "v": "10"}]`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use samyama_sparql::sparql::{Bindings, ExprValue, Expression, SparqlEngine};
use samyama_sparql::EngineConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "samyama-sparql", version, about = "SPARQL expression evaluator")]
struct Cli {
    /// YAML engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against every solution (or group)
    Eval {
        /// JSON file with the expression tree
        #[arg(long)]
        expr: PathBuf,

        /// JSON file with the input solutions
        #[arg(long)]
        bindings: PathBuf,

        /// Group by these variables before evaluating
        #[arg(long = "group-by")]
        group_by: Vec<String>,

        /// Bind the result to this variable and print whole solutions
        #[arg(long)]
        bind: Option<String>,

        /// Group the whole input even without --group-by
        #[arg(long)]
        aggregate: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("invalid log level {}", config.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let engine = SparqlEngine::with_config(config);

    match cli.command {
        Commands::Eval {
            expr,
            bindings,
            group_by,
            bind,
            aggregate,
        } => run_eval(&engine, &expr, &bindings, &group_by, bind.as_deref(), aggregate, &cli.format),
    }
}

fn run_eval(
    engine: &SparqlEngine,
    expr_path: &Path,
    bindings_path: &Path,
    group_by: &[String],
    bind: Option<&str>,
    aggregate: bool,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let expr_json = std::fs::read_to_string(expr_path)
        .with_context(|| format!("reading {}", expr_path.display()))?;
    let expression = Expression::from_json(&expr_json)
        .with_context(|| format!("parsing expression tree {}", expr_path.display()))?;
    let rows = load_bindings(engine, bindings_path)?;
    info!(rows = rows.len(), "Loaded solutions");

    let rows = if aggregate || !group_by.is_empty() {
        let variables: Vec<&str> = group_by.iter().map(String::as_str).collect();
        engine.group_by(rows, &variables)?
    } else {
        rows
    };

    if let Some(var) = bind {
        for solution in engine.extend(rows, var, &expression)? {
            print_bindings(&solution, format)?;
        }
        return Ok(());
    }

    let compiled = engine.compile(&expression)?;
    for solution in &rows {
        match compiled.evaluate(solution) {
            Ok(value) => print_value(value.as_ref(), format)?,
            Err(e) => match format {
                OutputFormat::Text => println!("ERROR {}", e),
                OutputFormat::Json => println!("{}", serde_json::json!({ "error": e.to_string() })),
            },
        }
    }
    Ok(())
}

fn load_bindings(engine: &SparqlEngine, path: &Path) -> anyhow::Result<Vec<Bindings>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let raw: Vec<BTreeMap<String, String>> = serde_json::from_str(&text)
        .with_context(|| format!("parsing solutions {}", path.display()))?;

    raw.iter()
        .enumerate()
        .map(|(i, row)| {
            let pairs: Vec<(&str, &str)> = row
                .iter()
                .map(|(var, term)| (var.as_str(), term.as_str()))
                .collect();
            engine
                .bindings(&pairs)
                .with_context(|| format!("solution {}", i))
        })
        .collect()
}

fn render_value(value: Option<&ExprValue>) -> String {
    match value {
        None => "UNBOUND".to_string(),
        Some(ExprValue::Term(term)) => term.to_rdf(),
        Some(ExprValue::Terms(terms)) => {
            let items: Vec<String> = terms.iter().map(|t| t.to_rdf()).collect();
            format!("({})", items.join(", "))
        }
        Some(ExprValue::Bindings(bindings)) => bindings.to_string(),
    }
}

fn print_value(value: Option<&ExprValue>, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", render_value(value)),
        OutputFormat::Json => {
            let json = match value {
                None => serde_json::Value::Null,
                Some(v) => serde_json::Value::String(render_value(Some(v))),
            };
            println!("{}", serde_json::to_string(&json)?);
        }
    }
    Ok(())
}

fn print_bindings(bindings: &Bindings, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", bindings),
        OutputFormat::Json => {
            let row: BTreeMap<&str, String> = bindings
                .iter()
                .map(|(var, term)| (var.name(), term.to_rdf()))
                .collect();
            println!("{}", serde_json::to_string(&row)?);
        }
    }
    Ok(())
}
