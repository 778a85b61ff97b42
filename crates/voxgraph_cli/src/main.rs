//! voxgraph: command-line front end for the patch graph engine
//!
//! - `validate`: build a patch and report diagnostics and fatal errors
//! - `inspect`: list nodes, ports, connections and the terminal node
//! - `render`: evaluate a patch for N ticks and print the output samples
//! - `catalog`: list the registered node types
//! - `schema`: print the JSON Schema of the patch format

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use voxgraph_core::types::HOST_PARAM_COUNT;
use voxgraph_core::{
    Connection, Diagnostic, DiagnosticKind, Engine, EngineConfig, Graph, HostInputs, NodeSchema,
    default_registry, patch_json_schema,
};

/// Validate, inspect and evaluate patch graphs
#[derive(Parser)]
#[command(name = "voxgraph")]
#[command(about = "Validate, inspect and evaluate JSON patch graphs")]
#[command(version)]
struct Cli {
    /// JSON engine config (sample_rate, strict_types)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a patch and report problems; exits 1 on a fatal error
    Validate {
        /// Patch JSON file
        patch: PathBuf,
    },

    /// Show nodes, ports and connections of a built patch
    Inspect {
        /// Patch JSON file
        patch: PathBuf,
    },

    /// Evaluate a patch and print output samples
    Render {
        /// Patch JSON file
        patch: PathBuf,

        /// Number of ticks to evaluate
        #[arg(short = 'n', long, default_value = "16")]
        samples: usize,

        /// Host pitch in V/oct
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: f32,

        /// Host gate voltage
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        gate: f32,

        /// Host parameter as SLOT=VALUE, slot 1-8 (repeatable)
        #[arg(long = "param", value_parser = parse_param, allow_hyphen_values = true)]
        params: Vec<(usize, f32)>,

        /// Override the configured sample rate
        #[arg(long)]
        sample_rate: Option<f32>,
    },

    /// List registered node types
    Catalog {
        /// Show a single type
        #[arg(long = "type")]
        type_tag: Option<String>,
    },

    /// Print the JSON Schema of the patch format
    Schema,
}

fn parse_param(arg: &str) -> Result<(usize, f32)> {
    let (slot, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected SLOT=VALUE, got '{arg}'"))?;
    let slot: usize = slot.trim().parse().context("slot must be an integer")?;
    if !(1..=HOST_PARAM_COUNT).contains(&slot) {
        bail!("slot must be between 1 and {HOST_PARAM_COUNT}");
    }
    let value: f32 = value.trim().parse().context("value must be a number")?;
    Ok((slot - 1, value))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn read_patch(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read patch {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn kind_label(kind: DiagnosticKind) -> colored::ColoredString {
    match kind {
        DiagnosticKind::ParseError => "parse error".red(),
        DiagnosticKind::UnknownType => "unknown type".magenta(),
        DiagnosticKind::Warning => "warning".yellow(),
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        let module = d.module.as_deref().unwrap_or("-");
        println!("  {:>14} {:>20}  {}", kind_label(d.kind), module.white(), d.message);
    }
}

// ─── validate ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ValidateReport<'a> {
    ok: bool,
    error: Option<String>,
    nodes: usize,
    diagnostics: &'a [Diagnostic],
}

fn cmd_validate(engine: &mut Engine, patch: &Path, format: OutputFormat) -> Result<ExitCode> {
    let text = read_patch(patch)?;
    let result = engine.load_patch_str(&text);
    let report = ValidateReport {
        ok: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
        nodes: engine.graph().map(Graph::len).unwrap_or(0),
        diagnostics: engine.diagnostics(),
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_diagnostics(report.diagnostics);
            match &report.error {
                None => println!(
                    "{} {} ({} nodes, {} diagnostics)",
                    "ok".green().bold(),
                    patch.display(),
                    report.nodes,
                    report.diagnostics.len()
                ),
                Some(error) => println!("{} {}: {error}", "failed".red().bold(), patch.display()),
            }
        }
    }

    Ok(if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ─── inspect ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct NodeReport<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    node_type: &'a str,
    parent: Option<&'a str>,
    inputs: Vec<&'a str>,
    outputs: Vec<&'a str>,
    params: BTreeMap<&'a str, f32>,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    terminal: &'a str,
    nodes: Vec<NodeReport<'a>>,
    connections: &'a [Connection],
}

fn inspect_report(graph: &Graph) -> InspectReport<'_> {
    let nodes = graph
        .nodes()
        .map(|node| NodeReport {
            id: node.id(),
            node_type: node.node_type(),
            parent: node.parent_id(),
            inputs: node.schema().inputs.iter().map(|p| p.name.as_str()).collect(),
            outputs: node.schema().outputs.iter().map(|p| p.name.as_str()).collect(),
            params: node.params().collect(),
        })
        .collect();
    InspectReport {
        terminal: graph.terminal_id(),
        nodes,
        connections: graph.connections(),
    }
}

fn port_name(graph: &Graph, id: &str, port: usize, output: bool) -> String {
    graph
        .node(id)
        .and_then(|node| {
            let ports = if output {
                &node.schema().outputs
            } else {
                &node.schema().inputs
            };
            ports.get(port).map(|p| p.name.clone())
        })
        .unwrap_or_else(|| port.to_string())
}

fn cmd_inspect(engine: &mut Engine, patch: &Path, format: OutputFormat) -> Result<ExitCode> {
    let text = read_patch(patch)?;
    engine.load_patch_str(&text)?;
    let graph = engine
        .graph()
        .ok_or_else(|| anyhow!("no graph after a successful load"))?;
    let report = inspect_report(graph);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", "Nodes".bold());
            for node in &report.nodes {
                let marker = if node.id == report.terminal { "*" } else { " " };
                println!(
                    "{marker} {:>24} {:<22} in[{}] out[{}]",
                    node.id.white(),
                    node.node_type.cyan(),
                    node.inputs.join(", "),
                    node.outputs.join(", ")
                );
                if let Some(parent) = node.parent {
                    println!("  {:>24} {}", "", format!("in macro {parent}").dimmed());
                }
                for (name, value) in &node.params {
                    println!("  {:>24} {}={}", "", name.dimmed(), value.to_string().yellow());
                }
            }
            println!("{}", "Connections".bold());
            for c in report.connections {
                println!(
                    "  {}.{} -> {}.{}",
                    c.src.module_uuid,
                    port_name(graph, &c.src.module_uuid, c.src.port_id, true).green(),
                    c.dst.module_uuid,
                    port_name(graph, &c.dst.module_uuid, c.dst.port_id, false).green()
                );
            }
            print_diagnostics(engine.diagnostics());
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ─── render ───────────────────────────────────────────────────────────────────

fn cmd_render(
    engine: &mut Engine,
    patch: &Path,
    samples: usize,
    host: &HostInputs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let text = read_patch(patch)?;
    engine.load_patch_str(&text)?;

    let out: Vec<f32> = (0..samples).map(|_| engine.process(host)).collect();
    match format {
        OutputFormat::Json => print_json(&out)?,
        OutputFormat::Table => {
            for (i, sample) in out.iter().enumerate() {
                println!("{:>8} {:>12.6}", i.to_string().dimmed(), sample);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ─── catalog / schema ─────────────────────────────────────────────────────────

fn print_schema_table(schema: &NodeSchema) {
    println!("{} {}", schema.name.cyan().bold(), schema.description.dimmed());
    for (i, port) in schema.inputs.iter().enumerate() {
        println!("    in  {i:>2} {:<14} {}", port.name, port.description.dimmed());
    }
    for (i, port) in schema.outputs.iter().enumerate() {
        println!("    out {i:>2} {:<14} {}", port.name, port.description.dimmed());
    }
    for param in &schema.params {
        println!(
            "    param  {:<14} {} {}",
            param.name,
            format!("[{}]", param.default).yellow(),
            param.description.dimmed()
        );
    }
}

fn cmd_catalog(type_tag: Option<&str>, format: OutputFormat) -> Result<ExitCode> {
    let registry = default_registry();
    let schemas: Vec<&NodeSchema> = match type_tag {
        Some(tag) => vec![
            registry
                .get(tag)
                .map(|t| &*t.schema)
                .ok_or_else(|| anyhow!("unknown node type '{tag}'"))?,
        ],
        None => registry.schemas(),
    };

    match format {
        OutputFormat::Json => print_json(&schemas)?,
        OutputFormat::Table => schemas.into_iter().for_each(print_schema_table),
    }
    Ok(ExitCode::SUCCESS)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "engine config");

    match cli.command {
        Commands::Validate { patch } => cmd_validate(&mut Engine::new(config), &patch, cli.format),
        Commands::Inspect { patch } => cmd_inspect(&mut Engine::new(config), &patch, cli.format),
        Commands::Render {
            patch,
            samples,
            pitch,
            gate,
            params,
            sample_rate,
        } => {
            let config = EngineConfig {
                sample_rate: sample_rate.unwrap_or(config.sample_rate),
                ..config
            };
            config.validate()?;
            let mut host = HostInputs {
                pitch,
                gate,
                ..HostInputs::default()
            };
            for (slot, value) in params {
                host.params[slot] = value;
            }
            cmd_render(&mut Engine::new(config), &patch, samples, &host, cli.format)
        }
        Commands::Catalog { type_tag } => cmd_catalog(type_tag.as_deref(), cli.format),
        Commands::Schema => {
            print_json(&patch_json_schema())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
