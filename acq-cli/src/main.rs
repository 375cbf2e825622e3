//! ACQ CLI - Command-line tool for acquisition over containment trees
//!
//! This binary loads a JSON or TOML tree and provides:
//! - resolve: look an attribute up from a node, acquiring from its context
//! - chain: list the contexts of a node, closest first
//! - in-context: test whether one node lies in another's context
//! - dump: print the captured state of a node

use acq_core::{base, AcquireOptions, Limits, Resolver, Value};
use acq_tree::{
    capture_state, describe, describe_chain, load_path, scalar_from_json, ContextEntry,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "acq")]
#[command(about = "Context-dependent attribute resolution over containment trees")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Maximum resolution depth
    #[arg(long, global = true)]
    max_depth: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an attribute from a node
    ///
    /// Examples:
    ///   acq resolve site.json /docs/page color
    ///   acq resolve site.toml docs/page _owner --default '"nobody"'
    Resolve {
        /// Tree file (.json or .toml)
        file: PathBuf,
        /// Slash-separated path from the root to the node
        path: String,
        /// Attribute name
        name: String,
        /// Do not acquire names starting with an underscore
        #[arg(long)]
        implicit_only: bool,
        /// Only search the containment chain
        #[arg(long)]
        containment: bool,
        /// JSON value printed when the attribute is not found
        #[arg(long)]
        default: Option<String>,
        /// Output format (text, json)
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the contexts of a node, closest first
    Chain {
        /// Tree file (.json or .toml)
        file: PathBuf,
        /// Slash-separated path from the root to the node
        path: String,
        /// Start from the innermost wrapper at every step
        #[arg(long)]
        containment: bool,
        /// Output format (text, json)
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Test whether TARGET lies in the context of the node at PATH
    InContext {
        /// Tree file (.json or .toml)
        file: PathBuf,
        /// Slash-separated path to the node
        path: String,
        /// Slash-separated path to the candidate context
        target: String,
        /// Do not drop outer wrapper layers while walking
        #[arg(long)]
        outer_only: bool,
    },
    /// Print the captured state of a node as JSON
    Dump {
        /// Tree file (.json or .toml)
        file: PathBuf,
        /// Slash-separated path to the node
        path: String,
        /// Capture the resolved value as is (wrappers are refused)
        #[arg(long)]
        no_unwrap: bool,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ResolveOutput {
    name: String,
    display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<serde_json::Value>,
    context: ContextEntry,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let resolver = match cli.max_depth {
        Some(max_depth) => Resolver::new(Limits {
            max_depth,
            ..Limits::default()
        })?,
        None => Resolver::default(),
    };

    match cli.command {
        Commands::Resolve {
            file,
            path,
            name,
            implicit_only,
            containment,
            default,
            format,
        } => handle_resolve(
            &resolver,
            file,
            &path,
            &name,
            implicit_only,
            containment,
            default,
            format,
        ),
        Commands::Chain {
            file,
            path,
            containment,
            format,
        } => handle_chain(&resolver, file, &path, containment, format),
        Commands::InContext {
            file,
            path,
            target,
            outer_only,
        } => handle_in_context(&resolver, file, &path, &target, outer_only),
        Commands::Dump {
            file,
            path,
            no_unwrap,
        } => handle_dump(&resolver, file, &path, no_unwrap),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_resolve(
    resolver: &Resolver,
    file: PathBuf,
    path: &str,
    name: &str,
    implicit_only: bool,
    containment: bool,
    default: Option<String>,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let tree = load_path(&file)?;
    let node = tree.resolve_with(resolver, path)?;
    debug!(path, name, "resolving");

    let mut options = AcquireOptions::new()
        .explicit(!implicit_only)
        .containment(containment);
    if let Some(text) = &default {
        let parsed: serde_json::Value = serde_json::from_str(text)?;
        options = options.with_default(scalar_from_json(&parsed)?);
    }
    let value = resolver.acquire(&node, name, &options)?;

    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            let output = ResolveOutput {
                name: name.to_string(),
                display: value.to_string(),
                state: capture_state(&base(&value)).ok(),
                context: describe(&node),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn handle_chain(
    resolver: &Resolver,
    file: PathBuf,
    path: &str,
    containment: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let tree = load_path(&file)?;
    let node = tree.resolve_with(resolver, path)?;
    let entries = describe_chain(&resolver.chain(&node, containment)?);

    match format {
        OutputFormat::Text => {
            for (depth, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}  {:<7}  {:<16}  {}",
                    depth,
                    entry.kind,
                    entry.type_name,
                    entry.attributes.join(", ")
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

fn handle_in_context(
    resolver: &Resolver,
    file: PathBuf,
    path: &str,
    target: &str,
    outer_only: bool,
) -> Result<(), Box<dyn Error>> {
    let tree = load_path(&file)?;
    let node = tree.resolve_with(resolver, path)?;
    let target = tree.resolve_with(resolver, target)?;
    println!("{}", resolver.in_context_of(&node, &target, !outer_only));
    Ok(())
}

fn handle_dump(
    resolver: &Resolver,
    file: PathBuf,
    path: &str,
    no_unwrap: bool,
) -> Result<(), Box<dyn Error>> {
    let tree = load_path(&file)?;
    let node = tree.resolve_with(resolver, path)?;
    let target: Value = if no_unwrap { node } else { base(&node) };
    let state = capture_state(&target)?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
