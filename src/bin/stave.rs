//! stave CLI tool
//!
//! Inspect and edit a conversation graph saved as JSON.
//!
//! ## Commands
//!
//! - `new-tree <graph>`: Start a new conversation tree seeded with the default preamble
//! - `lineage <graph> <node>`: Print a node's lineage, node first
//! - `messages <graph> <node>`: Print the conversation leading to a node
//! - `connect <graph> <source> <target>`: Add an edge if the connection policy allows it
//! - `validate <graph>`: Report structural problems
//! - `compact <graph>`: Drop superseded and dangling edges

use clap::{Parser, Subcommand};
use stave_core::{
    config::{ConfigProvider, StaveConfig, TomlConfigProvider},
    graph::{compact, lineage_of, roots, ConversationGraph},
    ids::NodeId,
    prompt::{messages_for, transcript},
    session::Session,
    StaveError,
};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    process::ExitCode,
};

#[derive(Parser)]
#[command(name = "stave")]
#[command(author, version, about = "A tool for inspecting and editing branching conversation graphs", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new tree. The graph file is created if it does not exist
    NewTree {
        /// Path to the graph JSON file
        graph: PathBuf,

        /// Text of the first user message
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Print the lineage of a node, from the node up to its root
    Lineage { graph: PathBuf, node: String },

    /// Print the conversation leading to a node as a transcript
    Messages {
        graph: PathBuf,
        node: String,

        /// Print the message list as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Connect two nodes
    Connect {
        graph: PathBuf,
        source: String,
        target: String,
    },

    /// Check the graph for cycles and dangling edges
    Validate { graph: PathBuf },

    /// Remove superseded and dangling edges
    Compact { graph: PathBuf },
}

fn load_graph(path: &Path) -> Result<ConversationGraph, StaveError> {
    if !path.exists() {
        tracing::debug!("Graph file not found, starting empty: {:?}", path);
        return Ok(ConversationGraph::default());
    }
    ConversationGraph::from_json(&read_to_string(path)?)
}

fn save_graph(path: &Path, graph: &ConversationGraph) -> Result<(), StaveError> {
    write(path, graph.to_json()?)?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<StaveConfig, StaveError> {
    match path {
        Some(path) => TomlConfigProvider::new(path.clone()).get_config(),
        None => Ok(StaveConfig::default()),
    }
}

fn run(cli: Cli) -> Result<ExitCode, StaveError> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::NewTree { graph: path, text } => {
            let mut session = Session::from_graph(config, load_graph(&path)?)?;
            let user = session.new_tree(text.as_deref());
            save_graph(&path, &session.graph())?;
            println!("{user}");
        }

        Commands::Lineage { graph: path, node } => {
            let graph = load_graph(&path)?;
            let node = NodeId::new(node)?;
            let lineage = lineage_of(&graph.nodes, &graph.edges, &node)?;
            if lineage.is_empty() {
                return Err(StaveError::NotFound(format!("node {node}")));
            }
            for node in lineage {
                println!("{node}");
            }
        }

        Commands::Messages {
            graph: path,
            node,
            json,
        } => {
            let graph = load_graph(&path)?;
            let messages = messages_for(&graph.nodes, &graph.edges, &NodeId::new(node)?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else {
                println!("{}", transcript(&messages));
            }
        }

        Commands::Connect {
            graph: path,
            source,
            target,
        } => {
            let mut session = Session::from_graph(config, load_graph(&path)?)?;
            let source = NodeId::new(source)?;
            let target = NodeId::new(target)?;
            if session.connect(&source, &target)? {
                save_graph(&path, &session.graph())?;
                println!("Connected {source} -> {target}");
            } else {
                println!("Refused {source} -> {target}: target has a parent or the edge closes a cycle");
            }
        }

        Commands::Validate { graph: path } => {
            let graph = load_graph(&path)?;
            let errors = graph.built_in_test();
            println!(
                "{} nodes, {} edges, {} trees",
                graph.nodes.len(),
                graph.edges.len(),
                roots(&graph.nodes, &graph.edges).len()
            );
            if !errors.is_empty() {
                for error in errors {
                    println!("- {error}");
                }
                return Ok(ExitCode::FAILURE);
            }
            println!("No problems found");
        }

        Commands::Compact { graph: path } => {
            let mut graph = load_graph(&path)?;
            let before = graph.edges.len();
            graph.edges = compact(&graph.edges, &graph.nodes);
            save_graph(&path, &graph)?;
            println!("Removed {} of {before} edges", before - graph.edges.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
