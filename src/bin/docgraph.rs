//! docgraph CLI: inspect and edit a document store as a graph.
//!
//! Usage:
//!   docgraph [--db path] [--config path] [-v] import <file.json>
//!   docgraph graph [--view name] [--filter expr] [--depth n]
//!   docgraph edge insert --from id --to id --type type

use clap::{Parser, Subcommand};
use docgraph::{
    AdapterConfig, Document, EdgeId, EdgeSpec, EdgeTypeId, GraphAdapter, GraphOptions,
    NeighbourhoodQuery, NodeId, OpenStore, Position, SqliteStore, StoredView, View,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docgraph",
    version,
    about = "Typed graph view over a document store"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import documents from a JSON array of `{title, fields}` objects
    Import {
        /// JSON file to import
        path: PathBuf,
    },
    /// Assemble and print a graph
    Graph {
        /// View supplying filters, toggles and positions
        #[arg(long)]
        view: Option<String>,
        /// Node filter, replacing the view's
        #[arg(long)]
        filter: Option<String>,
        /// Edge type filter, replacing the view's
        #[arg(long)]
        edge_filter: Option<String>,
        /// Neighbourhood depth
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print the neighbourhood of documents
    Neighbours {
        /// Titles of the seed documents
        #[arg(required = true)]
        titles: Vec<String>,
        /// Number of expansion rounds
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// Insert or delete edges
    Edge {
        #[command(subcommand)]
        action: EdgeCommand,
    },
    /// Insert or delete nodes
    Node {
        #[command(subcommand)]
        action: NodeCommand,
    },
    /// Maintain edge types
    EdgeType {
        #[command(subcommand)]
        action: EdgeTypeCommand,
    },
    /// Print a filter matching every node of a view's graph
    CollectionFilter {
        /// View name
        view: String,
    },
    /// Assign ids to all potential nodes
    Reindex,
}

#[derive(Subcommand)]
enum EdgeCommand {
    /// Insert an edge
    Insert {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long = "type")]
        edge_type: String,
        /// Edge id (stored edges only)
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete an edge
    Delete {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long = "type")]
        edge_type: String,
        /// Edge id (required for stored edges)
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand)]
enum NodeCommand {
    /// Create a document for a new node
    Insert {
        #[arg(long)]
        label: Option<String>,
        /// View to add the node to
        #[arg(long)]
        view: Option<String>,
        #[arg(long, requires = "y")]
        x: Option<f64>,
        #[arg(long, requires = "x")]
        y: Option<f64>,
    },
    /// Delete a node and its edges
    Delete {
        /// Node id
        id: String,
    },
}

#[derive(Subcommand)]
enum EdgeTypeCommand {
    /// Rename a type, re-keying all its edges
    Rename { old: String, new: String },
    /// Delete a type and all its edges
    Delete { edge_type: String },
}

/// Get the default database path (~/.local/share/docgraph/docgraph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let docgraph_dir = data_dir.join("docgraph");
    std::fs::create_dir_all(&docgraph_dir).ok();
    docgraph_dir.join("docgraph.db")
}

/// Get the default config path (~/.config/docgraph/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docgraph").join("config.yaml"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DOCGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AdapterConfig, String> {
    match path {
        Some(path) => AdapterConfig::load(&path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e)),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => AdapterConfig::load(&path)
                .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e)),
            None => Ok(AdapterConfig::default()),
        },
    }
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database: {}", e))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_import(store: &SqliteStore, adapter: &GraphAdapter, path: &Path) -> i32 {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };
    let documents: Vec<Document> = match serde_json::from_str(&json) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("Error: invalid document file: {}", e);
            return 1;
        }
    };
    let imported = match store.put_all(documents) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match adapter.rebuild_index() {
        Ok(indexed) => {
            println!("Imported {} documents ({} nodes)", imported, indexed);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn open_view(adapter: &GraphAdapter, name: &str) -> Result<StoredView, i32> {
    match adapter.get_view(name) {
        Ok(view) if view.exists() => Ok(view),
        Ok(_) => {
            eprintln!("Error: view '{}' not found", name);
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(1)
        }
    }
}

fn cmd_graph(
    adapter: &GraphAdapter,
    view: Option<&str>,
    filter: Option<&str>,
    edge_filter: Option<&str>,
    depth: Option<usize>,
) -> i32 {
    let view = match view.map(|name| open_view(adapter, name)).transpose() {
        Ok(view) => view,
        Err(code) => return code,
    };
    let options = GraphOptions {
        view: view.as_ref().map(|v| v as &dyn View),
        filter,
        edge_filter,
        neighbourhood_scope: depth,
    };
    if options.view.is_none() && options.filter.is_none() {
        eprintln!("Error: either --view or --filter is required");
        return 1;
    }
    match adapter.get_graph(&options) {
        Ok(graph) => print_json(&graph),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_neighbours(adapter: &GraphAdapter, titles: &[String], steps: usize) -> i32 {
    let query = NeighbourhoodQuery::from(titles.iter().cloned()).steps(steps);
    match adapter.get_neighbours(&query, None) {
        Ok(graph) => print_json(&graph),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_edge(adapter: &GraphAdapter, action: EdgeCommand) -> i32 {
    let (result, verb) = match action {
        EdgeCommand::Insert { from, to, edge_type, id } => {
            let mut spec = EdgeSpec::new(from, to, edge_type);
            spec.id = id.map(EdgeId::from_string);
            (adapter.insert_edge(&spec), "insert")
        }
        EdgeCommand::Delete { from, to, edge_type, id } => {
            let spec = EdgeSpec {
                id: id.map(EdgeId::from_string),
                from: Some(NodeId::from(from)),
                to: to.map(NodeId::from),
                edge_type: Some(EdgeTypeId::from(edge_type)),
            };
            (adapter.delete_edge(&spec), "delete")
        }
    };
    match result {
        Ok(Some(edge)) => print_json(&edge),
        Ok(None) => {
            eprintln!("Error: cannot {} edge (unresolvable or read-only)", verb);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_node(adapter: &GraphAdapter, action: NodeCommand) -> i32 {
    match action {
        NodeCommand::Insert { label, view, x, y } => {
            let view = match view.as_deref().map(|name| open_view(adapter, name)).transpose() {
                Ok(view) => view,
                Err(code) => return code,
            };
            let position = x.zip(y).map(|(x, y)| Position::new(x, y));
            let view_ref = view.as_ref().map(|v| v as &dyn View);
            match adapter.insert_node(label.as_deref(), position, view_ref) {
                Ok(node) => print_json(&node),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        NodeCommand::Delete { id } => match adapter.delete_node(&NodeId::from(id.as_str())) {
            Ok(true) => {
                println!("Deleted node '{}'", id);
                0
            }
            Ok(false) => {
                eprintln!("Error: node '{}' not found", id);
                1
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

fn cmd_edge_type(adapter: &GraphAdapter, action: EdgeTypeCommand) -> i32 {
    let result = match &action {
        EdgeTypeCommand::Rename { old, new } => adapter
            .rename_edge_type(&EdgeTypeId::from(old.as_str()), &EdgeTypeId::from(new.as_str())),
        EdgeTypeCommand::Delete { edge_type } => {
            adapter.delete_edge_type(&EdgeTypeId::from(edge_type.as_str()))
        }
    };
    match (result, action) {
        (Ok(count), EdgeTypeCommand::Rename { old, new }) => {
            println!("Renamed edge type '{}' to '{}' ({} edges)", old, new, count);
            0
        }
        (Ok(count), EdgeTypeCommand::Delete { edge_type }) => {
            println!("Deleted edge type '{}' ({} edges)", edge_type, count);
            0
        }
        (Err(e), _) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_collection_filter(adapter: &GraphAdapter, name: &str) -> i32 {
    let view = match open_view(adapter, name) {
        Ok(view) => view,
        Err(code) => return code,
    };
    match adapter.get_collection_filter(&view) {
        Ok(filter) => {
            println!("{}", filter);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_reindex(adapter: &GraphAdapter) -> i32 {
    match adapter.rebuild_index() {
        Ok(count) => {
            println!("Indexed {} nodes", count);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let store = match open_store(cli.db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let adapter = GraphAdapter::new(store.clone(), config);

    // ids live in the documents; the in-memory index is filled on startup
    if !matches!(cli.command, Commands::Import { .. }) {
        if let Err(e) = adapter.rebuild_index() {
            eprintln!("Error: failed to build index: {}", e);
            std::process::exit(1);
        }
    }

    let code = match cli.command {
        Commands::Import { path } => cmd_import(&store, &adapter, &path),
        Commands::Graph { view, filter, edge_filter, depth } => cmd_graph(
            &adapter,
            view.as_deref(),
            filter.as_deref(),
            edge_filter.as_deref(),
            depth,
        ),
        Commands::Neighbours { titles, steps } => cmd_neighbours(&adapter, &titles, steps),
        Commands::Edge { action } => cmd_edge(&adapter, action),
        Commands::Node { action } => cmd_node(&adapter, action),
        Commands::EdgeType { action } => cmd_edge_type(&adapter, action),
        Commands::CollectionFilter { view } => cmd_collection_filter(&adapter, &view),
        Commands::Reindex => cmd_reindex(&adapter),
    };
    std::process::exit(code);
}
