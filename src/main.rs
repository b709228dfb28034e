use anyhow::Result;
use clap::{Parser, Subcommand};
use notegraph::graph::{build_graph, traverse_graph, BuildOptions, Graph, RelationKind};
use notegraph::http::GraphServer;
use notegraph::layout::{build_rooted_layout, mount_force_layout, LayoutMode};
use notegraph::store::VaultStore;
use notegraph::{Config, NotegraphError};

#[derive(Parser, Debug)]
#[command(name = "notegraph")]
#[command(version, about = "Typed link graph over a folder of notes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the link graph as JSON
    Graph {
        /// Add inverse leadsto/dependson edges
        #[arg(long)]
        infer: bool,
        /// Drop leadsto edges implied by longer paths
        #[arg(long)]
        reduce: bool,
    },
    /// Print the rooted tree layout of a document as JSON
    Tree {
        id: String,
        #[arg(long)]
        child_depth: Option<usize>,
        #[arg(long)]
        parent_depth: Option<usize>,
        /// Radial (mindmap) placement instead of vertical levels
        #[arg(long)]
        radial: bool,
    },
    /// Run the force layout to settle and print node positions as JSON
    Force { id: String },
    /// List documents reachable from a document within a number of hops
    Reach {
        id: String,
        #[arg(long, default_value = "3")]
        depth: usize,
    },
    /// Serve graph and layouts over HTTP
    Serve,
}

fn load_graph(config: &Config, options: &BuildOptions) -> Result<Graph> {
    let store = VaultStore::open(config.vault_root(), &config.vault.extensions)?;
    Ok(build_graph(&store, options))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let cli = Cli::parse();
    let config = Config::load()?;
    log::debug!("Vault root: {}", config.vault_root().display());

    match cli.command {
        Command::Graph { infer, reduce } => {
            let options = BuildOptions {
                infer: infer || config.graph.infer,
                reduce: reduce || config.graph.reduce,
            };
            let graph = load_graph(&config, &options)?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Command::Tree { id, child_depth, parent_depth, radial } => {
            let mut tree_config = config.tree.clone();
            if let Some(depth) = child_depth {
                tree_config.child_depth = depth;
            }
            if let Some(depth) = parent_depth {
                tree_config.parent_depth = depth;
            }
            if radial {
                tree_config.mode = LayoutMode::Radial;
            }
            // depth 0 or past tree.max_depth is an error, same as over HTTP
            tree_config.validate()?;
            let graph = load_graph(&config, &config.graph)?;
            let layout = build_rooted_layout(&graph, &id, &tree_config)?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Command::Force { id } => {
            let graph = load_graph(&config, &config.graph)?;
            let mut force_config = config.force.clone();
            // nobody watches intermediate frames here
            force_config.frame_interval_ms = 0;
            let handle = mount_force_layout(&graph, &id, force_config, None)?;
            let layout = handle.settled().await;
            log::info!("force layout settled after {} ticks", layout.tick);
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Command::Reach { id, depth } => {
            let graph = load_graph(&config, &config.graph)?;
            if !graph.contains(&id) {
                return Err(NotegraphError::DocumentNotFound(id).into());
            }
            for edge in traverse_graph(&graph, &id, &RelationKind::ALL, depth) {
                println!("{} --{}--> {}", edge.source, edge.kind, edge.target);
            }
        }
        Command::Serve => {
            log::info!("Starting notegraph HTTP server v{}", env!("CARGO_PKG_VERSION"));
            let port = config.http_server.port;
            GraphServer::new(config).run(port).await?;
        }
    }

    Ok(())
}
