pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod layout;
pub mod store;
pub mod watch;

pub use config::Config;
pub use error::{NotegraphError, Result};
pub use graph::{build_graph, BuildOptions, Graph, NodeLinks, RelationKind};
pub use layout::{build_rooted_layout, mount_force_layout, ForceConfig, TreeConfig};
