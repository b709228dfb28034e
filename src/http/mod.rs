//! JSON surface for renderers.
//!
//! Every request refreshes the graph from the vault; nothing is kept between
//! requests.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{NotegraphError, Result};
use crate::graph::{build_graph, BuildOptions, Graph};
use crate::layout::{build_rooted_layout, ForceSimulation, LayoutMode};
use crate::store::VaultStore;

/// HTTP server serving graph and layout JSON
pub struct GraphServer {
    config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
struct GraphQuery {
    infer: Option<bool>,
    reduce: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TreeQuery {
    child_depth: Option<usize>,
    parent_depth: Option<usize>,
    radial: Option<bool>,
}

struct ApiError(NotegraphError);

impl From<NotegraphError> for ApiError {
    fn from(err: NotegraphError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NotegraphError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            NotegraphError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl GraphServer {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Bind and serve until the process exits.
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.create_router();
        let addr = format!("127.0.0.1:{}", port);
        log::info!("Starting graph server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            NotegraphError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.",
                    addr, e
                ),
            ))
        })?;

        axum::serve(listener, app).await.map_err(|e| {
            NotegraphError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    /// Create the axum router
    pub fn create_router(&self) -> Router {
        let allowed_origins = &self.config.http_server.allowed_origins;
        let cors = if allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(handle_health))
            .route("/graph", get(handle_graph))
            .route("/tree/*id", get(handle_tree))
            .route("/force/*id", get(handle_force))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(Arc::clone(&self.config))
    }
}

/// Full refresh: re-index the vault and rebuild the graph off the async runtime.
async fn refresh(config: Arc<Config>, options: BuildOptions) -> Result<Graph> {
    tokio::task::spawn_blocking(move || {
        let store = VaultStore::open(&config.vault.root, &config.vault.extensions)?;
        Ok(build_graph(&store, &options))
    })
    .await?
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "notegraph",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

async fn handle_graph(
    State(config): State<Arc<Config>>,
    Query(query): Query<GraphQuery>,
) -> std::result::Result<Response, ApiError> {
    let options = BuildOptions {
        infer: query.infer.unwrap_or(config.graph.infer),
        reduce: query.reduce.unwrap_or(config.graph.reduce),
    };
    let graph = refresh(config, options).await?;
    Ok(Json(graph).into_response())
}

async fn handle_tree(
    State(config): State<Arc<Config>>,
    Path(id): Path<String>,
    Query(query): Query<TreeQuery>,
) -> std::result::Result<Response, ApiError> {
    let mut tree_config = config.tree.clone();
    if let Some(depth) = query.child_depth {
        tree_config.child_depth = depth;
    }
    if let Some(depth) = query.parent_depth {
        tree_config.parent_depth = depth;
    }
    if let Some(radial) = query.radial {
        tree_config.mode = if radial { LayoutMode::Radial } else { LayoutMode::Vertical };
    }
    // reject bad depths before paying for a refresh
    tree_config.validate()?;

    let graph = refresh(Arc::clone(&config), config.graph).await?;
    let layout = tokio::task::spawn_blocking(move || build_rooted_layout(&graph, &id, &tree_config))
        .await
        .map_err(NotegraphError::from)??;
    Ok(Json(layout).into_response())
}

async fn handle_force(
    State(config): State<Arc<Config>>,
    Path(id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let graph = refresh(Arc::clone(&config), config.graph).await?;
    if !graph.contains(&id) {
        return Err(NotegraphError::DocumentNotFound(id).into());
    }

    let force_config = config.force.clone();
    let layout = tokio::task::spawn_blocking(move || {
        ForceSimulation::new(&graph, &id, force_config).run_to_settled()
    })
    .await
    .map_err(NotegraphError::from)?;
    Ok(Json(layout).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpServerConfig, VaultConfig};
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn server_for(temp_dir: &TempDir) -> GraphServer {
        let root = temp_dir.path();
        fs::create_dir_all(root.join("topics")).unwrap();
        fs::write(root.join("a.md"), "---\nleadsto: [topics/b]\n---\nsee >@c").unwrap();
        fs::write(root.join("topics/b.md"), "b").unwrap();
        fs::write(root.join("c.md"), "c").unwrap();

        GraphServer::new(Config {
            vault: VaultConfig {
                root: root.to_path_buf(),
                extensions: vec!["md".to_string()],
            },
            graph: BuildOptions::default(),
            tree: Default::default(),
            force: crate::layout::ForceConfig {
                max_ticks: 10,
                seed: Some(1),
                ..Default::default()
            },
            http_server: HttpServerConfig::default(),
        })
    }

    async fn get_json(server: &GraphServer, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = server
            .create_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().unwrap();
        let server = server_for(&temp_dir);
        let (status, body) = get_json(&server, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_graph_with_inference() {
        let temp_dir = TempDir::new().unwrap();
        let server = server_for(&temp_dir);
        let (status, body) = get_json(&server, "/graph?infer=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["a"]["leadsto"], serde_json::json!(["topics/b", "c"]));
        assert_eq!(body["topics/b"]["dependson"], serde_json::json!(["a"]));
    }

    #[tokio::test]
    async fn test_tree_nested_id_and_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let server = server_for(&temp_dir);
        let (status, body) = get_json(&server, "/tree/a?child_depth=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["root"]["id"], "a");
        assert_eq!(body["root"]["children"].as_array().unwrap().len(), 2);

        let (status, body) = get_json(&server, "/tree/topics/b").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["root"]["id"], "topics/b");

        let (status, body) = get_json(&server, "/tree/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));

        let (status, _) = get_json(&server, "/tree/a?child_depth=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tree_depth_over_limit_is_bad_request() {
        let temp_dir = TempDir::new().unwrap();
        let server = server_for(&temp_dir);
        let (status, body) = get_json(&server, "/tree/a?child_depth=30").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("max_depth"));

        let (status, _) = get_json(&server, "/tree/a?parent_depth=11").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(&server, "/tree/a?child_depth=10&parent_depth=10").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_force_layout() {
        let temp_dir = TempDir::new().unwrap();
        let server = server_for(&temp_dir);
        let (status, body) = get_json(&server, "/force/a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "settled");
        assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(body["edges"].as_array().unwrap().len(), 2);
    }
}
