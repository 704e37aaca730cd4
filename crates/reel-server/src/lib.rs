//! Wiring for the Reel HTTP server: configuration loading and the top-level
//! router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use reel_core::{Engine, store::Store};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `REEL_*` environment variables. Every field is optional.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("reel.db"),
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then layer the environment on top.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      Config::builder().add_source(File::from(path).required(false)),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .add_source(Environment::with_prefix("REEL").try_parsing(true))
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API over `store`, with request tracing.
pub fn app<S: Store + 'static>(store: Arc<S>) -> Router {
  reel_api::api_router(Engine::new(store)).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::FileFormat;
  use reel_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn file_values_override_defaults() {
    let toml = "host = \"0.0.0.0\"\nport = 9000\n";
    let cfg = ServerConfig::from_builder(
      Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
    .unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.store_path, PathBuf::from("reel.db"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(Path::new("~/reel/reel.db"));
    assert_eq!(expanded, PathBuf::from(home).join("reel/reel.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
  }

  #[tokio::test]
  async fn app_serves_the_api() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let resp = app(Arc::new(store))
      .oneshot(Request::builder().uri("/films").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let films: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(films, serde_json::json!([]));
  }
}
