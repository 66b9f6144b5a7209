//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the binary prepares directories from
//! the loaded configuration.

use configs::{AppConfig, BackendKind};
use tracing::warn;

/// Ensure the directories the selected backend writes to exist; warn when
/// the static asset directory is missing.
pub async fn ensure_env(cfg: &AppConfig) -> anyhow::Result<()> {
    match cfg.backend.kind {
        BackendKind::Local => common::env::ensure_env(&cfg.server.assets_dir, &cfg.local.data_dir).await,
        BackendKind::Supabase => {
            if tokio::fs::metadata(&cfg.server.assets_dir).await.is_err() {
                warn!(assets_dir = %cfg.server.assets_dir, "static assets directory not found; /assets will 404");
            }
            Ok(())
        }
    }
}
