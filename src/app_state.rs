// =============================================================================
// Central Application State: Aurora Signal Service
// =============================================================================
//
// Shared by every HTTP handler via `Arc<AppState>`.  The analysis engine itself
// is stateless; the service only tracks configuration and a few counters.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock around the runtime configuration.
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::runtime_config::{AnalysisParams, RuntimeConfig};

pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented whenever the runtime configuration changes.
    pub state_version: AtomicU64,

    /// Number of analyses completed since startup.
    pub analyses_served: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Where config updates are persisted.
    pub config_path: PathBuf,

    /// Bearer token for the admin endpoints. `None` rejects every admin call.
    pub admin_token: Option<String>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            analyses_served: AtomicU64::new(0),
            runtime_config: Arc::new(RwLock::new(config)),
            config_path: config_path.into(),
            admin_token: None,
            start_time: std::time::Instant::now(),
        }
    }

    /// Set the admin token. Empty strings count as unset.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty());
        self
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version, returning the previous value.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Analysis bookkeeping ────────────────────────────────────────────

    pub fn record_analysis(&self) -> u64 {
        self.analyses_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn analyses_served(&self) -> u64 {
        self.analyses_served.load(Ordering::Relaxed)
    }

    // ── Config access ───────────────────────────────────────────────────

    /// Snapshot of the default analysis parameters.
    pub fn default_params(&self) -> AnalysisParams {
        self.runtime_config.read().analysis.clone()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
