pub mod api;
pub mod applications;
pub mod auth;
pub mod config;
pub mod jobs;
mod redact;
pub mod state;
pub mod store;
pub mod types;

pub use api::{ApiClient, ClientError};
pub use applications::{ApplicationDraft, ApplicationStore, ResumeFile};
pub use auth::AuthService;
pub use config::ClientConfig;
pub use jobs::JobsService;
pub use state::{AppState, Landing, Session, SessionPhase};
pub use redact::redact_secrets;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs the global tracing subscriber (`RUST_LOG`, default `info`).
/// Does nothing if one is already set.
pub fn init_tracing() {
    let _ = Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
