mod app_state;
mod session;

pub use app_state::{AppState, ApplyError, Landing};
pub use session::{Session, SessionPhase};
