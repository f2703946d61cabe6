pub mod config;
pub mod handlers;
pub mod models;
pub mod render;
pub mod router;

use config::Config;
use render::CommandPolicy;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    /// Compiled once at startup
    pub policy: CommandPolicy,
}
