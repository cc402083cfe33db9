pub mod config;
pub mod state;

pub use self::config::AppConfig;
pub use state::AppState;
