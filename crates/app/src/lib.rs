// Process setup (logging, panic hook)
pub mod process;

// App state (configuration, paths)
pub mod state;

pub use process::init_logging;
pub use state::{AppConfig, AppState, StateError};
