pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

pub use error::{Error, Result};

/// Installs the `env_logger` backend (default filter `info`, `RUST_LOG` overrides).
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
