pub mod error;
mod loader;
mod solver_config;
mod whitelist_config;

pub use error::ConfigError;
pub use loader::load_config;
pub use solver_config::SolverConfig;
pub use whitelist_config::{german_day_token, ParserWhitelistConfig};
