//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SwitchyardConfig (validated, immutable)
//!     → ClientConfig handed to a factory
//! ```
//!
//! # Design Decisions
//! - Config is immutable once handed to a factory
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Filters are code, not data: they are attached programmatically

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, EngineConfig, FilterHandle, LoggingConfig, SwitchyardConfig, TimeoutConfig,
    WebSocketConfig,
};
pub use validation::{validate_client_config, validate_config, ValidationError};
