//! Review scheduling and study planning core
//!
//! - [`flashcards`]: Leitner box scheduler and review sessions
//! - [`planner`]: day-indexed task list kept in line with a task store
//! - [`preferences`]: remembered UI defaults with an explicit load/save lifecycle
//! - [`config`]: TOML configuration for the above

pub mod config;
pub mod error;
pub mod flashcards;
pub mod planner;
pub mod preferences;
pub mod storage;

pub use config::AppConfig;
pub use error::{CoreError, Result};
