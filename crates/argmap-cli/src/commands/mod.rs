//! Command implementations.

pub mod batch;
pub mod build;
pub mod config;
pub mod export;

pub use self::batch::execute_batch;
pub use self::build::execute_build;
pub use self::config::execute_config;
pub use self::export::execute_export;
