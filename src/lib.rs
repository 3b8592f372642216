pub mod app;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod password;

pub use bootstrap::{BootstrapReport, bootstrap, run};
pub use config::Config;
pub use error::BootstrapError;
