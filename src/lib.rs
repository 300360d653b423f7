pub mod cli;
pub mod config;
pub mod contract;
pub mod discover;
pub mod error;
pub mod forge;
pub mod load_config;
pub mod mime;
pub mod publish;
pub mod release;
pub mod upload;

pub use cli::{run, Cli};
pub use error::{ExitStatus, ReleaseError};
