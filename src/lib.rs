pub mod cli;
pub mod cluster;
pub mod config;
pub mod control;
pub mod endpoint;
pub mod error;
pub mod history;
pub mod hostlist;
pub mod presentation;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod utils;

pub use cli::Cli;
pub use cluster::{ClusterController, ClusterManager, Target};
pub use config::Config;
pub use endpoint::Endpoint;
pub use error::{ClusterError, ResolutionError};
