//! Scene annotations: category visibility filtering and clustered, interactive
//! spatial markers resolved from a row-streaming data source.
//!
//! Resolution (`visibility`, `resolver`, `session`) is async and runs at
//! connection time. Decoration and pointer dispatch (`cluster`, `decorator`)
//! are synchronous and run on the host's frame loop.

pub mod cluster;
pub mod config;
pub mod decorator;
pub mod error;
pub mod marker;
pub mod resolver;
pub mod session;
pub mod visibility;

pub use cluster::*;
pub use config::*;
pub use decorator::*;
pub use error::*;
pub use marker::*;
pub use resolver::*;
pub use session::*;
pub use visibility::*;
