pub mod config;
pub mod datamarts;
pub mod error;
pub mod extract;
pub mod load;
pub mod lock;
pub mod merge;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod schema;
#[cfg(feature = "runtime")]
pub mod scheduler;
