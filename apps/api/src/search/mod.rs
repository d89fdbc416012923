pub mod coordinator;
pub mod handlers;
pub mod model;

use thiserror::Error;

pub use coordinator::{SearchCoordinator, Timeouts};

/// The only failure `run_search` returns as an error. Source and matcher
/// failures are folded into the `SearchResult` instead.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
