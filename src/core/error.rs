//! Errors surfaced by the dispatcher.

use crate::infrastructure::traits::StoreError;
use thiserror::Error;

/// A failure the dispatcher can't recover from locally. The request produces no reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render reply: {0}")]
    Template(#[from] minijinja::Error),
}
