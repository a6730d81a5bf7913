use thiserror::Error;

/// Failure of a single extraction. Internal tier and encoding misses are
/// never surfaced; callers only see these once every strategy is exhausted.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no embedded XML document found in container")]
    NotFound,
    #[error("byte range decodes under no candidate encoding")]
    Decode,
    #[error("markup is not well-formed after repair: {0}")]
    Format(String),
}
