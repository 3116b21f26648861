use thiserror::Error;

/// Failures while retrieving a page from the source site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),
}

/// Failures while turning fetched HTML into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unrecognized date: {0:?}")]
    DateParseFailure(String),
}

/// Failures while mapping a request onto a source page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Invalid date format: {0}. Use YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("{0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl Error {
    /// True when the failure means "no such devotional" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Resolution(ResolutionError::NotFound(_)))
    }
}
