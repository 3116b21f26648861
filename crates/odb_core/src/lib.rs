pub mod config;
pub mod error;
pub mod models;

pub use config::SourceConfig;
pub use error::{Error, ExtractionError, FetchError, ResolutionError};
pub use models::{BibleInYear, DevotionalPage, DevotionalPreview, DevotionalRecord, ReflectPray};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{DevotionalPreview, DevotionalRecord, Error, Result, SourceConfig};
}
