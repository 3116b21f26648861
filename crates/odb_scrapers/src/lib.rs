pub mod dates;
pub mod devotional;
pub mod fetch;
pub mod listing;
pub mod matcher;
pub mod page_model;
pub mod resolver;
pub mod service;

pub use devotional::extract_devotional;
pub use fetch::{Fetch, HttpFetcher};
pub use listing::{clamp_limit, extract_listing};
pub use resolver::{resolve, Request, Target};
pub use service::DevotionalService;

pub mod prelude {
    pub use super::{DevotionalService, Fetch};
    pub use odb_core::{DevotionalPreview, DevotionalRecord, Error, Result};
}
