use chrono::NaiveDate;
use odb_core::{ResolutionError, SourceConfig};
use url::Url;

use crate::dates;

/// Characters that would change the meaning of a path segment.
const RESERVED: &[char] = &[
    '/', '?', '#', '%', '\\', '[', ']', '@', '!', '$', '&', '\'', '(', ')', '*', '+', ',', ';',
    '=', '"', '<', '>', '^', '`', '{', '|', '}',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Today,
    ByDate(String),
    BySlug(String),
}

/// Where a request's devotional is to be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The landing page; today's devotional is its first card.
    Landing(Url),
    /// The index page, to be searched for a card dated `date`.
    Dated { index: Url, date: NaiveDate },
    /// A devotional page addressed directly.
    Page(Url),
}

impl Target {
    pub fn url(&self) -> &Url {
        match self {
            Target::Landing(url) | Target::Page(url) => url,
            Target::Dated { index, .. } => index,
        }
    }
}

/// Maps a request onto the source site. Never touches the network, so a
/// syntactically valid date or slug may still turn out not to exist.
pub fn resolve(config: &SourceConfig, request: &Request) -> Result<Target, ResolutionError> {
    match request {
        Request::Today => Ok(Target::Landing(config.devotionals_url())),
        Request::ByDate(raw) => {
            let date = dates::parse_iso_date(raw)
                .ok_or_else(|| ResolutionError::InvalidDateFormat(raw.clone()))?;
            Ok(Target::Dated {
                index: config.devotionals_url(),
                date,
            })
        }
        Request::BySlug(slug) => {
            validate_slug(slug)?;
            Ok(Target::Page(config.devotional_url(slug)))
        }
    }
}

pub fn validate_slug(slug: &str) -> Result<&str, ResolutionError> {
    let invalid = slug.is_empty()
        || slug == "."
        || slug == ".."
        || slug
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || RESERVED.contains(&c));
    if invalid {
        Err(ResolutionError::InvalidSlug(slug.to_string()))
    } else {
        Ok(slug)
    }
}
