use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One full devotional entry as published on the source site.
///
/// Optional sections serialize as `null` when the page lacks them; they are
/// never skipped so clients always see the same set of keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevotionalRecord {
    pub title: String,
    pub date: NaiveDate,
    pub author: Option<String>,
    pub scripture: Option<String>,
    pub featured_verse: Option<String>,
    pub content: Vec<String>,
    pub reflect_pray: Option<ReflectPray>,
    pub insights: Option<String>,
    pub bible_in_year: Option<BibleInYear>,
    pub url: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectPray {
    pub question: String,
    pub prayer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibleInYear {
    pub old_testament: String,
    pub new_testament: String,
}

/// Lightweight listing entry. Never carries the full body sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevotionalPreview {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub author: Option<String>,
    pub preview: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
}

impl From<&DevotionalRecord> for DevotionalPreview {
    fn from(record: &DevotionalRecord) -> Self {
        Self {
            title: record.title.clone(),
            date: Some(record.date),
            author: record.author.clone(),
            preview: record.content.first().cloned(),
            url: record.url.clone(),
            image_url: record.image_url.clone(),
        }
    }
}

/// Response body of the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevotionalPage {
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
    pub devotionals: Vec<DevotionalPreview>,
}

impl DevotionalPage {
    pub fn new(limit: usize, offset: usize, devotionals: Vec<DevotionalPreview>) -> Self {
        Self {
            count: devotionals.len(),
            limit,
            offset,
            devotionals,
        }
    }
}
