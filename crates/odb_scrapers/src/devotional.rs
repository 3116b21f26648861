//! HTML heuristics for a single devotional page.
//!
//! Each field has its own extractor so a markup change upstream touches one
//! function. Only title, date and the content container are mandatory; every
//! other field degrades to `None`.

use odb_core::{BibleInYear, DevotionalRecord, ExtractionError, ReflectPray};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use crate::dates;
use crate::matcher::{is_heading, non_empty, text_of, TextMatcher};
use crate::page_model;

const HEADING_SCOPE: &str = "h2, h3, h4, h5, h6, strong, b, dt";
const MAX_AUTHOR_LEN: usize = 60;
const MAX_LABEL_LEN: usize = 40;

lazy_static::lazy_static! {
    static ref TITLE: Selector = Selector::parse("h1").unwrap();
    static ref DATE_ATTRS: Vec<(Selector, &'static str)> = vec![
        (Selector::parse("time[datetime]").unwrap(), "datetime"),
        (Selector::parse("meta[property='article:published_time']").unwrap(), "content"),
        (Selector::parse("meta[name='date']").unwrap(), "content"),
        (Selector::parse("meta[itemprop='datePublished']").unwrap(), "content"),
    ];
    static ref DATE_TEXT: Selector =
        Selector::parse(".devotional-date, .date, time").unwrap();
    static ref AUTHORS: Vec<Selector> = [
        ".author",
        ".byline",
        "[rel='author']",
        "[itemprop='author']",
        "a[href*='/authors/']",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref AUTHOR_META: Selector = Selector::parse("meta[name='author']").unwrap();
    static ref BY_PREFIX: Regex = Regex::new(r"(?i)^\s*(?:written\s+)?by[:\s]+").unwrap();
    static ref SCRIPTURE_CLASSES: Selector =
        Selector::parse(".scripture, .bible-reading, .devotional-scripture").unwrap();
    static ref SCRIPTURE_LABEL: TextMatcher = TextMatcher::new(
        r"(?i)^\s*(?:today['’]?s\s+)?scripture(?:\s+reading)?\b",
        "h2, h3, h4, h5, p, span, strong, dt",
    );
    // "Read" opens plenty of body sentences, so it only counts as a label.
    static ref READ_LABEL: TextMatcher =
        TextMatcher::new(r"(?i)^\s*read\b", "h2, h3, h4, h5, strong, b, dt");
    static ref SCRIPTURE_BUTTON: TextMatcher =
        TextMatcher::new(r"^\s*(?:[1-3]\s*)?[A-Z][a-z]+(?:\s+of\s+[A-Z][a-z]+)?\s+\d+:\d+", "button");
    static ref FEATURED_VERSE: Vec<Selector> = [
        ".featured-verse",
        ".key-verse",
        ".verse-of-the-day",
        "blockquote",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref CONTAINERS: Vec<Selector> = [
        ".devotional-body",
        ".devotional-content",
        ".devotion-body",
        "[itemprop='articleBody']",
        ".article-body",
        "article",
        "main",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref REFLECT_PRAY: TextMatcher = TextMatcher::new(
        r"(?i)^\s*reflect\s*(?:&|and|\+)\s*pray\b",
        HEADING_SCOPE,
    );
    static ref INSIGHTS: TextMatcher = TextMatcher::new(
        r"(?i)^\s*(?:scripture\s+)?insights?\b",
        HEADING_SCOPE,
    );
    static ref BIBLE_IN_YEAR: TextMatcher = TextMatcher::new(
        r"(?i)^\s*(?:today['’]?s\s+)?bible\s+in\s+a\s+year\b",
        HEADING_SCOPE,
    );
    static ref SKIPPED_PARAGRAPH_CLASS: Regex =
        Regex::new(r"(?i)author|byline|date|scripture|verse|share").unwrap();
    static ref IMAGES: Vec<Selector> = [
        "header img",
        ".hero img",
        ".devotional-image img",
        "figure img",
        "article img",
        "main img",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref OG_IMAGE: Selector = Selector::parse("meta[property='og:image']").unwrap();
}

/// Builds a record from a devotional page.
///
/// Pages that embed their data as a `window._model` object are read from that
/// object; everything else goes through the HTML heuristics.
#[instrument(level = "debug", skip_all, fields(url = %source_url))]
pub fn extract_devotional(html: &str, source_url: &Url) -> Result<DevotionalRecord, ExtractionError> {
    if let Some(record) = page_model::extract(html, source_url) {
        debug!("extracted from embedded page model");
        return Ok(record);
    }

    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = extract_title(root)?;
    let date = extract_date(root)?;
    let content = extract_content(root)?;

    Ok(DevotionalRecord {
        title,
        date,
        author: extract_author(root),
        scripture: extract_scripture(root),
        featured_verse: extract_featured_verse(root),
        content,
        reflect_pray: extract_reflect_pray(root),
        insights: extract_insights(root),
        bible_in_year: extract_bible_in_year(root),
        url: source_url.to_string(),
        image_url: extract_image(root, source_url),
    })
}

fn extract_title(root: ElementRef) -> Result<String, ExtractionError> {
    root.select(&TITLE)
        .map(text_of)
        .find(|text| !text.is_empty())
        .ok_or(ExtractionError::MissingField("title"))
}

fn extract_date(root: ElementRef) -> Result<chrono::NaiveDate, ExtractionError> {
    let mut first_raw: Option<String> = None;

    let attributes = DATE_ATTRS.iter().flat_map(|(selector, attr)| {
        root.select(selector)
            .filter_map(move |el| el.value().attr(attr).map(str::to_string))
    });
    let texts = root.select(&DATE_TEXT).map(text_of);

    for raw in attributes.chain(texts) {
        if raw.trim().is_empty() {
            continue;
        }
        if let Some(date) = dates::parse_date(&raw) {
            return Ok(date);
        }
        first_raw.get_or_insert(raw);
    }

    if let Some(date) = dates::find_date(&text_of(root)) {
        return Ok(date);
    }

    match first_raw {
        Some(raw) => Err(ExtractionError::DateParseFailure(raw)),
        None => Err(ExtractionError::MissingField("date")),
    }
}

fn extract_author(root: ElementRef) -> Option<String> {
    let from_markup = AUTHORS.iter().find_map(|selector| {
        root.select(selector)
            .map(text_of)
            .map(|text| BY_PREFIX.replace(&text, "").trim().to_string())
            .find(|text| {
                !text.is_empty()
                    && text.chars().count() <= MAX_AUTHOR_LEN
                    && ![".jpg", ".png", ".gif", ".svg"]
                        .iter()
                        .any(|ext| text.to_lowercase().contains(ext))
            })
    });

    from_markup.or_else(|| {
        root.select(&AUTHOR_META)
            .find_map(|el| el.value().attr("content").and_then(non_empty))
    })
}

fn extract_scripture(root: ElementRef) -> Option<String> {
    root.select(&SCRIPTURE_CLASSES)
        .map(|el| {
            SCRIPTURE_LABEL
                .inline_value(el)
                .or_else(|| READ_LABEL.inline_value(el))
                .unwrap_or_else(|| text_of(el))
        })
        .find(|text| is_reference(text))
        .or_else(|| labelled_reference(&SCRIPTURE_LABEL, root))
        .or_else(|| labelled_reference(&READ_LABEL, root))
        .or_else(|| SCRIPTURE_BUTTON.first(root).map(text_of))
}

fn is_reference(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

fn labelled_reference(label: &TextMatcher, root: ElementRef) -> Option<String> {
    label
        .section(root)
        .and_then(|blocks| blocks.into_iter().next())
        .filter(|text| is_reference(text))
}

fn extract_featured_verse(root: ElementRef) -> Option<String> {
    FEATURED_VERSE.iter().find_map(|selector| {
        root.select(selector)
            .map(text_of)
            .find_map(|text| non_empty(&text))
    })
}

/// Paragraphs of the main container in document order, up to the first
/// section heading. A missing container is an error, an empty one is not.
fn extract_content(root: ElementRef) -> Result<Vec<String>, ExtractionError> {
    let container = CONTAINERS
        .iter()
        .find_map(|selector| root.select(selector).next())
        .ok_or(ExtractionError::MissingField("content"))?;

    let mut paragraphs = Vec::new();
    for el in container.descendants().filter_map(ElementRef::wrap) {
        let name = el.value().name();
        if is_heading(el) || name == "p" {
            let text = text_of(el);
            if starts_section(el, &text) {
                break;
            }
            if name != "p" || in_aside(el, container) || has_skipped_class(el) {
                continue;
            }
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }
    }
    Ok(paragraphs)
}

fn is_section_label(text: &str) -> bool {
    REFLECT_PRAY.is_match(text) || INSIGHTS.is_match(text) || BIBLE_IN_YEAR.is_match(text)
}

/// Headings start a section when they carry a label. Paragraphs only do when
/// they lead with a bold label or are nothing but a short label, so body text
/// that happens to begin with "Insight" stays in the body.
fn starts_section(el: ElementRef, text: &str) -> bool {
    if is_heading(el) {
        return is_section_label(text);
    }
    let lead = el
        .children()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|child| matches!(child.value().name(), "strong" | "b"));
    match lead {
        Some(lead) => is_section_label(&text_of(lead)),
        None => text.chars().count() <= MAX_LABEL_LEN && is_section_label(text),
    }
}

fn has_skipped_class(el: ElementRef) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|class| SKIPPED_PARAGRAPH_CLASS.is_match(class))
}

fn in_aside(el: ElementRef, container: ElementRef) -> bool {
    el.ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            matches!(
                ancestor.value().name(),
                "blockquote" | "figure" | "aside" | "header" | "footer" | "nav"
            )
        })
}

fn extract_reflect_pray(root: ElementRef) -> Option<ReflectPray> {
    let blocks = REFLECT_PRAY.section(root)?;
    split_reflect_pray(blocks)
}

/// First block is the question and the rest the prayer. A lone block is
/// split after its first question mark.
pub(crate) fn split_reflect_pray(blocks: Vec<String>) -> Option<ReflectPray> {
    let mut blocks = blocks.into_iter().filter(|b| !b.trim().is_empty());
    let first = blocks.next()?;
    let rest: Vec<String> = blocks.collect();

    if !rest.is_empty() {
        return Some(ReflectPray {
            question: first,
            prayer: non_empty(&rest.join(" ")),
        });
    }

    match first.find('?') {
        Some(idx) => Some(ReflectPray {
            question: first[..=idx].trim().to_string(),
            prayer: non_empty(&first[idx + 1..]),
        }),
        None => Some(ReflectPray {
            question: first,
            prayer: None,
        }),
    }
}

fn extract_insights(root: ElementRef) -> Option<String> {
    let blocks = INSIGHTS.section(root)?;
    non_empty(&blocks.join(" "))
}

fn extract_bible_in_year(root: ElementRef) -> Option<BibleInYear> {
    let blocks = BIBLE_IN_YEAR.section(root)?;
    if let [old, new] = blocks.as_slice() {
        if !old.contains(';') && !new.contains(';') {
            return Some(BibleInYear {
                old_testament: old.clone(),
                new_testament: new.clone(),
            });
        }
    }
    split_readings(&blocks.join("\n"))
}

/// Splits "Genesis 43–45; Matthew 12:24–50" into its two readings. Returns
/// `None` rather than guessing when the text does not split cleanly in two.
pub(crate) fn split_readings(text: &str) -> Option<BibleInYear> {
    [";", " and ", "\n"].iter().find_map(|separator| {
        let parts: Vec<&str> = text.split(*separator).map(str::trim).collect();
        match parts.as_slice() {
            [old, new] if !old.is_empty() && !new.is_empty() => Some(BibleInYear {
                old_testament: old.replace('\n', " "),
                new_testament: new.replace('\n', " "),
            }),
            _ => None,
        }
    })
}

fn extract_image(root: ElementRef, source_url: &Url) -> Option<String> {
    let from_markup = IMAGES.iter().find_map(|selector| {
        root.select(selector).find_map(|img| {
            ["src", "data-src"]
                .iter()
                .filter_map(|attr| img.value().attr(attr))
                .find(|src| !src.trim().is_empty() && !src.starts_with("data:"))
        })
    });

    from_markup
        .or_else(|| root.select(&OG_IMAGE).find_map(|el| el.value().attr("content")))
        .and_then(|src| source_url.join(src.trim()).ok())
        .map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn url() -> Url {
        Url::parse("https://www.odbm.org/en/devotionals/devotional-category/sample").unwrap()
    }

    #[test]
    fn test_missing_title() {
        let html = "<html><body><time datetime=\"2026-01-18\"></time><main><p>Body</p></main></body></html>";
        assert_eq!(
            extract_devotional(html, &url()),
            Err(ExtractionError::MissingField("title"))
        );
    }

    #[test]
    fn test_blank_title_counts_as_missing() {
        let html = "<html><body><h1>   </h1><time datetime=\"2026-01-18\"></time><main><p>Body</p></main></body></html>";
        assert_eq!(
            extract_devotional(html, &url()),
            Err(ExtractionError::MissingField("title"))
        );
    }

    #[test]
    fn test_unparseable_date() {
        let html = "<html><body><h1>T</h1><time>someday soon</time><main><p>Body</p></main></body></html>";
        assert_eq!(
            extract_devotional(html, &url()),
            Err(ExtractionError::DateParseFailure("someday soon".to_string()))
        );
    }

    #[test]
    fn test_missing_date() {
        let html = "<html><body><h1>T</h1><main><p>Body</p></main></body></html>";
        assert_eq!(
            extract_devotional(html, &url()),
            Err(ExtractionError::MissingField("date"))
        );
    }

    #[test]
    fn test_date_from_minified_page_text() {
        let html = "<html><body><h1>Faith</h1><p>January 18, 2026</p><main><p>Body</p></main></body></html>";
        let record = extract_devotional(html, &url()).unwrap();
        assert_eq!(record.title, "Faith");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 18).unwrap());
        assert_eq!(record.content, vec!["Body"]);
    }

    #[test]
    fn test_read_is_only_a_label_in_label_elements() {
        let body_only = "<html><body><h1>T</h1><time datetime=\"2026-01-18\"></time><main>\
            <p>Read carefully: Psalm 23 has 6 verses.</p></main></body></html>";
        let record = extract_devotional(body_only, &url()).unwrap();
        assert_eq!(record.scripture, None);
        assert_eq!(record.content, vec!["Read carefully: Psalm 23 has 6 verses."]);

        let labelled = "<html><body><h1>T</h1><time datetime=\"2026-01-18\"></time>\
            <p><strong>Read:</strong> Psalm 23:1-6</p><main><p>Body</p></main></body></html>";
        let record = extract_devotional(labelled, &url()).unwrap();
        assert_eq!(record.scripture.as_deref(), Some("Psalm 23:1-6"));
    }

    #[test]
    fn test_missing_container() {
        let html = "<html><body><h1>T</h1><time datetime=\"2026-01-18\"></time><div><p>Body</p></div></body></html>";
        assert_eq!(
            extract_devotional(html, &url()),
            Err(ExtractionError::MissingField("content"))
        );
    }

    #[test]
    fn test_empty_container_is_not_an_error() {
        let html = "<html><body><h1>T</h1><time datetime=\"2026-01-18\"></time><article></article></body></html>";
        let record = extract_devotional(html, &url()).unwrap();
        assert!(record.content.is_empty());
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 18).unwrap());
        assert_eq!(record.url, url().to_string());
        assert_eq!(record.author, None);
        assert_eq!(record.reflect_pray, None);
        assert_eq!(record.bible_in_year, None);
    }

    #[test]
    fn test_split_reflect_pray_single_block() {
        let pair = split_reflect_pray(vec![
            "Who needs your encouragement? Jesus, help me speak kindly.".to_string(),
        ])
        .unwrap();
        assert_eq!(pair.question, "Who needs your encouragement?");
        assert_eq!(pair.prayer.as_deref(), Some("Jesus, help me speak kindly."));
    }

    #[test]
    fn test_split_reflect_pray_question_only() {
        let pair = split_reflect_pray(vec!["Think about today.".to_string()]).unwrap();
        assert_eq!(pair.question, "Think about today.");
        assert_eq!(pair.prayer, None);
        assert_eq!(split_reflect_pray(vec![]), None);
    }

    #[test]
    fn test_split_readings() {
        let semicolon = split_readings("Genesis 43–45; Matthew 12:24–50").unwrap();
        assert_eq!(semicolon.old_testament, "Genesis 43–45");
        assert_eq!(semicolon.new_testament, "Matthew 12:24–50");

        let conjunction = split_readings("1 Samuel 1–3 and Luke 7:1–30").unwrap();
        assert_eq!(conjunction.old_testament, "1 Samuel 1–3");
        assert_eq!(conjunction.new_testament, "Luke 7:1–30");

        let lines = split_readings("Exodus 1–3\nMatthew 13:1–23").unwrap();
        assert_eq!(lines.new_testament, "Matthew 13:1–23");
    }

    #[test]
    fn test_split_readings_ambiguous() {
        assert_eq!(split_readings("Psalms 1–150"), None);
        assert_eq!(split_readings("Job 1; Job 2; Luke 1"), None);
        assert_eq!(split_readings("; Luke 1"), None);
    }

    #[test]
    fn test_bible_in_year_from_line_break() {
        let html = "<html><body><h1>T</h1><time datetime=\"2026-01-18\"></time><main>\
            <p>Body</p><h4>Bible in a Year</h4><p>Exodus 1–3<br>Matthew 13:1–23</p></main></body></html>";
        let record = extract_devotional(html, &url()).unwrap();
        assert_eq!(record.content, vec!["Body"]);
        let readings = record.bible_in_year.unwrap();
        assert_eq!(readings.old_testament, "Exodus 1–3");
        assert_eq!(readings.new_testament, "Matthew 13:1–23");
    }

    #[test]
    fn test_inline_labels() {
        let html = "<html><body><h1>T</h1><p class=\"date\">Sunday, January 18, 2026</p><main>\
            <p>By the river we prayed.</p>\
            <p><strong>Reflect &amp; Pray:</strong> Where do you find rest? Father, be my rest.</p>\
            <p><strong>Insights:</strong> Rivers appear often in Scripture.</p>\
            </main></body></html>";
        let record = extract_devotional(html, &url()).unwrap();
        assert_eq!(record.content, vec!["By the river we prayed."]);
        let pair = record.reflect_pray.unwrap();
        assert_eq!(pair.question, "Where do you find rest?");
        assert_eq!(pair.prayer.as_deref(), Some("Father, be my rest."));
        assert_eq!(record.insights.as_deref(), Some("Rivers appear often in Scripture."));
    }
}
