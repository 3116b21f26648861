//! Devotional cards on the index page.

use std::collections::HashSet;

use odb_core::DevotionalPreview;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::dates;
use crate::matcher::{non_empty, text_of};

pub const MAX_LIMIT: usize = 50;
pub const DEFAULT_LIMIT: usize = 10;
pub const PREVIEW_LEN: usize = 200;

lazy_static::lazy_static! {
    static ref CARDS: Selector = Selector::parse("article, .card, .devotional-card").unwrap();
    static ref DEVOTIONAL_LINK: Selector =
        Selector::parse("a[href*='/devotionals/devotional-category/']").unwrap();
    static ref CARD_TITLE: Selector = Selector::parse("h2, h3, h4, .title, .card-title").unwrap();
    static ref CARD_TIME: Selector = Selector::parse("time[datetime]").unwrap();
    static ref CARD_DATE: Selector = Selector::parse("time, .date").unwrap();
    static ref CARD_AUTHOR: Selector =
        Selector::parse(".author, .byline, a[href*='/authors/']").unwrap();
    static ref PREVIEW_CLASSES: Selector = Selector::parse(".preview, .excerpt, .summary").unwrap();
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();
    static ref IMAGE: Selector = Selector::parse("img").unwrap();
}

/// Clamps a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(1, MAX_LIMIT as i64) as usize
}

/// Previews from an index page, skipping `offset` cards and yielding at most
/// `clamp_limit(limit)` of the rest.
pub fn extract_listing(
    html: &str,
    page_url: &Url,
    limit: i64,
    offset: usize,
) -> impl Iterator<Item = DevotionalPreview> {
    parse_cards(html, page_url)
        .into_iter()
        .skip(offset)
        .take(clamp_limit(limit))
}

/// Every well-formed card on the page, in document order, unique by URL.
///
/// Cards without a title or a devotional link are dropped so one broken card
/// cannot shift or break the rest of the listing.
pub fn parse_cards(html: &str, page_url: &Url) -> Vec<DevotionalPreview> {
    let document = Html::parse_document(html);
    let mut cards: Vec<ElementRef> = document
        .select(&CARDS)
        .filter(|card| !wraps_linked_card(*card))
        .collect();
    if cards.is_empty() {
        cards = link_parents(&document);
    }

    let total = cards.len();
    let mut seen = HashSet::new();
    let previews: Vec<DevotionalPreview> = cards
        .into_iter()
        .filter_map(|card| parse_card(card, page_url))
        .filter(|preview| seen.insert(preview.url.clone()))
        .collect();

    debug!(cards = total, previews = previews.len(), "parsed listing");
    previews
}

/// Fallback for pages without card markup: the parent of each distinct
/// devotional link stands in for a card.
fn link_parents(document: &Html) -> Vec<ElementRef<'_>> {
    let mut seen = HashSet::new();
    document
        .select(&DEVOTIONAL_LINK)
        .filter(|link| link.value().attr("href").is_some_and(|href| seen.insert(href)))
        .map(|link| link.parent().and_then(ElementRef::wrap).unwrap_or(link))
        .collect()
}

fn parse_card(card: ElementRef, page_url: &Url) -> Option<DevotionalPreview> {
    let link = card_link(card)?;
    let url = page_url.join(link.value().attr("href")?.trim()).ok()?;

    let title = card
        .select(&CARD_TITLE)
        .map(text_of)
        .find(|text| !text.is_empty())
        .or_else(|| non_empty(&text_of(link)))?;
    let author = card
        .select(&CARD_AUTHOR)
        .map(text_of)
        .map(|text| text.trim_start_matches("By ").trim().to_string())
        .find(|text| !text.is_empty());

    Some(DevotionalPreview {
        preview: card_preview(card, &title, author.as_deref()),
        date: card_date(card),
        title,
        author,
        url: url.to_string(),
        image_url: card_image(card, page_url),
    })
}

/// Section wrappers (`<article>` around `.card`s) match the card selector too;
/// only the innermost card that links a devotional stands for it.
fn wraps_linked_card(card: ElementRef) -> bool {
    card.select(&CARDS).any(|inner| card_link(inner).is_some())
}

/// The card's devotional link. Author, image and share links never qualify.
fn card_link(card: ElementRef) -> Option<ElementRef> {
    if DEVOTIONAL_LINK.matches(&card) {
        return Some(card);
    }
    card.select(&DEVOTIONAL_LINK).next()
}

fn card_date(card: ElementRef) -> Option<chrono::NaiveDate> {
    card.select(&CARD_TIME)
        .find_map(|el| el.value().attr("datetime").and_then(dates::parse_date))
        .or_else(|| {
            card.select(&CARD_DATE)
                .find_map(|el| dates::parse_date(&text_of(el)))
        })
        .or_else(|| dates::find_date(&text_of(card)))
}

fn card_preview(card: ElementRef, title: &str, author: Option<&str>) -> Option<String> {
    card.select(&PREVIEW_CLASSES)
        .chain(card.select(&PARAGRAPH))
        .map(text_of)
        .find(|text| {
            !text.is_empty()
                && text != title
                && Some(text.as_str()) != author
                && !is_bare_date(text)
        })
        .map(|text| truncate(&text, PREVIEW_LEN))
}

fn is_bare_date(text: &str) -> bool {
    text.chars().count() < 40 && dates::parse_date(text).is_some()
}

fn card_image(card: ElementRef, page_url: &Url) -> Option<String> {
    card.select(&IMAGE)
        .find_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
        .filter(|src| !src.trim().is_empty() && !src.starts_with("data:"))
        .and_then(|src| page_url.join(src.trim()).ok())
        .map(|url| url.to_string())
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
