//! Devotional pages ship their data as a `window._model = {...}` script
//! assignment. When that object is complete it is more reliable than the
//! rendered markup.

use odb_core::{BibleInYear, DevotionalRecord, ReflectPray};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::dates;
use crate::devotional::split_readings;
use crate::matcher::{non_empty, text_of};

/// Upper bound on how far the brace scanner walks before giving up.
const MAX_MODEL_BYTES: usize = 500_000;
const MIN_INSIGHT_LEN: usize = 20;

lazy_static::lazy_static! {
    static ref MODEL_START: Regex = Regex::new(r"window\._model\s*=\s*\{").unwrap();
    static ref PARAGRAPHS: Selector = Selector::parse("p").unwrap();
    static ref STRONG: Selector = Selector::parse("strong").unwrap();
    static ref EM: Selector = Selector::parse("em").unwrap();
}

/// The parsed `window._model` object, if the page has one.
pub fn find_model(html: &str) -> Option<Value> {
    let found = MODEL_START.find(html)?;
    let json = balanced_object(&html[found.end() - 1..])?;
    serde_json::from_str(json).ok()
}

/// Record built from the page model's `pageModel`. `None` unless the model
/// carries a title, a parseable date and a body.
pub fn extract(html: &str, source_url: &Url) -> Option<DevotionalRecord> {
    let model = find_model(html)?;
    let page = model.get("pageModel")?;

    let title = str_field(page, "pageTitle").or_else(|| str_field(page, "heroTitle"))?;
    let date = str_field(page, "devotionalDate").and_then(|raw| dates::parse_date(&raw))?;
    let body = page.get("devotionBody")?.as_str()?;
    let hero = hero(page);

    Some(DevotionalRecord {
        title,
        date,
        author: hero
            .and_then(|hero| hero.get("author"))
            .and_then(|author| str_field(author, "name")),
        scripture: str_field(page, "bibleVerseText"),
        featured_verse: hero.and_then(|hero| str_field(hero, "summary")),
        content: fragment_paragraphs(body),
        reflect_pray: reflect_pray(page),
        insights: insights(page),
        bible_in_year: bible_in_year(page),
        url: source_url.to_string(),
        image_url: hero
            .and_then(|hero| hero.get("backgroundImage"))
            .and_then(|image| str_field(image, "url"))
            .and_then(|path| source_url.join(&path).ok())
            .map(|url| url.to_string()),
    })
}

/// `heroContent`, unwrapping the optional `model` indirection.
fn hero(page: &Value) -> Option<&Value> {
    let hero = page.get("heroContent").filter(|hero| hero.is_object())?;
    match hero.get("model") {
        Some(inner) if inner.is_object() => Some(inner),
        _ => Some(hero),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).and_then(non_empty)
}

fn fragment_paragraphs(fragment: &str) -> Vec<String> {
    Html::parse_fragment(fragment)
        .select(&PARAGRAPHS)
        .map(text_of)
        .filter(|text| !text.is_empty())
        .collect()
}

fn reflect_pray(page: &Value) -> Option<ReflectPray> {
    let question = page
        .get("reflectBody")
        .and_then(Value::as_str)
        .and_then(|body| {
            Html::parse_fragment(body)
                .select(&STRONG)
                .last()
                .map(text_of)
        })
        .and_then(|text| non_empty(&text))?;
    let prayer = page
        .get("prayerBody")
        .and_then(Value::as_str)
        .and_then(|body| Html::parse_fragment(body).select(&EM).next().map(text_of))
        .and_then(|text| non_empty(&text));

    Some(ReflectPray { question, prayer })
}

fn insights(page: &Value) -> Option<String> {
    let body = page.get("insightsBody").and_then(Value::as_str)?;
    let text = fragment_paragraphs(body)
        .into_iter()
        .filter(|p| p.chars().count() > MIN_INSIGHT_LEN)
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(&text)
}

fn bible_in_year(page: &Value) -> Option<BibleInYear> {
    let entry = page.get("bibleInAYearEntries")?.as_array()?.first()?;
    split_readings(&str_field(entry, "bibleVerseText")?)
}

/// The `{...}` object at the start of `text`, honoring string literals.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, byte) in text.bytes().enumerate().take(MAX_MODEL_BYTES) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}
