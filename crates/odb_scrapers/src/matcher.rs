//! Locating elements by the text they carry.
//!
//! Upstream markup changes often; labels such as "Reflect & Pray" or
//! "Bible in a Year" change far less. Field extractors describe what they look
//! for as a [`TextMatcher`] and share the traversal below.

use regex::Regex;
use scraper::{ElementRef, Node, Selector};

lazy_static::lazy_static! {
    static ref BLOCKS: Selector = Selector::parse("p, li").unwrap();
    static ref HEADINGS: Selector = Selector::parse("h1, h2, h3, h4, h5, h6").unwrap();
}

/// How far a section lookup climbs when a heading is wrapped in its own
/// container (`<div><h3>Insights</h3></div><p>...</p>`).
const MAX_CLIMB: usize = 2;

/// A text pattern, the elements it is tested against, and a first-match policy.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    pattern: Regex,
    scope: Selector,
}

impl TextMatcher {
    /// Panics on an invalid pattern or selector; matchers are built from literals.
    pub fn new(pattern: &str, scope: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            scope: Selector::parse(scope).unwrap(),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// First element in document order under `root` whose text matches.
    pub fn first<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        root.select(&self.scope)
            .find(|el| self.pattern.is_match(&text_of(*el)))
    }

    /// Text that follows the label inside the matched element itself,
    /// e.g. `Nehemiah 6:1-9` out of `Today's Scripture: Nehemiah 6:1-9`.
    pub fn inline_value(&self, el: ElementRef) -> Option<String> {
        let text = text_of(el);
        let found = self.pattern.find(&text)?;
        let rest = text[found.end()..]
            .trim_start_matches(|c: char| c == ':' || c == '|' || c == '-' || c.is_whitespace());
        non_empty(rest)
    }

    /// Inline value when there is one, otherwise the blocks of the section the
    /// matched element heads.
    pub fn section<'a>(&self, root: ElementRef<'a>) -> Option<Vec<String>> {
        let heading = self.first(root)?;
        if let Some(value) = self.inline_value(heading) {
            return Some(vec![value]);
        }
        let blocks = section_blocks(heading);
        if blocks.is_empty() {
            None
        } else {
            Some(blocks)
        }
    }
}

/// Element text with whitespace collapsed. `<br>` survives as a newline and
/// block elements are kept apart, so minified `<h1>A</h1><p>B</p>` reads `A B`.
pub fn text_of(el: ElementRef) -> String {
    let mut raw = String::new();
    push_text(el, &mut raw);
    collapse_whitespace(&raw)
}

fn push_text(el: ElementRef, raw: &mut String) {
    for child in el.children() {
        if let Node::Text(text) = child.value() {
            raw.push_str(&text.replace('\n', " "));
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if name == "br" {
            raw.push('\n');
        } else if name == "script" || name == "style" {
            continue;
        } else if is_inline(name) {
            push_text(child, raw);
        } else {
            raw.push(' ');
            push_text(child, raw);
            raw.push(' ');
        }
    }
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr" | "b" | "cite" | "code" | "em" | "i" | "mark" | "q" | "small" | "span"
            | "strong" | "sub" | "sup" | "u" | "time" | "br"
    )
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub fn is_heading(el: ElementRef) -> bool {
    matches!(el.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Text blocks after `heading`, stopping at the next heading.
pub fn section_blocks(heading: ElementRef) -> Vec<String> {
    let mut anchor = heading;
    for _ in 0..=MAX_CLIMB {
        let blocks = following_blocks(anchor);
        if !blocks.is_empty() {
            return blocks;
        }
        match anchor.parent().and_then(ElementRef::wrap) {
            Some(parent) => anchor = parent,
            None => break,
        }
    }
    Vec::new()
}

fn following_blocks(anchor: ElementRef) -> Vec<String> {
    let mut blocks = Vec::new();
    for sibling in anchor.next_siblings() {
        if let Some(text) = sibling.value().as_text() {
            if let Some(text) = non_empty(&collapse_whitespace(text)) {
                blocks.push(text);
            }
            continue;
        }
        let Some(element) = ElementRef::wrap(sibling) else {
            continue;
        };
        if is_heading(element) || element.select(&HEADINGS).next().is_some() {
            break;
        }
        let inner: Vec<String> = element
            .select(&BLOCKS)
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect();
        if inner.is_empty() {
            if let Some(text) = non_empty(&text_of(element)) {
                blocks.push(text);
            }
        } else {
            blocks.extend(inner);
        }
    }
    blocks
}
