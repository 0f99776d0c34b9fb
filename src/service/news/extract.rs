use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::{ConfigError, SelectorConfig};

static RELATIVE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bh[áa]\s+(?:mais\s+de\s+)?(?:\d+|um|uma)\s+(?:segundos?|minutos?|horas?|dias?|semanas?|m[êe]s(?:es)?|anos?)\b|\b\d+\s+(?:seconds?|minutes?|hours?|days?|weeks?|months?|years?)\s+ago\b|\b(?:hoje|ontem)\b",
    )
    .expect("relative time pattern compiles")
});

/// Compiled form of [`SelectorConfig`].
#[derive(Debug, Clone)]
pub struct SelectorSet {
    container: Selector,
    title: Selector,
    snippet: Selector,
    category: Selector,
    link: Selector,
    image: Selector,
}

impl SelectorSet {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            container: parse("NEWS_SELECTOR_CONTAINER", &config.container)?,
            title: parse("NEWS_SELECTOR_TITLE", &config.title)?,
            snippet: parse("NEWS_SELECTOR_SNIPPET", &config.snippet)?,
            category: parse("NEWS_SELECTOR_CATEGORY", &config.category)?,
            link: parse("NEWS_SELECTOR_LINK", &config.link)?,
            image: parse("NEWS_SELECTOR_IMAGE", &config.image)?,
        })
    }
}

fn parse(key: &'static str, value: &str) -> Result<Selector, ConfigError> {
    Selector::parse(value).map_err(|_| ConfigError::InvalidSelector {
        key,
        value: value.to_string(),
    })
}

/// Fields pulled out of one container, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCard {
    pub title: String,
    pub date: Option<String>,
    pub category: Option<String>,
    pub href: Option<String>,
    pub image_src: Option<String>,
}

/// Walk the document's containers in order and collect at most `cap` cards.
/// Containers without a usable title are skipped, as are containers nested
/// inside another container (the outer one already covers them).
pub fn extract_cards(document: &Html, selectors: &SelectorSet, cap: usize) -> Vec<RawCard> {
    let mut cards = Vec::new();
    for (position, container) in document.select(&selectors.container).enumerate() {
        if cards.len() >= cap {
            break;
        }
        if is_nested(container, &selectors.container) {
            continue;
        }
        match extract_card(container, selectors) {
            Some(card) => cards.push(card),
            None => debug!(position, "skipping news container without a title"),
        }
    }
    cards
}

fn is_nested(container: ElementRef<'_>, selector: &Selector) -> bool {
    container
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| selector.matches(&ancestor))
}

fn extract_card(container: ElementRef<'_>, selectors: &SelectorSet) -> Option<RawCard> {
    let title_el = container.select(&selectors.title).next()?;
    let title = collapsed_text(title_el);
    if title.is_empty() {
        return None;
    }

    let snippets: Vec<String> = container.select(&selectors.snippet).map(collapsed_text).collect();
    let snippet = if snippets.is_empty() {
        text_outside(container, title_el)
    } else {
        snippets.join(" ")
    };
    let date = relative_time(&snippet);

    let category = container
        .select(&selectors.category)
        .next()
        .map(collapsed_text)
        .map(|label| strip_marker(&label).to_string())
        .filter(|label| !label.is_empty());

    let href = container
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    let image_src = container.select(&selectors.image).next().and_then(|img| {
        ["src", "data-src"]
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|src| !src.is_empty())
            .map(str::to_string)
    });

    Some(RawCard {
        title,
        date,
        category,
        href,
        image_src,
    })
}

/// First relative-time phrase ("Há 2 dias", "3 hours ago") in `text`.
pub fn relative_time(text: &str) -> Option<String> {
    RELATIVE_TIME.find(text).map(|m| m.as_str().to_string())
}

fn strip_marker(label: &str) -> &str {
    label
        .trim_start_matches(|c: char| matches!(c, '#' | '•' | '-' | '|') || c.is_whitespace())
        .trim_end()
}

/// Container text with the title's text left out.
fn text_outside(container: ElementRef<'_>, excluded: ElementRef<'_>) -> String {
    container
        .descendants()
        .filter(|node| !node.ancestors().any(|a| a.id() == excluded.id()))
        .filter_map(|node| node.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
