use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::extract::RawCard;
use crate::models::NewsRecord;

pub const PLACEHOLDER_LINK: &str = "#";

static LINK_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/informa/(\d+)(?:/|$)|[?&]id=(\d+)").expect("link id pattern compiles")
});

/// Canonical portal categories and the keywords that map onto them.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Saúde", &["saude", "vacina", "covid", "medic", "hospital"]),
    ("Educação", &["educa", "escola", "aluno", "professor", "matricula"]),
    ("Obras", &["obra", "infra", "constru", "paviment", "estrada"]),
    ("Meio Ambiente", &["ambiente", "agric", "rural", "campo"]),
    ("Cultura", &["cultura", "fest", "evento"]),
    ("Assistência Social", &["social", "assist"]),
    ("Esporte", &["esporte", "futebol", "lazer"]),
];

/// Defaults applied to fields the page did not provide.
#[derive(Debug, Clone)]
pub struct Normalizer {
    origin: Url,
    default_category: String,
    default_date: String,
}

impl Normalizer {
    pub fn new(origin: Url, default_category: String, default_date: String) -> Self {
        Self {
            origin,
            default_category,
            default_date,
        }
    }

    /// Turn a raw card into a record. The id comes from the link, if any; see
    /// [`assign_ids`] for the rest. Returns `None` for a blank title.
    pub fn normalize(&self, card: RawCard) -> Option<NewsRecord> {
        let title = card.title.trim().to_string();
        if title.is_empty() {
            return None;
        }

        let link = card
            .href
            .as_deref()
            .and_then(|href| self.resolve(href))
            .unwrap_or_else(|| PLACEHOLDER_LINK.to_string());
        let image_url = card.image_src.as_deref().and_then(|src| self.resolve(src));

        let category = card
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(canonical_category)
            .unwrap_or_else(|| self.default_category.clone());
        let date = card
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_date.clone());

        let id = link_id(&link);

        Some(NewsRecord {
            id,
            title,
            category,
            date,
            link,
            image_url,
        })
    }

    /// Resolve `href` against the site origin. Absolute http(s) URLs pass
    /// through untouched; anything that does not end up http(s) is rejected.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Some(href.to_string());
        }
        let resolved = self.origin.join(href).ok()?;
        match resolved.scheme() {
            "http" | "https" => Some(resolved.to_string()),
            _ => None,
        }
    }
}

/// Give every record in the batch a distinct id. Ids parsed from links win
/// (first occurrence only); the rest get their 1-based position, or the next
/// free number above it when that is already taken.
pub fn assign_ids(records: &mut [NewsRecord]) {
    let mut taken = HashSet::new();
    for record in records.iter_mut() {
        if let Some(id) = record.id {
            if !taken.insert(id) {
                record.id = None;
            }
        }
    }

    for (i, record) in records.iter_mut().enumerate() {
        if record.id.is_some() {
            continue;
        }
        let mut candidate = i as u64 + 1;
        while taken.contains(&candidate) {
            candidate += 1;
        }
        taken.insert(candidate);
        record.id = Some(candidate);
    }
}

/// Map a free-text tag onto one of the portal's categories, or keep it.
pub fn canonical_category(label: &str) -> String {
    let folded = fold_accents(&label.to_lowercase());
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| folded.contains(k)))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or_else(|| label.to_string())
}

fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'ê' | 'è' => 'e',
            'í' | 'î' => 'i',
            'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn link_id(link: &str) -> Option<u64> {
    let caps = LINK_ID.captures(link)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}
