use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::page::{ContactInformation, ContactSet, HarvestedPage, PageMetadata};

const ADDRESS_KEYWORDS: &[&str] = &["address", "location", "headquarters", "office", "contact"];
const SOCIAL_PLATFORMS: &[&str] = &["facebook", "twitter", "linkedin", "instagram"];
const NO_TITLE: &str = "No title";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

// Loose on purpose: matches are candidates for the answer model, not validated numbers.
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+?\d{1,3}[-.\s]?)?(?:\(?\d{1,4}\)?[-.\s]?)?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9}\b")
        .unwrap()
});

pub(super) fn extract_page(html: &str, url: &str) -> HarvestedPage {
    let document = Html::parse_document(html);

    HarvestedPage {
        metadata: PageMetadata {
            website_url: url.to_string(),
            page_title: extract_title(&document).unwrap_or_else(|| NO_TITLE.to_string()),
            industry_sector: extract_industry_sector(&document),
        },
        contact_information: ContactInformation {
            emails: extract_emails(html),
            phone_numbers: extract_phone_numbers(html),
            addresses: extract_addresses(&document),
        },
        social_media: extract_social_links(&document),
    }
}

pub(super) fn extract_emails(text: &str) -> ContactSet {
    EMAIL_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

pub(super) fn extract_phone_numbers(text: &str) -> ContactSet {
    PHONE_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|m| !m.is_empty())
        .collect()
}

/// Text of every `<div>`, then every `<p>`, whose lowercased text mentions an
/// address keyword. Nested blocks each contribute their own entry.
fn extract_addresses(document: &Html) -> Vec<String> {
    let mut texts: Vec<String> = select_all(document, "div").map(stripped_text).collect();
    texts.extend(select_all(document, "p").map(stripped_text));

    texts
        .into_iter()
        .filter(|text| {
            let lower = text.to_lowercase();
            ADDRESS_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .collect()
}

fn extract_social_links(document: &Html) -> Vec<String> {
    select_all(document, "a[href]")
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| SOCIAL_PLATFORMS.iter().any(|p| href.contains(p)))
        .map(str::to_string)
        .collect()
}

fn extract_title(document: &Html) -> Option<String> {
    select_all(document, "title")
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Meta description, falling back to meta keywords.
fn extract_industry_sector(document: &Html) -> Option<String> {
    meta_content(document, "description").or_else(|| meta_content(document, "keywords"))
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    select_all(document, &format!(r#"meta[name="{name}"]"#))
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Trimmed text nodes concatenated without separators.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

fn select_all<'a>(document: &'a Html, selector: &str) -> impl Iterator<Item = ElementRef<'a>> {
    let parsed = Selector::parse(selector).ok();
    parsed
        .map(|s| document.select(&s).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
}
