//! Placeholder substitution for the static landing page.
//!
//! The template is plain HTML containing `{{NAME}}` tokens. Each known name
//! maps to a pure function of the document; values are inserted verbatim
//! (no HTML escaping) and unknown tokens are left in place.

pub mod template;

pub use template::{TemplateError, TemplateSource};

use serde_json::Value;

use crate::db::models::{section, Document};

type Extract = fn(&Document) -> String;

/// Placeholder name and the document field it renders, in substitution order.
pub const PLACEHOLDERS: &[(&str, Extract)] = &[
    ("HERO_TITLE", |d| text(d.lookup(&[section::HERO, "title"]))),
    ("HERO_DESC", |d| text(d.lookup(&[section::HERO, "desc"]))),
    ("ABOUT_TITLE", |d| text(d.lookup(&[section::ABOUT, "title"]))),
    ("ABOUT_DESC1", |d| text(d.lookup(&[section::ABOUT, "desc1"]))),
    ("ABOUT_DESC2", |d| text(d.lookup(&[section::ABOUT, "desc2"]))),
    ("TELEGRAM_TITLE", |d| text(d.lookup(&[section::TELEGRAM, "title"]))),
    ("TELEGRAM_DESC", |d| text(d.lookup(&[section::TELEGRAM, "desc"]))),
    ("TELEGRAM_LINK", |d| text(d.lookup(&[section::TELEGRAM, "link"]))),
    ("SHIRTS_TITLE", |d| text(d.section(section::SHIRTS_TITLE))),
    ("SHIRTS_DATA", |d| json_list(d.section(section::SHIRTS))),
    ("VALID_CODES", |d| json_list(d.lookup(&[section::DISCOUNTS, "validCodes"]))),
    ("NEW_PRICE", |d| text(d.lookup(&[section::DISCOUNTS, "newPrice"]))),
    ("OLD_PRICE", |d| text(d.lookup(&[section::DISCOUNTS, "oldPrice"]))),
    ("DISCOUNTS_TITLE", |d| text(d.lookup(&[section::DISCOUNTS, "title"]))),
    ("DISCOUNTS_DESC", |d| text(d.lookup(&[section::DISCOUNTS, "desc"]))),
    ("COPYRIGHT_YEAR", |d| text(d.lookup(&[section::FOOTER, "year"]))),
    ("IG_LINK", |d| text(d.lookup(&[section::FOOTER, "ig"]))),
    ("TT_LINK", |d| text(d.lookup(&[section::FOOTER, "tt"]))),
    ("YT_LINK", |d| text(d.lookup(&[section::FOOTER, "yt"]))),
];

/// Strings verbatim, missing or null as empty, anything else as compact JSON.
fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Compact JSON for embedding in an inline script; missing or null renders as `[]`.
fn json_list(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "[]".to_string(),
        Some(other) => other.to_string(),
    }
}

/// `{{NAME}}`
pub fn token(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Replaces every occurrence of every known placeholder in `template`.
pub fn render(template: &str, doc: &Document) -> String {
    PLACEHOLDERS
        .iter()
        .fold(template.to_string(), |html, (name, extract)| {
            let token = token(name);
            if html.contains(&token) {
                html.replace(&token, &extract(doc))
            } else {
                html
            }
        })
}
