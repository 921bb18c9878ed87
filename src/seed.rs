//! Content stored on first boot, before anyone has edited the site.

use crate::db::models::Document;

const DEFAULT_SITE: &str = include_str!("../assets/default_site.json");

pub fn default_document() -> Result<Document, serde_json::Error> {
    serde_json::from_str(DEFAULT_SITE)
}
