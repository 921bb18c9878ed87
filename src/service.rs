//! Update-and-deploy pipeline.
//!
//! Every mutation runs load → merge → save → render → publish. The save is
//! the commit point: once it succeeds the request succeeds, whatever
//! happens to the publish.

use serde_json::Value;
use std::sync::Arc;

use crate::db::models::{section, Document};
use crate::db::{DocumentStore, StoreError};
use crate::publish::{PublishOutcome, Publisher, PAGE_PATH};
use crate::render::{self, TemplateSource};

/// A write to the document. Section variants replace one top-level section
/// and leave the others as stored; `None` removes the section. Section
/// values are stored as sent.
#[derive(Debug, Clone)]
pub enum SectionUpdate {
    Hero(Option<Value>),
    About(Option<Value>),
    Telegram(Option<Value>),
    Shirts {
        title: Option<Value>,
        shirts: Option<Value>,
    },
    Discounts(Option<Value>),
    Footer(Option<Value>),
    All(Document),
}

impl SectionUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hero(_) => "hero",
            Self::About(_) => "about",
            Self::Telegram(_) => "telegram",
            Self::Shirts { .. } => "shirts",
            Self::Discounts(_) => "discounts",
            Self::Footer(_) => "footer",
            Self::All(_) => "all",
        }
    }

    /// Shallow merge into `current`.
    pub fn apply_to(self, mut current: Document) -> Document {
        match self {
            Self::Hero(hero) => current.set_section(section::HERO, hero),
            Self::About(about) => current.set_section(section::ABOUT, about),
            Self::Telegram(telegram) => current.set_section(section::TELEGRAM, telegram),
            Self::Shirts { title, shirts } => {
                current.set_section(section::SHIRTS_TITLE, title);
                current.set_section(section::SHIRTS, shirts);
            }
            Self::Discounts(discounts) => current.set_section(section::DISCOUNTS, discounts),
            Self::Footer(footer) => current.set_section(section::FOOTER, footer),
            Self::All(document) => return document,
        }
        current
    }
}

pub struct SiteService {
    store: Arc<dyn DocumentStore>,
    template: TemplateSource,
    publisher: Arc<dyn Publisher>,
}

impl SiteService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        template: TemplateSource,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            store,
            template,
            publisher,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub async fn document(&self) -> Result<Document, StoreError> {
        self.store.load_document().await
    }

    /// Merges `update` into the stored document, persists it and republishes
    /// the page. Only storage failures are errors.
    pub async fn apply(&self, update: SectionUpdate) -> Result<PublishOutcome, StoreError> {
        let section = update.name();
        // A whole-document write never reads the stored row, so it can
        // replace one that no longer decodes.
        let updated = match update {
            SectionUpdate::All(document) => document,
            partial => partial.apply_to(self.store.load_document().await?),
        };
        self.store.save_document(&updated).await?;
        tracing::info!(section, "site document saved");

        Ok(self.publish(&updated).await)
    }

    /// Re-renders and publishes the stored document as it is now.
    pub async fn republish(&self) -> Result<PublishOutcome, StoreError> {
        let current = self.store.load_document().await?;
        Ok(self.publish(&current).await)
    }

    /// Creates the schema and seeds `seed` if the store is empty. A freshly
    /// seeded document is published right away.
    pub async fn bootstrap(&self, seed: &Document) -> Result<Option<PublishOutcome>, StoreError> {
        self.store.ensure_schema().await?;

        if !self.store.seed_if_empty(seed).await? {
            tracing::info!("site document already present, seed skipped");
            return Ok(None);
        }

        tracing::info!("seeded default site document");
        Ok(Some(self.publish(seed).await))
    }

    async fn publish(&self, doc: &Document) -> PublishOutcome {
        let template = match self.template.load().await {
            Ok(template) => template,
            Err(e) => {
                tracing::error!(error = %e, "cannot render page");
                return PublishOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let html = render::render(&template, doc);
        let outcome = self.publisher.publish(PAGE_PATH, &html).await;
        match &outcome {
            PublishOutcome::Failed { reason } => {
                tracing::warn!(%reason, "published page is behind the stored document")
            }
            other => tracing::debug!(outcome = ?other, bytes = html.len(), "publish finished"),
        }
        outcome
    }
}
