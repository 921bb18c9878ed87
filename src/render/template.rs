use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template {} could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Template file on disk. Read fresh on every render so edits apply
/// without a restart.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    path: PathBuf,
}

impl TemplateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<String, TemplateError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TemplateError::Unreadable {
                path: self.path.clone(),
                source,
            })
    }

    /// Start-up check: the service is useless without its template.
    pub async fn ensure_readable(&self) -> Result<(), TemplateError> {
        let template = self.load().await?;
        tracing::info!(
            path = %self.path.display(),
            bytes = template.len(),
            "template found"
        );
        Ok(())
    }
}
