//! In-memory stand-in for the AI provider, used by the tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use super::{GenerativeModel, ImageOptions};
use crate::artwork::ArtworkInfo;
use crate::artwork::tests::TINY_PNG_BASE64;
use crate::error::ExplorerError;

#[derive(Default)]
pub(crate) struct MockModel {
    structured: Option<Value>,
    fail_images_for: Option<String>,
    no_images: bool,
    gate: Option<Arc<Semaphore>>,
    structured_prompts: Mutex<Vec<String>>,
    image_calls: Mutex<Vec<(String, ImageOptions)>>,
}

impl MockModel {
    pub(crate) fn with_artworks(artworks: Vec<ArtworkInfo>) -> Self {
        Self::with_structured(json!({ "artworks": artworks }))
    }

    pub(crate) fn with_structured(value: Value) -> Self {
        Self {
            structured: Some(value),
            ..Default::default()
        }
    }

    /// Every structured call fails.
    pub(crate) fn failing_discovery() -> Self {
        Self::default()
    }

    /// Image prompts containing `needle` fail.
    pub(crate) fn failing_images_for(mut self, needle: &str) -> Self {
        self.fail_images_for = Some(needle.to_string());
        self
    }

    pub(crate) fn returning_no_images(mut self) -> Self {
        self.no_images = true;
        self
    }

    /// Every remote call waits for a permit from `gate` first.
    pub(crate) fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn structured_prompts(&self) -> Vec<String> {
        self.structured_prompts.lock().expect("lock").clone()
    }

    pub(crate) fn image_calls(&self) -> Vec<(String, ImageOptions)> {
        self.image_calls.lock().expect("lock").clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn generate_structured(
        &self,
        prompt: &str,
        _schema: Value,
    ) -> Result<Value, ExplorerError> {
        self.structured_prompts
            .lock()
            .expect("lock")
            .push(prompt.to_string());
        self.wait_for_gate().await;
        self.structured
            .clone()
            .ok_or_else(|| ExplorerError::Upstream("text model unavailable".to_string()))
    }

    async fn generate_images(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<String>, ExplorerError> {
        self.image_calls
            .lock()
            .expect("lock")
            .push((prompt.to_string(), options.clone()));
        self.wait_for_gate().await;
        if let Some(needle) = &self.fail_images_for
            && prompt.contains(needle.as_str())
        {
            return Err(ExplorerError::Upstream("image model unavailable".to_string()));
        }
        if self.no_images {
            return Ok(Vec::new());
        }
        Ok(vec![TINY_PNG_BASE64.to_string(); usize::from(options.count)])
    }
}
