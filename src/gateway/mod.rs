//! Talks to the generative AI provider.
//!
//! [`GenerativeModel`] is the seam: the two remote calls the app needs.
//! [`Gateway`] builds the prompts on top of it, fans out the artwork
//! illustrations and turns every failure into one of the app's error
//! categories.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::artwork::{Artwork, ArtworkInfo, GenerationLevel};
use crate::constants::{ARTWORKS_PER_SEARCH, IMAGE_ASPECT_RATIO};
use crate::error::ExplorerError;

mod gemini;
#[cfg(test)]
pub(crate) mod mock;
mod prompts;

pub use gemini::GeminiClient;

/// Options for a single image generation request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageOptions {
    /// How many images to ask for
    pub count: u8,
    /// Aspect ratio, eg `1:1`
    pub aspect_ratio: String,
}

impl ImageOptions {
    /// One square image, which is all this app ever asks for.
    pub fn single_square() -> Self {
        Self {
            count: 1,
            aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
        }
    }
}

/// The two remote operations of the AI provider.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generates JSON content constrained by `schema`.
    async fn generate_structured(&self, prompt: &str, schema: Value)
    -> Result<Value, ExplorerError>;

    /// Generates images, returned base64-encoded.
    async fn generate_images(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<String>, ExplorerError>;
}

#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    #[serde(default)]
    artworks: Vec<ArtworkInfo>,
}

/// Finds artworks for a theme and draws coloring pages of them.
#[derive(Clone)]
pub struct Gateway {
    model: Arc<dyn GenerativeModel>,
    artworks_per_search: usize,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("artworks_per_search", &self.artworks_per_search)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Wraps a model, asking for the default number of artworks per search.
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            artworks_per_search: ARTWORKS_PER_SEARCH,
        }
    }

    /// Changes how many artworks a search asks for.
    pub fn with_artworks_per_search(mut self, count: usize) -> Self {
        self.artworks_per_search = count.max(1);
        self
    }

    /// Finds artworks for `theme`, each with a freshly generated illustration.
    ///
    /// Either every artwork comes back with its image or the whole search
    /// fails with [`ExplorerError::Discovery`].
    #[instrument(skip(self))]
    pub async fn find_artworks(&self, theme: &str) -> Result<Vec<Artwork>, ExplorerError> {
        let infos = self.discover(theme).await.map_err(|err| {
            error!("Error searching artworks: {}", err);
            ExplorerError::Discovery(err.to_string())
        })?;

        info!("Found {} artworks for '{}'", infos.len(), theme);

        let artworks = try_join_all(infos.into_iter().map(|info| async move {
            let image = self.render(&prompts::artwork_image_prompt(&info)).await?;
            Ok::<_, ExplorerError>(Artwork::new(info, image))
        }))
        .await
        .map_err(|err| {
            error!("Error rendering artwork images: {}", err);
            ExplorerError::Discovery(err.to_string())
        })?;

        Ok(artworks)
    }

    /// Draws a black and white coloring page of `artwork` at `level`.
    #[instrument(skip(self, artwork), fields(title = %artwork.title))]
    pub async fn generate_coloring_page(
        &self,
        artwork: &ArtworkInfo,
        level: GenerationLevel,
    ) -> Result<String, ExplorerError> {
        let prompt = prompts::coloring_page_prompt(artwork, level);
        self.render(&prompt).await.map_err(|err| {
            error!("Error generating coloring page: {}", err);
            match err {
                ExplorerError::Generation(_) => err,
                other => ExplorerError::Generation(other.to_string()),
            }
        })
    }

    async fn discover(&self, theme: &str) -> Result<Vec<ArtworkInfo>, ExplorerError> {
        let prompt = prompts::discovery_prompt(theme, self.artworks_per_search);
        let value = self
            .model
            .generate_structured(&prompt, prompts::discovery_schema())
            .await?;
        let response: DiscoveryResponse = serde_json::from_value(value)?;

        if response.artworks.is_empty() {
            return Err(ExplorerError::Discovery(format!(
                "No artworks found for the theme '{theme}'"
            )));
        }
        if let Some(incomplete) = response.artworks.iter().find(|info| !info.is_complete()) {
            return Err(ExplorerError::Discovery(format!(
                "Artwork entry is missing fields: {incomplete:?}"
            )));
        }
        Ok(response.artworks)
    }

    /// Asks for exactly one square image and returns it.
    async fn render(&self, prompt: &str) -> Result<String, ExplorerError> {
        debug!("Requesting image for prompt: {}", prompt);
        let images = self
            .model
            .generate_images(prompt, &ImageOptions::single_square())
            .await?;
        images
            .into_iter()
            .find(|image| !image.trim().is_empty())
            .ok_or_else(|| ExplorerError::Generation("No image data returned".to_string()))
    }
}
