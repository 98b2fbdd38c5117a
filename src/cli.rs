//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::config::GatewayConfig;
use crate::constants::{
    ARTWORKS_PER_SEARCH, DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
};
use crate::error::ExplorerError;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "ART_EXPLORER_DEBUG")]
    /// Enable debug logging. Env: ART_EXPLORER_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "ART_EXPLORER_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: ART_EXPLORER_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "ART_EXPLORER_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: ART_EXPLORER_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(long, short, default_value = "./static", env = "ART_EXPLORER_STATIC_DIR")]
    /// Directory served under `/static`.
    /// Env: ART_EXPLORER_STATIC_DIR
    pub static_dir: PathBuf,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true, hide = true)]
    /// Gemini API key. Env: GEMINI_API_KEY
    pub gemini_api_key: Option<String>,
    #[clap(long, default_value = DEFAULT_API_BASE, env = "ART_EXPLORER_API_BASE")]
    /// Base URL of the Gemini REST API.
    pub api_base: String,
    #[clap(long, default_value = DEFAULT_TEXT_MODEL, env = "ART_EXPLORER_TEXT_MODEL")]
    /// Model used to pick artworks.
    pub text_model: String,
    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "ART_EXPLORER_IMAGE_MODEL")]
    /// Model used to draw illustrations and coloring pages.
    pub image_model: String,
    #[clap(long, default_value_t = ARTWORKS_PER_SEARCH, env = "ART_EXPLORER_ARTWORKS")]
    /// Artworks requested per search.
    pub artworks: usize,
}

impl CliOptions {
    /// Builds the gateway configuration, failing if no API key was given.
    pub fn gateway_config(&self) -> Result<GatewayConfig, ExplorerError> {
        let api_key = self.gemini_api_key.as_deref().ok_or_else(|| {
            ExplorerError::Configuration(
                "GEMINI_API_KEY is not set, provide it via the environment or --gemini-api-key"
                    .to_string(),
            )
        })?;
        Ok(GatewayConfig::new(api_key)?
            .with_api_base(&self.api_base)
            .with_text_model(&self.text_model)
            .with_image_model(&self.image_model)
            .with_artworks_per_search(self.artworks))
    }
}
