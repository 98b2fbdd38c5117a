//! Config handling

use tracing::log::LevelFilter;

use crate::constants::{
    ARTWORKS_PER_SEARCH, DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
};
use crate::error::ExplorerError;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("tower_sessions", LevelFilter::Warn)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything the AI gateway needs to reach the provider.
#[derive(Clone)]
pub struct GatewayConfig {
    /// API credential, sent with every request
    pub api_key: String,
    /// Base URL of the REST API, without a trailing slash
    pub api_base: String,
    /// Model used for structured artwork discovery
    pub text_model: String,
    /// Model used for images
    pub image_model: String,
    /// How many artworks a search asks for
    pub artworks_per_search: usize,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("artworks_per_search", &self.artworks_per_search)
            .finish()
    }
}

impl GatewayConfig {
    /// Builds the default configuration, refusing a blank API key.
    pub fn new(api_key: &str) -> Result<Self, ExplorerError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ExplorerError::Configuration(
                "API key is not set, pass --gemini-api-key or set GEMINI_API_KEY".to_string(),
            ));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            artworks_per_search: ARTWORKS_PER_SEARCH,
        })
    }

    /// Points the client at another API base, eg a local fake.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the text model.
    pub fn with_text_model(mut self, model: &str) -> Self {
        self.text_model = model.trim().trim_start_matches("models/").to_string();
        self
    }

    /// Overrides the image model.
    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = model.trim().trim_start_matches("models/").to_string();
        self
    }

    /// Overrides the number of artworks per search, at least one.
    pub fn with_artworks_per_search(mut self, count: usize) -> Self {
        self.artworks_per_search = count.max(1);
        self
    }
}
