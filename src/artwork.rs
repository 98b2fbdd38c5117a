//! Artwork records and the bits of image handling that go with them.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::COLORING_PAGE_SUFFIX;
use crate::error::ExplorerError;

/// An artwork as described by the text model.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ArtworkInfo {
    /// Title of the work
    pub title: String,
    /// Who made it
    pub artist: String,
    /// A short description a young student can follow
    pub description: String,
}

impl ArtworkInfo {
    /// True when every field carries some text.
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.artist, &self.description]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// A discovered artwork paired with its generated illustration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artwork {
    /// What the text model told us about the work
    pub info: ArtworkInfo,
    /// Base64-encoded raster image
    pub image: String,
}

impl Artwork {
    /// Pairs an [`ArtworkInfo`] with its generated image.
    pub fn new(info: ArtworkInfo, image: String) -> Self {
        Self { info, image }
    }

    /// Title of the work.
    pub fn title(&self) -> &str {
        &self.info.title
    }

    /// Who made it.
    pub fn artist(&self) -> &str {
        &self.info.artist
    }

    /// The child-friendly description.
    pub fn description(&self) -> &str {
        &self.info.description
    }
}

/// Difficulty of a coloring page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationLevel {
    /// Very thick, simple outlines for the youngest students
    Lower,
    /// Thick outlines with a little more detail
    Upper,
}

impl GenerationLevel {
    /// Both levels, in the order the buttons are shown.
    pub const ALL: [GenerationLevel; 2] = [GenerationLevel::Lower, GenerationLevel::Upper];

    /// Value used in forms and URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationLevel::Lower => "lower",
            GenerationLevel::Upper => "upper",
        }
    }

    /// Button label shown to students.
    pub fn label(self) -> &'static str {
        match self {
            GenerationLevel::Lower => "저학년용 도안",
            GenerationLevel::Upper => "고학년용 도안",
        }
    }
}

impl fmt::Display for GenerationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationLevel {
    type Err = ExplorerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lower" => Ok(GenerationLevel::Lower),
            "upper" => Ok(GenerationLevel::Upper),
            _ => Err(ExplorerError::BadRequest),
        }
    }
}

/// A coloring page ready to be saved by the browser.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Download {
    /// `<sanitized-title>_coloring_page.png`
    pub file_name: String,
    /// PNG bytes
    pub bytes: Vec<u8>,
}

/// Builds the download file name for an artwork title.
///
/// Every whitespace character becomes `_`, so `"Starry Night"` turns into
/// `Starry_Night_coloring_page.png`.
pub fn coloring_page_file_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{sanitized}{COLORING_PAGE_SUFFIX}")
}

/// Decodes a base64 image as returned by the image model.
pub fn decode_image(image: &str) -> Result<Vec<u8>, ExplorerError> {
    Ok(general_purpose::STANDARD.decode(image.trim())?)
}

/// Content type for raw image bytes, based on their magic number.
pub fn image_content_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Ensures image bytes are a valid PNG, converting if possible.
pub fn normalize_image_to_png(bytes: &[u8]) -> Result<Vec<u8>, ExplorerError> {
    if bytes.len() < 4 {
        debug!("Image is too short");
        return Err(ExplorerError::Generation(
            "image payload is too short".to_string(),
        ));
    }

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| {
            debug!("Failed to guess image format: {}", err);
            ExplorerError::Generation(err.to_string())
        })?;
    if reader.format() == Some(image::ImageFormat::Png) {
        return Ok(bytes.to_vec());
    }
    let image = reader.decode().map_err(|err| {
        debug!("Failed to decode image: {}", err);
        ExplorerError::Generation(err.to_string())
    })?;

    let mut output = Cursor::new(Vec::new());
    image
        .write_to(&mut output, image::ImageFormat::Png)
        .map_err(|err| ExplorerError::InternalServerError(err.to_string()))?;
    Ok(output.into_inner())
}
