//! Prompts and the response schema sent to the models.

use serde_json::{Value, json};

use crate::artwork::{ArtworkInfo, GenerationLevel};

/// Asks the text model for `count` artworks about `theme`.
pub(crate) fn discovery_prompt(theme: &str, count: usize) -> String {
    format!(
        "Recommend {count} famous artworks related to the theme '{theme}'. \
Pick works from all around the world that are appropriate for a second-grade \
elementary school student to look at. For each artwork give its title, its \
artist, and a description in easy Korean of 2-3 sentences that a second \
grader can understand. Answer in JSON."
    )
}

/// Schema the discovery answer has to follow.
pub(crate) fn discovery_schema() -> Value {
    let artwork = json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "Title of the artwork"
            },
            "artist": {
                "type": "STRING",
                "description": "Name of the artist"
            },
            "description": {
                "type": "STRING",
                "description": "Easy Korean description a second grader can understand (2-3 sentences)"
            }
        },
        "required": ["title", "artist", "description"]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "artworks": {
                "type": "ARRAY",
                "items": artwork
            }
        },
        "required": ["artworks"]
    })
}

/// Illustration shown on a result card.
pub(crate) fn artwork_image_prompt(info: &ArtworkInfo) -> String {
    format!(
        "Create a bright and colorful digital art image inspired by the famous \
artwork '{}' by {}. Keep the feeling of the original, but draw it in a style \
that children will love.",
        info.title, info.artist
    )
}

/// Part of a coloring page prompt that depends on the level.
pub(crate) fn level_clause(level: GenerationLevel) -> &'static str {
    match level {
        GenerationLevel::Lower => {
            "It is for younger elementary students who are about seven years old: \
the lines must be very thick and clear, and the black and white drawing must be \
simple and not complicated at all."
        }
        GenerationLevel::Upper => {
            "It is for older elementary students: the lines must be thick and clear, \
and the black and white drawing may have a moderate amount of detail."
        }
    }
}

/// Line-art coloring page for an artwork.
pub(crate) fn coloring_page_prompt(info: &ArtworkInfo, level: GenerationLevel) -> String {
    format!(
        "Create a printable coloring page inspired by the artwork '{}' by {}. \
Only black outlines on a plain white background, no shading and no color. {}",
        info.title,
        info.artist,
        level_clause(level)
    )
}
