//! What the result grid shows, derived from the search state.

use chrono::{DateTime, Utc};
use url::Url;

use super::card::CardState;
use super::search::{ArtworkCard, SearchControl, SearchState};
use crate::artwork::GenerationLevel;
use crate::constants::PLACEHOLDER_CARDS;

const IMAGE_SEARCH_URL: &str = "https://www.google.com/search";

/// The result grid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GridView {
    /// A search is running: placeholders and a progress message
    Loading {
        /// Number of placeholder cards
        placeholders: usize,
        /// Theme being searched
        theme: String,
        /// Seconds since the search started
        elapsed_seconds: i64,
    },
    /// Nothing to show, invite the visitor to search
    Empty,
    /// One card per result
    Cards(Vec<CardView>),
}

/// One level button on a card.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LevelButton {
    /// Form value
    pub value: &'static str,
    /// Button text
    pub label: &'static str,
    /// Disabled while the card is generating
    pub disabled: bool,
    /// This level is the one being generated
    pub busy: bool,
}

/// A result card.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CardView {
    /// Unique key, `{title}-{index}`
    pub key: String,
    /// Position in the result list
    pub index: usize,
    /// Result list the card belongs to
    pub epoch: u64,
    /// Title of the work
    pub title: String,
    /// Who made it
    pub artist: String,
    /// The child-friendly description
    pub description: String,
    /// Where the generated illustration is served
    pub image_url: String,
    /// Image search for the original work
    pub original_url: Option<String>,
    /// The two level buttons
    pub levels: Vec<LevelButton>,
    /// Label of the level being generated, if any
    pub generating: Option<&'static str>,
    /// Inline coloring page, once done; versioned per generation
    pub coloring_url: Option<String>,
    /// Download link, once done
    pub download_url: Option<String>,
    /// Message after a failed generation
    pub error_message: Option<&'static str>,
}

impl CardView {
    fn new(epoch: u64, index: usize, card: &ArtworkCard) -> Self {
        let artwork = &card.artwork;
        let base = format!("/artworks/{epoch}/{index}");
        let generating_level = match card.control.state() {
            CardState::Generating(level) => Some(*level),
            _ => None,
        };
        let done = card.control.image().is_some();

        Self {
            key: format!("{}-{}", artwork.title(), index),
            index,
            epoch,
            title: artwork.title().to_string(),
            artist: artwork.artist().to_string(),
            description: artwork.description().to_string(),
            image_url: format!("{base}/image"),
            original_url: original_search_url(artwork.title(), artwork.artist()),
            levels: GenerationLevel::ALL
                .iter()
                .map(|level| LevelButton {
                    value: level.as_str(),
                    label: level.label(),
                    disabled: generating_level.is_some(),
                    busy: generating_level == Some(*level),
                })
                .collect(),
            generating: generating_level.map(GenerationLevel::label),
            coloring_url: done
                .then(|| format!("{base}/coloring?v={}", card.control.generation())),
            download_url: done.then(|| format!("{base}/download")),
            error_message: card.control.error_message(),
        }
    }
}

/// Image search URL for the original artwork.
fn original_search_url(title: &str, artist: &str) -> Option<String> {
    let query = format!("{title} {artist}");
    Url::parse_with_params(IMAGE_SEARCH_URL, &[("tbm", "isch"), ("q", query.as_str())])
        .ok()
        .map(String::from)
}

/// Derives the grid from the search state.
pub fn present(control: &SearchControl, now: DateTime<Utc>) -> GridView {
    match control.state() {
        SearchState::Searching { theme, started_at } => GridView::Loading {
            placeholders: PLACEHOLDER_CARDS,
            theme: theme.clone(),
            elapsed_seconds: (now - *started_at).num_seconds().max(0),
        },
        _ if control.cards().is_empty() => GridView::Empty,
        _ => GridView::Cards(
            control
                .cards()
                .iter()
                .enumerate()
                .map(|(index, card)| CardView::new(control.epoch(), index, card))
                .collect(),
        ),
    }
}

impl GridView {
    /// True if anything on the grid is still being generated.
    pub fn is_pending(&self) -> bool {
        match self {
            GridView::Loading { .. } => true,
            GridView::Empty => false,
            GridView::Cards(cards) => cards.iter().any(|card| card.generating.is_some()),
        }
    }
}
