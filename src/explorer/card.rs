//! Coloring page state of a single result card.

use tracing::{error, info};

use crate::artwork::{
    Download, GenerationLevel, coloring_page_file_name, decode_image, normalize_image_to_png,
};
use crate::constants::COLORING_FAILED_MESSAGE;
use crate::error::ExplorerError;

/// Where a card's coloring page is at.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CardState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A coloring page is being drawn
    Generating(GenerationLevel),
    /// The coloring page is ready
    Done {
        /// Level it was drawn at
        level: GenerationLevel,
        /// Base64-encoded image
        image: String,
    },
    /// The last attempt failed
    Error,
}

/// Proof that a generation was started, needed to complete it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CardTicket {
    /// Level that was selected
    pub level: GenerationLevel,
    /// Generation number the outcome belongs to
    pub generation: u64,
}

/// Drives [`CardState`]. At most one generation is in flight per card.
#[derive(Clone, Debug, Default)]
pub struct CardControl {
    state: CardState,
    generation: u64,
}

impl CardControl {
    /// A card with nothing requested yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &CardState {
        &self.state
    }

    /// Counts accepted level selections. Each coloring page gets its own number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while a coloring page is being drawn; both level buttons are disabled.
    pub fn is_generating(&self) -> bool {
        matches!(self.state, CardState::Generating(_))
    }

    /// Starts drawing at `level`, unless a drawing is already in flight.
    pub fn select_level(&mut self, level: GenerationLevel) -> Option<CardTicket> {
        if self.is_generating() {
            return None;
        }
        self.generation += 1;
        self.state = CardState::Generating(level);
        Some(CardTicket {
            level,
            generation: self.generation,
        })
    }

    /// Applies the outcome of the generation started with `ticket`.
    pub fn complete(&mut self, ticket: CardTicket, outcome: Result<String, ExplorerError>) {
        if ticket.generation != self.generation
            || self.state != CardState::Generating(ticket.level)
        {
            info!("Dropping stale coloring page result for level {}", ticket.level);
            return;
        }
        self.state = match outcome {
            Ok(image) => CardState::Done {
                level: ticket.level,
                image,
            },
            Err(err) => {
                error!("Coloring page generation failed: {}", err);
                CardState::Error
            }
        };
    }

    /// The finished coloring page, base64-encoded.
    pub fn image(&self) -> Option<&str> {
        match &self.state {
            CardState::Done { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Message shown on the card after a failure.
    pub fn error_message(&self) -> Option<&'static str> {
        match self.state {
            CardState::Error => Some(COLORING_FAILED_MESSAGE),
            _ => None,
        }
    }

    /// Packages the finished coloring page as a PNG named after `title`.
    ///
    /// `Ok(None)` when there is no finished page.
    pub fn download(&self, title: &str) -> Result<Option<Download>, ExplorerError> {
        let Some(image) = self.image() else {
            return Ok(None);
        };
        let bytes = normalize_image_to_png(&decode_image(image)?)?;
        Ok(Some(Download {
            file_name: coloring_page_file_name(title),
            bytes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::tests::TINY_PNG_BASE64;

    #[test]
    fn idle_to_done() {
        let mut card = CardControl::new();
        let ticket = card
            .select_level(GenerationLevel::Lower)
            .expect("idle card accepts a level");
        assert_eq!(card.state(), &CardState::Generating(GenerationLevel::Lower));

        card.complete(ticket, Ok(TINY_PNG_BASE64.to_string()));
        assert_eq!(
            card.state(),
            &CardState::Done {
                level: GenerationLevel::Lower,
                image: TINY_PNG_BASE64.to_string(),
            }
        );
        assert_eq!(card.image(), Some(TINY_PNG_BASE64));
    }

    #[test]
    fn selecting_while_generating_is_a_no_op() {
        let mut card = CardControl::new();
        let ticket = card.select_level(GenerationLevel::Upper).expect("start");
        assert!(card.select_level(GenerationLevel::Lower).is_none());
        assert!(card.select_level(GenerationLevel::Upper).is_none());
        assert_eq!(card.state(), &CardState::Generating(GenerationLevel::Upper));

        card.complete(ticket, Err(ExplorerError::Generation("boom".to_string())));
        assert_eq!(card.state(), &CardState::Error);
        assert_eq!(card.error_message(), Some(COLORING_FAILED_MESSAGE));
    }

    #[test]
    fn done_and_error_cards_can_try_again() {
        let mut card = CardControl::new();
        let ticket = card.select_level(GenerationLevel::Lower).expect("start");
        card.complete(ticket, Err(ExplorerError::Generation("boom".to_string())));

        let ticket = card.select_level(GenerationLevel::Upper).expect("retry after error");
        assert!(card.error_message().is_none());
        card.complete(ticket, Ok(TINY_PNG_BASE64.to_string()));

        assert!(card.select_level(GenerationLevel::Lower).is_some());
        assert!(card.image().is_none());
    }

    #[test]
    fn every_selection_gets_a_new_generation() {
        let mut card = CardControl::new();
        assert_eq!(card.generation(), 0);

        let lower = card.select_level(GenerationLevel::Lower).expect("start");
        assert_eq!(lower.generation, 1);
        card.complete(lower, Ok(TINY_PNG_BASE64.to_string()));
        assert_eq!(card.generation(), 1);

        let upper = card.select_level(GenerationLevel::Upper).expect("again");
        assert_eq!(upper.generation, 2);
        assert_eq!(card.generation(), 2);

        // an outcome from an earlier generation never lands on the new one
        card.complete(lower, Ok(TINY_PNG_BASE64.to_string()));
        assert_eq!(card.state(), &CardState::Generating(GenerationLevel::Upper));
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut card = CardControl::new();
        let ticket = card.select_level(GenerationLevel::Lower).expect("start");
        card.complete(ticket, Ok(TINY_PNG_BASE64.to_string()));
        card.complete(ticket, Err(ExplorerError::Generation("late".to_string())));
        assert!(card.image().is_some());
    }

    #[test]
    fn download_only_when_done() {
        let mut card = CardControl::new();
        assert!(card.download("Starry Night").expect("no error").is_none());

        let ticket = card.select_level(GenerationLevel::Lower).expect("start");
        card.complete(ticket, Ok(TINY_PNG_BASE64.to_string()));
        let download = card
            .download("Starry Night")
            .expect("decodes")
            .expect("finished page");
        assert_eq!(download.file_name, "Starry_Night_coloring_page.png");
        assert_eq!(
            download.bytes,
            decode_image(TINY_PNG_BASE64).expect("decode")
        );
        assert!(card.image().is_some());
    }
}
