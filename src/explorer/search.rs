//! Search state of one visitor.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use super::card::CardControl;
use crate::artwork::Artwork;
use crate::constants::SEARCH_FAILED_MESSAGE;
use crate::error::ExplorerError;

/// One result on the page: the artwork and its coloring page state.
#[derive(Clone, Debug)]
pub struct ArtworkCard {
    /// The discovered artwork
    pub artwork: Artwork,
    /// Its coloring page state
    pub control: CardControl,
}

/// Where a visitor's search is at.
#[derive(Clone, Debug, Default)]
pub enum SearchState {
    /// Nothing searched yet
    #[default]
    Idle,
    /// Waiting for the AI provider
    Searching {
        /// Theme being searched
        theme: String,
        /// When the search started
        started_at: DateTime<Utc>,
    },
    /// Results are in
    Success {
        /// Theme that was searched
        theme: String,
        /// One card per artwork, never empty
        cards: Vec<ArtworkCard>,
    },
    /// The search failed
    Failed {
        /// Theme that was searched
        theme: String,
        /// Fixed message shown on the page
        message: &'static str,
    },
}

/// Proof that a search was started, needed to complete it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchTicket {
    /// Trimmed theme to search for
    pub theme: String,
    /// Epoch the results will belong to
    pub epoch: u64,
}

/// Drives [`SearchState`] for one visitor.
///
/// The epoch goes up with every accepted submission so that results and
/// card requests from an older result list can be told apart.
#[derive(Clone, Debug, Default)]
pub struct SearchControl {
    state: SearchState,
    epoch: u64,
    last_theme: Option<String>,
}

impl SearchControl {
    /// A visitor that hasn't searched yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Epoch of the current (or pending) result list.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True while waiting for the AI provider.
    pub fn is_searching(&self) -> bool {
        matches!(self.state, SearchState::Searching { .. })
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_searching()
    }

    /// Last theme that was submitted.
    pub fn last_theme(&self) -> Option<&str> {
        self.last_theme.as_deref()
    }

    /// Starts a search for `theme`.
    ///
    /// Blank themes and submissions while a search is running are ignored.
    pub fn submit(&mut self, theme: &str) -> Option<SearchTicket> {
        let theme = theme.trim();
        if theme.is_empty() || self.is_searching() {
            return None;
        }
        self.epoch += 1;
        self.last_theme = Some(theme.to_string());
        self.state = SearchState::Searching {
            theme: theme.to_string(),
            started_at: Utc::now(),
        };
        info!("Searching artworks for '{}' (epoch {})", theme, self.epoch);
        Some(SearchTicket {
            theme: theme.to_string(),
            epoch: self.epoch,
        })
    }

    /// Searches the last theme again.
    pub fn resubmit(&mut self) -> Option<SearchTicket> {
        let theme = self.last_theme.clone()?;
        self.submit(&theme)
    }

    /// Applies the outcome of the search started with `ticket`.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<Artwork>, ExplorerError>,
    ) {
        if ticket.epoch != self.epoch || !self.is_searching() {
            info!("Dropping stale search result for '{}'", ticket.theme);
            return;
        }
        self.state = match outcome {
            Ok(artworks) if !artworks.is_empty() => SearchState::Success {
                theme: ticket.theme,
                cards: artworks
                    .into_iter()
                    .map(|artwork| ArtworkCard {
                        artwork,
                        control: CardControl::new(),
                    })
                    .collect(),
            },
            Ok(_) => {
                error!("Search for '{}' returned no artworks", ticket.theme);
                SearchState::Failed {
                    theme: ticket.theme,
                    message: SEARCH_FAILED_MESSAGE,
                }
            }
            Err(err) => {
                error!("Search for '{}' failed: {}", ticket.theme, err);
                SearchState::Failed {
                    theme: ticket.theme,
                    message: SEARCH_FAILED_MESSAGE,
                }
            }
        };
    }

    /// Theme of the current state, if any.
    pub fn theme(&self) -> Option<&str> {
        match &self.state {
            SearchState::Idle => None,
            SearchState::Searching { theme, .. }
            | SearchState::Success { theme, .. }
            | SearchState::Failed { theme, .. } => Some(theme),
        }
    }

    /// Page-level error message, only after a failed search.
    pub fn error_message(&self) -> Option<&'static str> {
        match self.state {
            SearchState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Current results, empty unless the last search succeeded.
    pub fn cards(&self) -> &[ArtworkCard] {
        match &self.state {
            SearchState::Success { cards, .. } => cards,
            _ => &[],
        }
    }

    /// A card of the current result list.
    pub fn card(&self, epoch: u64, index: usize) -> Option<&ArtworkCard> {
        if epoch != self.epoch {
            return None;
        }
        self.cards().get(index)
    }

    /// A card of the current result list, for changing its state.
    pub fn card_mut(&mut self, epoch: u64, index: usize) -> Option<&mut ArtworkCard> {
        if epoch != self.epoch {
            return None;
        }
        match &mut self.state {
            SearchState::Success { cards, .. } => cards.get_mut(index),
            _ => None,
        }
    }
}
