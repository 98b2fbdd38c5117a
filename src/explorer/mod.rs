//! Per-visitor search and card state, and the tasks that drive it.
//!
//! Every visitor gets one [`SearchControl`] behind its own mutex. A
//! transition is applied under the lock, the remote call runs in a spawned
//! task without it, and the outcome is applied under the lock again.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::artwork::GenerationLevel;
use crate::constants::SESSION_INACTIVITY_HOURS;
use crate::error::ExplorerError;
use crate::gateway::Gateway;

pub mod card;
pub mod grid;
pub mod search;

pub use card::{CardControl, CardState, CardTicket};
pub use grid::{CardView, GridView, LevelButton, present};
pub use search::{ArtworkCard, SearchControl, SearchState, SearchTicket};

/// A visitor's search state, shared between requests and background tasks.
pub type SharedControl = Arc<Mutex<SearchControl>>;

#[derive(Debug)]
struct VisitorEntry {
    control: SharedControl,
    last_seen: DateTime<Utc>,
}

/// Owns the gateway and the state of every visitor.
#[derive(Debug)]
pub struct Explorer {
    gateway: Gateway,
    visitors: RwLock<HashMap<String, VisitorEntry>>,
}

impl Explorer {
    /// Builds an explorer with no visitors yet.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            visitors: RwLock::new(HashMap::new()),
        }
    }

    /// State for visitor `id`, created on first use.
    ///
    /// Visitors that have been idle longer than a session lasts are dropped.
    pub async fn visitor(&self, id: &str) -> SharedControl {
        self.visitor_at(id, Utc::now()).await
    }

    /// [`Self::visitor`] as seen at `now`.
    pub async fn visitor_at(&self, id: &str, now: DateTime<Utc>) -> SharedControl {
        let idle_limit = Duration::hours(SESSION_INACTIVITY_HOURS);
        let mut visitors = self.visitors.write().await;

        let before = visitors.len();
        visitors.retain(|key, entry| key == id || now - entry.last_seen < idle_limit);
        if visitors.len() != before {
            debug!("Pruned {} idle visitors", before - visitors.len());
        }

        let entry = visitors
            .entry(id.to_string())
            .or_insert_with(|| VisitorEntry {
                control: Arc::new(Mutex::new(SearchControl::new())),
                last_seen: now,
            });
        entry.last_seen = now;
        entry.control.clone()
    }

    /// Number of visitors with state.
    pub async fn visitor_count(&self) -> usize {
        self.visitors.read().await.len()
    }

    /// Starts a search for `theme`.
    ///
    /// Returns `None` when the submission was ignored (blank theme, or a
    /// search is already running), otherwise the task completing it.
    pub async fn start_search(
        &self,
        control: &SharedControl,
        theme: &str,
    ) -> Option<JoinHandle<()>> {
        let ticket = control.lock().await.submit(theme)?;
        Some(self.spawn_search(control, ticket))
    }

    /// Searches the last theme again, under the same rules as [`Self::start_search`].
    pub async fn search_again(&self, control: &SharedControl) -> Option<JoinHandle<()>> {
        let ticket = control.lock().await.resubmit()?;
        Some(self.spawn_search(control, ticket))
    }

    fn spawn_search(&self, control: &SharedControl, ticket: SearchTicket) -> JoinHandle<()> {
        let gateway = self.gateway.clone();
        let control = control.clone();
        tokio::spawn(async move {
            let outcome = gateway.find_artworks(&ticket.theme).await;
            control.lock().await.complete(ticket, outcome);
        })
    }

    /// Starts a coloring page for card `index` of result list `epoch`.
    ///
    /// Unknown cards are [`ExplorerError::NotFound`]; `Ok(None)` means the
    /// card is already generating and the request was ignored.
    pub async fn start_coloring(
        &self,
        control: &SharedControl,
        epoch: u64,
        index: usize,
        level: GenerationLevel,
    ) -> Result<Option<JoinHandle<()>>, ExplorerError> {
        let (ticket, info) = {
            let mut guard = control.lock().await;
            let card = guard
                .card_mut(epoch, index)
                .ok_or_else(|| ExplorerError::NotFound(format!("card {epoch}/{index}")))?;
            let Some(ticket) = card.control.select_level(level) else {
                info!("Card {epoch}/{index} is already generating, ignoring {level}");
                return Ok(None);
            };
            (ticket, card.artwork.info.clone())
        };

        let gateway = self.gateway.clone();
        let control = control.clone();
        Ok(Some(tokio::spawn(async move {
            let outcome = gateway.generate_coloring_page(&info, level).await;
            if let Some(card) = control.lock().await.card_mut(epoch, index) {
                card.control.complete(ticket, outcome);
            } else {
                info!("Result list {epoch} was replaced, dropping coloring page");
            }
        })))
    }
}
