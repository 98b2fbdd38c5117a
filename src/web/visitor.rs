use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::distr::{Alphanumeric, Distribution};
use tower_sessions::Session;

use super::AppState;
use crate::error::ExplorerError;
use crate::explorer::SharedControl;

const VISITOR_ID_KEY: &str = "visitor_id";
const VISITOR_ID_LENGTH: usize = 32;

fn generate_visitor_id() -> String {
    Alphanumeric
        .sample_iter(rand::rng())
        .take(VISITOR_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Returns the visitor id stored in the session, creating one on first visit.
async fn visitor_id(session: &Session) -> Result<String, ExplorerError> {
    let existing = session
        .get::<String>(VISITOR_ID_KEY)
        .await
        .map_err(|err| ExplorerError::InternalServerError(err.to_string()))?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let id = generate_visitor_id();
    session
        .insert(VISITOR_ID_KEY, id.clone())
        .await
        .map_err(|err| ExplorerError::InternalServerError(err.to_string()))?;
    Ok(id)
}

/// The browser making the request, and its search state.
#[derive(Debug, Clone)]
pub(crate) struct Visitor {
    pub(crate) control: SharedControl,
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = ExplorerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ExplorerError::InternalServerError(format!("session unavailable: {rejection:?}"))
            })?;
        let id = visitor_id(&session).await?;
        Ok(Self {
            control: state.explorer.visitor(&id).await,
        })
    }
}
