pub(crate) use super::visitor::Visitor;
pub(crate) use crate::error::ExplorerError;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Path, State};
pub(crate) use axum::http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE};
pub(crate) use axum::response::{Redirect, Response};
pub(crate) use chrono::Utc;
pub(crate) use serde::Deserialize;
pub(crate) use tracing::{debug, info, instrument};
