use std::hash::{DefaultHasher, Hash, Hasher};

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, ETAG, IF_NONE_MATCH};
use axum::http::response::Builder;

use super::CardPath;
use super::prelude::*;
use crate::artwork::{decode_image, image_content_type};
use crate::constants::{IMAGE_CACHE_CONTROL, PNG_CONTENT_TYPE};
use crate::explorer::{ArtworkCard, SearchControl};

/// Which image of a card is being served.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ImageKind {
    Artwork,
    Coloring,
}

impl ImageKind {
    fn as_str(self) -> &'static str {
        match self {
            ImageKind::Artwork => "artwork",
            ImageKind::Coloring => "coloring",
        }
    }
}

/// Weak ETag derived from the image itself.
///
/// Card URLs are reused across visitors, restarts and regenerations, so the
/// tag has to follow the content rather than the path.
fn build_etag(kind: ImageKind, encoded: &str) -> Option<HeaderValue> {
    let mut hasher = DefaultHasher::new();
    encoded.hash(&mut hasher);
    let value = format!(
        "W/\"{}-{}-{:016x}\"",
        kind.as_str(),
        encoded.len(),
        hasher.finish()
    );
    HeaderValue::from_str(&value).ok()
}

/// Clones card `path` out of the visitor's state so the lock can be released
/// before any decoding.
fn card_snapshot(
    control: &SearchControl,
    path: &CardPath,
) -> Result<ArtworkCard, ExplorerError> {
    control
        .card(path.epoch, path.index)
        .cloned()
        .ok_or_else(|| ExplorerError::NotFound(format!("card {}/{}", path.epoch, path.index)))
}

/// Applies image cache headers to a response builder.
fn apply_cache_headers(mut builder: Builder, etag: Option<&HeaderValue>) -> Builder {
    builder = builder.header(CACHE_CONTROL, IMAGE_CACHE_CONTROL);
    if let Some(etag) = etag {
        builder = builder.header(ETAG, etag.clone());
    }
    builder
}

/// Returns true when the request matches a not-modified response.
fn is_not_modified(headers: &HeaderMap, etag: Option<&HeaderValue>) -> bool {
    let (Some(if_none_match), Some(etag)) = (headers.get(IF_NONE_MATCH), etag) else {
        return false;
    };
    let (Ok(value), Ok(etag)) = (if_none_match.to_str(), etag.to_str()) else {
        return false;
    };
    let value = value.trim();
    value == "*" || value.split(',').any(|candidate| candidate.trim() == etag)
}

/// `Content-Disposition` for a download, with an ASCII fallback name and the
/// UTF-8 name for browsers that understand it.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = url::form_urlencoded::byte_serialize(file_name.as_bytes()).collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

async fn serve_image(
    visitor: &Visitor,
    headers: &HeaderMap,
    path: &CardPath,
    kind: ImageKind,
) -> Result<Response, ExplorerError> {
    let card = card_snapshot(&*visitor.control.lock().await, path)?;
    let encoded = match kind {
        ImageKind::Artwork => card.artwork.image,
        ImageKind::Coloring => card.control.image().map(str::to_owned).ok_or_else(|| {
            ExplorerError::NotFound(format!("coloring page {}/{}", path.epoch, path.index))
        })?,
    };

    let etag = build_etag(kind, &encoded);
    if is_not_modified(headers, etag.as_ref()) {
        let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
        return apply_cache_headers(builder, etag.as_ref())
            .body(Body::empty())
            .map_err(ExplorerError::from);
    }

    let bytes = decode_image(&encoded)?;
    apply_cache_headers(Response::builder(), etag.as_ref())
        .header(CONTENT_TYPE, image_content_type(&bytes))
        .body(Body::from(bytes))
        .map_err(ExplorerError::from)
}

/// GET /artworks/{epoch}/{index}/image
pub(crate) async fn artwork_image_handler(
    visitor: Visitor,
    headers: HeaderMap,
    Path(path): Path<CardPath>,
) -> Result<Response, ExplorerError> {
    serve_image(&visitor, &headers, &path, ImageKind::Artwork).await
}

/// GET /artworks/{epoch}/{index}/coloring
pub(crate) async fn coloring_image_handler(
    visitor: Visitor,
    headers: HeaderMap,
    Path(path): Path<CardPath>,
) -> Result<Response, ExplorerError> {
    serve_image(&visitor, &headers, &path, ImageKind::Coloring).await
}

/// GET /artworks/{epoch}/{index}/download
#[instrument(skip_all, fields(epoch = path.epoch, index = path.index))]
pub(crate) async fn download_handler(
    visitor: Visitor,
    Path(path): Path<CardPath>,
) -> Result<Response, ExplorerError> {
    let card = card_snapshot(&*visitor.control.lock().await, &path)?;
    let download = card.control.download(card.artwork.title())?.ok_or_else(|| {
        ExplorerError::NotFound(format!("coloring page {}/{}", path.epoch, path.index))
    })?;

    info!("Download of {}", download.file_name);
    let disposition = HeaderValue::from_str(&content_disposition(&download.file_name))
        .map_err(|err| ExplorerError::InternalServerError(err.to_string()))?;
    Response::builder()
        .header(CONTENT_TYPE, PNG_CONTENT_TYPE)
        .header(CONTENT_DISPOSITION, disposition)
        .body(Body::from(download.bytes))
        .map_err(ExplorerError::from)
}
