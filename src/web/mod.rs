//! HTTP front end: server-rendered pages over the explorer.

use std::num::NonZeroU16;
use std::path::Path as StdPath;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::{error, info};

use crate::constants::SESSION_INACTIVITY_HOURS;
use crate::explorer::Explorer;
use crate::gateway::Gateway;

mod images;
mod prelude;
mod store;
mod views;
mod visitor;

use images::{artwork_image_handler, coloring_image_handler, download_handler};
use store::VisitorStore;
use views::{coloring_handler, root_handler, search_again_handler, search_handler};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    explorer: Arc<Explorer>,
}

impl AppState {
    fn new(gateway: Gateway) -> Self {
        Self {
            explorer: Arc::new(Explorer::new(gateway)),
        }
    }
}

/// Addresses one card of one result list.
#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct CardPath {
    pub(crate) epoch: u64,
    pub(crate) index: usize,
}

fn session_layer(store: VisitorStore) -> SessionManagerLayer<VisitorStore> {
    SessionManagerLayer::new(store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            SESSION_INACTIVITY_HOURS,
        )))
}

fn create_router(static_dir: &StdPath, store: VisitorStore) -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/search", post(search_handler))
        .route("/search/again", post(search_again_handler))
        .route("/artworks/{epoch}/{index}/image", get(artwork_image_handler))
        .route(
            "/artworks/{epoch}/{index}/coloring",
            get(coloring_image_handler).post(coloring_handler),
        )
        .route("/artworks/{epoch}/{index}/download", get(download_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer(store))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    }
    info!("Shutting down");
}

/// Serves the explorer until Ctrl-C.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    static_dir: &StdPath,
    gateway: Gateway,
) -> Result<(), anyhow::Error> {
    let store = VisitorStore::default();
    tokio::spawn(store.clone().sweep_expired());
    let app = create_router(static_dir, store).with_state(AppState::new(gateway));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::header::{
        CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, ETAG, IF_NONE_MATCH, LOCATION,
        SET_COOKIE,
    };
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tower::ServiceExt;

    use crate::artwork::tests::info;
    use crate::constants::{COLORING_FAILED_MESSAGE, SEARCH_FAILED_MESSAGE};
    use crate::gateway::mock::MockModel;

    const EMPTY_PROMPT: &str = "어떤 주제로 미술 여행을 떠나볼까요?";
    const ARTWORK_CARD: &str = "class=\"card artwork\"";
    const SKELETON_CARD: &str = "class=\"card skeleton\"";

    fn test_app(model: MockModel) -> (Router, Arc<MockModel>) {
        let model = Arc::new(model);
        let app = create_router(StdPath::new("static"), VisitorStore::default())
            .with_state(AppState::new(Gateway::new(model.clone())));
        (app, model)
    }

    fn ocean_model() -> MockModel {
        MockModel::with_artworks(vec![
            info("The Great Wave off Kanagawa", "Hokusai"),
            info("Water Lilies", "Claude Monet"),
            info("The Starry Night", "Vincent van Gogh"),
            info("Fishing Boats", "Vincent van Gogh"),
        ])
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        builder.body(body).expect("request")
    }

    /// Opens the page once to get a session cookie.
    async fn start_session(app: &Router) -> (String, String) {
        let response = app
            .clone()
            .oneshot(request("GET", "/", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .expect("session cookie")
            .to_string();
        (cookie, read_body(response).await)
    }

    async fn page(app: &Router, cookie: &str) -> String {
        let response = app
            .clone()
            .oneshot(request("GET", "/", Some(cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        read_body(response).await
    }

    /// Reloads the page until `done` holds, like the browser's meta refresh.
    async fn page_until(app: &Router, cookie: &str, done: impl Fn(&str) -> bool) -> String {
        for _ in 0..200 {
            let body = page(app, cookie).await;
            if done(&body) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("page never reached the expected state");
    }

    async fn post_form(
        app: &Router,
        cookie: &str,
        uri: &str,
        form: &str,
    ) -> axum::response::Response {
        app.clone()
            .oneshot(request("POST", uri, Some(cookie), Some(form)))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn first_visit_invites_a_search() {
        let (app, _model) = test_app(ocean_model());
        let (_cookie, body) = start_session(&app).await;
        assert!(body.contains(EMPTY_PROMPT));
        assert!(body.contains("name=\"theme\""));
        assert!(!body.contains(ARTWORK_CARD));
        assert!(!body.contains("http-equiv=\"refresh\""));
    }

    #[tokio::test]
    async fn ocean_search_shows_four_cards() {
        let (app, model) = test_app(ocean_model());
        let (cookie, _) = start_session(&app).await;

        let response = post_form(&app, &cookie, "/search", "theme=ocean").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).expect("location"), "/");

        let body = page_until(&app, &cookie, |body| body.contains(ARTWORK_CARD)).await;
        assert_eq!(body.matches(ARTWORK_CARD).count(), 4);
        assert!(body.contains("Water Lilies"));
        assert!(body.contains("id=\"card-3\""));
        assert!(!body.contains(SKELETON_CARD));
        assert_eq!(model.image_calls().len(), 4);

        let response = app
            .clone()
            .oneshot(request("GET", "/artworks/1/0/image", Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).expect("type"), "image/png");
    }

    #[tokio::test]
    async fn blank_theme_is_a_no_op() {
        let (app, model) = test_app(ocean_model());
        let (cookie, _) = start_session(&app).await;

        let response = post_form(&app, &cookie, "/search", "theme=++").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let body = page(&app, &cookie).await;
        assert!(body.contains(EMPTY_PROMPT));
        assert!(model.structured_prompts().is_empty());
    }

    #[tokio::test]
    async fn searching_shows_placeholders_and_refreshes() {
        let gate = Arc::new(Semaphore::new(0));
        let (app, _model) = test_app(ocean_model().gated(gate.clone()));
        let (cookie, _) = start_session(&app).await;

        post_form(&app, &cookie, "/search", "theme=ocean").await;
        let body = page(&app, &cookie).await;
        assert_eq!(body.matches(SKELETON_CARD).count(), 4);
        assert!(body.contains("http-equiv=\"refresh\""));
        assert!(body.contains("disabled"));

        gate.add_permits(5);
        page_until(&app, &cookie, |body| body.contains(ARTWORK_CARD)).await;
    }

    #[tokio::test]
    async fn failed_search_shows_fixed_message() {
        let (app, _model) = test_app(MockModel::failing_discovery());
        let (cookie, _) = start_session(&app).await;

        post_form(&app, &cookie, "/search", "theme=ocean").await;
        let body = page_until(&app, &cookie, |body| body.contains(SEARCH_FAILED_MESSAGE)).await;
        assert!(!body.contains(ARTWORK_CARD));
        assert!(!body.contains("AI provider error"));
    }

    #[tokio::test]
    async fn coloring_page_can_be_downloaded() {
        let (app, _model) = test_app(ocean_model());
        let (cookie, _) = start_session(&app).await;
        post_form(&app, &cookie, "/search", "theme=ocean").await;
        page_until(&app, &cookie, |body| body.contains(ARTWORK_CARD)).await;

        let response = post_form(&app, &cookie, "/artworks/1/2/coloring", "level=upper").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).expect("location"),
            "/#card-2"
        );

        let body = page_until(&app, &cookie, |body| {
            body.contains("/artworks/1/2/download")
        })
        .await;
        assert!(body.contains("/artworks/1/2/coloring"));

        let response = app
            .clone()
            .oneshot(request("GET", "/artworks/1/2/download", Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .expect("disposition")
            .to_string();
        assert!(disposition.contains("filename=\"The_Starry_Night_coloring_page.png\""));
        assert_eq!(response.headers().get(CONTENT_TYPE).expect("type"), "image/png");
    }

    #[tokio::test]
    async fn regenerated_coloring_page_is_served_fresh() {
        let (app, _model) = test_app(ocean_model());
        let (cookie, _) = start_session(&app).await;
        post_form(&app, &cookie, "/search", "theme=ocean").await;
        page_until(&app, &cookie, |body| body.contains(ARTWORK_CARD)).await;

        post_form(&app, &cookie, "/artworks/1/0/coloring", "level=lower").await;
        let first_url = "/artworks/1/0/coloring?v=1";
        page_until(&app, &cookie, |body| body.contains(first_url)).await;

        let response = app
            .clone()
            .oneshot(request("GET", first_url, Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let cache_control = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .expect("cache-control");
        assert!(cache_control.contains("no-cache"));
        assert!(!cache_control.contains("max-age"));
        let etag = response.headers().get(ETAG).expect("etag").clone();

        let revalidate = Request::builder()
            .uri(first_url)
            .header(COOKIE, &cookie)
            .header(IF_NONE_MATCH, etag)
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(revalidate).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        post_form(&app, &cookie, "/artworks/1/0/coloring", "level=upper").await;
        let second_url = "/artworks/1/0/coloring?v=2";
        let body = page_until(&app, &cookie, |body| body.contains(second_url)).await;
        assert!(!body.contains(first_url));
    }

    #[tokio::test]
    async fn failing_card_does_not_touch_siblings() {
        let (app, _model) = test_app(
            ocean_model()
                .failing_images_for("coloring page inspired by the artwork 'Water Lilies'"),
        );
        let (cookie, _) = start_session(&app).await;
        post_form(&app, &cookie, "/search", "theme=ocean").await;
        page_until(&app, &cookie, |body| body.contains(ARTWORK_CARD)).await;

        post_form(&app, &cookie, "/artworks/1/1/coloring", "level=lower").await;
        let body = page_until(&app, &cookie, |body| body.contains(COLORING_FAILED_MESSAGE)).await;
        assert_eq!(body.matches(COLORING_FAILED_MESSAGE).count(), 1);
        assert_eq!(body.matches(ARTWORK_CARD).count(), 4);
        assert!(!body.contains(SEARCH_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn bad_card_requests_are_rejected() {
        let (app, _model) = test_app(ocean_model());
        let (cookie, _) = start_session(&app).await;
        post_form(&app, &cookie, "/search", "theme=ocean").await;
        page_until(&app, &cookie, |body| body.contains(ARTWORK_CARD)).await;

        let response = post_form(&app, &cookie, "/artworks/1/0/coloring", "level=middle").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_form(&app, &cookie, "/artworks/1/9/coloring", "level=lower").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(request("GET", "/artworks/1/0/download", Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn visitors_do_not_share_results() {
        let (app, _model) = test_app(ocean_model());
        let (alice, _) = start_session(&app).await;
        let (bob, _) = start_session(&app).await;
        assert_ne!(alice, bob);

        post_form(&app, &alice, "/search", "theme=ocean").await;
        page_until(&app, &alice, |body| body.contains(ARTWORK_CARD)).await;

        let body = page(&app, &bob).await;
        assert!(body.contains(EMPTY_PROMPT));
        let response = app
            .clone()
            .oneshot(request("GET", "/artworks/1/0/image", Some(&bob), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
