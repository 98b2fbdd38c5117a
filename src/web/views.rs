use super::CardPath;
use super::prelude::*;
use crate::artwork::GenerationLevel;
use crate::constants::PENDING_REFRESH_SECONDS;
use crate::explorer::{CardView, GridView, present};

/// The running search, while the grid shows placeholders.
#[derive(Clone, Debug)]
pub(crate) struct LoadingView {
    pub(crate) theme: String,
    pub(crate) elapsed_seconds: i64,
    pub(crate) placeholders: Vec<usize>,
}

#[derive(Template, WebTemplate)]
#[template(path = "explore.html")]
pub(crate) struct ExploreTemplate {
    pub(crate) theme: String,
    pub(crate) can_submit: bool,
    pub(crate) can_search_again: bool,
    pub(crate) error_message: Option<&'static str>,
    pub(crate) loading: Option<LoadingView>,
    pub(crate) cards: Vec<CardView>,
    pub(crate) show_empty: bool,
    pub(crate) refresh_seconds: Option<u32>,
}

#[derive(Deserialize)]
pub(crate) struct SearchForm {
    theme: String,
}

#[derive(Deserialize)]
pub(crate) struct ColoringForm {
    level: String,
}

/// handles the / GET
pub(crate) async fn root_handler(visitor: Visitor) -> Result<ExploreTemplate, ExplorerError> {
    let control = visitor.control.lock().await;
    let grid = present(&control, Utc::now());
    let refresh_seconds = grid.is_pending().then_some(PENDING_REFRESH_SECONDS);

    let (loading, cards, show_empty) = match grid {
        GridView::Loading {
            placeholders,
            theme,
            elapsed_seconds,
        } => (
            Some(LoadingView {
                theme,
                elapsed_seconds,
                placeholders: (0..placeholders).collect(),
            }),
            Vec::new(),
            false,
        ),
        GridView::Empty => (None, Vec::new(), true),
        GridView::Cards(cards) => (None, cards, false),
    };

    Ok(ExploreTemplate {
        theme: control.last_theme().unwrap_or_default().to_string(),
        can_submit: control.can_submit(),
        can_search_again: control.can_submit() && control.last_theme().is_some(),
        error_message: control.error_message(),
        loading,
        cards,
        show_empty,
        refresh_seconds,
    })
}

/// handles the /search POST
#[instrument(skip_all, fields(theme = %form.theme))]
pub(crate) async fn search_handler(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<SearchForm>,
) -> Redirect {
    if state
        .explorer
        .start_search(&visitor.control, &form.theme)
        .await
        .is_none()
    {
        debug!("Search submission ignored");
    }
    Redirect::to("/")
}

/// handles the /search/again POST
pub(crate) async fn search_again_handler(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Redirect {
    if state.explorer.search_again(&visitor.control).await.is_none() {
        debug!("Search again ignored");
    }
    Redirect::to("/")
}

/// handles the /artworks/{epoch}/{index}/coloring POST
#[instrument(skip_all, fields(epoch = path.epoch, index = path.index, level = %form.level))]
pub(crate) async fn coloring_handler(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(path): Path<CardPath>,
    Form(form): Form<ColoringForm>,
) -> Result<Redirect, ExplorerError> {
    let level: GenerationLevel = form.level.parse()?;
    let started = state
        .explorer
        .start_coloring(&visitor.control, path.epoch, path.index, level)
        .await?;
    if started.is_some() {
        info!("Drawing {} coloring page", level);
    }
    Ok(Redirect::to(&format!("/#card-{}", path.index)))
}
