//! Local content server.
//!
//! Serves the manifest and the animation documents from the content root so
//! share links and the viewer panel point at something real, and exposes a
//! small control API that feeds intents into the running coordinator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use ethereal_core::coordinator::{Coordinator, Phase};
use ethereal_core::intent::{Intent, Overlay};
use ethereal_core::link;

/// Read-only view of the coordinator, refreshed by the app after every event.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ApiState {
    pub phase: String,
    pub animation: Option<String>,
    pub index: usize,
    pub total: usize,
    pub favorited: bool,
    pub favorite_label: String,
    pub overlay: String,
    pub music: Option<String>,
    pub credit: String,
    pub credit_url: Option<String>,
    pub share_link: Option<String>,
    pub favorites: Vec<String>,
}

impl ApiState {
    pub fn capture(coordinator: &Coordinator) -> Self {
        let phase = match coordinator.phase() {
            Phase::Loading => "loading".to_string(),
            Phase::Ready => "ready".to_string(),
            Phase::Failed(msg) => format!("failed: {}", msg),
        };
        let overlay = match coordinator.overlay() {
            Overlay::None => "none",
            Overlay::About => "about",
            Overlay::Favorites => "favorites",
            Overlay::Share => "share",
        };
        let credit = coordinator.current_credit();
        Self {
            phase,
            animation: coordinator.current().map(str::to_string),
            index: coordinator.index(),
            total: coordinator.catalog().map_or(0, |c| c.len()),
            favorited: coordinator.is_favorited(),
            favorite_label: coordinator.favorite_label().to_string(),
            overlay: overlay.to_string(),
            music: coordinator.current_music().map(str::to_string),
            credit: credit.text(),
            credit_url: credit.url().map(str::to_string),
            share_link: coordinator.share_link().map(str::to_string),
            favorites: coordinator
                .favorites()
                .into_iter()
                .map(|f| f.animation)
                .collect(),
        }
    }

    /// Navigation intents are dropped until the catalog is ready and while an
    /// overlay is open.
    pub fn accepts_navigation(&self) -> bool {
        self.phase == "ready" && self.overlay == "none"
    }
}

pub type SharedApiState = Arc<RwLock<ApiState>>;

#[derive(Clone)]
struct HttpState {
    api: SharedApiState,
    intent_tx: mpsc::Sender<Intent>,
    content_root: PathBuf,
}

pub fn start_server(
    bind_address: String,
    port: u16,
    content_root: PathBuf,
    api: SharedApiState,
    intent_tx: mpsc::Sender<Intent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(HttpState {
            api,
            intent_tx,
            content_root,
        });

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("content server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/data.json", get(manifest))
        .route("/data/:file", get(document))
        .route("/api/state", get(get_state))
        .route("/api/next", get(next).post(next))
        .route("/api/prev", get(prev).post(prev))
        .route("/api/random", get(random).post(random))
        .route("/api/favorite", get(favorite).post(favorite))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Content ───────────────────────────────────────────────────────────────────

/// `/?animation=<id>` moves the viewer there; every visit lands on the
/// document currently shown.
async fn index(
    State(state): State<HttpState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let deep_link = params
        .get(link::DEEP_LINK_PARAM)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    if let Some(animation) = deep_link {
        info!("HTTP: deep link to {}", animation);
        if state.intent_tx.send(Intent::GoTo(animation.clone())).await.is_err() {
            error!("Failed to forward deep link");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        return Redirect::temporary(&link::content_url("", &animation)).into_response();
    }

    let current = state.api.read().ok().and_then(|api| api.animation.clone());
    match current {
        Some(animation) => Redirect::temporary(&link::content_url("", &animation)).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "catalog not loaded").into_response(),
    }
}

async fn manifest(State(state): State<HttpState>) -> Response {
    serve_file(&state.content_root.join("data.json")).await
}

async fn document(State(state): State<HttpState>, UrlPath(file): UrlPath<String>) -> Response {
    match data_file(&state.content_root, &file) {
        Some(path) => serve_file(&path).await,
        None => {
            warn!("HTTP: rejected document path {:?}", file);
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// Resolve `file` inside `<root>/data`.  Anything that could leave that
/// directory is refused.
pub fn data_file(root: &Path, file: &str) -> Option<PathBuf> {
    if file.is_empty()
        || file.starts_with('.')
        || file.contains(['/', '\\'])
        || file.contains("..")
    {
        return None;
    }
    Some(root.join("data").join(file))
}

pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("HTTP: serving {} ({} bytes)", path.display(), bytes.len());
            ([(header::CONTENT_TYPE, content_type(path))], bytes).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("HTTP: failed to read {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ── Control API ───────────────────────────────────────────────────────────────

async fn get_state(State(state): State<HttpState>) -> Result<Json<ApiState>, StatusCode> {
    let api = state
        .api
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();
    Ok(Json(api))
}

async fn forward(state: &HttpState, intent: Intent) -> StatusCode {
    info!("HTTP API: {:?}", intent);
    if intent.is_navigation() {
        let accepts = state
            .api
            .read()
            .map(|api| api.accepts_navigation())
            .unwrap_or(false);
        if !accepts {
            debug!("HTTP API: {:?} rejected, viewer busy", intent);
            return StatusCode::CONFLICT;
        }
    }
    if state.intent_tx.send(intent).await.is_err() {
        error!("Failed to forward intent");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}

async fn next(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Intent::Next).await
}

async fn prev(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Intent::Previous).await
}

async fn random(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Intent::Random).await
}

async fn favorite(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Intent::ToggleFavorite).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::coordinator;
    use ethereal_core::catalog::{Catalog, Manifest};

    #[test]
    fn data_files_stay_inside_the_content_root() {
        let root = Path::new("/srv/public");
        assert_eq!(
            data_file(root, "aurora.html"),
            Some(PathBuf::from("/srv/public/data/aurora.html"))
        );
        assert_eq!(data_file(root, "../secret"), None);
        assert_eq!(data_file(root, "a/b.html"), None);
        assert_eq!(data_file(root, ".hidden"), None);
        assert_eq!(data_file(root, ""), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("data.json")), "application/json");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn snapshot_before_catalog() {
        let coordinator = coordinator();
        let api = ApiState::capture(&coordinator);
        assert_eq!(api.phase, "loading");
        assert_eq!(api.animation, None);
        assert_eq!(api.favorite_label, "Favorite");
        assert_eq!(api.credit, "No music for this animation.");
    }

    fn http_state(coordinator: &Coordinator) -> (HttpState, mpsc::Receiver<Intent>) {
        let (intent_tx, intent_rx) = mpsc::channel(4);
        let state = HttpState {
            api: Arc::new(RwLock::new(ApiState::capture(coordinator))),
            intent_tx,
            content_root: PathBuf::from("/srv/public"),
        };
        (state, intent_rx)
    }

    #[tokio::test]
    async fn navigation_is_forwarded_when_idle() {
        let mut coordinator = coordinator();
        let manifest = Manifest::parse(r#"{"animations": {"a": null, "b": null}}"#).unwrap();
        coordinator.on_catalog_loaded(Ok(Catalog::from_manifest(manifest)), None);
        let (state, mut rx) = http_state(&coordinator);

        assert_eq!(next(State(state.clone())).await, StatusCode::OK);
        assert_eq!(rx.recv().await, Some(Intent::Next));
        assert_eq!(favorite(State(state)).await, StatusCode::OK);
        assert_eq!(rx.recv().await, Some(Intent::ToggleFavorite));
    }

    #[tokio::test]
    async fn navigation_conflicts_while_overlay_is_open() {
        let mut coordinator = coordinator();
        let manifest = Manifest::parse(r#"{"animations": {"a": null, "b": null}}"#).unwrap();
        coordinator.on_catalog_loaded(Ok(Catalog::from_manifest(manifest)), None);
        coordinator.dispatch(Intent::ShowAbout);
        let (state, mut rx) = http_state(&coordinator);

        assert_eq!(next(State(state.clone())).await, StatusCode::CONFLICT);
        assert_eq!(prev(State(state.clone())).await, StatusCode::CONFLICT);
        assert_eq!(random(State(state.clone())).await, StatusCode::CONFLICT);
        assert_eq!(favorite(State(state)).await, StatusCode::CONFLICT);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn navigation_conflicts_before_catalog_loads() {
        let (state, _rx) = http_state(&coordinator());
        assert_eq!(next(State(state)).await, StatusCode::CONFLICT);
    }

    #[test]
    fn snapshot_after_favorite() {
        let mut coordinator = coordinator();
        let manifest = Manifest::parse(r#"{"animations": {"a": "10_fs", "b": null}}"#).unwrap();
        coordinator.on_catalog_loaded(Ok(Catalog::from_manifest(manifest)), Some("a"));
        coordinator.dispatch(Intent::ToggleFavorite);

        let api = ApiState::capture(&coordinator);
        assert_eq!(api.phase, "ready");
        assert_eq!(api.animation.as_deref(), Some("a"));
        assert_eq!(api.total, 2);
        assert_eq!(api.favorite_label, "Unfavorite");
        assert_eq!(api.favorites, vec!["a"]);
        assert_eq!(api.music.as_deref(), Some("10_fs"));
        assert_eq!(api.credit, "Credit not found for 10_fs");
    }
}
