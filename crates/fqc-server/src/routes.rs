use crate::page;
use axum::extract::{Path as AxumPath, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fqc_lib::graph::{UiEvent, ViewerGraph, ViewerSnapshot};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared request state: the derivatives root and the viewer graph,
/// serialized behind a mutex so each event runs one propagation pass.
#[derive(Clone)]
pub struct AppState {
    pub root: Arc<PathBuf>,
    pub graph: Arc<Mutex<ViewerGraph>>,
}

impl AppState {
    pub fn new(root: PathBuf, graph: ViewerGraph) -> Self {
        Self {
            root: Arc::new(root),
            graph: Arc::new(Mutex::new(graph)),
        }
    }

    fn graph(&self) -> MutexGuard<'_, ViewerGraph> {
        match self.graph.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("figure {filename} not found for sub-{subject}")]
    FigureNotFound { subject: String, filename: String },
    #[error("invalid path component {0:?}")]
    BadComponent(String),
    #[error("{0}")]
    Rejected(String),
    #[error("reading figure: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RequestError::FigureNotFound { .. } => StatusCode::NOT_FOUND,
            RequestError::BadComponent(_) => StatusCode::BAD_REQUEST,
            RequestError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/event", post(post_event))
        .route("/images/:subject/:filename", get(get_image))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    page::viewer_page()
}

async fn get_state(State(state): State<AppState>) -> Json<ViewerSnapshot> {
    Json(state.graph().snapshot())
}

async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<UiEvent>,
) -> Result<Json<ViewerSnapshot>, RequestError> {
    debug!("event: {event:?}");
    let mut graph = state.graph();
    if let Err(err) = graph.apply(event) {
        warn!("rejected event: {err:#}");
        return Err(RequestError::Rejected(err.to_string()));
    }
    Ok(Json(graph.snapshot()))
}

async fn get_image(
    State(state): State<AppState>,
    AxumPath((subject, filename)): AxumPath<(String, String)>,
) -> Result<Response, RequestError> {
    let bytes = read_figure(&state.root, &subject, &filename)?;
    let mut response = Response::new(bytes.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(&filename)),
    );
    Ok(response)
}

/// Load one figure from `<root>/sub-<subject>/figures/<filename>`.
///
/// A missing file is reported as a deliberate not-found condition so the
/// viewer can show it instead of the request crashing the server.
pub fn read_figure(root: &Path, subject: &str, filename: &str) -> Result<Vec<u8>, RequestError> {
    for component in [subject, filename] {
        if !safe_component(component) {
            return Err(RequestError::BadComponent(component.to_string()));
        }
    }
    let path = root
        .join(format!("sub-{subject}"))
        .join("figures")
        .join(filename);
    if !path.exists() {
        return Err(RequestError::FigureNotFound {
            subject: subject.to_string(),
            filename: filename.to_string(),
        });
    }
    Ok(fs::read(&path)?)
}

fn safe_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && !component.contains(['/', '\\'])
}

fn content_type(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
