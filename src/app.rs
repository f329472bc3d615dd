use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::catalog::{self, CatalogEntry};
use crate::controller::{PlaybackController, PlaybackMode, PlaybackState};
use crate::errors::VizError;
use crate::recorder::{CancelToken, StepRecorder};
use crate::saving;
use crate::step::{Outcome, Run, Step, WorkingState};

/// One playback controller per page session.
#[derive(Default)]
pub struct Sessions {
    controllers: Mutex<HashMap<Uuid, PlaybackController>>,
}

#[derive(Deserialize)]
pub struct RunRequest {
    pub algorithm: String,
    #[serde(default)]
    pub input: String,
}

#[derive(Serialize, Debug)]
pub struct SessionView {
    pub id: Uuid,
    pub state: PlaybackState,
    pub mode: PlaybackMode,
    pub algorithm: Option<&'static str>,
    pub index: Option<usize>,
    pub total: usize,
    pub step: Option<Step>,
    pub working: Option<WorkingState>,
    pub outcome: Option<Outcome>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Debug)]
pub enum SessionError {
    NotFound(Uuid),
    Rejected(VizError),
    Io(std::io::Error),
    Worker(String),
}

impl SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Rejected(VizError::Unsupported(_) | VizError::Cancelled) => StatusCode::CONFLICT,
            SessionError::Rejected(_) => StatusCode::BAD_REQUEST,
            SessionError::Io(_) | SessionError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::NotFound(id) => format!("no session {}", id),
            SessionError::Rejected(e) => e.to_string(),
            SessionError::Io(e) => e.to_string(),
            SessionError::Worker(e) => format!("run worker failed: {}", e),
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(self.message()),
            }),
        )
            .into_response()
    }
}

fn view(id: Uuid, ctrl: &PlaybackController) -> SessionView {
    let run = ctrl.run();
    SessionView {
        id,
        state: ctrl.state(),
        mode: ctrl.mode(),
        algorithm: run.map(|r| r.algorithm.name()),
        index: ctrl.current_index(),
        total: run.map_or(0, |r| r.len()),
        step: ctrl.current_step().cloned(),
        working: ctrl.current_state().cloned(),
        outcome: if ctrl.is_finished() {
            run.map(|r| r.outcome.clone())
        } else {
            None
        },
    }
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, id: Uuid, f: impl FnOnce(&mut PlaybackController) -> Result<T, SessionError>) -> Result<T, SessionError> {
        let mut controllers = self.controllers.lock().unwrap_or_else(|e| e.into_inner());
        let ctrl = controllers.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        f(ctrl)
    }

    pub fn create(&self) -> SessionView {
        let id = Uuid::new_v4();
        let ctrl = PlaybackController::new();
        let v = view(id, &ctrl);
        self.controllers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, ctrl);
        log::info!("session {} created", id);
        v
    }

    /// Parses and generates without holding the session lock, so a newer
    /// start on the same session can cancel this one while it generates.
    pub fn start(&self, id: Uuid, request: &RunRequest) -> Result<SessionView, SessionError> {
        let parsed = catalog::parse_request(&request.algorithm, &request.input).map_err(SessionError::Rejected)?;
        let token = self.begin(id)?;
        let run = catalog::generate_with(&parsed, &mut StepRecorder::new().with_token(token.clone()))
            .map_err(SessionError::Rejected)?;
        self.install(id, run, &token)
    }

    /// Cancels the session's in-progress run and returns the token for the next one.
    pub fn begin(&self, id: Uuid) -> Result<CancelToken, SessionError> {
        self.with(id, |ctrl| Ok(ctrl.begin()))
    }

    pub fn install(&self, id: Uuid, run: Run, token: &CancelToken) -> Result<SessionView, SessionError> {
        self.with(id, |ctrl| {
            let (name, steps) = (run.algorithm.name(), run.len());
            if !ctrl.install(run, token) {
                log::info!("session {} dropped a superseded {} run", id, name);
                return Err(SessionError::Rejected(VizError::Cancelled));
            }
            log::info!("session {} runs {} ({} steps)", id, name, steps);
            Ok(view(id, ctrl))
        })
    }

    pub fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let mut controllers = self.controllers.lock().unwrap_or_else(|e| e.into_inner());
        let mut ctrl = controllers.remove(&id).ok_or(SessionError::NotFound(id))?;
        ctrl.cancel();
        log::info!("session {} removed", id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.controllers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next(&self, id: Uuid) -> Result<SessionView, SessionError> {
        self.with(id, |ctrl| {
            ctrl.next();
            Ok(view(id, ctrl))
        })
    }

    pub fn previous(&self, id: Uuid) -> Result<SessionView, SessionError> {
        self.with(id, |ctrl| {
            ctrl.previous().map_err(SessionError::Rejected)?;
            Ok(view(id, ctrl))
        })
    }

    pub fn get(&self, id: Uuid) -> Result<SessionView, SessionError> {
        self.with(id, |ctrl| Ok(view(id, ctrl)))
    }

    /// Compressed trace of the session's run.
    pub fn trace(&self, id: Uuid) -> Result<Vec<u8>, SessionError> {
        self.with(id, |ctrl| match ctrl.run() {
            Some(run) => saving::run_to_bytes(run).map_err(SessionError::Io),
            None => Err(SessionError::Rejected(VizError::invalid("session has no run"))),
        })
    }
}

pub fn router(sessions: Arc<Sessions>) -> Router {
    Router::new()
        .route("/api/algorithms", get(list_algorithms))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/run", post(run_session))
        .route("/api/sessions/:id/next", post(next_step))
        .route("/api/sessions/:id/previous", post(previous_step))
        .route("/api/sessions/:id/trace", get(download_trace))
        .nest_service("/static", ServeDir::new("static"))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(sessions)
}

pub async fn run(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(Sessions::new()));

    let listener = TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_algorithms() -> Json<Vec<CatalogEntry>> {
    Json(catalog::entries())
}

async fn create_session(State(sessions): State<Arc<Sessions>>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(sessions.create()))
}

async fn get_session(Path(id): Path<Uuid>, State(sessions): State<Arc<Sessions>>) -> impl IntoResponse {
    match sessions.get(id) {
        Ok(v) => Json(v).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_session(Path(id): Path<Uuid>, State(sessions): State<Arc<Sessions>>) -> impl IntoResponse {
    match sessions.remove(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn run_session(
    Path(id): Path<Uuid>,
    State(sessions): State<Arc<Sessions>>,
    Json(payload): Json<RunRequest>,
) -> impl IntoResponse {
    // Generation is CPU-bound; keep it off the async workers.
    match tokio::task::spawn_blocking(move || sessions.start(id, &payload)).await {
        Ok(Ok(v)) => Json(v).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => SessionError::Worker(e.to_string()).into_response(),
    }
}

async fn next_step(Path(id): Path<Uuid>, State(sessions): State<Arc<Sessions>>) -> impl IntoResponse {
    match sessions.next(id) {
        Ok(v) => Json(v).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn previous_step(Path(id): Path<Uuid>, State(sessions): State<Arc<Sessions>>) -> impl IntoResponse {
    match sessions.previous(id) {
        Ok(v) => Json(v).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn download_trace(Path(id): Path<Uuid>, State(sessions): State<Arc<Sessions>>) -> impl IntoResponse {
    match sessions.trace(id) {
        Ok(buffer) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/gzip")],
            Bytes::from(buffer),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_request(algorithm: &str, input: &str) -> RunRequest {
        RunRequest {
            algorithm: algorithm.to_string(),
            input: input.to_string(),
        }
    }

    #[test]
    fn session_steps_through_a_run() {
        let sessions = Sessions::new();
        let id = sessions.create().id;
        let v = sessions.start(id, &run_request("bubble", "3 1 2")).unwrap();
        assert_eq!(v.state, PlaybackState::Running);
        assert_eq!(v.index, Some(0));

        let v = sessions.next(id).unwrap();
        assert_eq!(v.index, Some(1));
        let v = sessions.previous(id).unwrap();
        assert_eq!(v.index, Some(0));

        for _ in 0..v.total {
            sessions.next(id).unwrap();
        }
        let v = sessions.get(id).unwrap();
        assert_eq!(v.state, PlaybackState::Finished);
        assert_eq!(v.outcome, Some(Outcome::Sorted(vec![1, 2, 3])));
        assert!(!sessions.trace(id).unwrap().is_empty());
    }

    #[test]
    fn unknown_session_and_bad_input() {
        let sessions = Sessions::new();
        assert!(matches!(sessions.get(Uuid::new_v4()), Err(SessionError::NotFound(_))));

        let id = sessions.create().id;
        let err = sessions.start(id, &run_request("binary", "3 1 2 | 1")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = sessions.start(id, &run_request("bogo", "1")).unwrap_err();
        assert!(matches!(err, SessionError::Rejected(VizError::UnknownAlgorithm(_))));
        let long = (0..5000).map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
        let err = sessions.start(id, &run_request("bubble", &long)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn newer_start_cancels_a_generating_run() {
        let sessions = Sessions::new();
        let id = sessions.create().id;
        let request = catalog::parse_request("insertion", "5 4 3 2 1").unwrap();
        let first = sessions.begin(id).unwrap();

        // The first run is still generating when a second start arrives.
        let mut second = None;
        let result = {
            let mut rec = StepRecorder::new().with_token(first.clone()).with_observer(|_| {
                if second.is_none() {
                    assert!(sessions.get(id).is_ok(), "session lock held during generation");
                    second = Some(sessions.begin(id).unwrap());
                }
            });
            catalog::generate_with(&request, &mut rec)
        };
        assert_eq!(result, Err(VizError::Cancelled));
        assert!(first.is_cancelled());

        let second = second.unwrap();
        let run = catalog::generate_with(&request, &mut StepRecorder::new().with_token(second.clone())).unwrap();
        let stale = catalog::generate(&request).unwrap();
        let err = sessions.install(id, stale, &first).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(sessions.get(id).unwrap().state, PlaybackState::Idle);

        let v = sessions.install(id, run, &second).unwrap();
        assert_eq!(v.state, PlaybackState::Running);
        assert_eq!(v.algorithm, Some("insertion"));
    }

    #[test]
    fn removed_sessions_are_gone() {
        let sessions = Sessions::new();
        let id = sessions.create().id;
        let token = sessions.begin(id).unwrap();
        assert_eq!(sessions.len(), 1);
        sessions.remove(id).unwrap();
        assert!(token.is_cancelled());
        assert!(sessions.is_empty());
        assert!(matches!(sessions.get(id), Err(SessionError::NotFound(_))));
        assert!(matches!(sessions.remove(id), Err(SessionError::NotFound(_))));
    }
}
