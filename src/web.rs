use crate::{
    AnswerOutcome, Feedback, QuizSession, Relation, RelationLookup, SentenceOutcome,
    SubmittedSentence, SuggestionView, Word, suggest::suggestion_view,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::RwLock;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState<L> = Arc<AppState<L>>;

pub struct AppState<L> {
    pub session: RwLock<QuizSession<L>>,
}

impl<L> AppState<L> {
    pub fn new(session: QuizSession<L>) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve<L>(config: WebConfig, session: QuizSession<L>) -> Result<(), WebError>
where
    L: RelationLookup + 'static,
{
    let words = session.words().len();
    let router = build_router(Arc::new(AppState::new(session)));
    info!(%config.addr, words, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router<L>(state: SharedState<L>) -> Router
where
    L: RelationLookup + 'static,
{
    Router::new()
        .route("/healthz", get(health))
        .route("/api/word", get(api_word::<L>))
        .route("/api/word/next", post(api_next_word::<L>))
        .route("/api/answer", post(api_answer::<L>))
        .route("/api/suggest", get(api_suggest::<L>))
        .route("/api/sentence", post(api_sentence::<L>))
        .route("/api/sentences", get(api_sentences::<L>))
        .route("/api/feedback", get(api_feedback::<L>))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "lexiquiz-web" }))
}

#[derive(Debug, Serialize, Deserialize)]
struct WordPayload {
    index: usize,
    total: usize,
    word: Word,
}

impl WordPayload {
    fn from_session<L: RelationLookup>(session: &QuizSession<L>) -> Result<Self, ApiError> {
        let word = session
            .current()
            .cloned()
            .ok_or_else(|| ApiError::not_found("No word list is loaded."))?;
        Ok(Self {
            index: session.current_index(),
            total: session.words().len(),
            word,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    relation: Relation,
    answer: String,
}

#[derive(Debug, Serialize)]
struct AnswerResponse {
    #[serde(flatten)]
    outcome: AnswerOutcome,
    feedback: Option<Feedback>,
}

#[derive(Debug, Deserialize)]
struct SentenceRequest {
    sentence: String,
}

#[derive(Debug, Serialize)]
struct SentenceResponse {
    #[serde(flatten)]
    outcome: SentenceOutcome,
    feedback: Option<Feedback>,
}

#[derive(Debug, Deserialize)]
struct SuggestParams {
    relation: Option<String>,
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct SuggestPayload {
    relation: Relation,
    query: String,
    #[serde(flatten)]
    view: SuggestionView,
}

async fn api_word<L: RelationLookup>(
    State(state): State<SharedState<L>>,
) -> Result<Json<WordPayload>, ApiError> {
    let session = state.session.read().await;
    WordPayload::from_session(&*session).map(Json)
}

async fn api_next_word<L: RelationLookup>(
    State(state): State<SharedState<L>>,
) -> Result<Json<WordPayload>, ApiError> {
    let mut session = state.session.write().await;
    session.advance();
    WordPayload::from_session(&*session).map(Json)
}

async fn api_answer<L: RelationLookup>(
    State(state): State<SharedState<L>>,
    Json(request): Json<AnswerRequest>,
) -> Json<AnswerResponse> {
    let session = state.session.read().await;
    let outcome = session
        .submit_answer(request.relation, &request.answer)
        .await;
    let feedback = match outcome {
        AnswerOutcome::Superseded => None,
        _ => session.feedback().latest(),
    };
    Json(AnswerResponse { outcome, feedback })
}

async fn api_suggest<L: RelationLookup>(
    State(state): State<SharedState<L>>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestPayload>, ApiError> {
    let relation = params
        .relation
        .as_deref()
        .unwrap_or("synonym")
        .parse::<Relation>()
        .map_err(|err| ApiError::bad_request(err))?;
    let query = params.q.unwrap_or_default();
    let session = state.session.read().await;
    let view = suggestion_view(&query, session.fallback().words(relation));
    Ok(Json(SuggestPayload {
        relation,
        query,
        view,
    }))
}

async fn api_sentence<L: RelationLookup>(
    State(state): State<SharedState<L>>,
    Json(request): Json<SentenceRequest>,
) -> Result<Json<SentenceResponse>, ApiError> {
    let session = state.session.read().await;
    let outcome = session
        .submit_sentence(&request.sentence)
        .map_err(|err| ApiError::internal(err.user_message()))?;
    Ok(Json(SentenceResponse {
        outcome,
        feedback: session.feedback().latest(),
    }))
}

async fn api_sentences<L: RelationLookup>(
    State(state): State<SharedState<L>>,
) -> Json<Vec<SubmittedSentence>> {
    let session = state.session.read().await;
    Json(session.journal().entries())
}

async fn api_feedback<L: RelationLookup>(
    State(state): State<SharedState<L>>,
) -> Json<Option<Feedback>> {
    let session = state.session.read().await;
    Json(session.feedback().current())
}
