use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trawler_engine::{
    charts::ChartStyle, error::TrawlerError, EngineConfig, Metric, RankedRecord, SearchHit, Session,
};

const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSIONS: usize = 256;
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

type SharedSession = Arc<Mutex<Session>>;

struct SessionSlot {
    session: SharedSession,
    last_used: Instant,
    /// Recency order for eviction
    seq: u64,
}

/// Bounded map of client sessions.
///
/// Idle sessions expire after the TTL; when full, the least recently used
/// session is dropped. The map lock is only held to look a session up.
struct SessionStore {
    config: Arc<EngineConfig>,
    slots: Mutex<HashMap<String, SessionSlot>>,
    capacity: usize,
    ttl: Duration,
    next_seq: AtomicU64,
}

impl SessionStore {
    fn new(config: EngineConfig, capacity: usize, ttl: Duration) -> Self {
        Self {
            config: Arc::new(config),
            slots: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Session for `id`. Without an id the client gets a fresh session under a new one.
    fn checkout(&self, id: Option<&str>) -> Result<(String, SharedSession), AppError> {
        let now = Instant::now();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| AppError::Internal("session store poisoned".to_string()))?;

        let ttl = self.ttl;
        slots.retain(|_, slot| now.duration_since(slot.last_used) < ttl);

        let id = match id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        if let Some(slot) = slots.get_mut(&id) {
            slot.last_used = now;
            slot.seq = seq;
            return Ok((id, Arc::clone(&slot.session)));
        }

        if slots.len() >= self.capacity {
            let oldest = slots
                .iter()
                .min_by_key(|(_, slot)| slot.seq)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                tracing::debug!("Evicting session {}", key);
                slots.remove(&key);
            }
        }

        tracing::debug!("New session {}", id);
        let session = Arc::new(Mutex::new(Session::new((*self.config).clone())?));
        slots.insert(
            id.clone(),
            SessionSlot {
                session: Arc::clone(&session),
                last_used: now,
                seq,
            },
        );
        Ok((id, session))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[derive(Clone)]
struct AppState {
    store: Arc<SessionStore>,
}

impl AppState {
    /// Run `f` against the caller's session on the blocking pool.
    ///
    /// Returns the session id so the response can hand it back.
    async fn with_session<T, F>(&self, headers: &HeaderMap, f: F) -> Result<(String, T), AppError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> Result<T, TrawlerError> + Send + 'static,
    {
        let requested = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let (id, session) = self.store.checkout(requested)?;

        let value = tokio::task::spawn_blocking(move || {
            let mut session = session
                .lock()
                .map_err(|_| AppError::Internal("session poisoned".to_string()))?;
            f(&mut session).map_err(AppError::from)
        })
        .await
        .map_err(|e| AppError::Internal(format!("worker failed: {}", e)))??;

        Ok((id, value))
    }
}

/// JSON body plus the session header
fn respond<T: Serialize>(session_id: String, body: T) -> Response {
    ([(SESSION_HEADER, session_id)], Json(body)).into_response()
}

#[derive(Debug, Deserialize)]
struct TopParams {
    #[serde(default = "default_metric")]
    metric: String,
    /// Comma-separated species list
    #[serde(default)]
    species: Option<String>,
    n: Option<usize>,
}

fn default_metric() -> String {
    "efficiency".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct ChartParams {
    #[serde(default)]
    species: Option<String>,
    x: Option<String>,
    y: Option<String>,
    style: Option<String>,
    n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    dataset: String,
    query: String,
    cutoff: Option<f64>,
    #[serde(default)]
    suggestions: usize,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    hit: Option<SearchHit>,
    suggestions: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct DatasetsResponse {
    datasets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TopResponse {
    metric: String,
    records: Vec<RankedRecord>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trawler_server=debug,trawler_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("TRAWLER_CONFIG").ok();
    let config = EngineConfig::load(config_path.as_deref().map(std::path::Path::new))?;
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8090);

    tracing::info!("🚀 Starting Trawler Engine Server");
    tracing::info!("📦 Data directory: {}", config.data_dir.display());
    tracing::info!("🔌 Port: {}", port);

    let state = AppState {
        store: Arc::new(SessionStore::new(config, MAX_SESSIONS, SESSION_TTL)),
    };

    let app = router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("🐟 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/datasets", get(datasets_handler))
        .route("/v1/datasets/:name", get(dataset_handler))
        .route("/v1/datasets/:name/top", get(top_handler))
        .route("/v1/datasets/:name/charts/:chart", get(chart_handler))
        .route("/v1/search", post(search_handler))
        .route("/v1/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: trawler_engine::VERSION.to_string(),
    })
}

async fn datasets_handler(State(state): State<AppState>) -> Json<DatasetsResponse> {
    Json(DatasetsResponse {
        datasets: state.store.config.datasets.clone(),
    })
}

async fn dataset_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (id, ranked) = state.with_session(&headers, move |s| s.open(&name)).await?;
    Ok(respond(id, ranked.as_ref()))
}

async fn top_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<TopParams>,
) -> Result<Response, AppError> {
    let metric = Metric::parse(&params.metric, split_species(params.species.as_deref()))?;
    let label = metric.to_string();
    let (id, records) = state
        .with_session(&headers, move |s| {
            let ranked = s.open(&name)?;
            let top = s.top_n(&ranked, &metric, params.n)?;
            Ok(top.into_iter().cloned().collect::<Vec<RankedRecord>>())
        })
        .await?;

    Ok(respond(
        id,
        TopResponse {
            metric: label,
            records,
        },
    ))
}

async fn chart_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((name, chart)): Path<(String, String)>,
    Query(params): Query<ChartParams>,
) -> Result<Response, AppError> {
    let (id, body) = state
        .with_session(&headers, move |s| {
            let ranked = s.open(&name)?;
            let value = match chart.as_str() {
                "top-catch" => {
                    let species = split_species(params.species.as_deref());
                    serde_json::to_value(s.top_catch_chart(&ranked, &species)?)?
                }
                "efficiency" => serde_json::to_value(s.efficiency_chart(&ranked)?)?,
                "all-efficiency" => serde_json::to_value(s.all_efficiency_chart(&ranked)?)?,
                "column" => {
                    let (Some(x), Some(y)) = (params.x.as_deref(), params.y.as_deref()) else {
                        return Err(TrawlerError::Other(
                            "column chart needs x and y query parameters".to_string(),
                        ));
                    };
                    let style = match params.style.as_deref() {
                        Some(style) => ChartStyle::parse(style)?,
                        None => ChartStyle::default(),
                    };
                    serde_json::to_value(s.column_chart(&ranked, x, y, style)?)?
                }
                "preview" => serde_json::to_value(s.preview(&ranked, params.n))?,
                other => return Err(TrawlerError::Other(format!("unknown chart '{}'", other))),
            };
            Ok(value)
        })
        .await?;
    Ok(respond(id, body))
}

async fn search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> Result<Response, AppError> {
    tracing::debug!("Search request: {:?}", req);

    let query = req.query.clone();
    let (id, response) = state
        .with_session(&headers, move |s| {
            let ranked = s.open(&req.dataset)?;
            let hit = match req.cutoff {
                Some(cutoff) => s.search_with_cutoff(&ranked, &req.query, cutoff)?,
                None => s.search(&ranked, &req.query),
            };
            let suggestions = s.suggestions(&ranked, &req.query, req.suggestions);
            Ok(SearchResponse { hit, suggestions })
        })
        .await?;

    match &response.hit {
        Some(hit) => tracing::info!("✅ {} → {}", query, hit.display()),
        None => tracing::info!("❌ {} → no match", query),
    }

    Ok(respond(id, response))
}

async fn stats_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let (id, stats) = state.with_session(&headers, |s| Ok(s.cache_stats())).await?;
    Ok(respond(id, stats))
}

fn split_species(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// Error handling
#[derive(Debug)]
enum AppError {
    Engine(TrawlerError),
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Engine(err) => match err {
                TrawlerError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
                TrawlerError::Schema(_)
                | TrawlerError::InvalidData { .. }
                | TrawlerError::DivisionByZero { .. }
                | TrawlerError::NonFiniteEfficiency { .. }
                | TrawlerError::InvalidCutoff(_)
                | TrawlerError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,
                TrawlerError::Other(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Engine(err) => err.to_string(),
            AppError::Internal(message) => message,
        };

        tracing::error!("❌ Error: {} - {}", status, message);

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<TrawlerError>,
{
    fn from(err: E) -> Self {
        AppError::Engine(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn store(capacity: usize, ttl: Duration) -> SessionStore {
        let config = EngineConfig {
            data_dir: std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
            ..EngineConfig::default()
        };
        SessionStore::new(config, capacity, ttl)
    }

    async fn body_of(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn error_body(err: impl Into<AppError>) -> (StatusCode, serde_json::Value) {
        body_of(err.into().into_response()).await
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let (status, body) = error_body(TrawlerError::DatasetNotFound("x.csv".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "Dataset not found: x.csv" }));

        let (status, body) = error_body(TrawlerError::DivisionByZero { trawler: "Idle".into() }).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"],
            "Division by zero: trawler 'Idle' has zero fishing days"
        );

        let (status, body) = error_body(TrawlerError::InvalidCutoff(1.5)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid match cutoff 1.5: must be within [0, 1]");

        let (status, body) = error_body(TrawlerError::Other("unknown chart 'pie'".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown chart 'pie'");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let (status, body) = error_body(TrawlerError::Io(io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "IO error: disk gone");

        let (status, _) = error_body(TrawlerError::NonFiniteEfficiency {
            trawler: "A".into(),
            total_catch: 10.0,
            fishing_days: 1e-320,
        })
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = body_of(AppError::Internal("worker failed".into()).into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "worker failed");
    }

    #[test]
    fn test_missing_header_gets_fresh_session() {
        let store = store(8, SESSION_TTL);
        let (a, session_a) = store.checkout(None).unwrap();
        let (b, session_b) = store.checkout(None).unwrap();

        assert_ne!(a, b);
        assert!(!Arc::ptr_eq(&session_a, &session_b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_same_id_reuses_session() {
        let store = store(8, SESSION_TTL);
        let (_, first) = store.checkout(Some("client-a")).unwrap();
        let (id, second) = store.checkout(Some("client-a")).unwrap();

        assert_eq!(id, "client-a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_is_bounded() {
        let store = store(2, SESSION_TTL);
        let (_, a) = store.checkout(Some("a")).unwrap();
        store.checkout(Some("b")).unwrap();
        // touch "a" so "b" is the least recently used
        store.checkout(Some("a")).unwrap();
        store.checkout(Some("c")).unwrap();

        assert_eq!(store.len(), 2);
        let (_, a_again) = store.checkout(Some("a")).unwrap();
        assert!(Arc::ptr_eq(&a, &a_again));

        for i in 0..50 {
            store.checkout(Some(&format!("rotating-{}", i))).unwrap();
        }
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = store(8, Duration::ZERO);
        let (_, first) = store.checkout(Some("a")).unwrap();
        let (_, second) = store.checkout(Some("a")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_handlers_return_session_header() {
        let state = AppState {
            store: Arc::new(store(8, SESSION_TTL)),
        };

        let response = dataset_handler(
            State(state.clone()),
            HeaderMap::new(),
            Path("trial.csv".to_string()),
        )
        .await
        .unwrap();
        let id = response.headers()[SESSION_HEADER].to_str().unwrap().to_string();
        let (status, body) = body_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "trial.csv");

        // The same id sees its own cache; a request without one does not
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&id).unwrap());
        let (_, stats) = body_of(stats_handler(State(state.clone()), headers).await.unwrap()).await;
        assert_eq!(stats["total_entries"], 1);

        let (_, stats) = body_of(stats_handler(State(state), HeaderMap::new()).await.unwrap()).await;
        assert_eq!(stats["total_entries"], 0);
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_not_found() {
        let state = AppState {
            store: Arc::new(store(8, SESSION_TTL)),
        };
        let err = dataset_handler(State(state), HeaderMap::new(), Path("secret.csv".to_string()))
            .await
            .unwrap_err();
        let (status, _) = body_of(err.into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_column_chart_and_preview_routes() {
        let state = AppState {
            store: Arc::new(store(8, SESSION_TTL)),
        };
        let params = ChartParams {
            x: Some("Trawler Name".into()),
            y: Some("Efficiency".into()),
            style: Some("scatter".into()),
            ..ChartParams::default()
        };
        let response = chart_handler(
            State(state.clone()),
            HeaderMap::new(),
            Path(("midwater.csv".to_string(), "column".to_string())),
            Query(params),
        )
        .await
        .unwrap();
        let (_, chart) = body_of(response).await;
        assert_eq!(chart["style"], "scatter");
        assert_eq!(chart["points"][0], serde_json::json!({ "x": "Deep Blue", "y": 150.0 }));

        let err = chart_handler(
            State(state.clone()),
            HeaderMap::new(),
            Path(("midwater.csv".to_string(), "column".to_string())),
            Query(ChartParams::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let params = ChartParams {
            n: Some(2),
            ..ChartParams::default()
        };
        let response = chart_handler(
            State(state),
            HeaderMap::new(),
            Path(("midwater.csv".to_string(), "preview".to_string())),
            Query(params),
        )
        .await
        .unwrap();
        let (_, table) = body_of(response).await;
        assert_eq!(table["rows"].as_array().map(Vec::len), Some(2));
        assert_eq!(table["total_rows"], 3);
    }
}
