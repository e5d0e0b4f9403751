//! REST API for the packing service.
//!
//! Provides HTTP endpoints for the warehouse frontend.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::model::{ContainerSpec, Item, ItemSpec, PackingLimits, PlacedItem, ValidationError};
use crate::optimizer::{
    PackEvent, PackingConfig, PackingOutcome, pack_items_with_config, pack_items_with_progress,
};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>warehouse-packer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded viewer assets (HTML, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Container dimensions of a pack request.
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct ContainerRequest {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRequest {
    fn into_spec(self) -> Result<ContainerSpec, ValidationError> {
        ContainerSpec::new((self.length, self.width, self.height))
    }
}

/// Request structure for the packing endpoints.
///
/// `weight_cutoff` and `buffer_percentage` fall back to the server defaults
/// when omitted.
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
#[schema(
    example = json!({
        "container": { "length": 30.0, "width": 25.0, "height": 20.0 },
        "items": [
            { "length": 10.0, "width": 5.0, "height": 2.0, "weight": 1.5 },
            { "length": 15.0, "width": 10.0, "height": 5.0, "weight": 3.0 }
        ],
        "weight_cutoff": 100.0,
        "buffer_percentage": 90.0
    })
)]
pub struct PackRequest {
    pub container: ContainerRequest,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub weight_cutoff: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub buffer_percentage: Option<f64>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    container: ContainerSpec,
    items: Vec<Item>,
    limits: PackingLimits,
}

#[derive(Debug)]
enum PackRequestValidationError {
    InvalidContainer(ValidationError),
    InvalidItem(ValidationError),
    InvalidLimits(ValidationError),
}

impl PackRequest {
    fn into_validated(
        self,
        config: &PackingConfig,
    ) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        let container = self
            .container
            .into_spec()
            .map_err(PackRequestValidationError::InvalidContainer)?;

        let items = ItemSpec::validate_all(&self.items)
            .map_err(PackRequestValidationError::InvalidItem)?;

        let limits = config
            .limits(self.weight_cutoff, self.buffer_percentage)
            .map_err(PackRequestValidationError::InvalidLimits)?;

        Ok(ValidatedPackRequest {
            container,
            items,
            limits,
        })
    }
}

/// Response structure of a packing run.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PackResponse {
    pub placements: Vec<PlacedItem>,
    pub total_volume: f64,
    pub total_weight: f64,
    pub container_volume: f64,
    pub max_fillable_volume: f64,
    pub utilization_percent: f64,
    pub placed_count: usize,
    pub item_count: usize,
    pub is_complete: bool,
    /// `weight_cutoff` or `volume_cap` when a cap ended the run early
    #[schema(nullable = true)]
    pub stop_reason: Option<String>,
}

impl PackResponse {
    /// Creates a PackResponse from a PackingOutcome.
    pub fn from_outcome(outcome: PackingOutcome) -> Self {
        let utilization_percent = outcome.utilization_percent();
        let placed_count = outcome.placed_count();
        let is_complete = outcome.is_complete();
        let PackingOutcome {
            placements,
            total_volume,
            total_weight,
            container_volume,
            max_fillable_volume,
            item_count,
            stop_reason,
        } = outcome;

        Self {
            placements,
            total_volume,
            total_weight,
            container_volume,
            max_fillable_volume,
            utilization_percent,
            placed_count,
            item_count,
            is_complete,
            stop_reason: stop_reason.map(|reason| reason.code().to_string()),
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    config: &PackingConfig,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = payload.map_err(|err| {
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid JSON data",
            err.to_string(),
        )
    })?;

    payload.into_validated(config).map_err(|err| {
        warn!("Rejected pack request: {:?}", err);
        let (error, details) = match err {
            PackRequestValidationError::InvalidContainer(err) => {
                ("Invalid container configuration", err.to_string())
            }
            PackRequestValidationError::InvalidItem(err) => ("Invalid input data", err.to_string()),
            PackRequestValidationError::InvalidLimits(err) => {
                ("Invalid packing limits", err.to_string())
            }
        };
        error_response(StatusCode::UNPROCESSABLE_ENTITY, error, details)
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream),
    components(
        schemas(
            PackRequest,
            ContainerRequest,
            ItemSpec,
            PackResponse,
            PlacedItem,
            PackEvent,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Endpoints for single-container packing"))
)]
struct ApiDoc;

/// Builds the router with all endpoints.
fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        // API endpoints
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Viewer (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /pack");
    println!("   - POST /pack_stream");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");
    println!("🌐 Viewer: http://{}:{}", display_host, config.port());

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Packs the given items into one container and returns all placements.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing finished", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, container or limits",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let packing_config = state.optimizer_config.packing_config();
    let request = match parse_pack_request(payload, &packing_config) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "New pack request: {} items, container {:?}",
        request.items.len(),
        (
            request.container.length(),
            request.container.width(),
            request.container.height()
        )
    );

    let ValidatedPackRequest {
        container,
        items,
        limits,
    } = request;
    let outcome = match tokio::task::spawn_blocking(move || {
        pack_items_with_config(&container, &items, limits, packing_config)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing task failed",
                err.to_string(),
            );
        }
    };

    (StatusCode::OK, Json(PackResponse::from_outcome(outcome))).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events in real-time as Server-Sent Events (text/event-stream).
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams PackEvent JSON objects in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, container or limits",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let packing_config = state.optimizer_config.packing_config();
    let ValidatedPackRequest {
        container,
        items,
        limits,
    } = match parse_pack_request(payload, &packing_config) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        pack_items_with_progress(&container, &items, limits, packing_config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(json);
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Serves the index.html viewer page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
