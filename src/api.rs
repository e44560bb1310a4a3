//! REST API of the configurator.
//!
//! Exposes the registry operations, occupancy, calculations and validation
//! over HTTP, plus a Server-Sent Events stream of configurator events.
//! Uses Axum as the web framework and supports CORS.

use std::convert::Infallible;
use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::Mutex;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::cabinet::{CabinetCategory, MountType};
use crate::config::ApiConfig;
use crate::equipment::{EquipmentSummary, Placement};
use crate::error::ConfiguratorError;
use crate::events::{ConfiguratorEvent, EventBus};
use crate::logic::{CalculationResult, Recommendation};
use crate::mounting::MountRequest;
use crate::occupancy::{OccupancyStats, OccupiedInterval};
use crate::registry::{AddEquipment, CabinetSummary, Configurator, SurfaceSummary};
use crate::validation::{Issue, Severity, ValidationResult};

#[derive(Clone)]
struct ApiState {
    configurator: Arc<Mutex<Configurator>>,
    events: EventBus,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>Cabinet Configurator API Docs</title>
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
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Catalog ids available for cabinets and equipment.
#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    pub cabinets: Vec<String>,
    pub equipment: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "type_id": "ts_700_500_250" }))]
pub struct AddCabinetRequest {
    pub type_id: String,
}

/// Request to add equipment. Lengths are in metres.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "catalog_id": "circuit_breaker_1p",
        "surface_index": 0,
        "offset_m": 0.1
    })
)]
pub struct AddEquipmentRequest {
    pub catalog_id: String,
    #[serde(default)]
    #[schema(nullable = true)]
    pub cabinet_id: Option<String>,
    #[serde(default)]
    pub surface_index: usize,
    /// Start offset along the surface. Omit for first-fit placement.
    #[serde(default)]
    #[schema(nullable = true)]
    pub offset_m: Option<f64>,
    #[serde(default)]
    pub cross_offset_m: f64,
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "surface_index": 0, "offset_m": 0.2 }))]
pub struct MoveEquipmentRequest {
    #[serde(default)]
    pub surface_index: usize,
    #[serde(default)]
    #[schema(nullable = true)]
    pub offset_m: Option<f64>,
    #[serde(default)]
    pub cross_offset_m: f64,
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "catalog_id": "power_supply_240w" }))]
pub struct ValidateRequest {
    pub catalog_id: String,
}

#[derive(Debug, PartialEq)]
enum RequestValidationError {
    EmptyId(&'static str),
    InvalidLength(&'static str, f64),
}

impl std::fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestValidationError::EmptyId(field) => write!(f, "'{field}' must not be empty"),
            RequestValidationError::InvalidLength(field, value) => {
                write!(f, "'{field}' must be a finite, non-negative length, got {value}")
            }
        }
    }
}

fn validate_length(field: &'static str, value: f64) -> Result<f64, RequestValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RequestValidationError::InvalidLength(field, value))
    }
}

fn mount_request(
    surface_index: usize,
    offset_m: Option<f64>,
    cross_offset_m: f64,
) -> Result<MountRequest, RequestValidationError> {
    Ok(MountRequest {
        surface_index,
        offset: offset_m
            .map(|offset| validate_length("offset_m", offset))
            .transpose()?,
        cross_offset: validate_length("cross_offset_m", cross_offset_m)?,
    })
}

impl AddEquipmentRequest {
    fn into_command(self) -> Result<AddEquipment, RequestValidationError> {
        let catalog_id = self.catalog_id.trim();
        if catalog_id.is_empty() {
            return Err(RequestValidationError::EmptyId("catalog_id"));
        }
        Ok(AddEquipment {
            catalog_id: catalog_id.to_string(),
            cabinet_id: self.cabinet_id.filter(|id| !id.trim().is_empty()),
            mount: mount_request(self.surface_index, self.offset_m, self.cross_offset_m)?,
        })
    }
}

impl MoveEquipmentRequest {
    fn into_command(self) -> Result<MountRequest, RequestValidationError> {
        mount_request(self.surface_index, self.offset_m, self.cross_offset_m)
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

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn status_for(err: &ConfiguratorError) -> StatusCode {
    match err {
        ConfiguratorError::UnknownEntity { .. } | ConfiguratorError::UnknownCatalogEntry { .. } => {
            StatusCode::NOT_FOUND
        }
        ConfiguratorError::NoMountSurface { .. }
        | ConfiguratorError::SurfaceOverflow { .. }
        | ConfiguratorError::UnsupportedMountType { .. } => StatusCode::CONFLICT,
        ConfiguratorError::InvalidDefinition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ConfiguratorError::AssetLoadFailure { .. } => StatusCode::BAD_GATEWAY,
        ConfiguratorError::RuleExecutionFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn configurator_error(err: ConfiguratorError) -> Response {
    error_response(status_for(&err), err.code(), err.to_string())
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(value)| value).map_err(json_deserialize_error)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_catalog,
        handle_list_cabinets,
        handle_add_cabinet,
        handle_remove_cabinet,
        handle_activate_cabinet,
        handle_add_equipment,
        handle_remove_equipment,
        handle_move_equipment,
        handle_occupancy,
        handle_calculations,
        handle_validate,
        handle_events
    ),
    components(
        schemas(
            CatalogResponse,
            AddCabinetRequest,
            AddEquipmentRequest,
            MoveEquipmentRequest,
            ValidateRequest,
            CabinetSummary,
            SurfaceSummary,
            EquipmentSummary,
            Placement,
            OccupancyStats,
            OccupiedInterval,
            CalculationResult,
            Recommendation,
            ValidationResult,
            Issue,
            Severity,
            MountType,
            CabinetCategory,
            ConfiguratorEvent,
            ErrorResponse
        )
    ),
    tags(
        (name = "cabinets", description = "Cabinet instances and their analysis"),
        (name = "equipment", description = "Equipment placement"),
        (name = "events", description = "Configurator event stream")
    )
)]
struct ApiDoc;

/// Builds the router around a configurator.
pub fn router(configurator: Configurator) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        events: configurator.events().clone(),
        configurator: Arc::new(Mutex::new(configurator)),
    };

    Router::new()
        .route("/catalog", get(handle_catalog))
        .route("/cabinets", get(handle_list_cabinets).post(handle_add_cabinet))
        .route("/cabinets/{id}", delete(handle_remove_cabinet))
        .route("/cabinets/{id}/activate", post(handle_activate_cabinet))
        .route(
            "/cabinets/{id}/occupancy/{mount_type}/{surface}",
            get(handle_occupancy),
        )
        .route("/cabinets/{id}/calculations", get(handle_calculations))
        .route("/cabinets/{id}/validate", post(handle_validate))
        .route("/equipment", post(handle_add_equipment))
        .route("/equipment/{id}", delete(handle_remove_equipment))
        .route("/equipment/{id}/move", post(handle_move_equipment))
        .route("/events", get(handle_events))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Binds the listener and serves until the server terminates.
pub async fn start_api_server(config: ApiConfig, configurator: Configurator) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        "server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        tracing::info!("local access: http://localhost:{}", config.port());
    }
    tracing::info!("documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, router(configurator)).await
}

/// Lists the catalog ids.
#[utoipa::path(
    get,
    path = "/catalog",
    responses((status = 200, description = "Catalog ids", body = CatalogResponse)),
    tag = "cabinets"
)]
async fn handle_catalog(State(state): State<ApiState>) -> Response {
    let configurator = state.configurator.lock().await;
    let catalog = configurator.catalog();
    Json(CatalogResponse {
        cabinets: catalog.cabinet_ids(),
        equipment: catalog.equipment_ids(),
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/cabinets",
    responses((status = 200, description = "Cabinet instances", body = [CabinetSummary])),
    tag = "cabinets"
)]
async fn handle_list_cabinets(State(state): State<ApiState>) -> Response {
    let configurator = state.configurator.lock().await;
    Json(configurator.list_cabinets()).into_response()
}

/// Instantiates a catalog cabinet type and makes it active.
#[utoipa::path(
    post,
    path = "/cabinets",
    request_body = AddCabinetRequest,
    responses(
        (status = 201, description = "Cabinet added", body = CabinetSummary),
        (status = NOT_FOUND, description = "Unknown cabinet type", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = BAD_GATEWAY, description = "Cabinet asset failed to load", body = ErrorResponse)
    ),
    tag = "cabinets"
)]
async fn handle_add_cabinet(
    State(state): State<ApiState>,
    payload: Result<Json<AddCabinetRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let type_id = request.type_id.trim();
    if type_id.is_empty() {
        return validation_error(RequestValidationError::EmptyId("type_id").to_string());
    }

    let mut configurator = state.configurator.lock().await;
    let id = match configurator.add_cabinet(type_id).await {
        Ok(id) => id,
        Err(err) => return configurator_error(err),
    };
    match configurator.cabinets().get(&id) {
        Some(cabinet) => (StatusCode::CREATED, Json(cabinet.summary())).into_response(),
        None => configurator_error(ConfiguratorError::unknown_cabinet(id)),
    }
}

/// Removes a cabinet and all of its equipment.
#[utoipa::path(
    delete,
    path = "/cabinets/{id}",
    params(("id" = String, Path, description = "Cabinet instance id")),
    responses(
        (status = 204, description = "Cabinet removed"),
        (status = NOT_FOUND, description = "Unknown cabinet", body = ErrorResponse)
    ),
    tag = "cabinets"
)]
async fn handle_remove_cabinet(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let mut configurator = state.configurator.lock().await;
    if configurator.remove_cabinet(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        configurator_error(ConfiguratorError::unknown_cabinet(id))
    }
}

#[utoipa::path(
    post,
    path = "/cabinets/{id}/activate",
    params(("id" = String, Path, description = "Cabinet instance id")),
    responses(
        (status = 204, description = "Cabinet is now active"),
        (status = NOT_FOUND, description = "Unknown cabinet", body = ErrorResponse)
    ),
    tag = "cabinets"
)]
async fn handle_activate_cabinet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Response {
    let mut configurator = state.configurator.lock().await;
    match configurator.set_active(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => configurator_error(err),
    }
}

/// Loads and places equipment. A failed placement leaves no state behind.
#[utoipa::path(
    post,
    path = "/equipment",
    request_body = AddEquipmentRequest,
    responses(
        (status = 201, description = "Equipment placed", body = EquipmentSummary),
        (status = NOT_FOUND, description = "Unknown cabinet or catalog entry", body = ErrorResponse),
        (status = CONFLICT, description = "No surface or no free slot", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = BAD_GATEWAY, description = "Equipment asset failed to load", body = ErrorResponse)
    ),
    tag = "equipment"
)]
async fn handle_add_equipment(
    State(state): State<ApiState>,
    payload: Result<Json<AddEquipmentRequest>, JsonRejection>,
) -> Response {
    let command = match parse_json(payload).and_then(|request| {
        request
            .into_command()
            .map_err(|err| validation_error(err.to_string()))
    }) {
        Ok(command) => command,
        Err(response) => return response,
    };

    let mut configurator = state.configurator.lock().await;
    match configurator.add_equipment(command).await {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(err) => configurator_error(err),
    }
}

#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    params(("id" = String, Path, description = "Equipment instance id")),
    responses(
        (status = 204, description = "Equipment removed"),
        (status = NOT_FOUND, description = "Unknown equipment", body = ErrorResponse)
    ),
    tag = "equipment"
)]
async fn handle_remove_equipment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Response {
    let mut configurator = state.configurator.lock().await;
    if configurator.remove_equipment(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        configurator_error(ConfiguratorError::unknown_equipment(id))
    }
}

/// Moves equipment. The target slot is checked before anything changes.
#[utoipa::path(
    post,
    path = "/equipment/{id}/move",
    params(("id" = String, Path, description = "Equipment instance id")),
    request_body = MoveEquipmentRequest,
    responses(
        (status = 200, description = "New placement", body = Placement),
        (status = NOT_FOUND, description = "Unknown equipment", body = ErrorResponse),
        (status = CONFLICT, description = "Target slot is not free", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "equipment"
)]
async fn handle_move_equipment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<MoveEquipmentRequest>, JsonRejection>,
) -> Response {
    let target = match parse_json(payload).and_then(|request| {
        request
            .into_command()
            .map_err(|err| validation_error(err.to_string()))
    }) {
        Ok(target) => target,
        Err(response) => return response,
    };

    let mut configurator = state.configurator.lock().await;
    match configurator.move_equipment(&id, target) {
        Ok(placement) => Json(placement).into_response(),
        Err(err) => configurator_error(err),
    }
}

#[utoipa::path(
    get,
    path = "/cabinets/{id}/occupancy/{mount_type}/{surface}",
    params(
        ("id" = String, Path, description = "Cabinet instance id"),
        ("mount_type" = String, Path, description = "din_rail, rack_unit or mounting_plate"),
        ("surface" = usize, Path, description = "Surface index")
    ),
    responses(
        (status = 200, description = "Surface occupancy", body = OccupancyStats),
        (status = NOT_FOUND, description = "Unknown cabinet", body = ErrorResponse),
        (status = CONFLICT, description = "No such surface", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Unknown mount type", body = ErrorResponse)
    ),
    tag = "cabinets"
)]
async fn handle_occupancy(
    State(state): State<ApiState>,
    Path((id, mount_type, surface)): Path<(String, String, usize)>,
) -> Response {
    let mount_type = match mount_type.parse::<MountType>() {
        Ok(mount_type) => mount_type,
        Err(err) => return validation_error(err.to_string()),
    };
    let configurator = state.configurator.lock().await;
    match configurator.occupancy(&id, mount_type, surface) {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => configurator_error(err),
    }
}

#[utoipa::path(
    get,
    path = "/cabinets/{id}/calculations",
    params(("id" = String, Path, description = "Cabinet instance id")),
    responses(
        (status = 200, description = "Category calculations", body = CalculationResult),
        (status = NOT_FOUND, description = "Unknown cabinet", body = ErrorResponse)
    ),
    tag = "cabinets"
)]
async fn handle_calculations(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let configurator = state.configurator.lock().await;
    match configurator.calculate(&id) {
        Ok(result) => Json(result).into_response(),
        Err(err) => configurator_error(err),
    }
}

/// Validates adding a catalog equipment type to a cabinet.
#[utoipa::path(
    post,
    path = "/cabinets/{id}/validate",
    params(("id" = String, Path, description = "Cabinet instance id")),
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Validation result", body = ValidationResult),
        (status = NOT_FOUND, description = "Unknown cabinet or catalog entry", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "cabinets"
)]
async fn handle_validate(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let configurator = state.configurator.lock().await;
    match configurator.validate(&id, request.catalog_id.trim()) {
        Ok(result) => Json(result).into_response(),
        Err(err) => configurator_error(err),
    }
}

/// Streams configurator events as Server-Sent Events (text/event-stream).
#[utoipa::path(
    get,
    path = "/events",
    responses(
        (
            status = 200,
            description = "Streams configurator events in real-time",
            content_type = "text/event-stream",
            body = String
        )
    ),
    tag = "events"
)]
async fn handle_events(State(state): State<ApiState>) -> Response {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|message| {
        match message {
            Ok(event) => serde_json::to_string(&event)
                .ok()
                .map(|json| Ok::<_, Infallible>(Event::default().event(event.kind()).data(json))),
            Err(err) => {
                tracing::warn!(error = %err, "event subscriber lagged, events skipped");
                None
            }
        }
    });

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in [
            "/catalog",
            "/cabinets",
            "/cabinets/{id}",
            "/cabinets/{id}/occupancy/{mount_type}/{surface}",
            "/equipment",
            "/equipment/{id}/move",
            "/events",
        ] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {path} path"
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "AddEquipmentRequest",
            "Placement",
            "ValidationResult",
            "CalculationResult",
            "ErrorResponse",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI document",
                name
            );
        }
    }

    #[test]
    fn add_equipment_request_defaults_to_first_fit() {
        let json = r#"{ "catalog_id": "circuit_breaker_1p" }"#;
        let request: AddEquipmentRequest = serde_json::from_str(json).expect("Should parse");
        let command = request.into_command().expect("Should validate");
        assert_eq!(command.catalog_id, "circuit_breaker_1p");
        assert_eq!(command.cabinet_id, None);
        assert_eq!(command.mount, MountRequest::auto(0));
    }

    #[test]
    fn add_equipment_request_rejects_negative_offset() {
        let request = AddEquipmentRequest {
            catalog_id: "rcd_2p".to_string(),
            cabinet_id: Some("  ".to_string()),
            surface_index: 1,
            offset_m: Some(-0.01),
            cross_offset_m: 0.0,
        };
        assert_eq!(
            request.into_command(),
            Err(RequestValidationError::InvalidLength("offset_m", -0.01))
        );
    }

    #[test]
    fn add_equipment_request_rejects_blank_catalog_id() {
        let request = AddEquipmentRequest {
            catalog_id: " ".to_string(),
            cabinet_id: None,
            surface_index: 0,
            offset_m: None,
            cross_offset_m: 0.0,
        };
        assert_eq!(
            request.into_command(),
            Err(RequestValidationError::EmptyId("catalog_id"))
        );
    }

    #[test]
    fn move_request_keeps_explicit_offset() {
        let request: MoveEquipmentRequest =
            serde_json::from_str(r#"{ "surface_index": 2, "offset_m": 0.25 }"#).expect("Should parse");
        assert_eq!(request.into_command(), Ok(MountRequest::at(2, 0.25)));
    }

    #[test]
    fn errors_map_to_http_status() {
        assert_eq!(
            status_for(&ConfiguratorError::unknown_equipment("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ConfiguratorError::SurfaceOverflow {
                surface: 0,
                required_m: 0.1,
                available_m: 0.05
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ConfiguratorError::NoMountSurface {
                mount_type: MountType::DinRail
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ConfiguratorError::AssetLoadFailure {
                asset: "a.glb".into(),
                reason: "timeout".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&ConfiguratorError::InvalidDefinition("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
