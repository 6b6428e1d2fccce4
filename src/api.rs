//! REST API for the planning service.
//!
//! Every planning call runs on the blocking pool; collision endpoints build a
//! fresh resolver per request from the configured defaults.

use std::collections::HashMap;
use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use crate::analyzer::{self, RoomAnalysisResult};
use crate::capacity::{self, CapacityReportItem, CapacityRequest};
use crate::collision::{CollisionConfigUpdate, CollisionReport, CollisionResolution, CollisionResolver};
use crate::config::{ApiConfig, PlannerConfig};
use crate::error::{PlannerError, PlannerResult};
use crate::layout::{GeneratedLayout, LayoutGenerationResult, LayoutGenerator, LayoutRequest};
use crate::model::{FloorPolygon, RoomInput, Scene, SceneObject};
use crate::optimizer::{self, OptimizationOverrides, OptimizationResult, Strategy};
use crate::templates::{self, LayoutTemplate};
use crate::types::{Vec2, Vec3};

#[derive(Clone, Default)]
struct ApiState {
    planner: PlannerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>space-planner API Docs</title>
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
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "room_id": "office-1",
        "room": {
            "floor": [{"x": 0.0, "z": 0.0}, {"x": 5.0, "z": 0.0}, {"x": 5.0, "z": 4.0}, {"x": 0.0, "z": 4.0}],
            "openings": [{"kind": "door", "position": {"x": 2.5, "z": 0.0}, "width": 0.9}]
        },
        "objects": []
    })
)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub room_id: String,
    pub room: RoomInput,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

/// Room and objects that passed validation.
#[derive(Debug)]
struct ValidatedRoom {
    room_id: String,
    room: RoomInput,
    objects: Vec<SceneObject>,
}

fn validate_room(room_id: String, room: RoomInput, objects: Vec<SceneObject>) -> PlannerResult<ValidatedRoom> {
    room.floor_polygon()?;
    for object in &objects {
        object.validate()?;
    }
    Ok(ValidatedRoom {
        room_id,
        room,
        objects,
    })
}

impl AnalyzeRequest {
    fn into_validated(self) -> PlannerResult<ValidatedRoom> {
        validate_room(self.room_id, self.room, self.objects)
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "floor": [{"x": 0.0, "z": 0.0}, {"x": 6.0, "z": 0.0}, {"x": 6.0, "z": 5.0}, {"x": 0.0, "z": 5.0}],
        "object_type": "desk",
        "strategy": "comfort"
    })
)]
pub struct OptimizeRequest {
    pub floor: Vec<Vec2>,
    pub object_type: String,
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub overrides: Option<OptimizationOverrides>,
}

#[derive(Debug)]
struct ValidatedOptimizeRequest {
    floor: FloorPolygon,
    object_type: String,
    strategy: Option<Strategy>,
    overrides: Option<OptimizationOverrides>,
}

impl OptimizeRequest {
    fn into_validated(self) -> PlannerResult<ValidatedOptimizeRequest> {
        let object_type = self.object_type.trim().to_string();
        if object_type.is_empty() {
            return Err(PlannerError::InvalidInput("object_type must not be empty".to_string()));
        }
        Ok(ValidatedOptimizeRequest {
            floor: FloorPolygon::new(self.floor)?,
            object_type,
            strategy: self.strategy,
            overrides: self.overrides,
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LayoutsRequest {
    #[serde(default)]
    pub room_id: String,
    pub room: RoomInput,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub object_types: Vec<String>,
    /// Empty means the configured default strategy.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub overrides: Option<OptimizationOverrides>,
}

impl LayoutsRequest {
    fn into_validated(self) -> PlannerResult<(ValidatedRoom, LayoutRequest)> {
        let request = LayoutRequest {
            room_id: self.room_id.clone(),
            template_id: self.template_id,
            object_types: self.object_types,
            strategies: self.strategies,
            overrides: self.overrides,
        };
        Ok((validate_room(self.room_id, self.room, self.objects)?, request))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct TemplateLayoutRequest {
    #[serde(default)]
    pub room_id: String,
    pub room: RoomInput,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    pub template_id: String,
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<Strategy>,
}

impl TemplateLayoutRequest {
    fn into_validated(self) -> PlannerResult<(ValidatedRoom, String, Option<Strategy>)> {
        Ok((
            validate_room(self.room_id, self.room, self.objects)?,
            self.template_id,
            self.strategy,
        ))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct DetectRequest {
    pub objects: Vec<SceneObject>,
    pub object_id: String,
    #[serde(default)]
    #[schema(nullable = true)]
    pub test_position: Option<Vec3>,
    #[serde(default)]
    pub exclude_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveRequest {
    pub objects: Vec<SceneObject>,
    pub object_id: String,
    #[serde(default)]
    pub exclude_ids: Vec<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub config: Option<CollisionConfigUpdate>,
}

fn build_scene(objects: Vec<SceneObject>) -> PlannerResult<Scene> {
    for object in &objects {
        object.validate()?;
    }
    Ok(Scene::from_objects(objects))
}

#[derive(Deserialize, ToSchema)]
pub struct NamedRoom {
    pub room_id: String,
    pub floor: Vec<Vec2>,
}

#[derive(Deserialize, ToSchema)]
pub struct CapacityRequestBody {
    pub rooms: Vec<NamedRoom>,
    pub requests: Vec<CapacityRequest>,
}

impl CapacityRequestBody {
    fn into_validated(self) -> PlannerResult<(HashMap<String, FloorPolygon>, Vec<CapacityRequest>)> {
        let mut rooms = HashMap::with_capacity(self.rooms.len());
        for room in self.rooms {
            if rooms.contains_key(&room.room_id) {
                return Err(PlannerError::InvalidInput(format!(
                    "room '{}' is listed more than once",
                    room.room_id
                )));
            }
            let floor = FloorPolygon::new(room.floor)?;
            rooms.insert(room.room_id, floor);
        }
        Ok((rooms, self.requests))
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
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

fn error_response(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid JSON data", err.to_string())
}

fn planner_error(err: PlannerError) -> Response {
    let status = match err {
        PlannerError::UnknownTemplate(_) => StatusCode::NOT_FOUND,
        PlannerError::InvalidInput(_) | PlannerError::NotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.code(), err.to_string())
}

fn parse_request<T, V>(
    payload: Result<Json<T>, JsonRejection>,
    validate: impl FnOnce(T) -> PlannerResult<V>,
) -> Result<V, Response> {
    let Json(payload) = payload.map_err(json_deserialize_error)?;
    validate(payload).map_err(planner_error)
}

/// Runs a planning call on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T, Response>
where
    F: FnOnce() -> PlannerResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(planner_error),
        Err(err) => {
            error!(error = %err, "Planning task failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Planning task failed",
                err.to_string(),
            ))
        }
    }
}

fn ok_json<T: Serialize>(result: Result<T, Response>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(response) => response,
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_analyze,
        handle_optimize,
        handle_layouts,
        handle_template_layout,
        handle_detect,
        handle_resolve,
        handle_capacity,
        handle_templates
    ),
    components(
        schemas(
            AnalyzeRequest,
            OptimizeRequest,
            LayoutsRequest,
            TemplateLayoutRequest,
            DetectRequest,
            ResolveRequest,
            CapacityRequestBody,
            NamedRoom,
            ErrorResponse,
            RoomAnalysisResult,
            OptimizationResult,
            LayoutGenerationResult,
            GeneratedLayout,
            CollisionReport,
            CollisionResolution,
            CapacityReportItem,
            LayoutTemplate
        )
    ),
    tags(
        (name = "planning", description = "Room analysis, optimization and layout generation"),
        (name = "collisions", description = "Interactive collision detection and resolution")
    )
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(handle_analyze))
        .route("/optimize", post(handle_optimize))
        .route("/layouts", post(handle_layouts))
        .route("/layouts/template", post(handle_template_layout))
        .route("/collisions/detect", post(handle_detect))
        .route("/collisions/resolve", post(handle_resolve))
        .route("/capacity", post(handle_capacity))
        .route("/templates", get(handle_templates))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Binds the configured address and serves until the server stops.
///
/// # Errors
/// Returns the I/O error when binding or serving fails.
pub async fn start_api_server(config: ApiConfig, planner: PlannerConfig) -> std::io::Result<()> {
    let app = router(ApiState { planner });

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        host = config.display_host(),
        port = config.port(),
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Documentation at /docs and /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /analyze.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Room analysis", body = RoomAnalysisResult),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid room or objects", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_analyze(
    State(_state): State<ApiState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_request(payload, AnalyzeRequest::into_validated) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(room_id = %request.room_id, objects = request.objects.len(), "New analyze request");
    ok_json(
        run_blocking(move || analyzer::analyze_room(&request.room, &request.objects, &request.room_id)).await,
    )
}

/// Handler for POST /optimize.
///
/// Unset strategy and grid resolution fall back to the server configuration.
#[utoipa::path(
    post,
    path = "/optimize",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Placements for one object type", body = OptimizationResult),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid floor or type", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_request(payload, OptimizeRequest::into_validated) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let strategy = request.strategy.unwrap_or(state.planner.default_strategy());
    let overrides = state.planner.overrides_for(request.overrides);
    info!(object_type = %request.object_type, strategy = %strategy, "New optimize request");

    ok_json(
        run_blocking(move || {
            Ok(optimizer::optimize_space(
                &request.floor,
                &request.object_type,
                strategy,
                overrides.as_ref(),
            ))
        })
        .await,
    )
}

/// Handler for POST /layouts.
#[utoipa::path(
    post,
    path = "/layouts",
    request_body = LayoutsRequest,
    responses(
        (status = 200, description = "Ranked layouts", body = LayoutGenerationResult),
        (status = NOT_FOUND, description = "Unknown template", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid room or objects", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_layouts(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutsRequest>, JsonRejection>,
) -> Response {
    let (room, mut request) = match parse_request(payload, LayoutsRequest::into_validated) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    if request.strategies.is_empty() {
        request.strategies.push(state.planner.default_strategy());
    }
    request.overrides = state.planner.overrides_for(request.overrides.take());
    info!(
        room_id = %room.room_id,
        template_id = ?request.template_id,
        strategies = request.strategies.len(),
        "New layouts request"
    );

    ok_json(
        run_blocking(move || LayoutGenerator::default().generate_layouts(&room.room, &room.objects, &request))
            .await,
    )
}

/// Handler for POST /layouts/template.
///
/// Answers `null` when the room is smaller than the template minimum.
#[utoipa::path(
    post,
    path = "/layouts/template",
    request_body = TemplateLayoutRequest,
    responses(
        (status = 200, description = "Template layout, or null for an undersized room", body = GeneratedLayout),
        (status = NOT_FOUND, description = "Unknown template", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid room or objects", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_template_layout(
    State(state): State<ApiState>,
    payload: Result<Json<TemplateLayoutRequest>, JsonRejection>,
) -> Response {
    let (room, template_id, strategy) = match parse_request(payload, TemplateLayoutRequest::into_validated) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let strategy = strategy.unwrap_or(state.planner.default_strategy());
    info!(room_id = %room.room_id, template_id = %template_id, "New template layout request");

    ok_json(
        run_blocking(move || {
            LayoutGenerator::default().generate_from_template(
                &room.room,
                &room.objects,
                &room.room_id,
                &template_id,
                Some(strategy),
            )
        })
        .await,
    )
}

/// Handler for POST /collisions/detect.
#[utoipa::path(
    post,
    path = "/collisions/detect",
    request_body = DetectRequest,
    responses(
        (status = 200, description = "Collision report", body = CollisionReport),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid scene objects", body = ErrorResponse)
    ),
    tag = "collisions"
)]
async fn handle_detect(
    State(state): State<ApiState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let config = state.planner.collision_config();
    ok_json(
        run_blocking(move || {
            let scene = build_scene(request.objects)?;
            let mut resolver = CollisionResolver::new(config);
            Ok(resolver.detect_collisions(
                &scene,
                &request.object_id,
                request.test_position,
                &request.exclude_ids,
            ))
        })
        .await,
    )
}

/// Handler for POST /collisions/resolve.
#[utoipa::path(
    post,
    path = "/collisions/resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Nearest free position, or resolved=false", body = CollisionResolution),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid scene objects", body = ErrorResponse)
    ),
    tag = "collisions"
)]
async fn handle_resolve(
    State(state): State<ApiState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let config = state.planner.collision_config();
    ok_json(
        run_blocking(move || {
            let scene = build_scene(request.objects)?;
            let mut resolver = CollisionResolver::new(config);
            Ok(resolver.resolve_collisions(
                &scene,
                &request.object_id,
                &request.exclude_ids,
                request.config.as_ref(),
            ))
        })
        .await,
    )
}

/// Handler for POST /capacity.
#[utoipa::path(
    post,
    path = "/capacity",
    request_body = CapacityRequestBody,
    responses(
        (status = 200, description = "One item per request; unknown rooms fail per item", body = [CapacityReportItem]),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid room floors", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_capacity(
    State(_state): State<ApiState>,
    payload: Result<Json<CapacityRequestBody>, JsonRejection>,
) -> Response {
    let (rooms, requests) = match parse_request(payload, CapacityRequestBody::into_validated) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    info!(rooms = rooms.len(), requests = requests.len(), "New capacity request");
    ok_json(run_blocking(move || Ok(capacity::capacity_report(&rooms, &requests))).await)
}

/// Handler for GET /templates.
#[utoipa::path(
    get,
    path = "/templates",
    responses((status = 200, description = "Built-in layout templates", body = [LayoutTemplate])),
    tag = "planning"
)]
async fn handle_templates() -> Response {
    (StatusCode::OK, Json(templates::builtin_templates())).into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle(w: f64, d: f64) -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(w, 0.0),
            Vec2::new(w, d),
            Vec2::new(0.0, d),
        ]
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in [
            "/analyze",
            "/optimize",
            "/layouts",
            "/layouts/template",
            "/collisions/detect",
            "/collisions/resolve",
            "/capacity",
            "/templates",
        ] {
            assert!(paths.contains_key(path), "OpenAPI documentation is missing {path}");
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        for name in ["AnalyzeRequest", "LayoutGenerationResult", "CollisionResolution", "ErrorResponse"] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from the OpenAPI document",
                name
            );
        }
    }

    #[test]
    fn analyze_request_defaults_optional_fields() {
        let json = r#"{
            "room": {"floor": [{"x": 0.0, "z": 0.0}, {"x": 4.0, "z": 0.0}, {"x": 4.0, "z": 3.0}]}
        }"#;
        let request: AnalyzeRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert!(request.room_id.is_empty());
        assert!(request.objects.is_empty());
        assert!(request.room.openings.is_empty());
    }

    #[test]
    fn optimize_request_rejects_blank_type_and_bad_floor() {
        let blank = OptimizeRequest {
            floor: rectangle(4.0, 4.0),
            object_type: "  ".to_string(),
            strategy: None,
            overrides: None,
        };
        assert!(matches!(blank.into_validated(), Err(PlannerError::InvalidInput(_))));

        let line = OptimizeRequest {
            floor: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)],
            object_type: "desk".to_string(),
            strategy: Some(Strategy::Comfort),
            overrides: None,
        };
        assert!(matches!(line.into_validated(), Err(PlannerError::InvalidInput(_))));
    }

    #[test]
    fn capacity_body_rejects_duplicate_rooms() {
        let body = CapacityRequestBody {
            rooms: vec![
                NamedRoom {
                    room_id: "a".to_string(),
                    floor: rectangle(3.0, 3.0),
                },
                NamedRoom {
                    room_id: "a".to_string(),
                    floor: rectangle(4.0, 4.0),
                },
            ],
            requests: Vec::new(),
        };
        assert!(body.into_validated().is_err());
    }

    #[test]
    fn error_statuses_follow_error_kind() {
        let response = planner_error(PlannerError::UnknownTemplate("x".to_string()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = planner_error(PlannerError::InvalidInput("x".to_string()));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn degenerate_floor_answers_422() {
        let request = AnalyzeRequest {
            room_id: "bad".to_string(),
            room: RoomInput::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]),
            objects: Vec::new(),
        };
        let response = handle_analyze(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn optimize_returns_layouts() {
        let request = OptimizeRequest {
            floor: rectangle(6.0, 5.0),
            object_type: "chair".to_string(),
            strategy: None,
            overrides: None,
        };
        let response = handle_optimize(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["max_objects"].as_u64().unwrap() > 0);
        assert_eq!(body["strategy"], "maximize");
    }

    #[tokio::test]
    async fn template_endpoint_handles_unknown_and_small_rooms() {
        let unknown = TemplateLayoutRequest {
            room_id: "r".to_string(),
            room: RoomInput::new(rectangle(5.0, 5.0)),
            objects: Vec::new(),
            template_id: "ballroom".to_string(),
            strategy: None,
        };
        let response = handle_template_layout(State(ApiState::default()), Ok(Json(unknown))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let small = TemplateLayoutRequest {
            room_id: "r".to_string(),
            room: RoomInput::new(rectangle(3.0, 3.0)),
            objects: Vec::new(),
            template_id: "conference_room".to_string(),
            strategy: None,
        };
        let response = handle_template_layout(State(ApiState::default()), Ok(Json(small))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.is_null());
    }

    #[tokio::test]
    async fn resolve_moves_overlapping_object() {
        let request = ResolveRequest {
            objects: vec![
                SceneObject::new("a", "box", Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
                SceneObject::new("b", "box", Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            ],
            object_id: "b".to_string(),
            exclude_ids: Vec::new(),
            config: None,
        };
        let response = handle_resolve(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["resolved"], true);
        assert!(body["distance_moved"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn capacity_reports_unknown_room_per_item() {
        let body = CapacityRequestBody {
            rooms: vec![NamedRoom {
                room_id: "office".to_string(),
                floor: rectangle(5.0, 4.0),
            }],
            requests: vec![
                CapacityRequest {
                    room_id: "office".to_string(),
                    object_type: "desk".to_string(),
                    strategy: None,
                },
                CapacityRequest {
                    room_id: "attic".to_string(),
                    object_type: "desk".to_string(),
                    strategy: None,
                },
            ],
        };
        let response = handle_capacity(State(ApiState::default()), Ok(Json(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let items = body_json(response).await;
        assert_eq!(items[0]["outcome"]["status"], "completed");
        assert_eq!(items[1]["outcome"]["status"], "failed");
    }
}
