use crate::ai::pipeline::{AnalysisOutcome, ServiceStatus};
use crate::ai::IngestionPipeline;
use crate::api::websocket;
use crate::config::ApiConfig;
use crate::db::models::{Alarm, Camera, NewAlarm, NewCamera, Report};
use crate::db::repositories::{AlarmsRepository, CamerasRepository};
use crate::error::Error;
use crate::messaging::{AlarmNotifier, WsNotifier};
use crate::reports::{GeneratedReport, ReportService};
use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub pipeline: Arc<IngestionPipeline>,
    pub notifier: Arc<WsNotifier>,
    pub reports: Arc<ReportService>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::Validation(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AiService(_) => StatusCode::BAD_GATEWAY,
            Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            message: err.to_string(),
            status,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return err.clone().into();
        }

        ApiError {
            message: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Uniform failure envelope at the HTTP boundary
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    message: String,
}

pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(
        config: &ApiConfig,
        db_pool: Arc<PgPool>,
        pipeline: Arc<IngestionPipeline>,
        notifier: Arc<WsNotifier>,
        reports: Arc<ReportService>,
    ) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            state: AppState {
                db_pool,
                pipeline,
                notifier,
                reports,
            },
        })
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600));

        Ok(if self.config.cors_origin == "*" {
            cors.allow_origin(Any)
        } else {
            let origin = self
                .config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|_| {
                    Error::Config(format!("Invalid CORS origin: {}", self.config.cors_origin))
                })?;
            cors.allow_origin(origin)
        })
    }

    pub fn router(&self) -> Result<Router> {
        let app = Router::new()
            // Realtime channel + liveness text share the root route
            .route("/", get(websocket::root_handler))
            // Camera routes
            .route("/api/cameras", get(get_cameras).post(create_camera))
            .route(
                "/api/cameras/:id",
                get(get_camera_by_id).delete(delete_camera),
            )
            // Alarm routes
            .route("/api/alarms", get(get_alarms).post(create_alarm))
            .route("/api/alarms/:id", get(get_alarm_by_id).delete(delete_alarm))
            // AI routes
            .route("/api/ai/analyze-frame", axum::routing::post(analyze_frame))
            .route("/api/ai/status", get(ai_status))
            .route("/api/ai/health", get(ai_health))
            // Report routes
            .route("/api/reports", get(get_reports))
            .route("/api/reports/stats", get(report_stats))
            .route("/api/reports/daily", get(daily_report))
            .route("/api/reports/weekly-trend", get(weekly_trend))
            .route("/api/reports/camera/:id", get(camera_report))
            .route("/api/reports/pdf/daily", get(generate_daily_pdf))
            .route("/api/reports/pdf/weekly", get(generate_weekly_pdf))
            .route("/api/reports/download/:filename", get(download_report))
            .route(
                "/api/reports/records/:id",
                get(get_report_by_id).delete(delete_report),
            )
            // Frames arrive as multipart uploads, so the default 2MB cap is
            // far too small.
            .layer(DefaultBodyLimit::max(
                self.config.body_limit_mb * 1024 * 1024,
            ))
            .layer(self.cors_layer()?)
            .with_state(self.state.clone());

        Ok(app)
    }

    pub async fn run(&self) -> Result<()> {
        let app = self.router()?;

        let addr = format!("{}:{}", self.config.address, self.config.port);
        let addr: SocketAddr = addr.parse()?;

        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down...");
            })
            .await?;

        Ok(())
    }
}

// ---- Camera handlers ----

async fn get_cameras(State(state): State<AppState>) -> ApiResult<Json<Vec<Camera>>> {
    let repo = CamerasRepository::new(Arc::clone(&state.db_pool));
    let cameras = repo.get_all().await?;
    Ok(Json(cameras))
}

async fn get_camera_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Camera>> {
    let repo = CamerasRepository::new(Arc::clone(&state.db_pool));
    let camera = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Camera not found: {}", id)))?;

    Ok(Json(camera))
}

async fn create_camera(
    State(state): State<AppState>,
    Json(camera): Json<NewCamera>,
) -> ApiResult<(StatusCode, Json<Camera>)> {
    if camera.name.trim().is_empty() {
        return Err(Error::Validation("Camera name is required".to_string()).into());
    }

    let repo = CamerasRepository::new(Arc::clone(&state.db_pool));
    let created = repo.create(&camera).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_camera(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DeleteResponse>> {
    let repo = CamerasRepository::new(Arc::clone(&state.db_pool));
    if !repo.delete(id).await? {
        return Err(Error::NotFound(format!("Camera not found: {}", id)).into());
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Camera deleted".to_string(),
    }))
}

// ---- Alarm handlers ----

async fn get_alarms(State(state): State<AppState>) -> ApiResult<Json<Vec<Alarm>>> {
    let repo = AlarmsRepository::new(Arc::clone(&state.db_pool));
    let alarms = repo.get_all(None).await?;
    Ok(Json(alarms))
}

async fn get_alarm_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Alarm>> {
    let repo = AlarmsRepository::new(Arc::clone(&state.db_pool));
    let alarm = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Alarm not found: {}", id)))?;

    Ok(Json(alarm))
}

async fn create_alarm(
    State(state): State<AppState>,
    Json(alarm): Json<NewAlarm>,
) -> ApiResult<(StatusCode, Json<Alarm>)> {
    if alarm.alarm_type.trim().is_empty() {
        return Err(Error::Validation("Alarm type is required".to_string()).into());
    }

    // An alarm must always reference an existing camera.
    let cameras = CamerasRepository::new(Arc::clone(&state.db_pool));
    if cameras.get_by_id(alarm.camera_id).await?.is_none() {
        return Err(
            Error::Validation(format!("Unknown camera: {}", alarm.camera_id)).into(),
        );
    }

    let repo = AlarmsRepository::new(Arc::clone(&state.db_pool));
    let created = repo.create(&alarm).await?;

    // Notify connected dashboards only after the durable write.
    if let Err(e) = state.notifier.notify_new_alarm(&created).await {
        warn!("Failed to broadcast alarm {}: {}", created.id, e);
    }

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_alarm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DeleteResponse>> {
    let repo = AlarmsRepository::new(Arc::clone(&state.db_pool));
    if !repo.delete(id).await? {
        return Err(Error::NotFound(format!("Alarm not found: {}", id)).into());
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Alarm deleted".to_string(),
    }))
}

// ---- AI handlers ----

async fn analyze_frame(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisOutcome>> {
    let mut image: Option<Vec<u8>> = None;
    let mut camera_id: Option<i32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "frame" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read image field: {}", e)))?;
                image = Some(bytes.to_vec());
            }
            "cameraId" | "camera_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read cameraId: {}", e)))?;
                camera_id = Some(text.trim().parse().map_err(|_| {
                    Error::Validation(format!("cameraId must be an integer, got: {}", text))
                })?);
            }
            _ => {}
        }
    }

    let image = image
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Error::Validation("Image payload is required".to_string()))?;
    let camera_id =
        camera_id.ok_or_else(|| Error::Validation("cameraId is required".to_string()))?;

    let cameras = CamerasRepository::new(Arc::clone(&state.db_pool));
    if cameras.get_by_id(camera_id).await?.is_none() {
        return Err(Error::NotFound(format!("Camera not found: {}", camera_id)).into());
    }

    let outcome = state.pipeline.analyze_frame(&image, camera_id).await?;

    Ok(Json(outcome))
}

async fn ai_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(state.pipeline.service_status().await)
}

async fn ai_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "aiEnabled": state.pipeline.is_enabled(),
        "timestamp": Utc::now(),
    }))
}

// ---- Report handlers ----

#[derive(Debug, Deserialize)]
struct DailyReportParams {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct CameraReportParams {
    days: Option<i64>,
}

async fn report_stats(State(state): State<AppState>) -> ApiResult<Json<impl Serialize>> {
    Ok(Json(state.reports.dashboard_stats().await?))
}

async fn daily_report(
    State(state): State<AppState>,
    Query(params): Query<DailyReportParams>,
) -> ApiResult<Json<impl Serialize>> {
    Ok(Json(state.reports.daily_report(params.date).await?))
}

async fn weekly_trend(State(state): State<AppState>) -> ApiResult<Json<impl Serialize>> {
    Ok(Json(state.reports.weekly_trend().await?))
}

async fn camera_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<CameraReportParams>,
) -> ApiResult<Json<impl Serialize>> {
    let days = params.days.unwrap_or(7).clamp(1, 365);
    Ok(Json(state.reports.camera_report(id, days).await?))
}

async fn generate_daily_pdf(State(state): State<AppState>) -> ApiResult<Json<GeneratedReport>> {
    Ok(Json(state.reports.generate_daily_pdf().await?))
}

async fn generate_weekly_pdf(State(state): State<AppState>) -> ApiResult<Json<GeneratedReport>> {
    Ok(Json(state.reports.generate_weekly_pdf().await?))
}

async fn download_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state.reports.artifact_path(&filename)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| Error::NotFound(format!("Report not found: {}", filename)))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, bytes).into_response())
}

async fn get_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.reports.reports_repository().get_all().await?))
}

async fn get_report_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Report>> {
    let report = state
        .reports
        .reports_repository()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Report not found: {}", id)))?;

    Ok(Json(report))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.reports.reports_repository().delete(id).await? {
        return Err(Error::NotFound(format!("Report not found: {}", id)).into());
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Report deleted".to_string(),
    }))
}
