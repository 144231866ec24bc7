//! ==============================================================================
//! api.rs - http api served to every screen in the attraction
//! ==============================================================================
//!
//! purpose:
//!     plain REST/JSON over http. front-ends poll `GET /api/status` every
//!     500ms and the admin console posts changes. there is no push channel.
//!
//! routes:
//!
//! ```text
//!     show state          GET  /api/status
//!                         POST /api/updateState            {shutdown}
//!                         POST /api/setCamera              {camera}
//!                         POST /api/setPhase               {phase}
//!                         POST /api/setVitals              {vitals}
//!                         POST /api/setBlackScreenOpacity  {opacity}
//!                         POST /api/setBatteryLevel        {level}
//!                         POST /api/resetAll
//!     questionnaire       POST /api/questionnaire/submit   {results, teamName?, score?}
//!                         GET  /api/questionnaire/stats
//!                         POST /api/questionnaire/reset
//!                         GET  /api/questionnaire/session
//!                         POST /api/questionnaire/session/team    {teamName}
//!                         POST /api/questionnaire/session/answer  {id, value}
//!                         POST /api/questionnaire/session/reset
//!     scoreboard          GET  /api/scores
//!                         GET  /api/scores/top?limit=N
//!                         POST /api/scores/reset
//!     client errors       GET|POST|DELETE /api/errors
//!     battery lab         GET  /api/battery
//!                         POST /api/battery/lever          {pressed}
//!     admin login         POST /api/login                  {password}
//!     legacy              GET  /status, POST /updateState
//! ```
//!
//! ==============================================================================

use std::collections::BTreeMap;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::battery::{release_window_ms, BatterySnapshot};
use crate::config::MediaMount;
use crate::domain::{now_ms, AnswerValue, ClientError, QuestionnaireSession, ShowStatus};
use crate::errlog::ErrorReport;
use crate::error::ApiError;
use crate::questionnaire::{Leaderboard, DEFAULT_LEADERBOARD_LIMIT};
use crate::show::{camera_error, vitals_error};
use crate::state::SharedState;

type ApiResult<T> = std::result::Result<T, ApiError>;

// ==============================================================================
// router
// ==============================================================================

pub fn router(state: SharedState, media: &[MediaMount]) -> Router {
    let mut app = Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/updateState", post(update_state_handler))
        .route("/api/setCamera", post(set_camera_handler))
        .route("/api/setPhase", post(set_phase_handler))
        .route("/api/setVitals", post(set_vitals_handler))
        .route("/api/setBlackScreenOpacity", post(set_opacity_handler))
        .route("/api/setBatteryLevel", post(set_battery_level_handler))
        .route("/api/resetAll", post(reset_all_handler))
        .route("/api/questionnaire/submit", post(submit_handler))
        .route("/api/questionnaire/stats", get(stats_handler))
        .route("/api/questionnaire/reset", post(reset_stats_handler))
        .route("/api/questionnaire/session", get(session_handler))
        .route("/api/questionnaire/session/team", post(session_team_handler))
        .route("/api/questionnaire/session/answer", post(session_answer_handler))
        .route("/api/questionnaire/session/reset", post(session_reset_handler))
        .route("/api/scores", get(scores_handler))
        .route("/api/scores/top", get(leaderboard_handler))
        .route("/api/scores/reset", post(reset_scores_handler))
        .route(
            "/api/errors",
            get(list_errors_handler).post(log_error_handler).delete(clear_errors_handler),
        )
        .route("/api/battery", get(battery_handler))
        .route("/api/battery/lever", post(lever_handler))
        .route("/api/login", post(login_handler))
        // earlier screens still poll these
        .route("/status", get(legacy_status_handler))
        .route("/updateState", post(update_state_handler));

    for mount in media {
        tracing::info!(route = %mount.route, dir = %mount.dir.display(), "serving media");
        app = app.nest_service(&mount.route, ServeDir::new(&mount.dir));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

/// unwrap a json body, turning any rejection into the route's 400 message
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>, error: impl FnOnce() -> ApiError) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "rejected payload");
            Err(error())
        }
    }
}

// ==============================================================================
// show state
// ==============================================================================

async fn status_handler(State(state): State<SharedState>) -> Json<ShowStatus> {
    let show = state.show().read().await;
    Json(show.status(now_ms()))
}

async fn legacy_status_handler(State(state): State<SharedState>) -> Json<Value> {
    let show = state.show().read().await;
    Json(json!({ "isShutdown": show.is_shutdown() }))
}

#[derive(Deserialize)]
struct ShutdownBody {
    shutdown: bool,
}

async fn update_state_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<ShutdownBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let ShutdownBody { shutdown } = body(payload, || ApiError::bad_request("shutdown must be a boolean"))?;
    let is_shutdown = state.show().write().await.set_shutdown(shutdown);
    tracing::info!(is_shutdown, "shutdown updated");
    Ok(Json(json!({ "success": true, "isShutdown": is_shutdown })))
}

#[derive(Deserialize)]
struct CameraBody {
    camera: i64,
}

async fn set_camera_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<CameraBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let mut show = state.show().write().await;
    let camera_count = show.camera_count();
    let CameraBody { camera } = body(payload, || camera_error(camera_count))?;
    let current_camera = show.set_camera(camera)?;
    tracing::info!(current_camera, "camera selected");
    Ok(Json(json!({ "success": true, "currentCamera": current_camera })))
}

#[derive(Deserialize)]
struct PhaseBody {
    phase: i64,
}

async fn set_phase_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<PhaseBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let PhaseBody { phase } =
        body(payload, || ApiError::bad_request("phase must be a non-negative number"))?;
    let phase = state.show().write().await.set_phase(phase)?;
    tracing::info!(phase, "phase changed");
    Ok(Json(json!({ "success": true, "phase": phase })))
}

#[derive(Deserialize)]
struct VitalsBody {
    vitals: Vec<bool>,
}

async fn set_vitals_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<VitalsBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let mut show = state.show().write().await;
    let vital_count = show.vital_count();
    let VitalsBody { vitals } = body(payload, || vitals_error(vital_count))?;
    let vitals = show.set_vitals(vitals)?.to_vec();
    tracing::info!(?vitals, "vitals updated");
    Ok(Json(json!({ "success": true, "vitals": vitals })))
}

#[derive(Deserialize)]
struct OpacityBody {
    opacity: f64,
}

async fn set_opacity_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<OpacityBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let OpacityBody { opacity } = body(payload, || {
        ApiError::bad_request("opacity must be a number between 0 and 100")
    })?;
    let opacity = state.show().write().await.set_black_screen_opacity(opacity)?;
    tracing::debug!(opacity, "black screen opacity");
    Ok(Json(json!({ "success": true, "blackScreenOpacity": opacity })))
}

#[derive(Deserialize)]
struct BatteryLevelBody {
    level: f64,
}

async fn set_battery_level_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<BatteryLevelBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let BatteryLevelBody { level } = body(payload, || {
        ApiError::bad_request("level must be a number between 0 and 100")
    })?;
    if state.simulates_battery() {
        tracing::warn!("battery level set by hand while the simulation is running");
    }
    let level = state.show().write().await.set_battery_level(level)?;
    Ok(Json(json!({ "success": true, "batteryLevel": level })))
}

async fn reset_all_handler(State(state): State<SharedState>) -> Json<Value> {
    state.reset_all().await;
    Json(json!({ "success": true }))
}

// ==============================================================================
// questionnaire
// ==============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody {
    results: BTreeMap<u32, bool>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    score: Option<u32>,
}

async fn submit_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<SubmitBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let submit = body(payload, || ApiError::bad_request("results must be an object"))?;
    let stats = state.questionnaire().lock().await.submit(
        &submit.results,
        submit.team_name.as_deref(),
        submit.score,
        now_ms(),
    );
    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn stats_handler(State(state): State<SharedState>) -> Json<Value> {
    let q = state.questionnaire().lock().await;
    Json(json!({ "stats": q.stats() }))
}

async fn reset_stats_handler(State(state): State<SharedState>) -> Json<Value> {
    state.questionnaire().lock().await.reset_stats();
    Json(json!({ "success": true }))
}

async fn session_handler(State(state): State<SharedState>) -> Json<QuestionnaireSession> {
    let q = state.questionnaire().lock().await;
    Json(q.session().clone())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamBody {
    team_name: String,
}

async fn session_team_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<TeamBody>, JsonRejection>,
) -> ApiResult<Json<QuestionnaireSession>> {
    let TeamBody { team_name } =
        body(payload, || ApiError::bad_request("teamName must be a non-empty string"))?;
    let mut q = state.questionnaire().lock().await;
    let session = q.set_team(&team_name)?;
    tracing::info!(team = %session.team_name, "questionnaire session started");
    Ok(Json(session.clone()))
}

#[derive(Deserialize)]
struct AnswerBody {
    id: u32,
    value: AnswerValue,
}

async fn session_answer_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<AnswerBody>, JsonRejection>,
) -> ApiResult<Json<QuestionnaireSession>> {
    let AnswerBody { id, value } = body(payload, || {
        ApiError::bad_request("answer needs a numeric id and a string or string list value")
    })?;
    let mut q = state.questionnaire().lock().await;
    Ok(Json(q.set_answer(id, value)?.clone()))
}

async fn session_reset_handler(State(state): State<SharedState>) -> Json<Value> {
    state.questionnaire().lock().await.reset_session();
    Json(json!({ "success": true }))
}

async fn scores_handler(State(state): State<SharedState>) -> Json<Value> {
    let q = state.questionnaire().lock().await;
    Json(json!({ "scores": q.scores() }))
}

#[derive(Deserialize)]
struct TopParams {
    limit: Option<usize>,
}

async fn leaderboard_handler(
    State(state): State<SharedState>,
    Query(params): Query<TopParams>,
) -> Json<Leaderboard> {
    let q = state.questionnaire().lock().await;
    Json(q.leaderboard(params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT)))
}

async fn reset_scores_handler(State(state): State<SharedState>) -> Json<Value> {
    state.questionnaire().lock().await.reset_scores();
    Json(json!({ "success": true }))
}

// ==============================================================================
// client errors
// ==============================================================================

async fn log_error_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<ErrorReport>, JsonRejection>,
) -> ApiResult<Json<ClientError>> {
    let report = body(payload, || {
        ApiError::bad_request("error report needs message, source and type")
    })?;
    let mut errors = state.errors().write().await;
    Ok(Json(errors.push(report, now_ms())?.clone()))
}

async fn list_errors_handler(State(state): State<SharedState>) -> Json<Value> {
    let errors = state.errors().read().await;
    Json(json!({ "errors": errors.entries() }))
}

async fn clear_errors_handler(State(state): State<SharedState>) -> Json<Value> {
    state.errors().write().await.clear();
    tracing::info!("client error log cleared");
    Json(json!({ "success": true }))
}

// ==============================================================================
// battery lab
// ==============================================================================

async fn battery_handler(State(state): State<SharedState>) -> Json<BatterySnapshot> {
    // without the ticker the lab only advances when someone looks at it
    if !state.simulates_battery() {
        let shutdown = state.show().read().await.is_shutdown();
        state.battery().lock().await.tick(now_ms(), shutdown);
    }
    Json(state.battery().lock().await.snapshot())
}

#[derive(Deserialize)]
struct LeverBody {
    pressed: bool,
}

async fn lever_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<LeverBody>, JsonRejection>,
) -> ApiResult<Json<BatterySnapshot>> {
    let LeverBody { pressed } = body(payload, || ApiError::bad_request("pressed must be a boolean"))?;
    let shutdown = state.show().read().await.is_shutdown();
    let now = now_ms();
    let mut lab = state.battery().lock().await;
    // settle the elapsed time before the lever changes the rates
    lab.tick(now, shutdown);
    let outcome = lab.set_lever(pressed, now, release_window_ms());
    tracing::debug!(?outcome, "battery lever");
    Ok(Json(lab.snapshot()))
}

// ==============================================================================
// admin login
// ==============================================================================

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

async fn login_handler(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<LoginBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let LoginBody { password } = body(payload, || ApiError::Unauthorized)?;
    if !state.check_password(&password) {
        tracing::warn!("admin login refused");
        return Err(ApiError::Unauthorized);
    }
    Ok(Json(json!({ "success": true })))
}
