//! Route handler functions for all API endpoints.
//!
//! Every command goes through the same [`Dispatcher`] the keystroke loop
//! uses, tagged [`Origin::Http`].
//!
//! [`Dispatcher`]: deskbuddy_action::Dispatcher

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use deskbuddy_action::{
    ActionEvent, ActionHandle, ActuatorState, CommandOutcome, CommandRequest, Origin, Task,
};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

/// Body of `POST /tasks`. `date` is `YYYY-MM-DD`, `time` is `HH:MM`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub date: String,
    pub time: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: &'static str,
    pub result: CommandOutcome,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub actuators: ActuatorState,
    pub active_actions: Vec<ActionHandle>,
    pub task_count: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub device_attached: bool,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - liveness; answers even before the device is attached.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device_attached: state.is_attached(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /status - actuator snapshot and the actions still running.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let dispatcher = state.dispatcher()?;
    let scheduler = dispatcher.scheduler();
    Ok(Json(StatusResponse {
        actuators: scheduler.context().actuators().snapshot(),
        active_actions: scheduler.active(),
        task_count: dispatcher.list_tasks()?.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

/// POST /command - dispatch one command.
pub async fn command(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let dispatcher = state.dispatcher()?;
    let Json(request) = payload?;
    let result = dispatcher.dispatch(&request, Origin::Http)?;
    Ok(Json(CommandResponse {
        status: "ok",
        result,
    }))
}

/// GET /tasks - all tasks sorted by proximity to now.
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.dispatcher()?.list_tasks()?;
    Ok(Json(tasks))
}

/// POST /tasks - add a task from structured fields.
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let dispatcher = state.dispatcher()?;
    let Json(req) = payload?;

    let date = NaiveDate::parse_from_str(req.date.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", req.date))
    })?;
    let time = parse_time(req.time.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid time '{}', expected HH:MM", req.time)))?;

    let task = dispatcher.add_task(&req.name, date, time)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// DELETE /tasks/{index} - remove by position in the current listing.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Task>, ApiError> {
    let task = state.dispatcher()?.remove_task(index)?;
    Ok(Json(task))
}

/// GET /stream - SSE stream of action lifecycle events.
///
/// The SSE event name is the lifecycle stage (`started`, `completed`, ...).
/// Events missed by a lagging client are skipped.
pub async fn stream(
    State(state): State<AppState>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send>, ApiError> {
    let rx = state.dispatcher()?.scheduler().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event_name(&event)).data(data)))
        }
        Err(_) => None,
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn event_name(event: &ActionEvent) -> &'static str {
    match event {
        ActionEvent::Started { .. } => "started",
        ActionEvent::Completed { .. } => "completed",
        ActionEvent::Failed { .. } => "failed",
        ActionEvent::Reset { .. } => "reset",
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("14:30"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_time("09:05:10"), NaiveTime::from_hms_opt(9, 5, 10));
        assert_eq!(parse_time("2pm"), None);
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_event_names_match_serde_tag() {
        let events = [
            ActionEvent::Reset { still_running: 0 },
            ActionEvent::Failed {
                id: uuid::Uuid::nil(),
                name: "wave".into(),
                error: "x".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event_name(&event));
        }
    }
}
