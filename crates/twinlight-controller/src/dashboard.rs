//! HTTP dashboard over a [`TwinController`].
//!
//! - `GET /` renders the traffic light page
//! - `GET /state` returns the current [`ReadOutcome`] as JSON
//! - `GET /set/:value` requests a new desired value and redirects to `/`

use crate::controller::{ControllerError, ReadOutcome, TwinController};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use twinlight_adapter_kube::ShadowApi;

const PAGE: &str = r##"<!DOCTYPE html>
<html lang="vi">
<head>
    <meta charset="UTF-8">
    <title>Điều Khiển Đèn Giao Thông</title>
    <meta http-equiv="refresh" content="__REFRESH__">
    <style>
        body { background-color: #212529; color: white; padding-top: 50px; font-family: sans-serif; text-align: center; }
        .traffic-light { background-color: #333; width: 150px; padding: 20px; border-radius: 30px; margin: 0 auto; border: 5px solid #555; }
        .bulb { width: 100px; height: 100px; background-color: #444; border-radius: 50%; margin: 20px auto; box-shadow: inset 0 0 20px #000; opacity: 0.3; }
        .bulb.red.active { background-color: #ff0000; box-shadow: 0 0 50px #ff0000; opacity: 1; }
        .bulb.yellow.active { background-color: #ffcc00; box-shadow: 0 0 50px #ffcc00; opacity: 1; }
        .bulb.green.active { background-color: #00ff00; box-shadow: 0 0 50px #00ff00; opacity: 1; }
        .status-text { font-size: 1.2rem; font-weight: bold; margin-top: 15px; min-height: 1.5em; text-transform: uppercase; }
        .controls a { display: inline-block; margin: 8px; padding: 12px 20px; border-radius: 8px; color: white; text-decoration: none; }
        .muted { color: #6c757d; }
    </style>
</head>
<body>
    <h2>🚦 HỆ THỐNG ĐÈN GIAO THÔNG</h2>
    <div class="traffic-light">
        <div class="bulb red __RED__"></div>
        <div class="bulb yellow __YELLOW__"></div>
        <div class="bulb green __GREEN__"></div>
    </div>
    <div class="status-text" style="color: __TEXT_COLOR__">__STATUS__</div>
    <small class="muted">Cập nhật: __TIME__</small>
    __DIAGNOSTIC__
    <div class="controls">
        <a href="/set/RED" style="background-color: #dc3545">🔴 Bật Đèn Đỏ</a>
        <a href="/set/YELLOW" style="background-color: #ffc107">🟡 Bật Đèn Vàng</a>
        <a href="/set/GREEN" style="background-color: #198754">🟢 Bật Đèn Xanh</a>
    </div>
</body>
</html>
"##;

/// Shared dashboard state.
pub struct Dashboard<R> {
    /// Controller serving reads and requests
    pub controller: TwinController<R>,
    /// Page auto-refresh interval in seconds
    pub refresh_secs: u64,
}

/// Build the dashboard router.
pub fn router<R: ShadowApi + 'static>(dashboard: Arc<Dashboard<R>>) -> Router {
    Router::new()
        .route("/", get(index::<R>))
        .route("/state", get(state::<R>))
        .route("/set/:value", get(set_value::<R>))
        .with_state(dashboard)
}

async fn index<R: ShadowApi>(State(dashboard): State<Arc<Dashboard<R>>>) -> Response {
    match dashboard.controller.read_display_state().await {
        Ok(outcome) => {
            let now = chrono::Local::now().format("%H:%M:%S").to_string();
            Html(render_page(&outcome, dashboard.refresh_secs, &now)).into_response()
        }
        Err(ControllerError::Registry(err)) => {
            (StatusCode::BAD_GATEWAY, format!("Registry error: {err}")).into_response()
        }
    }
}

async fn state<R: ShadowApi>(State(dashboard): State<Arc<Dashboard<R>>>) -> Response {
    match dashboard.controller.read_display_state().await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

async fn set_value<R: ShadowApi>(
    State(dashboard): State<Arc<Dashboard<R>>>,
    Path(value): Path<String>,
) -> Redirect {
    dashboard.controller.request(&value).await;
    Redirect::to("/")
}

/// Render the dashboard page for `outcome`.
#[must_use]
pub fn render_page(outcome: &ReadOutcome, refresh_secs: u64, time: &str) -> String {
    let state = &outcome.state;
    let lit = |name: &str| if state.color.contains(name) { "active" } else { "" };

    let (status, text_color) = if state.converging {
        (format!("Đang chuyển sang {}...", state.label), "#ffc107")
    } else {
        (format!("Trạng thái: {}", state.label), "white")
    };

    let diagnostic = outcome
        .diagnostic
        .as_deref()
        .map(|d| format!(r#"<p class="muted">{}</p>"#, escape_html(d)))
        .unwrap_or_default();

    PAGE.replace("__REFRESH__", &refresh_secs.to_string())
        .replace("__RED__", lit("RED"))
        .replace("__YELLOW__", lit("YELLOW"))
        .replace("__GREEN__", lit("GREEN"))
        .replace("__TEXT_COLOR__", text_color)
        .replace("__STATUS__", &escape_html(&status))
        .replace("__TIME__", &escape_html(time))
        .replace("__DIAGNOSTIC__", &diagnostic)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
