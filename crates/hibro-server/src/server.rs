// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HiBro.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use chrono_tz::Tz;
use hibro_charts::{Dashboard, DashboardConfig, Figure, Panel, build_dashboard};
use hibro_history::SqliteHistoryStore;
use tokio::task::JoinError;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub store: Arc<SqliteHistoryStore>,
    pub tz: Tz,
}

impl AppState {
    pub fn new(config: DashboardConfig, store: SqliteHistoryStore, tz: Tz) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            tz,
        }
    }
}

#[derive(Debug, Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub timezone: String,
    pub generated_at: String,
    pub panels: Vec<PanelView>,
}

#[derive(Debug)]
pub struct PanelView {
    pub id: String,
    pub chart: &'static str,
    /// Figure JSON, safe to embed inside a `<script>` element
    pub figure_json: Option<String>,
    pub error: Option<String>,
}

impl DashboardTemplate {
    fn from_dashboard(dashboard: Dashboard) -> serde_json::Result<Self> {
        let panels = dashboard
            .panels
            .into_iter()
            .map(|panel| {
                Ok(match panel {
                    Panel::Figure { id, chart, figure } => PanelView {
                        id,
                        chart,
                        figure_json: Some(script_safe_json(&figure)?),
                        error: None,
                    },
                    Panel::Error { id, chart, message } => PanelView {
                        id,
                        chart,
                        figure_json: None,
                        error: Some(message),
                    },
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(Self {
            title: dashboard.title,
            timezone: dashboard.timezone,
            generated_at: dashboard.generated_at,
            panels,
        })
    }
}

fn script_safe_json(figure: &Figure) -> serde_json::Result<String> {
    Ok(serde_json::to_string(figure)?.replace("</", "<\\/"))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/dashboard", get(dashboard_api_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Serving dashboard on http://{addr}/");
    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

/// Build the dashboard on a blocking worker; the history store is synchronous.
pub async fn render_dashboard(state: &AppState) -> Result<Dashboard, JoinError> {
    let state = state.clone();
    tokio::task::spawn_blocking(move || {
        build_dashboard(&state.config, state.store.as_ref(), &state.tz, Utc::now())
    })
    .await
}

async fn index_handler(State(state): State<AppState>) -> Response {
    debug!("Dashboard page requested");

    let dashboard = match render_dashboard(&state).await {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("Dashboard worker failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<html><body><h1>Error</h1><p>Failed to build dashboard</p></body></html>"),
            )
                .into_response();
        }
    };

    let rendered = DashboardTemplate::from_dashboard(dashboard)
        .map_err(|e| e.to_string())
        .and_then(|template| template.render().map_err(|e| e.to_string()));

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    "<html><body><h1>Error</h1><p>Failed to render template: {e}</p></body></html>"
                )),
            )
                .into_response()
        }
    }
}

async fn dashboard_api_handler(State(state): State<AppState>) -> Response {
    match render_dashboard(&state).await {
        Ok(dashboard) => Json(dashboard).into_response(),
        Err(e) => {
            error!("Dashboard worker failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn health_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Duration;
    use rusqlite::{Connection, params};
    use tower::ServiceExt;

    const CONFIG: &str = r#"
        title = "Cabin"
        db_url = "sqlite:///unused.db"

        [[elements]]
        type = "line"
        entities = ["sensor.temperature"]

        [[elements]]
        type = "box"
        entities = ["sensor.door"]
    "#;

    fn state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE states (
                entity_id  VARCHAR(255),
                state      VARCHAR(255),
                attributes TEXT,
                created    DATETIME
            );",
        )
        .unwrap();

        let recent = (Utc::now() - Duration::hours(1))
            .format("%Y-%m-%d %H:%M:%S%.6f")
            .to_string();
        let rows = [
            ("sensor.temperature", "18.5", r#"{"friendly_name": "Porch </script>", "unit_of_measurement": "°C"}"#),
            ("sensor.door", "open", "{}"),
        ];
        for (entity, value, attributes) in rows {
            conn.execute(
                "INSERT INTO states (entity_id, state, attributes, created) VALUES (?1, ?2, ?3, ?4)",
                params![entity, value, attributes, recent],
            )
            .unwrap();
        }

        AppState::new(
            CONFIG.parse().unwrap(),
            SqliteHistoryStore::from_connection(conn),
            Tz::UTC,
        )
    }

    async fn get_body(uri: &str) -> (StatusCode, String) {
        let response = router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_api_returns_dashboard_json() {
        let (status, body) = get_body("/api/dashboard").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["title"], "Cabin");
        assert_eq!(json["panels"][0]["kind"], "figure");
        assert_eq!(json["panels"][0]["figure"]["data"][0]["y"][0], 18.5);
        assert_eq!(json["panels"][1]["kind"], "error");
    }

    #[tokio::test]
    async fn test_index_renders_figures_and_error_panels() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Cabin</title>"));
        assert!(body.contains(r#"Plotly.newPlot("chart-0""#));
        assert!(body.contains("panel-error"));
        assert!(body.contains("sensor.door"));
        // Labels cannot terminate the script block
        assert!(!body.contains("Porch </script>"));
        assert!(body.contains(r"Porch <\/script>"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = get_body("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
