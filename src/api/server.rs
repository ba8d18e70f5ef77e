use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    artifact, check_containers, check_rdp_sessions, check_sql_injections, health_check,
    list_alerts, pause_rdp, pause_sql_injections, reset_container_alert, AppState,
};
use crate::alerts::{AlertChecker, AlertDefinition, AlertKind, PauseRegistry, SystemClock};

/// Directory the monitoring jobs drop their artifacts into
pub fn default_data_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\inetpub\wwwroot")
    } else {
        PathBuf::from(".")
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub definitions: Vec<AlertDefinition>,
    /// Served for any path no route claims
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            definitions: AlertKind::ALL
                .iter()
                .map(|&kind| AlertDefinition::new(kind, &data_dir))
                .collect(),
            static_dir: None,
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Alert checks
        .route("/check-rdp-sessions", get(check_rdp_sessions))
        .route("/check-containers", get(check_containers))
        .route("/check-sql-injections", get(check_sql_injections))
        // Pause / reset
        .route("/pause-rdp", post(pause_rdp))
        .route("/reset-container-alert", post(reset_container_alert))
        .route("/pause-sql-injections", post(pause_sql_injections))
        // Summary & raw data
        .route("/alerts", get(list_alerts))
        .route("/artifacts/:kind", get(artifact));

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Pause state lives for the lifetime of the process only
    let registry = Arc::new(PauseRegistry::new());
    let checker = Arc::new(AlertChecker::new(config.definitions, registry));

    let state = Arc::new(AppState {
        checker,
        clock: Arc::new(SystemClock),
    });

    let app = build_router(state, config.static_dir);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("API running at http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Watchpost server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::config::CONTAINER_WARNING_LINE;
    use crate::alerts::ManualClock;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    struct TestApp {
        dir: TempDir,
        clock: Arc<ManualClock>,
        router: Router,
    }

    impl TestApp {
        fn write(&self, file: &str, content: &str) {
            std::fs::write(self.dir.path().join(file), content).unwrap();
        }

        fn read(&self, file: &str) -> String {
            std::fs::read_to_string(self.dir.path().join(file)).unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn create_test_app() -> TestApp {
        create_test_app_with_static(None)
    }

    fn create_test_app_with_static(static_dir: Option<PathBuf>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let checker = Arc::new(AlertChecker::with_data_dir(
            dir.path(),
            Arc::new(PauseRegistry::new()),
        ));
        let state = Arc::new(AppState {
            checker,
            clock: clock.clone(),
        });

        TestApp {
            dir,
            clock,
            router: build_router(state, static_dir),
        }
    }

    async fn get_text(app: &TestApp, uri: &str) -> (StatusCode, String) {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read_response(response).await
    }

    async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> (StatusCode, String) {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read_response(response).await
    }

    async fn read_response(response: axum::response::Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.definitions.len(), 3);
        assert!(config.static_dir.is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app();
        let (status, body) = get_text(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("healthy"));
    }

    #[tokio::test]
    async fn test_check_rdp_sessions() {
        let app = create_test_app();

        app.write("rdp_data.txt", "10\n20\n999999\n");
        let (status, body) = get_text(&app, "/check-rdp-sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ERROR: Abnormal RDP count detected");

        app.write("rdp_data.txt", "10\n20\nabc\n");
        let (status, body) = get_text(&app, "/check-rdp-sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_check_missing_artifact() {
        let app = create_test_app();

        for uri in ["/check-rdp-sessions", "/check-containers", "/check-sql-injections"] {
            let (status, body) = get_text(&app, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "Server Error");
        }
    }

    #[tokio::test]
    async fn test_pause_rdp_round_trip() {
        let app = create_test_app();
        app.write("rdp_data.txt", "999999\n");

        let (status, body) =
            post_json(&app, "/pause-rdp", serde_json::json!({ "pauseHours": 24 })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Paused RDP alert for 24 hours.");

        let (_, body) = get_text(&app, "/check-rdp-sessions").await;
        assert_eq!(
            body,
            "OK - Paused until: Tue Oct 20 2026 12:00:00 GMT+0000 (Coordinated Universal Time)"
        );

        app.clock.advance(TimeDelta::hours(24) + TimeDelta::seconds(1));
        let (_, body) = get_text(&app, "/check-rdp-sessions").await;
        assert_eq!(body, "ERROR: Abnormal RDP count detected");

        app.clock.set(start());
        let (_, body) =
            post_json(&app, "/pause-rdp", serde_json::json!({ "pauseHours": 0 })).await;
        assert_eq!(body, "Cleared RDP alert pause.");

        let (_, body) = get_text(&app, "/check-rdp-sessions").await;
        assert_eq!(body, "ERROR: Abnormal RDP count detected");
    }

    #[tokio::test]
    async fn test_pause_without_body_clears() {
        let app = create_test_app();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/pause-sql-injections")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, body) = read_response(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Cleared SQL Injection alert pause.");
    }

    #[tokio::test]
    async fn test_pause_sql_injections() {
        let app = create_test_app();
        app.write("sql_injections.txt", "12\n800\n");

        let (_, body) = get_text(&app, "/check-sql-injections").await;
        assert_eq!(body, "ERROR: SQL Injection detected");

        let (status, body) = post_json(
            &app,
            "/pause-sql-injections",
            serde_json::json!({ "pauseHours": 1.5 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Paused SQL Injection alert for 1.5 hours.");

        let (_, body) = get_text(&app, "/check-sql-injections").await;
        assert!(body.starts_with("OK - Paused until: "));

        // a string duration is not a number and clears
        let (_, body) = post_json(
            &app,
            "/pause-sql-injections",
            serde_json::json!({ "pauseHours": "3" }),
        )
        .await;
        assert_eq!(body, "Cleared SQL Injection alert pause.");
        assert_eq!(app.read("sql_injections.txt"), "12\n800\n");
    }

    #[tokio::test]
    async fn test_reset_container_alert() {
        let app = create_test_app();
        app.write("container_alert.txt", CONTAINER_WARNING_LINE);

        let (_, body) = get_text(&app, "/check-containers").await;
        assert_eq!(body, "ERROR: Container count exceeds allowed maximum");

        let (status, body) = post_json(
            &app,
            "/reset-container-alert",
            serde_json::json!({ "pauseHours": 5 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Container alert file has been reset");
        assert_eq!(app.read("container_alert.txt"), "");

        let (_, body) = get_text(&app, "/check-containers").await;
        assert!(body.starts_with("OK - Paused until: Mon Oct 19 2026 17:00:00"));

        app.write("container_alert.txt", CONTAINER_WARNING_LINE);
        let (_, body) = post_json(&app, "/reset-container-alert", serde_json::json!({})).await;
        assert_eq!(body, "Cleared container alert pause.");
        assert_eq!(app.read("container_alert.txt"), CONTAINER_WARNING_LINE);

        let (_, body) = get_text(&app, "/check-containers").await;
        assert_eq!(body, "ERROR: Container count exceeds allowed maximum");
    }

    #[tokio::test]
    async fn test_reset_container_alert_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let definition = AlertDefinition::new(AlertKind::ContainerCount, dir.path())
            .with_artifact(dir.path().join("gone").join("container_alert.txt"));
        let clock = Arc::new(ManualClock::new(start()));
        let state = Arc::new(AppState {
            checker: Arc::new(AlertChecker::new(
                [definition],
                Arc::new(PauseRegistry::new()),
            )),
            clock: clock.clone(),
        });
        let app = TestApp {
            dir,
            clock,
            router: build_router(state, None),
        };

        let (status, body) = post_json(
            &app,
            "/reset-container-alert",
            serde_json::json!({ "pauseHours": 5 }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Server Error");

        // pause was applied before the truncation failed
        let (status, body) = get_text(&app, "/check-containers").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("OK - Paused until: "));

        // once the pause runs out the unreadable artifact surfaces again
        app.clock.advance(TimeDelta::hours(5));
        let (status, body) = get_text(&app, "/check-containers").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Server Error");
    }

    #[tokio::test]
    async fn test_list_alerts() {
        let app = create_test_app();
        app.write("rdp_data.txt", "5\n");
        app.write("container_alert.txt", "");

        let (status, body) = get_text(&app, "/alerts").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let alerts = json["alerts"].as_array().unwrap();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0]["kind"], "rdp-sessions");
        assert_eq!(alerts[0]["status"], "OK");
        assert_eq!(alerts[1]["pause_authority"], "client");
        assert!(alerts[2]["error"].is_string());
    }

    #[tokio::test]
    async fn test_artifact_route() {
        let app = create_test_app();
        app.write("rdp_data.txt", "1\n2\n3\n");

        let (status, body) = get_text(&app, "/artifacts/rdp-sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1\n2\n3\n");

        let (status, _) = get_text(&app, "/artifacts/disk-usage").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_text(&app, "/artifacts/sql-injections").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Server Error");
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let site = tempfile::tempdir().unwrap();
        std::fs::write(site.path().join("index.html"), "<h1>dashboard</h1>").unwrap();
        let app = create_test_app_with_static(Some(site.path().to_path_buf()));

        let (status, body) = get_text(&app, "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>dashboard</h1>");

        let (status, _) = get_text(&app, "/nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_without_static_dir() {
        let app = create_test_app();
        let (status, _) = get_text(&app, "/index.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
