//! HTTP API endpoints.
//!
//! Read-only lookups for a session by code and a full store export for backups.
//! The export holds every secret and sits behind admin auth.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, AdminAuth};
use crate::game::GameError;
use crate::protocol::ServerMessage;
use crate::state::{AppState, ServiceError};
use crate::view::SessionView;

/// Look up a session as an outsider (no secret word, no roles before the end).
///
/// GET /api/sessions/{code}
pub async fn get_session(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.get_session(&code).await {
        Ok(versioned) => Json(SessionView::for_viewer(&versioned, None)).into_response(),
        Err(e) => {
            let status = match e {
                ServiceError::Game(GameError::NotFound(_)) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ServerMessage::error(e.code(), e.to_string()))).into_response()
        }
    }
}

/// Export every stored document.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Response {
    match state.export().await {
        Some(snapshot) => {
            tracing::info!("Exported {} documents", snapshot.documents.len());
            Json(snapshot).into_response()
        }
        None => (
            StatusCode::NOT_IMPLEMENTED,
            Json(ServerMessage::error(
                "EXPORT_UNSUPPORTED",
                "This store does not support export",
            )),
        )
            .into_response(),
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// All HTTP and websocket routes
pub fn router(state: Arc<AppState>, admin: Arc<AdminAuth>) -> Router {
    let admin_routes = Router::new()
        .route("/api/state/export", get(export_state))
        .layer(middleware::from_fn_with_state(
            admin,
            auth::admin_auth_middleware,
        ));

    Router::new()
        .route("/ws", get(crate::ws::ws_handler))
        .route("/api/sessions/{code}", get(get_session))
        .route("/healthz", get(healthz))
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use tower::ServiceExt;

    fn admin() -> Arc<AdminAuth> {
        Arc::new(AdminAuth {
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
        })
    }

    fn export_request(credentials: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/state/export");
        if let Some(raw) = credentials {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode(raw)),
            );
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_export_requires_admin_credentials() {
        let state = Arc::new(AppState::in_memory());
        state.create_session("host", "Alice").await.unwrap();
        let app = router(state, admin());

        let response = app.clone().oneshot(export_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(export_request(Some("admin:guess")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(export_request(Some("admin:secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_hidden_without_admin_config() {
        let state = Arc::new(AppState::in_memory());
        let app = router(state, Arc::new(AdminAuth::default()));

        let response = app
            .oneshot(export_request(Some("admin:secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_routes_need_no_credentials() {
        let state = Arc::new(AppState::in_memory());
        let code = state.create_session("host", "Alice").await.unwrap().session.code;
        let app = router(state, admin());

        let request = Request::builder()
            .uri(format!("/api/sessions/{}", code))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_session_found() {
        let state = Arc::new(AppState::in_memory());
        let created = state.create_session("host", "Alice").await.unwrap();

        let response = get_session(Path(created.session.code.to_lowercase()), State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_session_missing() {
        let state = Arc::new(AppState::in_memory());
        let response = get_session(Path("NOPE00".to_string()), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_state() {
        let state = Arc::new(AppState::in_memory());
        state.create_session("host", "Alice").await.unwrap();

        let response = export_state(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
