//! HTTP surface: the Telegram webhook plus health routes.

use std::sync::Arc;

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    secrecy::{ExposeSecret, Secret},
    serde_json::json,
    teloxide::types::Update,
    tracing::{debug, error, warn},
};

use crate::{handlers, state::BotState};

/// Header Telegram uses to echo the secret registered with `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
struct WebhookState {
    bot: Arc<BotState>,
    secret: Option<Arc<Secret<String>>>,
}

/// Build the router serving `POST {webhook_path}`, `GET /` and `GET /health`.
pub fn router(bot: BotState, webhook_path: &str, secret: Option<Secret<String>>) -> Router {
    let state = WebhookState {
        bot: Arc::new(bot),
        secret: secret.map(Arc::new),
    };
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route(webhook_path, post(receive_update))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = &state.secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !constant_time_eq(provided, expected.expose_secret()) {
            warn!("rejected webhook call with a bad secret token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    // Telegram redelivers anything that is not acknowledged, so undecodable
    // payloads are logged and acknowledged.
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            debug!(update_id = ?update.id, "webhook update received");
            let bot = Arc::clone(&state.bot);
            tokio::spawn(async move {
                if let Err(e) = handlers::handle_update(&bot, update).await {
                    error!(error = %e, "failed to handle telegram update");
                }
            });
        },
        Err(e) => warn!(error = %e, size = body.len(), "dropping undecodable update"),
    }

    Json(json!({ "ok": true })).into_response()
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            outbound::Responder,
            state::HandlerSettings,
            testing::{RecordingResponder, Sent},
        },
        axum::{body::Body, http::Request},
        std::time::Duration,
        tower::ServiceExt,
        tvlogo_catalog::Catalog,
        tvlogo_gallery::{
            GalleryPersistence, GalleryStore, InMemoryGalleryPersistence, SelectionMachine,
        },
    };

    const CATALOG: &str =
        r#"{"ntv": {"name": "НТВ", "aliases": ["нтв"], "logos": ["ntv.png"]}}"#;

    async fn app(secret: Option<&str>) -> (Router, Arc<RecordingResponder>) {
        let persistence: Arc<dyn GalleryPersistence> =
            Arc::new(InMemoryGalleryPersistence::new());
        let store = Arc::new(GalleryStore::open(persistence).await);
        let responder = Arc::new(RecordingResponder::default());
        let bot = BotState {
            catalog: Arc::new(Catalog::from_json(CATALOG, "/nonexistent").unwrap()),
            selection: Arc::new(SelectionMachine::new(store)),
            responder: Arc::clone(&responder) as Arc<dyn Responder>,
            settings: HandlerSettings::default(),
        };
        let router = router(bot, "/hook", secret.map(|s| Secret::new(s.to_string())));
        (router, responder)
    }

    fn update_body() -> String {
        json!({
            "update_id": 1,
            "message": {
                "message_id": 3,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                "text": "погода"
            }
        })
        .to_string()
    }

    fn post(path: &str, body: String, secret: Option<&str>) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            req = req.header(SECRET_HEADER, secret);
        }
        req.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_for_reply(responder: &RecordingResponder) -> Vec<Sent> {
        for _ in 0..100 {
            let sent = responder.take();
            if !sent.is_empty() {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Vec::new()
    }

    #[tokio::test]
    async fn health_routes() {
        for path in ["/", "/health"] {
            let (app, _) = app(None).await;
            let response = app
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await, json!({"status": "ok"}));
        }
    }

    #[tokio::test]
    async fn accepted_update_is_processed() {
        let (app, responder) = app(None).await;
        let response = app.oneshot(post("/hook", update_body(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"ok": true}));

        let sent = wait_for_reply(&responder).await;
        assert!(
            matches!(&sent[..], [Sent::Text { chat_id: 42, text, .. }] if text.starts_with("Nothing found"))
        );
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let (app, responder) = app(Some("s3cret")).await;
        let response = app
            .oneshot(post("/hook", update_body(), Some("guess")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(responder.take().is_empty());
    }

    #[tokio::test]
    async fn missing_secret_is_rejected() {
        let (app, _) = app(Some("s3cret")).await;
        let response = app.oneshot(post("/hook", update_body(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn matching_secret_is_accepted() {
        let (app, responder) = app(Some("s3cret")).await;
        let response = app
            .oneshot(post("/hook", update_body(), Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(wait_for_reply(&responder).await.len(), 1);
    }

    #[tokio::test]
    async fn garbage_is_acknowledged() {
        let (app, responder) = app(None).await;
        let response = app
            .oneshot(post("/hook", "not json".into(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(responder.take().is_empty());
    }

    #[tokio::test]
    async fn other_paths_are_not_routed() {
        let (app, _) = app(None).await;
        let response = app
            .oneshot(post("/webhook", update_body(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn constant_time_eq_compares_content_and_length() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
