use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use shared::protocol::Filter;
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::{SessionCache, SessionStore};

const ANON_KEY: &str = "anon-key";
const USER_ID: &str = "8d2c1f2e-93b5-4c1e-a7a0-0a4f5b8e6c11";

#[derive(Debug, Clone)]
struct Captured {
    path: &'static str,
    query: HashMap<String, String>,
    authorization: Option<String>,
    apikey: Option<String>,
    prefer: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct MockState {
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockState {
    async fn record(
        &self,
        path: &'static str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        body: Option<Value>,
    ) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.captured.lock().await.push(Captured {
            path,
            query,
            authorization: header("authorization"),
            apikey: header("apikey"),
            prefer: header("prefer"),
            body,
        });
    }

    async fn count(&self, path: &str) -> usize {
        self.captured
            .lock()
            .await
            .iter()
            .filter(|captured| captured.path == path)
            .count()
    }

    async fn last(&self, path: &str) -> Captured {
        self.captured
            .lock()
            .await
            .iter()
            .rev()
            .find(|captured| captured.path == path)
            .cloned()
            .expect("request captured")
    }
}

fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1_900_000_000,
        "refresh_token": "refresh-1",
        "user": { "id": USER_ID, "email": "mestre@example.com", "aud": "authenticated" }
    })
}

async fn list_quests(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> AxumResponse {
    state.record("select_quests", &headers, query, None).await;
    let bearer = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok());
    if bearer == Some("Bearer stale-token") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "PGRST301", "message": "JWT expired" })),
        )
            .into_response();
    }
    Json(json!([
        { "id": 1, "campaign_id": 4, "title": "Find the heir", "description": null, "status": "pending" },
        { "id": 2, "campaign_id": 4, "title": "Burn the ledger", "status": "completed" }
    ]))
    .into_response()
}

async fn delete_quest(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> AxumResponse {
    state.record("delete_quest", &headers, query, None).await;
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "code": "42501", "message": "permission denied for table quests" })),
    )
        .into_response()
}

async fn insert_campaign(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .record("insert_campaign", &headers, HashMap::new(), Some(body.clone()))
        .await;
    let mut row = body[0].clone();
    row["id"] = json!(12);
    (StatusCode::CREATED, Json(json!([row])))
}

async fn update_character(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state
        .record("update_character", &headers, query, Some(body))
        .await;
    StatusCode::NO_CONTENT
}

async fn token(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> AxumResponse {
    state
        .record("token", &headers, query.clone(), Some(body.clone()))
        .await;
    match query.get("grant_type").map(String::as_str) {
        Some("password") if body["password"] == json!("correct horse") => {
            Json(token_body("user-token")).into_response()
        }
        Some("password") if body["password"] == json!("stale horse") => {
            let mut body = token_body("stale-token");
            body["expires_at"] = json!(1_600_000_000);
            Json(body).into_response()
        }
        Some("refresh_token") if body["refresh_token"] == json!("refresh-1") => {
            Json(token_body("user-token-2")).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response(),
    }
}

async fn signup(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .record("signup", &headers, HashMap::new(), Some(body))
        .await;
    Json(json!({
        "id": USER_ID,
        "email": "novato@example.com",
        "confirmation_sent_at": "2026-10-19T12:00:00Z"
    }))
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> StatusCode {
    state.record("logout", &headers, HashMap::new(), None).await;
    StatusCode::NO_CONTENT
}

async fn spawn_supabase_mock() -> (SupabaseClient, MockState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = MockState::default();
    let app = Router::new()
        .route("/rest/v1/quests", get(list_quests).delete(delete_quest))
        .route("/rest/v1/campaigns", post(insert_campaign))
        .route("/rest/v1/characters", patch(update_character))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/logout", post(logout))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = SupabaseClient::new(&format!("http://{addr}"), ANON_KEY).expect("client");
    (client, state)
}

#[tokio::test]
async fn select_sends_postgrest_filters_and_anon_bearer() {
    let (client, state) = spawn_supabase_mock().await;

    let rows = client
        .select(
            Table::Quests,
            &Filter::all().eq("campaign_id", 4).order_by("id", true),
        )
        .await
        .expect("select");

    assert_eq!(rows.len(), 2);
    let request = state.last("select_quests").await;
    assert_eq!(request.query.get("select").map(String::as_str), Some("*"));
    assert_eq!(
        request.query.get("campaign_id").map(String::as_str),
        Some("eq.4")
    );
    assert_eq!(request.query.get("order").map(String::as_str), Some("id.asc"));
    assert_eq!(request.apikey.as_deref(), Some(ANON_KEY));
    assert_eq!(
        request.authorization.as_deref(),
        Some("Bearer anon-key")
    );
}

#[tokio::test]
async fn insert_asks_for_the_stored_row() {
    let (client, state) = spawn_supabase_mock().await;

    let row = client
        .insert(Table::Campaigns, json!({ "name": "Curse of the Crimson Throne" }))
        .await
        .expect("insert");

    assert_eq!(row["id"], json!(12));
    assert_eq!(row["name"], json!("Curse of the Crimson Throne"));
    let request = state.last("insert_campaign").await;
    assert_eq!(request.prefer.as_deref(), Some("return=representation"));
    assert_eq!(
        request.body,
        Some(json!([{ "name": "Curse of the Crimson Throne" }]))
    );
}

#[tokio::test]
async fn update_targets_primary_key() {
    let (client, state) = spawn_supabase_mock().await;

    client
        .update(Table::Characters, 7, json!({ "level": 4 }))
        .await
        .expect("update");

    let request = state.last("update_character").await;
    assert_eq!(request.query.get("id").map(String::as_str), Some("eq.7"));
    assert_eq!(request.body, Some(json!({ "level": 4 })));
}

#[tokio::test]
async fn rejected_delete_surfaces_postgrest_message() {
    let (client, _state) = spawn_supabase_mock().await;

    let err = client
        .delete(Table::Quests, 3)
        .await
        .expect_err("delete must fail");

    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(err.message, "permission denied for table quests");
}

#[tokio::test]
async fn sign_in_installs_user_token_for_later_requests() {
    let (client, state) = spawn_supabase_mock().await;

    let session = client
        .sign_in_with_password(&Credentials::new("mestre@example.com", "correct horse"))
        .await
        .expect("sign in");

    assert_eq!(session.account.email, "mestre@example.com");
    assert_eq!(session.account.id.0.to_string(), USER_ID);
    assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
    assert!(client.has_user_token().await);

    let token_request = state.last("token").await;
    assert_eq!(
        token_request.query.get("grant_type").map(String::as_str),
        Some("password")
    );

    client
        .select(Table::Quests, &Filter::all())
        .await
        .expect("select");
    assert_eq!(
        state.last("select_quests").await.authorization.as_deref(),
        Some("Bearer user-token")
    );
}

#[tokio::test]
async fn wrong_password_reports_provider_message() {
    let (client, _state) = spawn_supabase_mock().await;

    let err = client
        .sign_in_with_password(&Credentials::new("mestre@example.com", "wrong"))
        .await
        .expect_err("sign in must fail");

    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "Invalid login credentials");
    assert!(!client.has_user_token().await);
}

#[tokio::test]
async fn sign_up_without_session_requires_confirmation() {
    let (client, _state) = spawn_supabase_mock().await;

    let outcome = client
        .sign_up(&Credentials::new("novato@example.com", "correct horse"))
        .await
        .expect("sign up");

    match outcome {
        SignUpOutcome::ConfirmationRequired(account) => {
            assert_eq!(account.email, "novato@example.com");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!client.has_user_token().await);
}

#[tokio::test]
async fn refresh_and_sign_out_manage_the_token() {
    let (client, state) = spawn_supabase_mock().await;

    let session = client.refresh_session("refresh-1").await.expect("refresh");
    assert_eq!(session.access_token, "user-token-2");
    assert!(client.has_user_token().await);

    client
        .sign_out(&session.access_token)
        .await
        .expect("sign out");
    assert!(!client.has_user_token().await);
    assert_eq!(
        state.last("logout").await.authorization.as_deref(),
        Some("Bearer user-token-2")
    );
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let client = SupabaseClient::new("http://127.0.0.1:9", ANON_KEY).expect("client");

    let err = client
        .select(Table::Campaigns, &Filter::all())
        .await
        .expect_err("no server");

    assert_eq!(err.code, ErrorCode::Network);
}

#[tokio::test]
async fn expired_token_is_renewed_before_the_next_request() {
    let (client, state) = spawn_supabase_mock().await;
    let client = Arc::new(client);
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = SessionCache::new(dir.path().join("session.json"));
    let session = SessionStore::new(client.clone(), Some(cache.clone()));
    session.initialize().await;
    session
        .sign_in("mestre@example.com", "stale horse")
        .await
        .expect("sign in");

    let err = client
        .select(Table::Quests, &Filter::all())
        .await
        .expect_err("token expired");
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(err.message, "JWT expired");

    session.ensure_fresh().await;

    let rows = client
        .select(Table::Quests, &Filter::all())
        .await
        .expect("select");
    assert_eq!(rows.len(), 2);
    assert_eq!(
        state.last("select_quests").await.authorization.as_deref(),
        Some("Bearer user-token-2")
    );
    assert_eq!(
        state.last("token").await.body.expect("body")["refresh_token"],
        json!("refresh-1")
    );
    assert_eq!(
        cache.load().await.expect("cached").access_token,
        "user-token-2"
    );

    session.ensure_fresh().await;
    assert_eq!(state.count("token").await, 2);
}
