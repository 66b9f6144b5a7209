use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use models::{Collection, RecordId};
use serde_json::{json, Value};
use service::backend::{AccessToken, IdentityProvider, ObjectStorage, RecordStore};
use service::supabase::{SupabaseAuth, SupabaseClient, SupabaseRest, SupabaseStorage};

const ANON: &str = "anon-key";

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path_and_query: String,
    headers: HeaderMap,
    body: Bytes,
}

#[derive(Clone, Default)]
struct Fake {
    seen: Arc<Mutex<Vec<Seen>>>,
    objects: Arc<Mutex<Vec<String>>>,
}

impl Fake {
    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("a request was made")
    }
}

// One handler for the whole project API; dispatch on method and path.
async fn project_api(State(fake): State<Fake>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path_and_query = uri.path_and_query().map(|p| p.as_str().to_string()).unwrap_or_default();
    fake.seen.lock().unwrap().push(Seen { method: method.clone(), path_and_query, headers: headers.clone(), body: body.clone() });
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();

    match (method.as_str(), uri.path()) {
        ("POST", "/auth/v1/token") => {
            let creds: Value = serde_json::from_slice(&body).unwrap_or_default();
            if creds["password"] == "pw" {
                Json(json!({ "access_token": "tok-1", "user": { "id": "u1", "email": creds["email"] } })).into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
                )
                    .into_response()
            }
        }
        ("GET", "/auth/v1/user") if bearer == "Bearer tok-1" => Json(json!({ "id": "u1", "email": "a@b.c" })).into_response(),
        ("GET", "/auth/v1/user") => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response(),
        ("POST", "/auth/v1/logout") => StatusCode::NO_CONTENT.into_response(),
        ("GET", "/rest/v1/projects") => Json(json!([
            { "id": 1, "title": "Beta", "order_index": 1 },
            { "id": 2, "title": "Alpha", "order_index": 2 }
        ]))
        .into_response(),
        ("GET", "/rest/v1/services") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "relation does not exist" }))).into_response(),
        ("POST", "/rest/v1/projects") => {
            let rows: Vec<Value> = serde_json::from_slice(&body).unwrap_or_default();
            let mut row = rows.into_iter().next().unwrap_or_default();
            row["id"] = json!(7);
            (StatusCode::CREATED, Json(json!([row]))).into_response()
        }
        ("PATCH", "/rest/v1/projects") | ("DELETE", "/rest/v1/projects") => StatusCode::NO_CONTENT.into_response(),
        ("POST", p) if p.starts_with("/storage/v1/object/") => {
            let mut objects = fake.objects.lock().unwrap();
            if objects.iter().any(|o| o == p) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "statusCode": "409", "error": "Duplicate", "message": "The resource already exists" })),
                )
                    .into_response();
            }
            objects.push(p.to_string());
            Json(json!({ "Key": p.trim_start_matches("/storage/v1/object/") })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_fake() -> (Fake, SupabaseClient) {
    let fake = Fake::default();
    let app = Router::new().fallback(project_api).with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let client = SupabaseClient::with_http(reqwest::Client::new(), &format!("http://{addr}/"), ANON);
    (fake, client)
}

#[tokio::test]
async fn auth_endpoints_follow_gotrue_contract() {
    let (fake, client) = spawn_fake().await;
    let auth = SupabaseAuth::new(client);

    let err = auth.sign_in_with_password("a@b.c", "nope").await.unwrap_err();
    assert_eq!(err.message, "Invalid login credentials");
    let req = fake.last();
    assert_eq!(req.path_and_query, "/auth/v1/token?grant_type=password");
    assert_eq!(req.headers["apikey"], ANON);

    let signed = auth.sign_in_with_password("a@b.c", "pw").await.unwrap();
    assert_eq!(signed.token.as_str(), "tok-1");
    assert_eq!(signed.identity.id, "u1");

    let me = auth.current_identity(&signed.token).await.unwrap();
    assert_eq!(me.map(|i| i.id).as_deref(), Some("u1"));
    assert_eq!(fake.last().headers["authorization"], "Bearer tok-1");

    assert_eq!(auth.current_identity(&AccessToken::new("expired")).await.unwrap(), None);

    auth.sign_out(&signed.token).await.unwrap();
    let req = fake.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path_and_query, "/auth/v1/logout");
}

#[tokio::test]
async fn rest_endpoints_follow_postgrest_contract() {
    let (fake, client) = spawn_fake().await;
    let rest = SupabaseRest::new(client);
    let token = AccessToken::new("tok-1");

    let rows = rest.list(&token, Collection::Projects).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(fake.last().path_and_query, "/rest/v1/projects?select=*&order=order_index.asc");

    let created = rest.insert(&token, Collection::Projects, json!({ "title": "Gamma", "order_index": null })).await.unwrap();
    assert_eq!(created["id"], 7);
    let req = fake.last();
    assert_eq!(req.headers["prefer"], "return=representation");
    let sent: Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(sent, json!([{ "title": "Gamma", "order_index": null }]));

    rest.update(&token, Collection::Projects, &RecordId::new("7"), json!({ "title": "Gamma 2" })).await.unwrap();
    let req = fake.last();
    assert_eq!(req.method, Method::PATCH);
    assert_eq!(req.path_and_query, "/rest/v1/projects?id=eq.7");

    rest.delete_by_id(&token, Collection::Projects, &RecordId::new("7")).await.unwrap();
    let req = fake.last();
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.path_and_query, "/rest/v1/projects?id=eq.7");

    let err = rest.list(&token, Collection::Services).await.unwrap_err();
    assert!(matches!(
        err,
        service::ServiceError::Remote { status: 500, ref message } if message == "relation does not exist"
    ));
}

#[tokio::test]
async fn storage_upload_never_overwrites() {
    let (fake, client) = spawn_fake().await;
    let storage = SupabaseStorage::new(client);
    let token = AccessToken::new("tok-1");

    storage.upload(&token, "portfolio-images", "projects/a.png", b"png".to_vec(), Some("image/png")).await.unwrap();
    let req = fake.last();
    assert_eq!(req.path_and_query, "/storage/v1/object/portfolio-images/projects/a.png");
    assert_eq!(req.headers["x-upsert"], "false");
    assert_eq!(req.headers["cache-control"], "max-age=3600");
    assert_eq!(req.headers["content-type"], "image/png");
    assert_eq!(&req.body[..], b"png");

    let err = storage.upload(&token, "portfolio-images", "projects/a.png", b"x".to_vec(), None).await.unwrap_err();
    assert!(err.to_string().contains("The resource already exists"));

    let url = storage.public_url("portfolio-images", "projects/a.png");
    assert!(url.ends_with("/storage/v1/object/public/portfolio-images/projects/a.png"));
}
