#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tower::Service;

use server::routes::{self, ServerState};
use service::backend::identity::mock::MockIdentityProvider;
use service::backend::objects::mock::MemoryObjectStorage;
use service::backend::records::mock::MemoryRecordStore;
use service::console::{Console, FailurePolicy, ImageUploader};

pub const EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "S3curePass!";

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<MockIdentityProvider>,
    pub records: Arc<MemoryRecordStore>,
    pub objects: Arc<MemoryObjectStorage>,
}

pub fn build_app() -> TestApp {
    let identity = Arc::new(MockIdentityProvider::with_user(EMAIL, PASSWORD));
    let records = Arc::new(MemoryRecordStore::default());
    let objects = Arc::new(MemoryObjectStorage::default());
    let console = Console::new(
        identity.clone(),
        records.clone(),
        ImageUploader::new(objects.clone(), "portfolio-images", "projects"),
        FailurePolicy::default(),
    );
    let state = ServerState { console, secure_cookies: false };
    let router = routes::build_router(state, "/nonexistent-assets", None);
    TestApp { router, identity, records, objects }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<Response<Body>> {
        Ok(self.router.clone().call(req).await?)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> anyhow::Result<Response<Body>> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::empty())?).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &str) -> anyhow::Result<Response<Body>> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::from(form.to_string()))?).await
    }

    /// Sign in through the login form and return the `name=value` cookie pair.
    pub async fn login(&self) -> anyhow::Result<String> {
        let resp = self
            .post_form("/login", None, &format!("email={}&password={}", urlencode(EMAIL), urlencode(PASSWORD)))
            .await?;
        session_cookie(&resp).ok_or_else(|| anyhow::anyhow!("login did not set a session cookie"))
    }
}

pub use urlencoding::encode as urlencode;

pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("auth_token="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(resp: &Response<Body>) -> Option<&str> {
    resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

pub async fn body_text(resp: Response<Body>) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Hand-rolled multipart body: text fields plus an optional file part.
pub fn multipart(boundary: &str, fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
