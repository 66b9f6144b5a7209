use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::debug;

use service::backend::AccessToken;
use service::console::{Console, GuardOutcome, Route};

use crate::views;

/// HTTP-only cookie carrying the identity provider's access token.
pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub console: Console,
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn session_token(jar: &CookieJar) -> Option<AccessToken> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .map(AccessToken::new)
}

fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub async fn login_page(State(state): State<ServerState>, jar: CookieJar) -> Response {
    if let GuardOutcome::Authenticated(_) = state.console.guard().check(session_token(&jar)).await {
        return Redirect::to(Route::Console.path()).into_response();
    }
    Html(views::login_page("", None)).into_response()
}

pub async fn login(State(state): State<ServerState>, jar: CookieJar, Form(input): Form<LoginInput>) -> Response {
    let mut view = state.console.login_view();
    match view.submit(&input.email, &input.password).await {
        Some(signed) => {
            let mut cookie = Cookie::new(SESSION_COOKIE, signed.token.as_str().to_string());
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookie.set_secure(state.secure_cookies);
            cookie.set_same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to(Route::Console.path())).into_response()
        }
        None => (StatusCode::UNAUTHORIZED, Html(views::login_page(&input.email, view.error()))).into_response(),
    }
}

pub async fn logout(State(state): State<ServerState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let guard = state.console.guard();
    let next = match guard.check(session_token(&jar)).await {
        GuardOutcome::Authenticated(session) => guard.sign_out(&session).await,
        GuardOutcome::Redirect(_) => Route::Root,
    };
    (clear_session(jar), Redirect::to(next.path()))
}

/// Gate for `/admin/...`: resolves the cookie to a [`service::console::SessionContext`]
/// request extension, or redirects to the login page and drops a stale cookie.
pub async fn require_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    match state.console.guard().check(session_token(&jar)).await {
        GuardOutcome::Authenticated(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        GuardOutcome::Redirect(route) => {
            debug!(%path, "no valid session; redirecting");
            let jar = if jar.get(SESSION_COOKIE).is_some() { clear_session(jar) } else { jar };
            (jar, Redirect::to(route.path())).into_response()
        }
    }
}
