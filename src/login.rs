use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::listing::is_truthy;
use crate::session::{Role, Session};
#[cfg(feature = "web")]
use crate::app::{AppState, inject_page_data};
#[cfg(feature = "web")]
use crate::session::{Route, switch_account_target};
#[cfg(feature = "web")]
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
#[cfg(feature = "web")]
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
#[cfg(feature = "web")]
use std::sync::Arc;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

/// Reply of the login lookup endpoint
///
/// The endpoint answers `{ "error": ... }` for unknown ids and otherwise
/// describes the account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLookup {
    #[serde(default)]
    pub error: Option<Value>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub user_id: Option<Value>,

    #[serde(default)]
    pub student_name: Option<String>,

    #[serde(default)]
    pub educator_name: Option<String>,
}

/// Why a login attempt was turned away
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("❌ Invalid UserID")]
    InvalidUser,

    #[error("⚠️ Invalid {0} credentials")]
    WrongRole(Role),

    #[error("🚨 Network error, please try again later.")]
    Network,
}

/// Login form posted by both login pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// User id issued by the institution
    pub user_id: String,

    /// Name typed on the form, used when the lookup has none
    #[serde(default)]
    pub name: String,
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl LoginLookup {
    /// Turn a lookup reply into a session for the page's role.
    ///
    /// # Arguments
    /// * `expected` - Role of the login page that was used
    /// * `submitted_id` - User id typed on the form
    /// * `submitted_name` - Name typed on the form
    ///
    /// # Returns
    /// * `Result<Session, LoginError>` - The new session, or why it was refused
    pub fn resolve(
        self,
        expected: Role,
        submitted_id: &str,
        submitted_name: &str,
    ) -> Result<Session, LoginError> {
        if self.error.as_ref().is_some_and(is_truthy) {
            return Err(LoginError::InvalidUser);
        }

        match self.role.as_deref().and_then(|role| role.parse::<Role>().ok()) {
            Some(role) if role == expected => {
                let user_id = self
                    .user_id
                    .as_ref()
                    .and_then(value_as_id)
                    .unwrap_or_else(|| submitted_id.to_string());
                let looked_up = match role {
                    Role::Student => self.student_name,
                    Role::Educator => self.educator_name,
                };
                let name = looked_up
                    .filter(|name| !name.is_empty())
                    .or_else(|| Some(submitted_name.to_string()));
                Ok(Session::new(user_id, name, role))
            }
            _ => Err(LoginError::WrongRole(expected)),
        }
    }
}

// Web handler functions below (only compiled with "web" feature)

#[cfg(feature = "web")]
fn login_page(role: Role) -> Html<String> {
    let data = serde_json::json!({
        "role": role.as_str(),
        "title": match role {
            Role::Student => "👨‍🎓 Student Login",
            Role::Educator => "👨‍🏫 Educator Login",
        },
        "action": role.login_page().path(),
    });

    inject_page_data(include_str!("./static/login.html"), "LOGIN", &data)
}

/// Serve the student login page
#[cfg(feature = "web")]
pub async fn serve_student_login() -> Html<String> {
    login_page(Role::Student)
}

/// Serve the educator login page
#[cfg(feature = "web")]
pub async fn serve_educator_login() -> Html<String> {
    login_page(Role::Educator)
}

#[cfg(feature = "web")]
pub async fn handle_student_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    handle_login(state, jar, form, Role::Student).await
}

#[cfg(feature = "web")]
pub async fn handle_educator_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    handle_login(state, jar, form, Role::Educator).await
}

/// Look the user id up, create a session on success and send the user to
/// their dashboard.
#[cfg(feature = "web")]
async fn handle_login(state: Arc<AppState>, jar: CookieJar, form: LoginForm, role: Role) -> Response {
    let user_id = form.user_id.trim();
    if user_id.is_empty() {
        return (StatusCode::UNAUTHORIZED, LoginError::InvalidUser.to_string()).into_response();
    }

    let lookup = match state.client.lookup_user(user_id).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::warn!("Login lookup for {} failed: {}", user_id, e);
            return (StatusCode::BAD_GATEWAY, LoginError::Network.to_string()).into_response();
        }
    };

    match lookup.resolve(role, user_id, form.name.trim()) {
        Ok(session) => {
            tracing::info!("{} {} signed in", session.role, session.user_id);
            let destination = session.role.dashboard();
            let session_id = state.sessions.create(session);
            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to(destination.path())).into_response()
        }
        Err(e) => {
            tracing::info!("Login refused for {}: {}", user_id, e);
            (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
    }
}

/// Forget the caller's session and listing; returns the role they had.
#[cfg(feature = "web")]
fn sign_out(state: &AppState, jar: CookieJar) -> (CookieJar, Option<Role>) {
    let role = jar.get(SESSION_COOKIE).and_then(|cookie| {
        state.forget_listing(cookie.value());
        state.sessions.remove(cookie.value()).map(|session| session.role)
    });

    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), role)
}

/// Handle user logout
///
/// Clears the session and goes back to the landing page.
#[cfg(feature = "web")]
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let (jar, _) = sign_out(&state, jar);
    (jar, Redirect::to(Route::Landing.path()))
}

/// Handle account switching
///
/// Clears the session and opens the other role's login page.
#[cfg(feature = "web")]
pub async fn handle_switch_account(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let (jar, role) = sign_out(&state, jar);
    (jar, Redirect::to(switch_account_target(role).path()))
}
