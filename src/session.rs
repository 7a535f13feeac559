use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "web")]
use std::collections::HashMap;
#[cfg(feature = "web")]
use std::sync::RwLock;
#[cfg(feature = "web")]
use std::time::{Duration, SystemTime};
#[cfg(feature = "web")]
use uuid::Uuid;

/// Account kind returned by the login lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Educator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Educator => "educator",
        }
    }

    /// Navbar badge for the role
    pub fn badge(&self) -> &'static str {
        match self {
            Role::Student => "🎓 Student",
            Role::Educator => "👨‍🏫 Educator",
        }
    }

    /// Dashboard this role lands on after login
    pub fn dashboard(&self) -> Route {
        match self {
            Role::Student => Route::StudentDashboard,
            Role::Educator => Route::EducatorDashboard,
        }
    }

    pub fn login_page(&self) -> Route {
        match self {
            Role::Student => Route::StudentLogin,
            Role::Educator => Route::EducatorLogin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "educator" => Ok(Role::Educator),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Identity of the signed-in user.
///
/// Built once at login and handed to whatever needs to know who is
/// asking; nothing reads identity from shared ambient storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque user id issued by the login lookup
    pub user_id: String,

    /// Student or educator name, when known
    pub display_name: Option<String>,

    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, display_name: Option<String>, role: Role) -> Self {
        Session {
            user_id: user_id.into(),
            display_name: display_name.filter(|name| !name.trim().is_empty()),
            role,
        }
    }

    /// Name shown in the navbar and the dashboard greeting
    pub fn display_label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) => name,
            None if !self.user_id.is_empty() => &self.user_id,
            None => GUEST_LABEL,
        }
    }
}

pub const GUEST_LABEL: &str = "Guest";

/// Pages of the application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    StudentLogin,
    EducatorLogin,
    StudentDashboard,
    EducatorDashboard,
    NotFound,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::StudentLogin => "/student-login",
            Route::EducatorLogin => "/educator-login",
            Route::StudentDashboard => "/dashboard",
            Route::EducatorDashboard => "/educator-dashboard",
            Route::NotFound => "/404",
        }
    }

    /// Role a route is restricted to, if any
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::StudentDashboard => Some(Role::Student),
            Route::EducatorDashboard => Some(Role::Educator),
            _ => None,
        }
    }
}

/// Outcome of the route guard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Route),
}

/// Gate a route on the current session.
///
/// Restricted routes need a session whose role matches; anything else is
/// sent back to the landing page.
pub fn guard(route: Route, session: Option<&Session>) -> Access {
    match route.required_role() {
        None => Access::Allow,
        Some(required) => match session {
            Some(session) if !session.user_id.is_empty() && session.role == required => {
                Access::Allow
            }
            _ => Access::Redirect(Route::Landing),
        },
    }
}

/// Landing page phases
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandingState {
    SessionCheck,
    Landing,
}

impl LandingState {
    /// Resolve the session check. A signed-in user is sent on to their
    /// dashboard; everyone else gets the landing page.
    pub fn resolve(self, session: Option<&Session>) -> (LandingState, Option<Route>) {
        match self {
            LandingState::SessionCheck => match session {
                Some(session) if !session.user_id.is_empty() => {
                    (LandingState::Landing, Some(session.role.dashboard()))
                }
                _ => (LandingState::Landing, None),
            },
            LandingState::Landing => (LandingState::Landing, None),
        }
    }
}

/// Where "Switch Account" sends a user after signing them out
pub fn switch_account_target(role: Option<Role>) -> Route {
    match role {
        Some(Role::Student) => Route::EducatorLogin,
        _ => Route::StudentLogin,
    }
}

#[cfg(feature = "web")]
#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    expires_at: SystemTime,
}

/// In-memory session table keyed by the `session` cookie value
#[cfg(feature = "web")]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    ttl: Duration,
}

#[cfg(feature = "web")]
impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a session and return its new id
    pub fn create(&self, session: Session) -> String {
        let session_id = Uuid::new_v4().to_string();
        let expires_at = SystemTime::now() + self.ttl;

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(
            session_id.clone(),
            StoredSession {
                session,
                expires_at,
            },
        );

        session_id
    }

    /// Look up a live session. Expired entries are dropped on the way.
    pub fn validate(&self, session_id: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            match sessions.get(session_id) {
                Some(stored) if stored.expires_at > SystemTime::now() => {
                    return Some(stored.session.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        tracing::debug!("Session {} expired", session_id);
        self.remove(session_id);
        None
    }

    pub fn remove(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id).map(|stored| stored.session)
    }

    /// Drop every expired session; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        before - sessions.len()
    }
}
