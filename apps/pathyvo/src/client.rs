//! # Pathyvo HTTP Client
//!
//! Typed wrapper around the Pathyvo REST API.
//!
//! The bearer token is read from the [`SessionStore`] on every request. Any
//! 401 response clears the stored session before the error is returned, so
//! the next command starts signed out.

use crate::config::Config;
use crate::error::ClientError;
use crate::session::SessionStore;
use pathyvo_core::{
    Achievement, LoginResponse, MentorReply, Milestone, MilestoneId, RecentMilestone, Roadmap,
    RoadmapConversation, RoadmapId, StoredMessage, User, UserAchievement, WeeklyCount,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

// =============================================================================
// REQUEST / RESPONSE BODIES
// =============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    message: &'a str,
    roadmap_id: RoadmapId,
}

#[derive(Debug, Serialize)]
struct NewRoadmapConversation<'a> {
    field: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Body of `PUT /roadmaps/{id}/complete-all`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompleteAllResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub completed_count: u32,
}

/// FastAPI error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the Pathyvo backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Mutex<SessionStore>,
}

impl ApiClient {
    /// Create a client for `config.api_url` using `session` for credentials.
    pub fn new(config: &Config, session: SessionStore) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pathyvo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", config.api_url)))?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            session: Mutex::new(session),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session(&self) -> MutexGuard<'_, SessionStore> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The signed-in user recorded in the session, if any.
    pub fn current_user(&self) -> Option<User> {
        self.session().current_user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    fn require_user(&self) -> Result<User, ClientError> {
        self.current_user().ok_or(ClientError::NotLoggedIn)
    }

    /// Build a request with Bearer auth when a session exists.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(token) = self.session().token() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::ConnectionFailed(format!("{}: request timed out", self.base_url))
            } else {
                ClientError::ConnectionFailed(format!("{}: {e}", self.base_url))
            }
        })
    }

    /// Check the status code and decode the JSON body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.clear_session();
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = error_message(resp.text().await.unwrap_or_default());
            return Err(match status {
                reqwest::StatusCode::FORBIDDEN => ClientError::Forbidden(message),
                reqwest::StatusCode::NOT_FOUND => ClientError::NotFound(message),
                s if s.is_server_error() => ClientError::ServerError(s.as_u16(), message),
                s => ClientError::UnexpectedStatus(s.as_u16(), message),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }

    fn clear_session(&self) {
        let mut session = self.session();
        if !session.is_authenticated() {
            return;
        }
        tracing::warn!(
            event = "session_cleared",
            reason = "unauthorized",
            "Backend rejected the stored token; signing out"
        );
        if let Err(e) = session.logout() {
            tracing::warn!("Failed to remove session file: {}", e);
        }
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// POST /auth/login, storing the returned token.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/auth/login")
            .json(&LoginRequest { email, password });
        let response: LoginResponse = self.call(req).await?;
        self.session().login(&response)?;
        tracing::info!(user_id = %response.user_id, "Logged in");
        Ok(response.user())
    }

    /// Drop the local session. The backend keeps no server-side state.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session().logout()?;
        Ok(())
    }

    /// GET /auth/me, refreshing the stored profile.
    pub async fn me(&self) -> Result<User, ClientError> {
        self.require_user()?;
        let user: User = self
            .call(self.request(reqwest::Method::GET, "/auth/me"))
            .await?;
        self.session().update_user(user.clone())?;
        Ok(user)
    }

    // =========================================================================
    // ROADMAPS
    // =========================================================================

    /// GET /roadmaps/user/{user_id} for the signed-in user.
    pub async fn list_roadmaps(&self) -> Result<Vec<Roadmap>, ClientError> {
        let user = self.require_user()?;
        let path = format!("/roadmaps/user/{}", user.id);
        self.call(self.request(reqwest::Method::GET, &path)).await
    }

    /// GET /roadmaps/{id}
    pub async fn get_roadmap(&self, id: RoadmapId) -> Result<Roadmap, ClientError> {
        let path = format!("/roadmaps/{id}");
        self.call(self.request(reqwest::Method::GET, &path)).await
    }

    /// PUT /roadmaps/milestones/{id}/complete
    pub async fn complete_milestone(&self, id: MilestoneId) -> Result<Milestone, ClientError> {
        let path = format!("/roadmaps/milestones/{id}/complete");
        self.call(self.request(reqwest::Method::PUT, &path)).await
    }

    /// PUT /roadmaps/{id}/complete-all
    pub async fn complete_all(&self, id: RoadmapId) -> Result<CompleteAllResponse, ClientError> {
        let path = format!("/roadmaps/{id}/complete-all");
        self.call(self.request(reqwest::Method::PUT, &path)).await
    }

    /// PUT /roadmaps/{id} with a new title.
    pub async fn rename_roadmap(&self, id: RoadmapId, title: &str) -> Result<Roadmap, ClientError> {
        let path = format!("/roadmaps/{id}");
        let req = self
            .request(reqwest::Method::PUT, &path)
            .json(&RenameRequest { title });
        self.call(req).await
    }

    /// DELETE /roadmaps/{id}
    pub async fn delete_roadmap(&self, id: RoadmapId) -> Result<(), ClientError> {
        let path = format!("/roadmaps/{id}");
        let _: serde::de::IgnoredAny = self
            .call(self.request(reqwest::Method::DELETE, &path))
            .await?;
        Ok(())
    }

    // =========================================================================
    // ACHIEVEMENTS & ANALYTICS
    // =========================================================================

    /// GET /achievements/
    pub async fn achievements(&self) -> Result<Vec<Achievement>, ClientError> {
        self.call(self.request(reqwest::Method::GET, "/achievements/"))
            .await
    }

    /// GET /achievements/user
    pub async fn user_achievements(&self) -> Result<Vec<UserAchievement>, ClientError> {
        self.call(self.request(reqwest::Method::GET, "/achievements/user"))
            .await
    }

    /// GET /roadmaps/analytics/milestones-by-date
    pub async fn milestones_by_week(&self) -> Result<Vec<WeeklyCount>, ClientError> {
        self.call(self.request(
            reqwest::Method::GET,
            "/roadmaps/analytics/milestones-by-date",
        ))
        .await
    }

    /// GET /roadmaps/analytics/recent-milestones?limit=N
    pub async fn recent_milestones(
        &self,
        limit: usize,
    ) -> Result<Vec<RecentMilestone>, ClientError> {
        let req = self
            .request(
                reqwest::Method::GET,
                "/roadmaps/analytics/recent-milestones",
            )
            .query(&[("limit", limit)]);
        self.call(req).await
    }

    // =========================================================================
    // MENTOR CHAT
    // =========================================================================

    /// POST /ai/create-roadmap-conversation: create an empty roadmap in
    /// `field` and open its mentor conversation.
    pub async fn create_roadmap_conversation(
        &self,
        field: &str,
        description: Option<&str>,
    ) -> Result<RoadmapConversation, ClientError> {
        self.require_user()?;
        let req = self
            .request(reqwest::Method::POST, "/ai/create-roadmap-conversation")
            .json(&NewRoadmapConversation { field, description });
        let opening: RoadmapConversation = self.call(req).await?;
        tracing::info!(roadmap = %opening.roadmap_id, field, "Roadmap conversation created");
        Ok(opening)
    }

    /// GET /chat/roadmap/{id}: the stored transcript.
    pub async fn chat_history(
        &self,
        roadmap_id: RoadmapId,
    ) -> Result<Vec<StoredMessage>, ClientError> {
        let path = format!("/chat/roadmap/{roadmap_id}");
        self.call(self.request(reqwest::Method::GET, &path)).await
    }

    /// POST /ai/chat with one user turn.
    pub async fn chat(
        &self,
        roadmap_id: RoadmapId,
        message: &str,
    ) -> Result<MentorReply, ClientError> {
        self.require_user()?;
        let req = self
            .request(reqwest::Method::POST, "/ai/chat")
            .json(&ChatTurn { message, roadmap_id });
        self.call(req).await
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Roadmap not found"}"#.to_string()),
            "Roadmap not found"
        );
        assert_eq!(error_message("Bad Gateway".to_string()), "Bad Gateway");
        assert_eq!(
            error_message(r#"{"detail": [{"loc": ["body"]}]}"#.to_string()),
            r#"[{"loc":["body"]}]"#
        );
    }
}
