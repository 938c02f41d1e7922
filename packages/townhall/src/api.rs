//! HTTP client for the session lifecycle endpoints.
//!
//! All calls share one cookie jar: the server identifies questioners and
//! answerers by the cookie it sets on create/join, and the session socket
//! handshake forwards the same cookies.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request as SocketRequest;
use tracing::debug;

use townhall_state::protocol::{
    Answerer, AskQuestionRequest, CreateSessionRequest, DashboardSession, JoinSessionRequest,
    QuestionId, Questioner, SessionId, WhoAmI,
};

use crate::config::ClientConfig;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("server is unavailable")]
    Unavailable,

    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: Method,
        path: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Request(reqwest::Error),
}

impl ApiError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unavailable
        } else if err.is_decode() {
            Self::Decode(err)
        } else {
            Self::Request(err)
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    api_base: Url,
    api_url: String,
    ws_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let api_base = Url::parse(&config.api_url).map_err(|e| ApiError::InvalidUrl {
            url: config.api_url.clone(),
            reason: e.to_string(),
        })?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(ApiError::Request)?;
        Ok(Self {
            http,
            jar,
            api_base,
            api_url: config.api_url.clone(),
            ws_url: config.ws_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn socket_url(&self, session_id: &SessionId) -> String {
        format!("{}/sessions/{}/messages", self.ws_url, session_id)
    }

    /// Handshake request for the session socket, carrying the jar's cookies.
    pub fn socket_request(&self, session_id: &SessionId) -> Result<SocketRequest, ApiError> {
        let url = self.socket_url(session_id);
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ApiError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        if let Some(cookies) = self.jar.cookies(&self.api_base) {
            request.headers_mut().insert(COOKIE, cookies);
        }
        Ok(request)
    }

    pub async fn list_sessions(&self) -> Result<Vec<DashboardSession>, ApiError> {
        let path = "/sessions".to_string();
        self.fetch_json(self.request(Method::GET, &path), Method::GET, &path)
            .await
    }

    pub async fn create_session(&self, topic: &str, name: &str) -> Result<Answerer, ApiError> {
        let path = "/sessions".to_string();
        let body = CreateSessionRequest {
            session_name: topic.to_string(),
            answerer_name: name.to_string(),
        };
        self.fetch_json(
            self.request(Method::POST, &path).json(&body),
            Method::POST,
            &path,
        )
        .await
    }

    pub async fn join_session(
        &self,
        session_id: &SessionId,
        name: Option<&str>,
    ) -> Result<Questioner, ApiError> {
        let path = format!("/sessions/{}/join", session_id);
        let body = JoinSessionRequest {
            questioner_name: name.map(str::to_string),
        };
        self.fetch_json(
            self.request(Method::POST, &path).json(&body),
            Method::POST,
            &path,
        )
        .await
    }

    pub async fn who_am_i(&self, session_id: &SessionId) -> Result<WhoAmI, ApiError> {
        let path = format!("/sessions/{}/me", session_id);
        self.fetch_json(self.request(Method::GET, &path), Method::GET, &path)
            .await
    }

    pub async fn ask_question(&self, session_id: &SessionId, text: &str) -> Result<(), ApiError> {
        let path = format!("/sessions/{}/questions/ask", session_id);
        let body = AskQuestionRequest {
            question: text.to_string(),
        };
        self.send(
            self.request(Method::POST, &path).json(&body),
            Method::POST,
            &path,
        )
        .await
        .map(drop)
    }

    pub async fn upvote_question(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
    ) -> Result<(), ApiError> {
        let path = format!("/sessions/{}/questions/{}/upvote", session_id, question_id);
        self.send(self.request(Method::POST, &path), Method::POST, &path)
            .await
            .map(drop)
    }

    pub async fn answer_question(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
    ) -> Result<(), ApiError> {
        let path = format!("/sessions/{}/questions/{}/answer", session_id, question_id);
        self.send(self.request(Method::POST, &path), Method::POST, &path)
            .await
            .map(drop)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .header(ACCEPT, "application/json")
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<Response, ApiError> {
        debug!(%method, path, "api request");
        let resp = builder.send().await.map_err(ApiError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let resp = self.send(builder, method, path).await?;
        resp.json().await.map_err(ApiError::from_reqwest)
    }
}
