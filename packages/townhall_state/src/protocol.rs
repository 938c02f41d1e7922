//! Wire Protocol Types
//!
//! JSON shapes exchanged with the Q&A server, over HTTP and over the
//! per-session message socket. Keys are camelCase on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ProtocolError;

/// Identifiers arrive as either JSON strings or numbers depending on the
/// server build; both are normalised to their string form.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_id(deserializer).map(Self)
            }
        }

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

wire_id!(
    /// Identifier of a Q&A session.
    SessionId
);
wire_id!(
    /// Identifier of a question within a session.
    QuestionId
);
wire_id!(QuestionerId);
wire_id!(AnswererId);

/// Session header: identity, title and lock flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub name: String,
    #[serde(default)]
    pub locked: bool,
}

/// The session owner. The create endpoint includes the ids; the snapshot
/// embedded in `SessionState` may only carry the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answerer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answerer_id: Option<AnswererId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// A participant who asks and upvotes. `name: None` is an anonymous questioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questioner {
    pub questioner_id: QuestionerId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: QuestionId,
    pub text: String,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub answered: bool,
}

/// Full session state as pushed by the server on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session: SessionInfo,
    pub answerer: Answerer,
    #[serde(default)]
    pub questioners: Vec<Questioner>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Response of `GET /sessions/{id}/me`, encoded as an Either:
/// `{"Left": answerer}` or `{"Right": questioner}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhoAmI {
    Left(Answerer),
    Right(Questioner),
}

/// Messages sent FROM the server over `/sessions/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum ServerMessage {
    SessionState { session: SessionSnapshot },
    SessionLocked,
    QuestionAsked { question: Question },
    QuestionUpvoted { question: Question },
    QuestionAnswered { question: Question },
    QuestionerJoined { questioner: Questioner },
}

impl ServerMessage {
    /// Decode one text frame from the session socket.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed {
            reason: e.to_string(),
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ServerMessage::SessionState { .. } => "SessionState",
            ServerMessage::SessionLocked => "SessionLocked",
            ServerMessage::QuestionAsked { .. } => "QuestionAsked",
            ServerMessage::QuestionUpvoted { .. } => "QuestionUpvoted",
            ServerMessage::QuestionAnswered { .. } => "QuestionAnswered",
            ServerMessage::QuestionerJoined { .. } => "QuestionerJoined",
        }
    }
}

// =============================================================================
// HTTP request bodies
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub session_name: String,
    pub answerer_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub questioner_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskQuestionRequest {
    pub question: String,
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswererName {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTotals {
    #[serde(default)]
    pub questioners: u32,
    #[serde(default)]
    pub questions: u32,
    #[serde(default)]
    pub answered_questions: u32,
}

/// One row of `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSession {
    pub session: SessionInfo,
    pub answerer: AnswererName,
    #[serde(default)]
    pub totals: SessionTotals,
}
