use crate::app::Route;
use crate::protocol::{QuestionId, SessionId};

/// Side effects requested by the reducers. The reducers never perform I/O;
/// the runtime executes these and dispatches follow-up actions with the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `GET /sessions`, answered with `DashboardAction::Loaded`.
    FetchDashboard,
    /// `POST /sessions`, answered with `SessionAction::Created`.
    CreateSession { topic: String, name: String },
    /// `POST /sessions/{id}/join`, answered with `SessionAction::Joined`.
    JoinSession {
        session_id: SessionId,
        name: Option<String>,
    },
    /// `GET /sessions/{id}/me`, answered with `SessionAction::Identified`.
    WhoAmI { session_id: SessionId },
    /// Open the session message socket, replacing any previous one.
    OpenSocket { session_id: SessionId },
    /// Drop the current session socket, if any.
    CloseSocket,
    AskQuestion { session_id: SessionId, text: String },
    UpvoteQuestion {
        session_id: SessionId,
        question_id: QuestionId,
    },
    AnswerQuestion {
        session_id: SessionId,
        question_id: QuestionId,
    },
    Navigate(Route),
}
