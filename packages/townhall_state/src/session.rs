//! Session state reducer
//!
//! Owns everything scoped to the session currently on screen: who we are,
//! the session header, questioners and questions. User intents turn into
//! effects; HTTP results and socket messages turn into state patches.
//! Socket messages are applied in arrival order, last write wins.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::app::Route;
use crate::effect::Effect;
use crate::protocol::{
    Answerer, Question, QuestionId, Questioner, ServerMessage, SessionId, SessionSnapshot, WhoAmI,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Questioner,
    Answerer,
}

/// Our own identity within the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Me {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

impl Me {
    pub fn answerer(a: &Answerer) -> Self {
        Self {
            id: a.answerer_id.as_ref().map(|id| id.to_string()),
            name: Some(a.name.clone()),
            role: Role::Answerer,
        }
    }

    pub fn questioner(q: &Questioner) -> Self {
        Self {
            id: Some(q.questioner_id.to_string()),
            name: q.name.clone(),
            role: Role::Questioner,
        }
    }
}

impl From<&WhoAmI> for Me {
    fn from(who: &WhoAmI) -> Self {
        match who {
            WhoAmI::Left(a) => Me::answerer(a),
            WhoAmI::Right(q) => Me::questioner(q),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocketStatus {
    #[default]
    Detached,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub id: Option<SessionId>,
    pub name: Option<String>,
    pub locked: bool,
    /// True until the first full snapshot arrives.
    pub loading: bool,
    pub me: Option<Me>,
    pub socket: SocketStatus,
    pub answerer: Option<String>,
    /// Questioners that chose a display name, in join order.
    pub questioners: Vec<Questioner>,
    pub anonymous_questioners: u32,
    pub questions: BTreeMap<QuestionId, Question>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            locked: false,
            loading: true,
            me: None,
            socket: SocketStatus::Detached,
            answerer: None,
            questioners: Vec::new(),
            anonymous_questioners: 0,
            questions: BTreeMap::new(),
        }
    }
}

impl SessionState {
    pub fn is_answerer(&self) -> bool {
        self.me.as_ref().is_some_and(|me| me.role == Role::Answerer)
    }

    pub fn total_questioners(&self) -> usize {
        self.questioners.len() + self.anonymous_questioners as usize
    }

    /// Display order: open questions first, then by upvotes (descending),
    /// ties broken by id so the order is stable across redraws.
    pub fn sorted_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.values().collect();
        questions.sort_by(|a, b| {
            a.answered
                .cmp(&b.answered)
                .then(b.upvotes.cmp(&a.upvotes))
                .then(a.question_id.cmp(&b.question_id))
        });
        questions
    }

    fn upsert_question(&mut self, question: Question) {
        self.questions.insert(question.question_id.clone(), question);
    }
}

/// Split questioners into the named ones and a count of anonymous ones.
pub fn partition_questioners(questioners: Vec<Questioner>) -> (Vec<Questioner>, u32) {
    let total = questioners.len();
    let named: Vec<Questioner> = questioners
        .into_iter()
        .filter(|q| q.name.is_some())
        .collect();
    let anonymous = (total - named.len()) as u32;
    (named, anonymous)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    // === User intents ===
    Create {
        topic: String,
        name: String,
    },
    Join {
        session_id: SessionId,
        name: Option<String>,
    },
    Rejoin {
        session_id: SessionId,
    },
    AskQuestion(String),
    UpvoteQuestion(QuestionId),
    AnswerQuestion(QuestionId),

    // === HTTP results ===
    Created(Answerer),
    Joined {
        session_id: SessionId,
        questioner: Questioner,
    },
    Identified {
        session_id: SessionId,
        who: WhoAmI,
    },

    // === Socket lifecycle ===
    SocketOpened {
        session_id: SessionId,
    },
    SocketClosed {
        session_id: SessionId,
        reason: Option<String>,
    },

    // === Socket messages ===
    Load(SessionSnapshot),
    Lock,
    QuestionAsked(Question),
    QuestionUpvoted(Question),
    QuestionAnswered(Question),
    QuestionerJoined(Questioner),
}

impl From<ServerMessage> for SessionAction {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::SessionState { session } => SessionAction::Load(session),
            ServerMessage::SessionLocked => SessionAction::Lock,
            ServerMessage::QuestionAsked { question } => SessionAction::QuestionAsked(question),
            ServerMessage::QuestionUpvoted { question } => SessionAction::QuestionUpvoted(question),
            ServerMessage::QuestionAnswered { question } => {
                SessionAction::QuestionAnswered(question)
            }
            ServerMessage::QuestionerJoined { questioner } => {
                SessionAction::QuestionerJoined(questioner)
            }
        }
    }
}

pub fn reduce(state: &mut SessionState, action: SessionAction) -> Vec<Effect> {
    match action {
        SessionAction::Create { topic, name } => {
            *state = SessionState::default();
            vec![Effect::CloseSocket, Effect::CreateSession { topic, name }]
        }

        SessionAction::Join { session_id, name } => {
            *state = SessionState {
                id: Some(session_id.clone()),
                ..Default::default()
            };
            vec![
                Effect::CloseSocket,
                Effect::Navigate(Route::Session {
                    session_id: session_id.clone(),
                }),
                Effect::JoinSession { session_id, name },
            ]
        }

        SessionAction::Rejoin { session_id } => {
            *state = SessionState {
                id: Some(session_id.clone()),
                ..Default::default()
            };
            vec![
                Effect::CloseSocket,
                Effect::Navigate(Route::Session {
                    session_id: session_id.clone(),
                }),
                Effect::WhoAmI { session_id },
            ]
        }

        SessionAction::AskQuestion(text) => match &state.id {
            Some(session_id) => vec![Effect::AskQuestion {
                session_id: session_id.clone(),
                text,
            }],
            None => {
                warn!("ask ignored: no active session");
                vec![]
            }
        },

        SessionAction::UpvoteQuestion(question_id) => match &state.id {
            Some(session_id) => vec![Effect::UpvoteQuestion {
                session_id: session_id.clone(),
                question_id,
            }],
            None => {
                warn!(%question_id, "upvote ignored: no active session");
                vec![]
            }
        },

        SessionAction::AnswerQuestion(question_id) => match &state.id {
            Some(session_id) => vec![Effect::AnswerQuestion {
                session_id: session_id.clone(),
                question_id,
            }],
            None => {
                warn!(%question_id, "answer ignored: no active session");
                vec![]
            }
        },

        SessionAction::Created(answerer) => {
            state.me = Some(Me::answerer(&answerer));
            let Some(session_id) = answerer.session_id.clone() else {
                warn!(name = %answerer.name, "create response carried no session id");
                return vec![];
            };
            info!(%session_id, "session created");
            state.id = Some(session_id.clone());
            vec![
                Effect::OpenSocket {
                    session_id: session_id.clone(),
                },
                Effect::Navigate(Route::Session { session_id }),
            ]
        }

        SessionAction::Joined {
            session_id,
            questioner,
        } => {
            info!(%session_id, questioner_id = %questioner.questioner_id, "joined session");
            state.me = Some(Me::questioner(&questioner));
            vec![Effect::OpenSocket { session_id }]
        }

        SessionAction::Identified { session_id, who } => {
            state.me = Some(Me::from(&who));
            vec![Effect::OpenSocket { session_id }]
        }

        SessionAction::SocketOpened { session_id } => {
            if state.id.as_ref() != Some(&session_id) {
                debug!(%session_id, "ignoring open for another session's socket");
                return vec![];
            }
            debug!(%session_id, "session socket open");
            state.socket = SocketStatus::Open;
            vec![]
        }

        SessionAction::SocketClosed { session_id, reason } => {
            if state.id.as_ref() != Some(&session_id) {
                debug!(%session_id, "ignoring close for another session's socket");
                return vec![];
            }
            info!(%session_id, reason = ?reason, "session socket closed");
            state.socket = SocketStatus::Closed;
            vec![]
        }

        SessionAction::Load(snapshot) => {
            let (questioners, anonymous_questioners) =
                partition_questioners(snapshot.questioners);
            *state = SessionState {
                id: Some(snapshot.session.session_id),
                name: Some(snapshot.session.name),
                locked: snapshot.session.locked,
                loading: false,
                me: state.me.take(),
                socket: state.socket,
                answerer: Some(snapshot.answerer.name),
                questioners,
                anonymous_questioners,
                questions: snapshot
                    .questions
                    .into_iter()
                    .map(|q| (q.question_id.clone(), q))
                    .collect(),
            };
            vec![]
        }

        SessionAction::Lock => {
            state.locked = true;
            vec![]
        }

        SessionAction::QuestionAsked(question)
        | SessionAction::QuestionUpvoted(question)
        | SessionAction::QuestionAnswered(question) => {
            state.upsert_question(question);
            vec![]
        }

        SessionAction::QuestionerJoined(questioner) => {
            if questioner.name.is_some() {
                state.questioners.push(questioner);
            } else {
                state.anonymous_questioners += 1;
            }
            vec![]
        }
    }
}
