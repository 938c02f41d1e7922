//! Effect runtime: owns the application state, runs the reducer for every
//! dispatched action and executes the effects it returns.
//!
//! Network effects run as tokio tasks and report back over a channel; the UI
//! loop drains that channel with [`Store::pump`], so the reducer only ever
//! runs on the UI thread.

use std::future::Future;
use std::sync::mpsc;
use tracing::{debug, error};

use townhall_state::protocol::SessionId;
use townhall_state::{Action, AppState, DashboardAction, Effect, SessionAction, reduce};

use crate::api::{ApiClient, ApiError};
use crate::socket::{self, SocketHandle};

/// Work handed back to the UI thread by background tasks.
#[derive(Debug)]
pub enum Inbound {
    /// Follow-up to an HTTP effect.
    Effect(Action),
    /// Frame or lifecycle event from the socket opened for `session_id`.
    Socket {
        session_id: SessionId,
        action: Action,
    },
}

pub struct Store {
    state: AppState,
    api: ApiClient,
    runtime: tokio::runtime::Handle,
    tx: mpsc::Sender<Inbound>,
    rx: mpsc::Receiver<Inbound>,
    socket: Option<SocketHandle>,
}

impl Store {
    pub fn new(api: ApiClient, runtime: tokio::runtime::Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state: AppState::default(),
            api,
            runtime,
            tx,
            rx,
            socket: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn api_url(&self) -> &str {
        self.api.api_url()
    }

    /// Session id of the live socket, if one is open or connecting.
    pub fn socket_session(&self) -> Option<&SessionId> {
        self.socket.as_ref().map(|s| s.session_id())
    }

    pub fn dispatch(&mut self, action: Action) {
        debug!(action = action_name(&action), "dispatch");
        let effects = reduce(&mut self.state, action);
        for effect in effects {
            self.run(effect);
        }
    }

    /// Dispatch every action delivered by background tasks since the last call.
    /// Socket events for anything but the current session are dropped.
    /// Returns true if anything was dispatched.
    pub fn pump(&mut self) -> bool {
        let mut dispatched = false;
        while let Ok(inbound) = self.rx.try_recv() {
            let action = match inbound {
                Inbound::Effect(action) => action,
                Inbound::Socket { session_id, action } => {
                    if self.state.session.id.as_ref() != Some(&session_id) {
                        debug!(
                            %session_id,
                            action = action_name(&action),
                            "dropping event from stale socket"
                        );
                        continue;
                    }
                    action
                }
            };
            self.dispatch(action);
            dispatched = true;
        }
        dispatched
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Navigate(route) => self.dispatch(Action::Navigate(route)),

            Effect::OpenSocket { session_id } => {
                // Replacing the handle aborts the previous session's reader.
                self.socket = Some(socket::open_session_socket(
                    &self.runtime,
                    &self.api,
                    session_id,
                    self.tx.clone(),
                ));
            }

            Effect::CloseSocket => {
                if let Some(old) = self.socket.take() {
                    debug!(session_id = %old.session_id(), "closing session socket");
                }
            }

            Effect::FetchDashboard => self.spawn(|api| async move {
                Some(match api.list_sessions().await {
                    Ok(sessions) => Action::from(DashboardAction::Loaded(sessions)),
                    Err(e) => Action::from(DashboardAction::LoadFailed(e.to_string())),
                })
            }),

            Effect::CreateSession { topic, name } => self.spawn(|api| async move {
                api.create_session(&topic, &name)
                    .await
                    .map(|answerer| Action::from(SessionAction::Created(answerer)))
                    .map_err(|e| log_failure("create session", None, &e))
                    .ok()
            }),

            Effect::JoinSession { session_id, name } => self.spawn(|api| async move {
                api.join_session(&session_id, name.as_deref())
                    .await
                    .map(|questioner| {
                        Action::from(SessionAction::Joined {
                            session_id: session_id.clone(),
                            questioner,
                        })
                    })
                    .map_err(|e| log_failure("join session", Some(&session_id), &e))
                    .ok()
            }),

            Effect::WhoAmI { session_id } => self.spawn(|api| async move {
                api.who_am_i(&session_id)
                    .await
                    .map(|who| {
                        Action::from(SessionAction::Identified {
                            session_id: session_id.clone(),
                            who,
                        })
                    })
                    .map_err(|e| log_failure("rejoin session", Some(&session_id), &e))
                    .ok()
            }),

            Effect::AskQuestion { session_id, text } => self.spawn(|api| async move {
                if let Err(e) = api.ask_question(&session_id, &text).await {
                    log_failure("ask question", Some(&session_id), &e);
                }
                None::<Action>
            }),

            Effect::UpvoteQuestion {
                session_id,
                question_id,
            } => self.spawn(|api| async move {
                if let Err(e) = api.upvote_question(&session_id, &question_id).await {
                    log_failure("upvote question", Some(&session_id), &e);
                }
                None::<Action>
            }),

            Effect::AnswerQuestion {
                session_id,
                question_id,
            } => self.spawn(|api| async move {
                if let Err(e) = api.answer_question(&session_id, &question_id).await {
                    log_failure("answer question", Some(&session_id), &e);
                }
                None::<Action>
            }),
        }
    }

    /// Run `task` on the runtime and dispatch the action it yields, if any.
    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = Option<Action>> + Send + 'static,
    {
        let fut = task(self.api.clone());
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            if let Some(action) = fut.await {
                let _ = tx.send(Inbound::Effect(action));
            }
        });
    }
}

fn log_failure(op: &str, session_id: Option<&SessionId>, err: &ApiError) {
    match session_id {
        Some(id) => error!(session_id = %id, error = %err, "{} failed", op),
        None => error!(error = %err, "{} failed", op),
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Navigate(_) => "navigate",
        Action::Dashboard(DashboardAction::Reset) => "dashboard/reset",
        Action::Dashboard(DashboardAction::Loaded(_)) => "dashboard/loaded",
        Action::Dashboard(DashboardAction::LoadFailed(_)) => "dashboard/load_failed",
        Action::Session(a) => match a {
            SessionAction::Create { .. } => "session/create",
            SessionAction::Join { .. } => "session/join",
            SessionAction::Rejoin { .. } => "session/rejoin",
            SessionAction::AskQuestion(_) => "session/ask_question",
            SessionAction::UpvoteQuestion(_) => "session/upvote_question",
            SessionAction::AnswerQuestion(_) => "session/answer_question",
            SessionAction::Created(_) => "session/created",
            SessionAction::Joined { .. } => "session/joined",
            SessionAction::Identified { .. } => "session/identified",
            SessionAction::SocketOpened { .. } => "session/socket_opened",
            SessionAction::SocketClosed { .. } => "session/socket_closed",
            SessionAction::Load(_) => "session/load",
            SessionAction::Lock => "session/lock",
            SessionAction::QuestionAsked(_) => "session/question_asked",
            SessionAction::QuestionUpvoted(_) => "session/question_upvoted",
            SessionAction::QuestionAnswered(_) => "session/question_answered",
            SessionAction::QuestionerJoined(_) => "session/questioner_joined",
        },
    }
}
