use tracing::{debug, warn};

use crate::effect::Effect;
use crate::protocol::{DashboardSession, SessionId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub sessions: Vec<DashboardSession>,
    pub loading: bool,
}

impl DashboardState {
    pub fn find(&self, session_id: &SessionId) -> Option<&DashboardSession> {
        self.sessions
            .iter()
            .find(|s| &s.session.session_id == session_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    /// Refresh the session list. Keeps the stale list visible while loading.
    Reset,
    Loaded(Vec<DashboardSession>),
    LoadFailed(String),
}

pub fn reduce(state: &mut DashboardState, action: DashboardAction) -> Vec<Effect> {
    match action {
        DashboardAction::Reset => {
            state.loading = true;
            vec![Effect::FetchDashboard]
        }
        DashboardAction::Loaded(sessions) => {
            debug!(count = sessions.len(), "dashboard loaded");
            state.sessions = sessions;
            state.loading = false;
            vec![]
        }
        DashboardAction::LoadFailed(reason) => {
            warn!(%reason, "dashboard load failed");
            state.loading = false;
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AnswererName, SessionInfo, SessionTotals};

    fn row(id: &str) -> DashboardSession {
        DashboardSession {
            session: SessionInfo {
                session_id: SessionId::new(id),
                name: format!("session {id}"),
                locked: false,
            },
            answerer: AnswererName {
                name: "Ferris".into(),
            },
            totals: SessionTotals {
                questioners: 4,
                questions: 3,
                answered_questions: 1,
            },
        }
    }

    #[test]
    fn test_reset_sets_loading_and_fetches() {
        let mut state = DashboardState::default();
        let effects = reduce(&mut state, DashboardAction::Reset);
        assert!(state.loading);
        assert_eq!(effects, vec![Effect::FetchDashboard]);
    }

    #[test]
    fn test_reset_keeps_previous_rows() {
        let mut state = DashboardState {
            sessions: vec![row("a")],
            loading: false,
        };
        reduce(&mut state, DashboardAction::Reset);
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn test_loaded_replaces_rows() {
        let mut state = DashboardState {
            sessions: vec![row("old")],
            loading: true,
        };
        reduce(&mut state, DashboardAction::Loaded(vec![row("a"), row("b")]));
        assert!(!state.loading);
        assert_eq!(state.sessions.len(), 2);
        assert!(state.find(&SessionId::new("b")).is_some());
        assert!(state.find(&SessionId::new("old")).is_none());
    }

    #[test]
    fn test_load_failed_clears_loading() {
        let mut state = DashboardState {
            sessions: vec![],
            loading: true,
        };
        let effects = reduce(&mut state, DashboardAction::LoadFailed("boom".into()));
        assert!(effects.is_empty());
        assert!(!state.loading);
    }
}
