//! Application root: current route plus the dashboard and session slices.

use crate::dashboard::{self, DashboardAction, DashboardState};
use crate::effect::Effect;
use crate::protocol::SessionId;
use crate::session::{self, SessionAction, SessionState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Dashboard,
    /// Create-session form.
    NewSession,
    Session {
        session_id: SessionId,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub route: Route,
    pub dashboard: DashboardState,
    pub session: SessionState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(Route),
    Dashboard(DashboardAction),
    Session(SessionAction),
}

impl From<DashboardAction> for Action {
    fn from(action: DashboardAction) -> Self {
        Action::Dashboard(action)
    }
}

impl From<SessionAction> for Action {
    fn from(action: SessionAction) -> Self {
        Action::Session(action)
    }
}

pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    match action {
        Action::Navigate(route) => {
            let entering_dashboard = route == Route::Dashboard;
            state.route = route;
            if entering_dashboard {
                dashboard::reduce(&mut state.dashboard, DashboardAction::Reset)
            } else {
                vec![]
            }
        }
        Action::Dashboard(action) => dashboard::reduce(&mut state.dashboard, action),
        Action::Session(action) => session::reduce(&mut state.session, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_route_is_dashboard() {
        assert_eq!(AppState::default().route, Route::Dashboard);
    }

    #[test]
    fn test_navigate_to_dashboard_refreshes() {
        let mut state = AppState {
            route: Route::NewSession,
            ..Default::default()
        };
        let effects = reduce(&mut state, Action::Navigate(Route::Dashboard));
        assert_eq!(state.route, Route::Dashboard);
        assert!(state.dashboard.loading);
        assert_eq!(effects, vec![Effect::FetchDashboard]);
    }

    #[test]
    fn test_navigate_elsewhere_has_no_effects() {
        let mut state = AppState::default();
        let effects = reduce(&mut state, Action::Navigate(Route::NewSession));
        assert_eq!(state.route, Route::NewSession);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_session_actions_route_to_session_slice() {
        let mut state = AppState::default();
        let effects = reduce(
            &mut state,
            SessionAction::Rejoin {
                session_id: SessionId::new("s1"),
            }
            .into(),
        );
        assert_eq!(state.session.id, Some(SessionId::new("s1")));
        // Route changes only once the runtime executes the Navigate effect.
        assert_eq!(state.route, Route::Dashboard);
        assert_eq!(effects.len(), 2);
    }
}
