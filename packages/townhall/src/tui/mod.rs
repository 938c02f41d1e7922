//! Terminal views. Each screen renders a slice of [`AppState`] and turns key
//! presses into dispatched actions; none of them mutate application state
//! directly.

pub mod dashboard;
pub mod input;
pub mod new_session;
pub mod session;

use anyhow::Result;
use ratatui::{
    DefaultTerminal,
    crossterm::event::{self, Event, KeyCode, KeyEventKind},
};
use std::time::Duration;
use tracing::debug;

use townhall_state::{Action, AppState, Route};

use crate::store::Store;

/// Result of handling one key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Dispatch(Action),
    Quit,
}

/// View-local state (selection, open prompts) that doesn't belong in the store.
#[derive(Default)]
struct Screens {
    dashboard: dashboard::DashboardView,
    new_session: new_session::NewSessionView,
    session: session::SessionView,
}

/// Run the UI until the user quits. The caller owns terminal init/restore.
pub fn run(terminal: &mut DefaultTerminal, store: &mut Store, tick: Duration) -> Result<()> {
    let mut screens = Screens::default();
    let mut last_route = store.state().route.clone();

    loop {
        store.pump();

        // Fresh screen state whenever the route changes
        if store.state().route != last_route {
            debug!(
                route = ?store.state().route,
                socket = ?store.socket_session(),
                "route changed"
            );
            last_route = store.state().route.clone();
            screens = Screens::default();
        }

        let api_url = store.api_url().to_string();
        terminal.draw(|frame| {
            let state = store.state();
            match &state.route {
                Route::Dashboard => screens.dashboard.draw(frame, &state.dashboard, &api_url),
                Route::NewSession => screens.new_session.draw(frame),
                Route::Session { session_id } => {
                    let fallback = state
                        .dashboard
                        .find(session_id)
                        .map(|row| row.session.name.as_str());
                    screens
                        .session
                        .draw(frame, session_id, &state.session, fallback)
                }
            }
        })?;

        // Poll with a short timeout so socket updates are drawn between key presses
        if !event::poll(tick)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(&mut screens, store.state(), key.code) {
            Outcome::Continue => {}
            Outcome::Dispatch(action) => store.dispatch(action),
            Outcome::Quit => return Ok(()),
        }
    }
}

fn handle_key(screens: &mut Screens, state: &AppState, code: KeyCode) -> Outcome {
    match &state.route {
        Route::Dashboard => screens.dashboard.handle_key(&state.dashboard, code),
        Route::NewSession => screens.new_session.handle_key(code),
        Route::Session { .. } => screens.session.handle_key(&state.session, code),
    }
}
