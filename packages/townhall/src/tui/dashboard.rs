use ratatui::{
    Frame,
    crossterm::event::KeyCode,
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding},
};

use townhall_state::protocol::{DashboardSession, SessionId};
use townhall_state::{Action, DashboardAction, DashboardState, Route, SessionAction};

use super::Outcome;
use super::input::{InputEvent, TextInput};

/// Name prompt shown before joining a session. Blank joins anonymously.
struct JoinPrompt {
    session_id: SessionId,
    input: TextInput,
}

#[derive(Default)]
pub struct DashboardView {
    list: ListState,
    join: Option<JoinPrompt>,
}

impl DashboardView {
    fn selected<'a>(&self, state: &'a DashboardState) -> Option<&'a DashboardSession> {
        state.sessions.get(self.list.selected().unwrap_or(0))
    }

    pub fn handle_key(&mut self, state: &DashboardState, code: KeyCode) -> Outcome {
        if let Some(prompt) = self.join.as_mut() {
            return match prompt.input.handle_key(code) {
                InputEvent::Submit => {
                    let name = prompt.input.submitted();
                    let session_id = prompt.session_id.clone();
                    self.join = None;
                    Outcome::Dispatch(Action::Session(SessionAction::Join { session_id, name }))
                }
                InputEvent::Cancel => {
                    self.join = None;
                    Outcome::Continue
                }
                InputEvent::Edited | InputEvent::Ignored => Outcome::Continue,
            };
        }

        let total = state.sessions.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Outcome::Quit,
            KeyCode::Down | KeyCode::Char('j') if total > 0 => {
                let i = self.list.selected().unwrap_or(0);
                self.list.select(Some((i + 1) % total));
                Outcome::Continue
            }
            KeyCode::Up | KeyCode::Char('k') if total > 0 => {
                let i = self.list.selected().unwrap_or(0);
                self.list.select(Some(if i == 0 { total - 1 } else { i - 1 }));
                Outcome::Continue
            }
            KeyCode::Enter => {
                if let Some(row) = self.selected(state) {
                    self.join = Some(JoinPrompt {
                        session_id: row.session.session_id.clone(),
                        input: TextInput::new(),
                    });
                }
                Outcome::Continue
            }
            KeyCode::Char('R') => match self.selected(state) {
                Some(row) => Outcome::Dispatch(Action::Session(SessionAction::Rejoin {
                    session_id: row.session.session_id.clone(),
                })),
                None => Outcome::Continue,
            },
            KeyCode::Char('c') => Outcome::Dispatch(Action::Navigate(Route::NewSession)),
            KeyCode::Char('r') => Outcome::Dispatch(Action::Dashboard(DashboardAction::Reset)),
            _ => Outcome::Continue,
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, state: &DashboardState, api_url: &str) {
        if self.list.selected().is_none() && !state.sessions.is_empty() {
            self.list.select(Some(0));
        }
        if let Some(i) = self.list.selected() {
            if i >= state.sessions.len() {
                self.list
                    .select(state.sessions.len().checked_sub(1));
            }
        }

        let mut items: Vec<ListItem> = state
            .sessions
            .iter()
            .map(|row| {
                let joining = self
                    .join
                    .as_ref()
                    .is_some_and(|p| p.session_id == row.session.session_id);
                session_item(row, joining.then(|| self.join.as_ref()).flatten())
            })
            .collect();
        if state.sessions.is_empty() {
            let text = if state.loading {
                "Loading..."
            } else {
                "No sessions yet. Press c to create one."
            };
            items.push(ListItem::new(Line::styled(
                text,
                Style::default().add_modifier(Modifier::DIM),
            )));
        }

        let bottom_bar = if self.join.is_some() {
            Line::raw(" type your name (blank = anonymous) · enter join · esc cancel ")
        } else {
            Line::raw(
                " ↑↓ navigate · enter join · R rejoin · c create · r refresh · q/esc quit ",
            )
        };
        let title = if state.loading && !state.sessions.is_empty() {
            " townhall: sessions (refreshing) "
        } else {
            " townhall: sessions "
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .title(
                        Line::styled(
                            format!(" {} ", api_url),
                            Style::default().add_modifier(Modifier::DIM),
                        )
                        .alignment(Alignment::Right),
                    )
                    .title_bottom(bottom_bar)
                    .borders(Borders::ALL)
                    .padding(Padding::horizontal(1)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, frame.area(), &mut self.list);
    }
}

fn session_item<'a>(row: &DashboardSession, join: Option<&JoinPrompt>) -> ListItem<'a> {
    let t = &row.totals;
    let mut spans = vec![
        Span::styled(
            format!("{:<28}", row.session.name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {:<16}", row.answerer.name)),
        Span::raw(format!(" {:>3} questioners", t.questioners)),
        Span::raw(format!(
            "  {}/{} answered",
            t.answered_questions, t.questions
        )),
    ];
    if row.session.locked {
        spans.push(Span::styled(
            "  locked",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    if let Some(prompt) = join {
        spans.push(Span::raw("   name: "));
        spans.extend(prompt.input.spans(true, ""));
    }
    ListItem::new(Line::from(spans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use townhall_state::protocol::{AnswererName, SessionInfo, SessionTotals};

    fn state_with(ids: &[&str]) -> DashboardState {
        DashboardState {
            sessions: ids
                .iter()
                .map(|id| DashboardSession {
                    session: SessionInfo {
                        session_id: SessionId::new(*id),
                        name: format!("session {id}"),
                        locked: false,
                    },
                    answerer: AnswererName {
                        name: "Ferris".into(),
                    },
                    totals: SessionTotals::default(),
                })
                .collect(),
            loading: false,
        }
    }

    #[test]
    fn test_enter_prompts_then_joins_with_name() {
        let state = state_with(&["a", "b"]);
        let mut view = DashboardView::default();
        view.handle_key(&state, KeyCode::Down);
        assert_eq!(view.handle_key(&state, KeyCode::Enter), Outcome::Continue);
        for c in "Ada".chars() {
            view.handle_key(&state, KeyCode::Char(c));
        }
        assert_eq!(
            view.handle_key(&state, KeyCode::Enter),
            Outcome::Dispatch(Action::Session(SessionAction::Join {
                session_id: SessionId::new("b"),
                name: Some("Ada".into()),
            }))
        );
        assert!(view.join.is_none());
    }

    #[test]
    fn test_blank_name_joins_anonymously() {
        let state = state_with(&["a"]);
        let mut view = DashboardView::default();
        view.handle_key(&state, KeyCode::Enter);
        assert_eq!(
            view.handle_key(&state, KeyCode::Enter),
            Outcome::Dispatch(Action::Session(SessionAction::Join {
                session_id: SessionId::new("a"),
                name: None,
            }))
        );
    }

    #[test]
    fn test_prompt_swallows_quit_key() {
        let state = state_with(&["a"]);
        let mut view = DashboardView::default();
        view.handle_key(&state, KeyCode::Enter);
        assert_eq!(view.handle_key(&state, KeyCode::Char('q')), Outcome::Continue);
        assert_eq!(view.handle_key(&state, KeyCode::Esc), Outcome::Continue);
        assert_eq!(view.handle_key(&state, KeyCode::Char('q')), Outcome::Quit);
    }

    #[test]
    fn test_navigation_keys() {
        let state = state_with(&["a", "b"]);
        let mut view = DashboardView::default();
        assert_eq!(
            view.handle_key(&state, KeyCode::Char('c')),
            Outcome::Dispatch(Action::Navigate(Route::NewSession))
        );
        assert_eq!(
            view.handle_key(&state, KeyCode::Char('r')),
            Outcome::Dispatch(Action::Dashboard(DashboardAction::Reset))
        );
        view.handle_key(&state, KeyCode::Up);
        assert_eq!(
            view.handle_key(&state, KeyCode::Char('R')),
            Outcome::Dispatch(Action::Session(SessionAction::Rejoin {
                session_id: SessionId::new("b"),
            }))
        );
    }

    #[test]
    fn test_empty_list_ignores_selection_keys() {
        let state = state_with(&[]);
        let mut view = DashboardView::default();
        assert_eq!(view.handle_key(&state, KeyCode::Down), Outcome::Continue);
        assert_eq!(view.handle_key(&state, KeyCode::Enter), Outcome::Continue);
        assert!(view.join.is_none());
    }
}
