use ratatui::{
    Frame,
    crossterm::event::KeyCode,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph},
};

use townhall_state::protocol::{Question, QuestionId, SessionId};
use townhall_state::{Action, Role, Route, SessionAction, SessionState, SocketStatus};

use super::Outcome;
use super::input::{InputEvent, TextInput};

#[derive(Default)]
pub struct SessionView {
    list: ListState,
    /// Follows the question, not the row: live upvotes reorder the list.
    selected: Option<QuestionId>,
    ask: Option<TextInput>,
}

impl SessionView {
    /// Re-point the list at the selected question after a reorder, falling
    /// back to the clamped row when that question is gone.
    fn restore_selection(&mut self, questions: &[&Question]) -> Option<usize> {
        let index = self
            .selected
            .as_ref()
            .and_then(|id| questions.iter().position(|q| &q.question_id == id))
            .or_else(|| {
                questions
                    .len()
                    .checked_sub(1)
                    .map(|last| self.list.selected().unwrap_or(0).min(last))
            });
        self.list.select(index);
        self.selected = index.map(|i| questions[i].question_id.clone());
        index
    }

    fn select(&mut self, questions: &[&Question], index: usize) {
        self.list.select(Some(index));
        self.selected = Some(questions[index].question_id.clone());
    }

    fn can_ask(state: &SessionState) -> bool {
        !state.locked && state.me.as_ref().is_some_and(|me| me.role == Role::Questioner)
    }

    pub fn handle_key(&mut self, state: &SessionState, code: KeyCode) -> Outcome {
        if let Some(input) = self.ask.as_mut() {
            return match input.handle_key(code) {
                InputEvent::Submit => {
                    let text = input.submitted();
                    self.ask = None;
                    match text {
                        Some(text) => {
                            Outcome::Dispatch(Action::Session(SessionAction::AskQuestion(text)))
                        }
                        None => Outcome::Continue,
                    }
                }
                InputEvent::Cancel => {
                    self.ask = None;
                    Outcome::Continue
                }
                InputEvent::Edited | InputEvent::Ignored => Outcome::Continue,
            };
        }

        let questions = state.sorted_questions();
        let current = self.restore_selection(&questions);
        let total = questions.len();
        match code {
            KeyCode::Char('q') => Outcome::Quit,
            KeyCode::Esc | KeyCode::Char('b') => {
                Outcome::Dispatch(Action::Navigate(Route::Dashboard))
            }
            KeyCode::Down | KeyCode::Char('j') if total > 0 => {
                let i = current.unwrap_or(0);
                self.select(&questions, (i + 1) % total);
                Outcome::Continue
            }
            KeyCode::Up | KeyCode::Char('k') if total > 0 => {
                let i = current.unwrap_or(0);
                self.select(&questions, if i == 0 { total - 1 } else { i - 1 });
                Outcome::Continue
            }
            KeyCode::Char('a') if Self::can_ask(state) => {
                self.ask = Some(TextInput::new());
                Outcome::Continue
            }
            KeyCode::Char('u') if !state.is_answerer() => match current.map(|i| questions[i]) {
                Some(q) if !q.answered => Outcome::Dispatch(Action::Session(
                    SessionAction::UpvoteQuestion(q.question_id.clone()),
                )),
                _ => Outcome::Continue,
            },
            KeyCode::Enter if state.is_answerer() => match current.map(|i| questions[i]) {
                Some(q) if !q.answered => Outcome::Dispatch(Action::Session(
                    SessionAction::AnswerQuestion(q.question_id.clone()),
                )),
                _ => Outcome::Continue,
            },
            _ => Outcome::Continue,
        }
    }

    /// `fallback_title` is the dashboard's name for the session, shown until
    /// the snapshot arrives.
    pub fn draw(
        &mut self,
        frame: &mut Frame,
        session_id: &SessionId,
        state: &SessionState,
        fallback_title: Option<&str>,
    ) {
        let questions = state.sorted_questions();
        self.restore_selection(&questions);

        let title = match state.name.as_deref().or(fallback_title) {
            Some(name) => format!(" {} ", name),
            None => format!(" session {} ", session_id),
        };
        let block = Block::default()
            .title(title)
            .title_bottom(self.help_line(state))
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1));
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [header_area, list_area, input_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(header_lines(state)), header_area);

        let items: Vec<ListItem> = if state.loading {
            vec![ListItem::new(Line::styled(
                "Loading...",
                Style::default().add_modifier(Modifier::DIM),
            ))]
        } else if questions.is_empty() {
            vec![ListItem::new(Line::styled(
                "No questions yet.",
                Style::default().add_modifier(Modifier::DIM),
            ))]
        } else {
            questions.iter().map(|q| question_item(q)).collect()
        };
        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, list_area, &mut self.list);

        if let Some(input) = &self.ask {
            let mut spans = vec![Span::styled(
                "Ask: ",
                Style::default().add_modifier(Modifier::BOLD),
            )];
            spans.extend(input.spans(true, ""));
            frame.render_widget(Paragraph::new(Line::from(spans)), input_area);
        }
    }

    fn help_line(&self, state: &SessionState) -> Line<'static> {
        if self.ask.is_some() {
            return Line::raw(" type your question · enter send · esc cancel ");
        }
        let mut help = String::from(" ↑↓ navigate");
        if Self::can_ask(state) {
            help.push_str(" · a ask");
        }
        match state.me.as_ref().map(|me| me.role) {
            Some(Role::Questioner) => help.push_str(" · u upvote"),
            Some(Role::Answerer) => help.push_str(" · enter answer"),
            None => {}
        }
        help.push_str(" · esc dashboard · q quit ");
        Line::raw(help)
    }
}

fn header_lines(state: &SessionState) -> Vec<Line<'static>> {
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut first = vec![
        Span::raw("Answerer: "),
        Span::styled(
            state.answerer.clone().unwrap_or_else(|| "?".to_string()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if state.locked {
        first.push(Span::styled(
            "  [locked]",
            Style::default().fg(Color::Yellow),
        ));
    }
    match state.socket {
        SocketStatus::Detached => first.push(Span::styled("  connecting...", dim)),
        SocketStatus::Open => {}
        SocketStatus::Closed => first.push(Span::styled(
            "  [disconnected]",
            Style::default().fg(Color::Red),
        )),
    }

    let names: Vec<&str> = state
        .questioners
        .iter()
        .filter_map(|q| q.name.as_deref())
        .collect();
    let mut second = format!(
        "Questioners ({}): {}",
        state.total_questioners(),
        names.join(", ")
    );
    if state.anonymous_questioners > 0 {
        if !names.is_empty() {
            second.push_str(", ");
        }
        second.push_str(&format!("{} anonymous", state.anonymous_questioners));
    }

    let me = match &state.me {
        Some(me) => {
            let role = match me.role {
                Role::Answerer => "answerer",
                Role::Questioner => "questioner",
            };
            format!(
                "You: {} ({})",
                me.name.as_deref().unwrap_or("anonymous"),
                role
            )
        }
        None => "You: joining...".to_string(),
    };

    vec![
        Line::from(first),
        Line::raw(second),
        Line::styled(me, dim),
    ]
}

fn question_item<'a>(q: &Question) -> ListItem<'a> {
    let mut spans = vec![Span::styled(
        format!("▲ {:>3}  ", q.upvotes),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if q.answered {
        spans.push(Span::styled(
            q.text.clone(),
            Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT),
        ));
        spans.push(Span::styled("  ✓ answered", Style::default().fg(Color::Green)));
    } else {
        spans.push(Span::raw(q.text.clone()));
    }
    ListItem::new(Line::from(spans))
}
