//! Create-session form: topic and answerer name.

use ratatui::{
    Frame,
    crossterm::event::KeyCode,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

use townhall_state::{Action, Route, SessionAction};

use super::Outcome;
use super::input::{InputEvent, TextInput};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Field {
    #[default]
    Topic,
    Name,
}

#[derive(Default)]
pub struct NewSessionView {
    topic: TextInput,
    name: TextInput,
    focus: Field,
    error: Option<&'static str>,
}

impl NewSessionView {
    fn focused(&mut self) -> &mut TextInput {
        match self.focus {
            Field::Topic => &mut self.topic,
            Field::Name => &mut self.name,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Topic => Field::Name,
            Field::Name => Field::Topic,
        };
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Outcome {
        match code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.toggle_focus();
                return Outcome::Continue;
            }
            _ => {}
        }

        match self.focused().handle_key(code) {
            InputEvent::Cancel => Outcome::Dispatch(Action::Navigate(Route::Dashboard)),
            InputEvent::Submit if self.focus == Field::Topic => {
                self.focus = Field::Name;
                Outcome::Continue
            }
            InputEvent::Submit => match (self.topic.submitted(), self.name.submitted()) {
                (Some(topic), Some(name)) => {
                    Outcome::Dispatch(Action::Session(SessionAction::Create { topic, name }))
                }
                (None, _) => {
                    self.error = Some("topic is required");
                    self.focus = Field::Topic;
                    Outcome::Continue
                }
                (_, None) => {
                    self.error = Some("your name is required");
                    Outcome::Continue
                }
            },
            InputEvent::Edited | InputEvent::Ignored => {
                self.error = None;
                Outcome::Continue
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let block = Block::default()
            .title(" townhall: new session ")
            .title_bottom(Line::raw(
                " tab switch field · enter next/create · esc back ",
            ))
            .borders(Borders::ALL)
            .padding(Padding::uniform(1));
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [topic_area, name_area, _, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let label = |text: &'static str, focused: bool| {
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Span::styled(format!("{:<12}", text), style)
        };

        let mut topic_line = vec![label("Topic", self.focus == Field::Topic)];
        topic_line.extend(
            self.topic
                .spans(self.focus == Field::Topic, "What's the session about?"),
        );
        frame.render_widget(Paragraph::new(Line::from(topic_line)), topic_area);

        let mut name_line = vec![label("Your name", self.focus == Field::Name)];
        name_line.extend(self.name.spans(self.focus == Field::Name, "Dexter"));
        frame.render_widget(Paragraph::new(Line::from(name_line)), name_area);

        if let Some(error) = self.error {
            frame.render_widget(
                Paragraph::new(Line::styled(error, Style::default().fg(Color::Red))),
                status_area,
            );
        }
    }
}
