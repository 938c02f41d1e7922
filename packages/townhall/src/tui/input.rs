use ratatui::{
    crossterm::event::KeyCode,
    style::{Color, Modifier, Style},
    text::Span,
};

/// What a key press did to a text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Edited,
    Submit,
    Cancel,
    /// Key not handled by the input (Tab, arrows up/down, ...).
    Ignored,
}

/// Single-line text field with a byte-offset cursor on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn value(&self) -> &str {
        &self.buffer
    }

    /// Trimmed value, `None` when blank.
    pub fn submitted(&self) -> Option<String> {
        let trimmed = self.buffer.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn handle_key(&mut self, code: KeyCode) -> InputEvent {
        match code {
            KeyCode::Enter => InputEvent::Submit,
            KeyCode::Esc => InputEvent::Cancel,
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let prev = self.prev_boundary();
                    self.buffer.remove(prev);
                    self.cursor = prev;
                }
                InputEvent::Edited
            }
            KeyCode::Left => {
                self.cursor = self.prev_boundary();
                InputEvent::Edited
            }
            KeyCode::Right => {
                self.cursor = self.next_boundary();
                InputEvent::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputEvent::Edited
            }
            KeyCode::End => {
                self.cursor = self.buffer.len();
                InputEvent::Edited
            }
            KeyCode::Char(c) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                InputEvent::Edited
            }
            _ => InputEvent::Ignored,
        }
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map_or(self.cursor, |c| self.cursor + c.len_utf8())
    }

    /// Render as spans; the character under the cursor is shown reversed
    /// when `focused`.
    pub fn spans<'a>(&self, focused: bool, placeholder: &str) -> Vec<Span<'a>> {
        let edit_style = Style::default().add_modifier(Modifier::UNDERLINED);
        if !focused {
            return if self.buffer.is_empty() {
                vec![Span::styled(
                    placeholder.to_string(),
                    Style::default().add_modifier(Modifier::DIM),
                )]
            } else {
                vec![Span::styled(self.buffer.clone(), edit_style)]
            };
        }

        let cursor_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED);
        let (before, rest) = self.buffer.split_at(self.cursor);
        let (under, after) = match rest.chars().next() {
            Some(c) => rest.split_at(c.len_utf8()),
            None => (" ", ""),
        };
        vec![
            Span::styled(before.to_string(), edit_style),
            Span::styled(under.to_string(), cursor_style),
            Span::styled(after.to_string(), edit_style),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> TextInput {
        let mut input = TextInput::new();
        for c in s.chars() {
            input.handle_key(KeyCode::Char(c));
        }
        input
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = typed("abc");
        assert_eq!(input.value(), "abc");
        input.handle_key(KeyCode::Backspace);
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn test_cursor_movement_inserts_in_middle() {
        let mut input = typed("ac");
        input.handle_key(KeyCode::Left);
        input.handle_key(KeyCode::Char('b'));
        assert_eq!(input.value(), "abc");
        input.handle_key(KeyCode::Home);
        input.handle_key(KeyCode::Char('>'));
        assert_eq!(input.value(), ">abc");
        input.handle_key(KeyCode::End);
        input.handle_key(KeyCode::Char('<'));
        assert_eq!(input.value(), ">abc<");
    }

    #[test]
    fn test_multibyte_chars() {
        let mut input = typed("né");
        input.handle_key(KeyCode::Left);
        input.handle_key(KeyCode::Backspace);
        assert_eq!(input.value(), "é");
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Char('!'));
        assert_eq!(input.value(), "é!");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut input = typed("x");
        input.handle_key(KeyCode::Home);
        input.handle_key(KeyCode::Backspace);
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn test_submit_cancel_and_ignored() {
        let mut input = typed("  hi  ");
        assert_eq!(input.handle_key(KeyCode::Enter), InputEvent::Submit);
        assert_eq!(input.handle_key(KeyCode::Esc), InputEvent::Cancel);
        assert_eq!(input.handle_key(KeyCode::Tab), InputEvent::Ignored);
        assert_eq!(input.submitted().as_deref(), Some("hi"));
        assert_eq!(typed("   ").submitted(), None);
    }
}
