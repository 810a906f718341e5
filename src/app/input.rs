use super::*;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single-line editable text with a byte-offset cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replaces the content and puts the cursor at the end.
    pub(crate) fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub(crate) fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub(crate) fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub(crate) fn backspace(&mut self) {
        if let Some((idx, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.text.replace_range(idx..self.cursor, "");
            self.cursor = idx;
        }
    }

    pub(crate) fn delete(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            let end = self.cursor + ch.len_utf8();
            self.text.replace_range(self.cursor..end, "");
        }
    }

    pub(crate) fn move_left(&mut self) {
        if let Some((idx, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub(crate) fn move_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub(crate) fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn move_end(&mut self) {
        self.cursor = self.text.len();
    }
}

impl App {
    pub(super) fn handle_paste_event(&mut self, raw: &str) {
        if !matches!(self.mode, Mode::Normal) {
            return;
        }
        // Both inputs are single-line.
        let normalized: String = raw
            .replace("\r\n", " ")
            .chars()
            .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
            .filter(|ch| !ch.is_control())
            .collect();
        if normalized.is_empty() {
            return;
        }
        self.focused_buffer().insert_str(&normalized);
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if matches!(self.mode, Mode::Alert) {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.dismiss_alert();
            }
            return;
        }

        if self.handle_global_key(key) {
            return;
        }

        match key.code {
            KeyCode::Enter => match self.focus {
                Focus::Console => self.submit_console(),
                Focus::Address => self.activate_address(),
            },
            KeyCode::Esc if self.focus == Focus::Address => self.sync_address(),
            KeyCode::Backspace => self.focused_buffer().backspace(),
            KeyCode::Delete => self.focused_buffer().delete(),
            KeyCode::Left => self.focused_buffer().move_left(),
            KeyCode::Right => self.focused_buffer().move_right(),
            KeyCode::Home => self.focused_buffer().move_home(),
            KeyCode::End => self.focused_buffer().move_end(),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.focused_buffer().insert_char(ch);
            }
            _ => {}
        }
    }

    /// Shell-wide shortcuts. Returns true when the key was consumed.
    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char(ch @ '1'..='3') if alt => {
                self.select_tab(ch as usize - '1' as usize);
            }
            KeyCode::F(n @ 1..=3) => {
                self.select_tab(n as usize - 1);
            }
            KeyCode::Left if alt => self.go_back(),
            KeyCode::Right if alt => self.go_forward(),
            KeyCode::Home if alt => self.go_home(),
            KeyCode::F(5) => self.reload(),
            KeyCode::F(12) => self.toggle_console(),
            KeyCode::Char('l') if ctrl => {
                self.focus = Focus::Address;
                self.address.move_end();
            }
            KeyCode::Tab | KeyCode::BackTab => self.cycle_focus(),
            _ => return false,
        }
        true
    }

    fn focused_buffer(&mut self) -> &mut LineBuffer {
        match self.focus {
            Focus::Console => &mut self.console.input,
            Focus::Address => &mut self.address,
        }
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Address if self.console_visible => Focus::Console,
            _ => Focus::Address,
        };
    }

    pub(super) fn toggle_console(&mut self) {
        self.console_visible = !self.console_visible;
        self.focus = if self.console_visible {
            Focus::Console
        } else {
            Focus::Address
        };
    }

    pub(super) fn submit_console(&mut self) {
        if let Some(command) = self.console.submit() {
            self.execute_command(&command);
        }
    }

    fn activate_address(&mut self) {
        let typed = self.address.text().to_string();
        self.load_uri_smart(&typed);
    }

    pub(super) fn dismiss_alert(&mut self) {
        self.alert = None;
        self.mode = Mode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::LineBuffer;

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut buf = LineBuffer::default();
        for ch in "añb".chars() {
            buf.insert_char(ch);
        }
        buf.move_left();
        buf.backspace();
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.cursor(), 1);

        buf.move_home();
        buf.delete();
        assert_eq!(buf.text(), "b");
        buf.move_end();
        buf.insert_str("cd");
        assert_eq!(buf.text(), "bcd");
        assert_eq!(buf.cursor(), 3);
    }

    #[test]
    fn take_resets_cursor() {
        let mut buf = LineBuffer::default();
        buf.set("https://example.org");
        assert_eq!(buf.take(), "https://example.org");
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);
        buf.move_left();
        buf.backspace();
        assert_eq!(buf.cursor(), 0);
    }
}
