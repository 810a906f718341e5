use super::input::LineBuffer;
use super::text::sanitize_console_text;

pub(crate) const PROMPT: &str = "> ";

/// The on-screen terminal: append-only text plus the line being typed.
///
/// The typed line is only committed to the text on submit, so a line is a
/// command only when it was typed right after a prompt.
pub(crate) struct Console {
    text: String,
    pub(crate) input: LineBuffer,
}

impl Console {
    pub(crate) fn new() -> Self {
        Self {
            text: String::new(),
            input: LineBuffer::default(),
        }
    }

    pub(crate) fn print(&mut self, line: &str) {
        self.text.push_str(&sanitize_console_text(line));
        self.text.push('\n');
    }

    pub(crate) fn print_prompt(&mut self) {
        self.text.push_str(PROMPT);
    }

    /// Trailer every finished command gets: a blank line and a fresh prompt.
    pub(crate) fn finish_block(&mut self) {
        self.print("");
        self.print_prompt();
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
        self.print_prompt();
    }

    pub(crate) fn prompt_active(&self) -> bool {
        self.last_line() == PROMPT
    }

    fn last_line(&self) -> &str {
        match self.text.rfind('\n') {
            Some(idx) => &self.text[idx + 1..],
            None => &self.text,
        }
    }

    /// Commits the typed line. Returns the command when it followed a prompt
    /// and is not blank; otherwise just re-establishes the prompt.
    pub(crate) fn submit(&mut self) -> Option<String> {
        let typed = self.input.take();
        let prompted = self.prompt_active();
        self.text.push_str(&sanitize_console_text(&typed));
        let command = typed.trim();
        if prompted && !command.is_empty() {
            self.text.push('\n');
            return Some(command.to_string());
        }
        self.finish_block();
        None
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_line(console: &mut Console, line: &str) {
        for ch in line.chars() {
            console.input.insert_char(ch);
        }
    }

    #[test]
    fn submit_after_prompt_returns_trimmed_command() {
        let mut console = Console::new();
        console.print_prompt();
        type_line(&mut console, "  help  ");

        assert_eq!(console.submit().as_deref(), Some("help"));
        assert_eq!(console.text(), ">   help  \n");
        assert!(console.input.text().is_empty());
    }

    #[test]
    fn blank_submit_reprints_prompt() {
        let mut console = Console::new();
        console.print_prompt();
        type_line(&mut console, "   ");

        assert_eq!(console.submit(), None);
        assert!(console.prompt_active());
    }

    #[test]
    fn text_typed_without_prompt_is_not_a_command() {
        let mut console = Console::new();
        console.print("Querying public IP...");
        type_line(&mut console, "help");

        assert_eq!(console.submit(), None);
        assert!(console.text().ends_with("help\n> "));
    }

    #[test]
    fn clear_leaves_only_the_prompt() {
        let mut console = Console::new();
        console.print("something");
        console.finish_block();
        console.clear();
        assert_eq!(console.text(), PROMPT);
    }
}
