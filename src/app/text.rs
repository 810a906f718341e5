/// Strips terminal escape sequences and stray control characters from text
/// headed for the console panel. Newlines are kept; a lone carriage return
/// becomes a line break and tabs become a single space.
pub(super) fn sanitize_console_text(text: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Plain,
        Escape,
        Csi,
        Osc,
        OscEscape,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Plain;
    let mut prev_cr = false;

    for ch in text.chars() {
        match state {
            State::Escape => {
                state = match ch {
                    '[' => State::Csi,
                    ']' => State::Osc,
                    _ => State::Plain,
                };
                continue;
            }
            State::Csi => {
                // Final byte of a CSI sequence.
                if ('@'..='~').contains(&ch) {
                    state = State::Plain;
                }
                continue;
            }
            State::Osc => {
                match ch {
                    '\u{7}' => state = State::Plain,
                    '\u{1b}' => state = State::OscEscape,
                    _ => {}
                }
                continue;
            }
            State::OscEscape => {
                state = if ch == '\\' { State::Plain } else { State::Osc };
                continue;
            }
            State::Plain => {}
        }

        match ch {
            '\u{1b}' => state = State::Escape,
            '\r' => out.push('\n'),
            '\n' if prev_cr => {}
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
        prev_cr = ch == '\r';
    }

    out
}

#[cfg(test)]
mod tests {
    use super::sanitize_console_text;

    #[test]
    fn color_and_title_sequences_are_removed() {
        assert_eq!(sanitize_console_text("\u{1b}[31mred\u{1b}[0m"), "red");
        assert_eq!(
            sanitize_console_text("\u{1b}]0;window\u{7}after"),
            "after"
        );
        assert_eq!(
            sanitize_console_text("\u{1b}]8;;https://x\u{1b}\\link"),
            "link"
        );
    }

    #[test]
    fn line_endings_are_normalized() {
        assert_eq!(sanitize_console_text("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(sanitize_console_text("x\ty\u{0}z"), "x yz");
    }
}
