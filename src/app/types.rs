use ratatui::style::{Color, Modifier, Style};

use super::dispatch::TaskId;

/// Which input the keyboard is talking to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Focus {
    Console,
    Address,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Normal,
    Alert,
}

/// Modal message box with a single OK button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Alert {
    pub(crate) message: String,
    pub(crate) detail: String,
}

/// Result of one command handler.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Lines to print, followed by a blank line and a fresh prompt.
    Done(Vec<String>),
    /// A background task will print and re-prompt when it completes.
    Async(TaskId),
    /// The console was reset and already shows a prompt.
    Cleared,
    Quit,
}

impl Outcome {
    pub(crate) fn silent() -> Self {
        Outcome::Done(Vec::new())
    }

    pub(crate) fn line(text: impl Into<String>) -> Self {
        Outcome::Done(vec![text.into()])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ThemePreset {
    Light,
    Dark,
}

impl ThemePreset {
    pub(crate) fn for_dark_mode(dark: bool) -> Self {
        if dark {
            ThemePreset::Dark
        } else {
            ThemePreset::Light
        }
    }

    pub(crate) fn palette(self) -> ThemePalette {
        match self {
            ThemePreset::Light => ThemePalette {
                prompt: Color::Rgb(0, 255, 0),
                console_text: Color::Rgb(0, 230, 0),
                console_bg: Color::Rgb(0, 0, 0),
                muted_text: Color::Rgb(128, 128, 128),
                highlight_fg: Color::Rgb(255, 255, 255),
                highlight_bg: Color::Rgb(64, 64, 64),
                status_text: Color::Rgb(140, 140, 140),
                page_text: Color::Rgb(40, 40, 40),
                page_bg: Color::Rgb(236, 236, 236),
                privacy_label: Color::Rgb(153, 102, 204),
                banner_title: Color::Rgb(200, 200, 200),
                panel_bg: Color::Rgb(10, 10, 10),
                panel_fg: Color::Rgb(210, 210, 210),
                alert_title: Color::Rgb(200, 160, 120),
            },
            ThemePreset::Dark => ThemePalette {
                prompt: Color::Rgb(0, 255, 0),
                console_text: Color::Rgb(0, 230, 0),
                console_bg: Color::Rgb(0, 0, 0),
                muted_text: Color::Rgb(100, 100, 100),
                highlight_fg: Color::Rgb(136, 204, 255),
                highlight_bg: Color::Rgb(51, 51, 51),
                status_text: Color::Rgb(120, 120, 120),
                page_text: Color::Rgb(238, 238, 238),
                page_bg: Color::Rgb(17, 17, 17),
                privacy_label: Color::Rgb(187, 136, 238),
                banner_title: Color::Rgb(200, 200, 200),
                panel_bg: Color::Rgb(10, 10, 10),
                panel_fg: Color::Rgb(210, 210, 210),
                alert_title: Color::Rgb(200, 160, 120),
            },
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct ThemePalette {
    pub(crate) prompt: Color,
    pub(crate) console_text: Color,
    pub(crate) console_bg: Color,
    pub(crate) muted_text: Color,
    pub(crate) highlight_fg: Color,
    pub(crate) highlight_bg: Color,
    pub(crate) status_text: Color,
    pub(crate) page_text: Color,
    pub(crate) page_bg: Color,
    pub(crate) privacy_label: Color,
    pub(crate) banner_title: Color,
    pub(crate) panel_bg: Color,
    pub(crate) panel_fg: Color,
    pub(crate) alert_title: Color,
}

impl ThemePalette {
    pub(crate) fn prompt_style(self) -> Style {
        Style::default()
            .fg(self.prompt)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn title_style(self) -> Style {
        Style::default()
            .fg(self.banner_title)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn console_style(self) -> Style {
        Style::default().bg(self.console_bg).fg(self.console_text)
    }

    pub(crate) fn page_style(self) -> Style {
        Style::default().bg(self.page_bg).fg(self.page_text)
    }

    pub(crate) fn privacy_style(self) -> Style {
        Style::default()
            .fg(self.privacy_label)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn muted_style(self) -> Style {
        Style::default().fg(self.muted_text)
    }

    pub(crate) fn status_style(self) -> Style {
        Style::default().fg(self.status_text)
    }

    pub(crate) fn panel_surface_style(self) -> Style {
        Style::default().bg(self.panel_bg).fg(self.panel_fg)
    }

    pub(crate) fn panel_border_style(self) -> Style {
        Style::default().fg(self.highlight_bg)
    }

    pub(crate) fn focused_border_style(self) -> Style {
        Style::default().fg(self.highlight_fg)
    }

    pub(crate) fn alert_title_style(self) -> Style {
        Style::default()
            .fg(self.alert_title)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn tab_selected_style(self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }
}
