use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::{App, Focus, Mode, ThemePalette};
use crate::surface::NetworkProfile;
use crate::{input_cursor_position, truncate};

const PANEL_PADDING_X: u16 = 1;
const PANEL_PADDING_Y: u16 = 0;
const PANEL_HORIZONTAL_INSET: u16 = 2 + PANEL_PADDING_X * 2;
const PANEL_VERTICAL_INSET: u16 = 2 + PANEL_PADDING_Y * 2;
const PRIVACY_BADGE: &str = "[privacy] ";

pub(super) fn draw(f: &mut Frame, app: &App) {
    let theme = app.theme_palette();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1 + PANEL_VERTICAL_INSET),
            Constraint::Min(3),
            Constraint::Length(1 + PANEL_VERTICAL_INSET),
        ])
        .split(f.area());

    draw_tab_bar(f, app, theme, chunks[0]);
    draw_address(f, app, theme, chunks[1]);

    let body = if app.console_visible {
        let console_width = app
            .config
            .console_width
            .min(chunks[2].width.saturating_sub(20).max(1));
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(console_width)])
            .split(chunks[2])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1)])
            .split(chunks[2])
    };
    draw_page(f, app, theme, body[0]);
    if app.console_visible {
        draw_console(f, app, theme, body[1]);
    }

    draw_status(f, app, theme, chunks[3]);

    if matches!(app.mode, Mode::Alert) {
        draw_alert(f, app, theme);
    }
}

fn panel_block(theme: ThemePalette, title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        theme.focused_border_style()
    } else {
        theme.panel_border_style()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(Span::styled(format!(" {} ", title), theme.title_style()))
        .padding(Padding::new(
            PANEL_PADDING_X,
            PANEL_PADDING_X,
            PANEL_PADDING_Y,
            PANEL_PADDING_Y,
        ))
        .style(theme.panel_surface_style())
}

fn modal_block(theme: ThemePalette, title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.panel_border_style())
        .title(Span::styled(format!(" {} ", title), theme.alert_title_style()))
        .padding(Padding::new(1, 1, 0, 0))
        .style(theme.panel_surface_style())
}

fn draw_tab_bar(f: &mut Frame, app: &App, theme: ThemePalette, area: Rect) {
    let mut spans = Vec::new();
    for idx in 0..app.tabs.len() {
        let mut label = format!(" {} ", app.tabs.label(idx));
        if app.tabs.is_privacy_active(idx) {
            label.push_str("• ");
        }
        let style = if idx == app.tabs.active_index() {
            theme.tab_selected_style()
        } else if app.tabs.is_privacy_active(idx) {
            theme.privacy_style()
        } else {
            theme.muted_style()
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_address(f: &mut Frame, app: &App, theme: ThemePalette, area: Rect) {
    let focused = app.focus == Focus::Address && matches!(app.mode, Mode::Normal);
    let badge = if app.tabs.is_privacy_active(app.tabs.active_index()) {
        PRIVACY_BADGE
    } else {
        ""
    };
    let line = Line::from(vec![
        Span::styled(badge, theme.privacy_style()),
        Span::styled(app.address.text().to_string(), theme.panel_surface_style()),
    ]);
    let panel = Paragraph::new(line).block(panel_block(theme, "address", focused));
    f.render_widget(panel, area);

    if focused {
        let content_width = area.width.saturating_sub(PANEL_HORIZONTAL_INSET).max(1);
        let badge_width = UnicodeWidthStr::width(badge) as u16;
        let (cx, _) = input_cursor_position(
            app.address.text(),
            app.address.cursor(),
            u16::MAX,
            badge_width,
        );
        let cursor_x = area.x + 1 + PANEL_PADDING_X + cx.min(content_width.saturating_sub(1));
        let cursor_y = area.y + 1 + PANEL_PADDING_Y;
        f.set_cursor_position((cursor_x, cursor_y));
    }
}

fn draw_page(f: &mut Frame, app: &App, theme: ThemePalette, area: Rect) {
    let surface = app.tabs.active();
    let label = |text: &str| Span::styled(format!("{text:<14}"), theme.muted_style());

    let title = surface.current_title().unwrap_or("(untitled)");
    let mut lines = vec![
        Line::from(Span::styled(
            truncate(title, 80),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(surface.current_uri().unwrap_or("").to_string()),
        Line::from(""),
    ];

    match surface.profile() {
        NetworkProfile::Normal => {
            lines.push(Line::from(vec![label("network"), Span::raw("direct")]));
        }
        NetworkProfile::PrivacyRouted(privacy) => {
            lines.push(Line::from(vec![
                label("network"),
                Span::styled("privacy-routed", theme.privacy_style()),
            ]));
            lines.push(Line::from(vec![
                label("proxy"),
                Span::raw(privacy.proxy_uri.clone()),
            ]));
            lines.push(Line::from(vec![
                label("user agent"),
                Span::raw(privacy.user_agent.clone()),
            ]));
            lines.push(Line::from(vec![
                label("webrtc"),
                Span::raw(on_off(privacy.enable_webrtc)),
            ]));
            lines.push(Line::from(vec![
                label("media source"),
                Span::raw(on_off(privacy.enable_media_source)),
            ]));
            lines.push(Line::from(vec![
                label("session"),
                Span::raw(if privacy.ephemeral_session {
                    "ephemeral"
                } else {
                    "persistent"
                }),
            ]));
        }
    }

    lines.push(Line::from(vec![
        label("state"),
        Span::raw(if surface.is_loading() { "loading…" } else { "loaded" }),
    ]));
    lines.push(Line::from(vec![
        label("history"),
        Span::raw(format!(
            "back {}  forward {}",
            if surface.can_go_back() { "yes" } else { "no" },
            if surface.can_go_forward() { "yes" } else { "no" },
        )),
    ]));
    lines.push(Line::from(vec![
        label("dark style"),
        Span::raw(on_off(app.dark_mode)),
    ]));
    if let Some(stats) = &app.surface_stats {
        lines.push(Line::from(vec![
            label("engine"),
            Span::raw(format!(
                "{} live surface(s), {} script(s) injected",
                stats.live(),
                stats.scripts_injected()
            )),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "headless surface: pages are tracked, not fetched",
        theme.muted_style(),
    )));

    let title = format!("{} · {}", app.tabs.label(app.tabs.active_index()), surface.id());
    let page = Paragraph::new(Text::from(lines))
        .style(theme.page_style())
        .block(panel_block(theme, &title, false).style(theme.page_style()))
        .wrap(Wrap { trim: false });
    f.render_widget(page, area);
}

fn draw_console(f: &mut Frame, app: &App, theme: ThemePalette, area: Rect) {
    let focused = app.focus == Focus::Console && matches!(app.mode, Mode::Normal);
    let content_width = area.width.saturating_sub(PANEL_HORIZONTAL_INSET).max(1);
    let content_height = area.height.saturating_sub(PANEL_VERTICAL_INSET).max(1);

    // The typed line is shown after the last committed line.
    let committed = app.console.text();
    let (earlier, last_line) = match committed.rfind('\n') {
        Some(idx) => (&committed[..idx], &committed[idx + 1..]),
        None => ("", committed),
    };
    let typed = app.console.input.text();
    let mut lines: Vec<Line<'static>> = if committed.contains('\n') {
        earlier.split('\n').map(|l| Line::from(l.to_string())).collect()
    } else {
        Vec::new()
    };
    let rows_before = Paragraph::new(Text::from(lines.clone()))
        .wrap(Wrap { trim: false })
        .line_count(content_width);
    lines.push(Line::from(vec![
        Span::styled(last_line.to_string(), theme.prompt_style()),
        Span::raw(typed.to_string()),
    ]));

    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let total_rows = paragraph.line_count(content_width);
    let scroll = total_rows.saturating_sub(content_height as usize);
    let scroll = scroll.min(u16::MAX as usize) as u16;
    let panel = paragraph
        .style(theme.console_style())
        .block(panel_block(theme, "terminal", focused).style(theme.console_style()))
        .scroll((scroll, 0));
    f.render_widget(panel, area);

    if focused {
        let mut tail = last_line.to_string();
        tail.push_str(typed);
        let cursor = last_line.len() + app.console.input.cursor();
        let (cx, cy) = input_cursor_position(&tail, cursor, content_width, 0);
        let row = (rows_before + cy as usize).saturating_sub(scroll as usize);
        if row < content_height as usize {
            let cursor_x = area.x + 1 + PANEL_PADDING_X + cx.min(content_width.saturating_sub(1));
            let cursor_y = area.y + 1 + PANEL_PADDING_Y + row as u16;
            f.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

fn draw_status(f: &mut Frame, app: &App, theme: ThemePalette, area: Rect) {
    let active = app.tabs.active_index();
    let mut parts = vec![
        truncate(&app.window_title, 40),
        format!("tab {}/{}", active + 1, app.tabs.len()),
        app.tabs.active().mode().as_str().to_string(),
    ];
    if app.dark_mode {
        parts.push("dark".to_string());
    }
    let running = app.dispatcher.in_flight();
    if running > 0 {
        parts.push(format!("{running} task(s) running"));
    }
    if !app.last_status.is_empty() {
        parts.push(truncate(&app.last_status, 32));
    }
    parts.push("Tab focus | F12 terminal | Ctrl+C exit".to_string());

    let status = Paragraph::new(parts.join(" | "))
        .style(theme.status_style())
        .block(panel_block(theme, "status", false));
    f.render_widget(status, area);
}

fn draw_alert(f: &mut Frame, app: &App, theme: ThemePalette) {
    let Some(alert) = app.alert.as_ref() else {
        return;
    };
    let area = centered_rect(50, 30, f.area());
    let mut lines = vec![Line::from(Span::styled(
        alert.message.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if !alert.detail.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            alert.detail.clone(),
            theme.muted_style(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[ OK ]", theme.tab_selected_style())));

    let panel = Paragraph::new(lines)
        .style(theme.panel_surface_style())
        .block(modal_block(theme, "alert"))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(panel, area);
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 30, area);
        assert!(inner.x >= area.x && inner.right() <= area.right());
        assert!(inner.y >= area.y && inner.bottom() <= area.bottom());
        assert!((49..=51).contains(&inner.width));
    }
}
