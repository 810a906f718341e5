use std::io::Stdout;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use unicode_width::UnicodeWidthChar;

mod app;
mod calc;
mod config;
mod history;
mod logging;
mod net;
mod orchestrator;
mod surface;

use config::Config;

const APP_NAME: &str = "TabShell";
const APP_VERSION: &str = "0.1.0";
const USAGE: &str = "usage: tabshell [--version|-v] [--help|-h] [URL]";

/// Schemes loaded as typed; everything else is assumed to be a web address.
const VERBATIM_SCHEMES: &[&str] = &["http://", "https://", "file://", "about:"];

#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    Run { initial_url: Option<String> },
    Version,
    Help,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let initial_url = match parse_args(&args) {
        Ok(CliAction::Version) => {
            println!("tabshell {}", APP_VERSION);
            return Ok(());
        }
        Ok(CliAction::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Ok(CliAction::Run { initial_url }) => initial_url,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let config = Config::load()?;
    if let Err(err) = logging::init_logging(&config.log_level, config.log_file.as_deref()) {
        eprintln!("logging disabled: {err}");
    }

    let mut terminal = setup_terminal()?;
    let result = app::run_app(&mut terminal, config, initial_url);
    restore_terminal(&mut terminal)?;
    if let Err(err) = &result {
        tracing::error!(error = %err, "shell exited with error");
    }
    result
}

fn parse_args(args: &[String]) -> Result<CliAction, String> {
    let mut initial_url = None;
    for arg in args {
        match arg.as_str() {
            "--version" | "-v" => return Ok(CliAction::Version),
            "--help" | "-h" => return Ok(CliAction::Help),
            flag if flag.starts_with('-') => return Err(format!("unknown argument: {}", flag)),
            url if initial_url.is_none() => initial_url = Some(url.to_string()),
            extra => return Err(format!("unexpected argument: {}", extra)),
        }
    }
    Ok(CliAction::Run { initial_url })
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    crossterm::execute!(std::io::stdout(), EnterAlternateScreen).context("enter alternate screen")?;

    let mut terminal =
        Terminal::new(CrosstermBackend::new(std::io::stdout())).context("create terminal")?;

    if matches!(supports_keyboard_enhancement(), Ok(true)) {
        crossterm::execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .ok();
    }
    crossterm::execute!(std::io::stdout(), EnableBracketedPaste).ok();

    terminal.hide_cursor().ok();
    terminal.clear().context("clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    crossterm::execute!(std::io::stdout(), DisableBracketedPaste).ok();
    crossterm::execute!(std::io::stdout(), PopKeyboardEnhancementFlags).ok();
    disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(std::io::stdout(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

/// Turns address-bar text into a loadable location. Blank input yields
/// nothing; text without a known scheme is assumed to be an https address.
fn normalize_location(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if VERBATIM_SCHEMES.iter().any(|scheme| raw.starts_with(scheme)) {
        Some(raw.to_string())
    } else {
        Some(format!("https://{}", raw))
    }
}

fn truncate(s: &str, n: usize) -> String {
    match s.char_indices().nth(n) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

fn input_cursor_position(input: &str, cursor: usize, width: u16, prompt_width: u16) -> (u16, u16) {
    let width = width.max(1) as usize;
    let mut x = prompt_width as usize;
    let mut y = 0usize;
    let mut consumed = 0usize;

    for ch in input.chars() {
        let len = ch.len_utf8();
        if consumed + len > cursor {
            break;
        }
        consumed += len;
        if ch == '\n' {
            x = prompt_width as usize;
            y += 1;
            continue;
        }
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if x + ch_width > width {
            x = 0;
            y += 1;
        }
        x += ch_width;
        if x >= width {
            x = 0;
            y += 1;
        }
    }

    (x.min(u16::MAX as usize) as u16, y.min(u16::MAX as usize) as u16)
}
