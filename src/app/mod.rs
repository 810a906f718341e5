use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::calc::{ArithmeticEvaluator, Evaluator};
use crate::config::Config;
use crate::history::HistoryRing;
use crate::net::{AddressLookup, HttpAddressLookup, NameResolver, SystemResolver};
use crate::surface::{HeadlessFactory, SurfaceFactory, SurfaceStats};
use crate::APP_NAME;

mod commands;
mod console;
mod dispatch;
mod input;
mod navigation;
mod runtime;
mod tabs;
mod text;
mod types;
mod ui;
mod worker;

use console::Console;
use dispatch::{TaskDispatcher, TaskHost};
use input::LineBuffer;
pub(crate) use runtime::run_app;
use tabs::TabManager;
use types::{Alert, Focus, Mode, Outcome, ThemePalette, ThemePreset};

/// Delay between a load finishing and the dark style being injected.
const DARK_STYLE_DELAY: Duration = Duration::from_millis(600);

/// Dark-mode stylesheet injected into pages; idempotent per document.
const DARK_STYLE_SCRIPT: &str = "(function() {\
  let style = document.getElementById('tabshell-dark');\
  if (!style) {\
    style = document.createElement('style');\
    style.id = 'tabshell-dark';\
    style.textContent = ':root{color-scheme:dark!important}\
      *{background:#111!important;color:#eee!important;border-color:#333!important}\
      a{color:#8cf!important}';\
    document.head.appendChild(style);\
  }\
})();";

/// Dark-style injection waiting for its due time.
#[derive(Clone, Debug)]
struct PendingStyle {
    tab: usize,
    due: Instant,
}

pub(crate) struct App {
    config: Config,
    tabs: TabManager,
    history: HistoryRing,
    console: Console,
    dispatcher: TaskDispatcher<App>,
    evaluator: Box<dyn Evaluator>,
    resolver: Arc<dyn NameResolver>,
    lookup: Arc<dyn AddressLookup>,
    surface_stats: Option<Arc<SurfaceStats>>,
    dark_mode: bool,
    address: LineBuffer,
    focus: Focus,
    mode: Mode,
    alert: Option<Alert>,
    console_visible: bool,
    window_title: String,
    pending_styles: Vec<PendingStyle>,
    should_quit: bool,
    last_status: String,
}

impl App {
    /// Production wiring: headless surfaces, system resolver, HTTPS lookup.
    pub(crate) fn new(config: Config, initial_url: Option<String>) -> Result<Self> {
        let factory = HeadlessFactory::new(config.privacy.clone());
        let stats = factory.stats();
        let lookup = HttpAddressLookup::new(
            config.lookup_url.clone(),
            Duration::from_secs(config.lookup_timeout_secs),
        )
        .context("build address lookup client")?;
        let mut app = Self::with_collaborators(
            config,
            Box::new(factory),
            Box::new(ArithmeticEvaluator),
            Arc::new(SystemResolver),
            Arc::new(lookup),
        );
        app.surface_stats = Some(stats);
        if let Some(url) = initial_url {
            app.load_uri_smart(&url);
        }
        Ok(app)
    }

    pub(crate) fn with_collaborators(
        config: Config,
        factory: Box<dyn SurfaceFactory>,
        evaluator: Box<dyn Evaluator>,
        resolver: Arc<dyn NameResolver>,
        lookup: Arc<dyn AddressLookup>,
    ) -> Self {
        let home_uri = config.home_uri();
        tracing::info!(home = %home_uri, dark_mode = config.dark_mode, "starting shell");
        let tabs = TabManager::new(factory, home_uri.clone());

        let mut console = Console::new();
        console.print(&format!("{APP_NAME} terminal"));
        console.print("FEATURES: 'help' to list all commands");
        console.print("");
        console.print_prompt();

        let mut address = LineBuffer::default();
        address.set(home_uri);

        Self {
            dark_mode: config.dark_mode,
            config,
            tabs,
            history: HistoryRing::default(),
            console,
            dispatcher: TaskDispatcher::new(),
            evaluator,
            resolver,
            lookup,
            surface_stats: None,
            address,
            focus: Focus::Console,
            mode: Mode::Normal,
            alert: None,
            console_visible: true,
            window_title: APP_NAME.to_string(),
            pending_styles: Vec::new(),
            should_quit: false,
            last_status: String::new(),
        }
    }

    pub(super) fn theme_palette(&self) -> ThemePalette {
        ThemePreset::for_dark_mode(self.dark_mode).palette()
    }

    pub(super) fn show_alert(&mut self, message: impl Into<String>, detail: impl Into<String>) {
        self.alert = Some(Alert {
            message: message.into(),
            detail: detail.into(),
        });
        self.mode = Mode::Alert;
    }

    /// Background work still running; the loop polls faster while non-zero.
    pub(super) fn is_busy(&self) -> bool {
        self.dispatcher.in_flight() > 0 || !self.pending_styles.is_empty()
    }
}

impl TaskHost for App {
    fn task_panicked(&mut self, name: &'static str) {
        self.console.print(&format!("Error: '{name}' failed unexpectedly."));
        self.console.finish_block();
        self.last_status = format!("{name} failed");
    }
}
