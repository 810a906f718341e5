use super::*;

pub(crate) fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: Config,
    initial_url: Option<String>,
) -> Result<()> {
    let mut app = App::new(config, initial_url)?;
    const ACTIVE_POLL_MS: u64 = 33;
    const IDLE_POLL_MS: u64 = 100;
    const MAX_EVENTS_PER_FRAME: u16 = 64;
    let mut needs_draw = true;

    loop {
        if app.poll_worker() {
            needs_draw = true;
        }

        if needs_draw {
            terminal.draw(|f| ui::draw(f, &app)).context("draw frame")?;
            needs_draw = false;
        }

        if app.should_quit {
            break;
        }

        let timeout = if app.is_busy() {
            Duration::from_millis(ACTIVE_POLL_MS)
        } else {
            Duration::from_millis(IDLE_POLL_MS)
        };
        if !event::poll(timeout).context("event poll")? {
            continue;
        }

        let mut drained_events: u16 = 0;
        loop {
            match event::read().context("event read")? {
                Event::Key(key) => {
                    if !matches!(key.kind, KeyEventKind::Release) {
                        app.handle_key(key);
                        needs_draw = true;
                    }
                }
                Event::Paste(text) => {
                    app.handle_paste_event(&text);
                    needs_draw = true;
                }
                Event::Resize(_, _) => {
                    needs_draw = true;
                }
                _ => {}
            }

            drained_events = drained_events.saturating_add(1);
            if drained_events >= MAX_EVENTS_PER_FRAME || app.should_quit {
                break;
            }
            if !event::poll(Duration::from_millis(0)).context("event poll drain")? {
                break;
            }
        }
    }

    let abandoned = app.dispatcher.in_flight();
    if abandoned > 0 {
        tracing::info!(tasks = abandoned, "exiting with background tasks still running");
    }
    tracing::info!("shell closed");
    Ok(())
}
