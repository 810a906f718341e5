use super::*;
use crate::history::BLANK_LOCATION;
use crate::surface::{SurfaceEvent, SurfaceEventKind};

impl App {
    /// One UI tick of background work. Returns true when anything visible
    /// may have changed.
    pub(super) fn poll_worker(&mut self) -> bool {
        let mut changed = false;

        let ready = self.dispatcher.take_ready();
        if !ready.is_empty() {
            changed = true;
        }
        for completion in ready {
            completion.apply(self);
        }

        if self.pump_surface_events() {
            changed = true;
        }
        if self.fire_due_styles(Instant::now()) {
            changed = true;
        }
        changed
    }

    pub(super) fn pump_surface_events(&mut self) -> bool {
        let events = self.tabs.take_events();
        let changed = !events.is_empty();
        for event in events {
            self.handle_surface_event(event);
        }
        changed
    }

    fn handle_surface_event(&mut self, event: SurfaceEvent) {
        let is_active = event.tab == self.tabs.active_index();
        match event.kind {
            SurfaceEventKind::LocationChanged(uri) => {
                if uri.is_empty() || uri == BLANK_LOCATION {
                    return;
                }
                if is_active {
                    self.address.set(uri.clone());
                }
                self.history.push(&uri);
            }
            SurfaceEventKind::TitleChanged(title) => {
                let title = title.filter(|t| !t.is_empty());
                self.tabs.set_title_label(event.tab, title.as_deref());
                if is_active {
                    self.window_title = title.unwrap_or_else(|| APP_NAME.to_string());
                }
            }
            SurfaceEventKind::LoadFinished => {
                if self.dark_mode {
                    self.pending_styles.push(PendingStyle {
                        tab: event.tab,
                        due: Instant::now() + DARK_STYLE_DELAY,
                    });
                }
            }
        }
    }

    /// Injects the dark style into tabs whose delay has elapsed by `now`.
    pub(super) fn fire_due_styles(&mut self, now: Instant) -> bool {
        if self.pending_styles.is_empty() {
            return false;
        }
        let (due, waiting): (Vec<PendingStyle>, Vec<PendingStyle>) = self
            .pending_styles
            .drain(..)
            .partition(|pending| pending.due <= now);
        self.pending_styles = waiting;
        if !self.dark_mode {
            return false;
        }
        for pending in &due {
            if let Some(surface) = self.tabs.surface_mut(pending.tab) {
                surface.execute_script(DARK_STYLE_SCRIPT);
            }
        }
        !due.is_empty()
    }

    pub(super) fn apply_dark_style_to_active(&mut self) {
        self.tabs.active_mut().execute_script(DARK_STYLE_SCRIPT);
    }
}
