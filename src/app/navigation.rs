use super::*;
use crate::normalize_location;

impl App {
    /// Makes a tab active and points the address bar and title at it.
    pub(super) fn select_tab(&mut self, idx: usize) {
        if !self.tabs.select(idx) {
            return;
        }
        self.sync_address();
        let title = self.tabs.active().current_title().unwrap_or("");
        self.window_title = format!("[Tab {}] {}", idx + 1, title);
        tracing::debug!(tab = idx, "tab selected");
    }

    /// Resets the address bar to the active tab's location.
    pub(super) fn sync_address(&mut self) {
        let location = self.tabs.display_location(self.tabs.active_index());
        self.address.set(location);
    }

    pub(super) fn navigate_active(&mut self, uri: &str) {
        tracing::debug!(tab = self.tabs.active_index(), uri, "navigate");
        self.tabs.active_mut().navigate(uri);
    }

    /// Address-bar activation: blank input is ignored, anything without a
    /// known scheme is loaded over https.
    pub(super) fn load_uri_smart(&mut self, raw: &str) {
        if let Some(uri) = normalize_location(raw) {
            self.navigate_active(&uri);
        }
    }

    pub(super) fn go_home(&mut self) {
        let home = self.tabs.home_uri().to_string();
        self.navigate_active(&home);
    }

    pub(super) fn reload(&mut self) {
        self.tabs.active_mut().reload();
    }

    pub(super) fn go_back(&mut self) {
        let surface = self.tabs.active_mut();
        if surface.can_go_back() {
            surface.go_back();
        }
    }

    pub(super) fn go_forward(&mut self) {
        let surface = self.tabs.active_mut();
        if surface.can_go_forward() {
            surface.go_forward();
        }
    }
}
