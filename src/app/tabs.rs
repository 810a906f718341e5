use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::history::BLANK_LOCATION;
use crate::surface::{
    DetachedSurface, NavigationMode, Surface, SurfaceEvent, SurfaceFactory, SurfaceLink,
};

pub(crate) const TAB_COUNT: usize = 3;
const LABEL_MAX_CHARS: usize = 12;

struct Tab {
    surface: Box<dyn Surface>,
    privacy_active: bool,
    label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SwapOutcome {
    Swapped,
    AlreadyInMode,
    NoSuchTab,
}

/// Owns the tabs and the single surface each one displays.
pub(crate) struct TabManager {
    tabs: Vec<Tab>,
    active: usize,
    factory: Box<dyn SurfaceFactory>,
    events_tx: Sender<SurfaceEvent>,
    events_rx: Receiver<SurfaceEvent>,
    home_uri: String,
}

impl TabManager {
    /// Builds `TAB_COUNT` normal tabs, each loading `home_uri`.
    pub(crate) fn new(factory: Box<dyn SurfaceFactory>, home_uri: String) -> Self {
        let (events_tx, events_rx) = unbounded();
        let tabs = (0..TAB_COUNT)
            .map(|idx| {
                let mut surface =
                    factory.create(SurfaceLink::new(idx, events_tx.clone()), NavigationMode::Normal);
                surface.navigate(&home_uri);
                Tab {
                    surface,
                    privacy_active: false,
                    label: default_label(idx),
                }
            })
            .collect();
        Self {
            tabs,
            active: 0,
            factory,
            events_tx,
            events_rx,
            home_uri,
        }
    }

    pub(crate) fn home_uri(&self) -> &str {
        &self.home_uri
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    /// Makes `idx` the active tab. Out-of-range indices are ignored.
    pub(crate) fn select(&mut self, idx: usize) -> bool {
        if idx >= self.tabs.len() {
            return false;
        }
        self.active = idx;
        true
    }

    pub(crate) fn active(&self) -> &dyn Surface {
        self.tabs[self.active].surface.as_ref()
    }

    pub(crate) fn active_mut(&mut self) -> &mut dyn Surface {
        self.tabs[self.active].surface.as_mut()
    }

    pub(crate) fn surface(&self, idx: usize) -> Option<&dyn Surface> {
        self.tabs.get(idx).map(|tab| tab.surface.as_ref())
    }

    pub(crate) fn surface_mut(&mut self, idx: usize) -> Option<&mut dyn Surface> {
        let tab = self.tabs.get_mut(idx)?;
        let surface: &mut dyn Surface = tab.surface.as_mut();
        Some(surface)
    }

    pub(crate) fn is_privacy_active(&self, idx: usize) -> bool {
        self.tabs.get(idx).is_some_and(|tab| tab.privacy_active)
    }

    pub(crate) fn label(&self, idx: usize) -> &str {
        self.tabs.get(idx).map(|tab| tab.label.as_str()).unwrap_or("")
    }

    pub(crate) fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Location shown for a tab: its URI, or home when it has none.
    pub(crate) fn display_location(&self, idx: usize) -> String {
        self.surface(idx)
            .and_then(|surface| surface.current_uri())
            .filter(|uri| !uri.is_empty() && *uri != BLANK_LOCATION)
            .unwrap_or(&self.home_uri)
            .to_string()
    }

    /// Current location of every tab, in tab order.
    pub(crate) fn locations(&self) -> Vec<Option<String>> {
        self.tabs
            .iter()
            .map(|tab| tab.surface.current_uri().map(str::to_string))
            .collect()
    }

    /// Replaces the tab's surface with one built for `target`.
    ///
    /// The new surface reloads the old one's location (home when there was
    /// none). The old surface is dropped, releasing its event subscription,
    /// before the replacement is created; anything it queued is discarded by
    /// `take_events`.
    pub(crate) fn swap_mode(&mut self, idx: usize, target: NavigationMode) -> SwapOutcome {
        let Some(tab) = self.tabs.get_mut(idx) else {
            return SwapOutcome::NoSuchTab;
        };
        let current = if tab.privacy_active {
            NavigationMode::PrivacyRouted
        } else {
            NavigationMode::Normal
        };
        if current == target {
            return SwapOutcome::AlreadyInMode;
        }

        let saved = tab
            .surface
            .current_uri()
            .filter(|uri| !uri.is_empty() && *uri != BLANK_LOCATION)
            .map(str::to_string);

        // The old surface is gone before the factory builds its successor.
        let placeholder: Box<dyn Surface> = Box::new(DetachedSurface);
        let old = std::mem::replace(&mut tab.surface, placeholder);
        let old_id = old.id();
        drop(old);

        tab.surface = self
            .factory
            .create(SurfaceLink::new(idx, self.events_tx.clone()), target);
        tab.privacy_active = target == NavigationMode::PrivacyRouted;

        let load = saved.unwrap_or_else(|| self.home_uri.clone());
        tab.surface.navigate(&load);
        tracing::info!(
            tab = idx,
            from = %old_id,
            to = %tab.surface.id(),
            mode = target.as_str(),
            "surface swapped"
        );
        SwapOutcome::Swapped
    }

    /// Pending events from currently attached surfaces, in emission order.
    pub(crate) fn take_events(&mut self) -> Vec<SurfaceEvent> {
        let mut routed = Vec::new();
        for event in self.events_rx.try_iter() {
            let attached = self
                .tabs
                .get(event.tab)
                .is_some_and(|tab| tab.surface.id() == event.surface);
            if attached {
                routed.push(event);
            } else {
                tracing::debug!(tab = event.tab, surface = %event.surface, "discarding event from detached surface");
            }
        }
        routed
    }

    pub(crate) fn set_title_label(&mut self, idx: usize, title: Option<&str>) {
        if let Some(tab) = self.tabs.get_mut(idx) {
            tab.label = match title.filter(|t| !t.is_empty()) {
                Some(title) => short_label(title),
                None => default_label(idx),
            };
        }
    }
}

fn default_label(idx: usize) -> String {
    format!("Tab {}", idx + 1)
}

fn short_label(title: &str) -> String {
    match title.char_indices().nth(LABEL_MAX_CHARS) {
        Some((cut, _)) => format!("{}…", &title[..cut]),
        None => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessFactory, PrivacySettings, SurfaceEventKind, SurfaceStats};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    const HOME: &str = "file:///opt/tabshell/newtab.html";

    fn manager() -> (TabManager, Arc<SurfaceStats>) {
        let factory = HeadlessFactory::new(PrivacySettings::default());
        let stats = factory.stats();
        (TabManager::new(Box::new(factory), HOME.to_string()), stats)
    }

    #[test]
    fn every_tab_starts_on_home() {
        let (mut tabs, stats) = manager();
        assert_eq!(stats.live(), TAB_COUNT);
        for idx in 0..TAB_COUNT {
            assert_eq!(tabs.surface(idx).and_then(|s| s.current_uri()), Some(HOME));
            assert_eq!(tabs.label(idx), format!("Tab {}", idx + 1));
        }
        assert_eq!(tabs.take_events().len(), TAB_COUNT * 3);
    }

    #[test]
    fn select_ignores_out_of_range() {
        let (mut tabs, _) = manager();
        assert!(tabs.select(2));
        assert_eq!(tabs.active_index(), 2);
        assert!(!tabs.select(TAB_COUNT));
        assert_eq!(tabs.active_index(), 2);
    }

    #[test]
    fn swap_round_trip_preserves_location() {
        let (mut tabs, stats) = manager();
        tabs.surface_mut(0)
            .expect("tab 0")
            .navigate("https://news.example/today");
        let before = tabs.display_location(0);

        assert_eq!(tabs.swap_mode(0, NavigationMode::PrivacyRouted), SwapOutcome::Swapped);
        assert!(tabs.is_privacy_active(0));
        assert_eq!(stats.live(), TAB_COUNT);
        assert_eq!(
            tabs.surface(0).map(|s| s.mode()),
            Some(NavigationMode::PrivacyRouted)
        );

        assert_eq!(tabs.swap_mode(0, NavigationMode::Normal), SwapOutcome::Swapped);
        assert!(!tabs.is_privacy_active(0));
        assert_eq!(stats.live(), TAB_COUNT);
        assert_eq!(tabs.display_location(0), before);
    }

    /// Records how many surfaces are alive each time it is asked for one.
    struct CountingFactory {
        inner: HeadlessFactory,
        live_at_create: Rc<RefCell<Vec<usize>>>,
    }

    impl SurfaceFactory for CountingFactory {
        fn create(&self, link: SurfaceLink, mode: NavigationMode) -> Box<dyn Surface> {
            self.live_at_create.borrow_mut().push(self.inner.stats().live());
            self.inner.create(link, mode)
        }
    }

    #[test]
    fn old_surface_is_destroyed_before_its_replacement_is_built() {
        let inner = HeadlessFactory::new(PrivacySettings::default());
        let stats = inner.stats();
        let live_at_create = Rc::new(RefCell::new(Vec::new()));
        let factory = CountingFactory {
            inner,
            live_at_create: Rc::clone(&live_at_create),
        };
        let mut tabs = TabManager::new(Box::new(factory), HOME.to_string());
        live_at_create.borrow_mut().clear();

        tabs.swap_mode(0, NavigationMode::PrivacyRouted);
        tabs.swap_mode(0, NavigationMode::Normal);

        assert_eq!(*live_at_create.borrow(), vec![TAB_COUNT - 1, TAB_COUNT - 1]);
        assert_eq!(stats.live(), TAB_COUNT);
        assert_eq!(tabs.surface(0).and_then(|s| s.current_uri()), Some(HOME));
    }

    #[test]
    fn second_privacy_request_is_a_no_op() {
        let (mut tabs, stats) = manager();
        let created = stats.created();

        assert_eq!(tabs.swap_mode(1, NavigationMode::PrivacyRouted), SwapOutcome::Swapped);
        let id_after_first = tabs.surface(1).map(|s| s.id());
        assert_eq!(
            tabs.swap_mode(1, NavigationMode::PrivacyRouted),
            SwapOutcome::AlreadyInMode
        );

        assert_eq!(stats.created(), created + 1);
        assert_eq!(tabs.surface(1).map(|s| s.id()), id_after_first);
        assert_eq!(tabs.swap_mode(2, NavigationMode::Normal), SwapOutcome::AlreadyInMode);
        assert_eq!(tabs.swap_mode(7, NavigationMode::Normal), SwapOutcome::NoSuchTab);
    }

    #[test]
    fn events_from_swapped_out_surface_are_discarded() {
        let (mut tabs, _) = manager();
        tabs.take_events();

        tabs.surface_mut(0)
            .expect("tab 0")
            .navigate("https://stale.example");
        tabs.swap_mode(0, NavigationMode::PrivacyRouted);

        let events = tabs.take_events();
        let current = tabs.surface(0).map(|s| s.id());
        assert!(events.iter().all(|e| Some(e.surface) == current));
        assert!(events.iter().any(|e| e.kind
            == SurfaceEventKind::LocationChanged("https://stale.example".to_string())));
    }

    #[test]
    fn swap_of_blank_tab_loads_home() {
        let (mut tabs, _) = manager();
        tabs.surface_mut(2).expect("tab 2").navigate("about:blank");
        tabs.swap_mode(2, NavigationMode::PrivacyRouted);
        assert_eq!(tabs.surface(2).and_then(|s| s.current_uri()), Some(HOME));
    }

    #[test]
    fn long_titles_are_shortened_for_labels() {
        let (mut tabs, _) = manager();
        tabs.set_title_label(0, Some("A very long page title"));
        assert_eq!(tabs.label(0), "A very long …");
        tabs.set_title_label(0, Some(""));
        assert_eq!(tabs.label(0), "Tab 1");
        tabs.set_title_label(1, Some("Short"));
        assert_eq!(tabs.label(1), "Short");
    }
}
