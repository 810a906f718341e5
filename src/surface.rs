//! Rendering surfaces and the factory that builds them.
//!
//! A surface is one engine instance displaying one tab. Engines report
//! location/title/load events through a [`SurfaceLink`]; every event carries
//! the emitting surface's id so the tab manager can drop events from a
//! surface that has already been swapped out.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::history::BLANK_LOCATION;
use crate::net::host_from_location;

pub(crate) const DEFAULT_PRIVACY_PROXY: &str = "socks5://127.0.0.1:9050";
pub(crate) const DEFAULT_PRIVACY_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; rv:128.0) Gecko/20100101 Firefox/128.0";
const NEW_TAB_TITLE: &str = "New Tab";

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SurfaceId(u64);

impl SurfaceId {
    /// Never handed out by [`SurfaceLink::new`]; marks an empty tab slot.
    pub(crate) const DETACHED: SurfaceId = SurfaceId(0);

    fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NavigationMode {
    Normal,
    PrivacyRouted,
}

impl NavigationMode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            NavigationMode::Normal => "normal",
            NavigationMode::PrivacyRouted => "privacy-routed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PrivacySettings {
    pub(crate) proxy_uri: String,
    pub(crate) user_agent: String,
    pub(crate) enable_webrtc: bool,
    pub(crate) enable_media_source: bool,
    pub(crate) ephemeral_session: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            proxy_uri: DEFAULT_PRIVACY_PROXY.to_string(),
            user_agent: DEFAULT_PRIVACY_USER_AGENT.to_string(),
            enable_webrtc: false,
            enable_media_source: false,
            ephemeral_session: true,
        }
    }
}

/// Network configuration a surface is built with. Never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NetworkProfile {
    Normal,
    PrivacyRouted(PrivacySettings),
}

impl NetworkProfile {
    pub(crate) fn mode(&self) -> NavigationMode {
        match self {
            NetworkProfile::Normal => NavigationMode::Normal,
            NetworkProfile::PrivacyRouted(_) => NavigationMode::PrivacyRouted,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceEventKind {
    LocationChanged(String),
    TitleChanged(Option<String>),
    LoadFinished,
}

#[derive(Clone, Debug)]
pub(crate) struct SurfaceEvent {
    pub(crate) tab: usize,
    pub(crate) surface: SurfaceId,
    pub(crate) kind: SurfaceEventKind,
}

/// The event subscription of one surface. Dropping it detaches the surface.
#[derive(Debug)]
pub(crate) struct SurfaceLink {
    tab: usize,
    id: SurfaceId,
    tx: Sender<SurfaceEvent>,
}

impl SurfaceLink {
    pub(crate) fn new(tab: usize, tx: Sender<SurfaceEvent>) -> Self {
        Self {
            tab,
            id: SurfaceId::next(),
            tx,
        }
    }

    pub(crate) fn id(&self) -> SurfaceId {
        self.id
    }

    pub(crate) fn emit(&self, kind: SurfaceEventKind) {
        let _ = self.tx.send(SurfaceEvent {
            tab: self.tab,
            surface: self.id,
            kind,
        });
    }
}

/// What the shell needs from a rendering engine instance.
pub(crate) trait Surface {
    fn id(&self) -> SurfaceId;
    fn profile(&self) -> &NetworkProfile;
    fn navigate(&mut self, uri: &str);
    fn reload(&mut self);
    fn go_back(&mut self);
    fn go_forward(&mut self);
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn current_uri(&self) -> Option<&str>;
    fn current_title(&self) -> Option<&str>;
    fn is_loading(&self) -> bool;
    fn execute_script(&mut self, script: &str);

    fn mode(&self) -> NavigationMode {
        self.profile().mode()
    }
}

pub(crate) trait SurfaceFactory {
    fn create(&self, link: SurfaceLink, mode: NavigationMode) -> Box<dyn Surface>;
}

/// Counters shared by every surface a [`HeadlessFactory`] builds.
#[derive(Debug, Default)]
pub(crate) struct SurfaceStats {
    live: AtomicUsize,
    created: AtomicUsize,
    scripts: AtomicUsize,
}

impl SurfaceStats {
    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn scripts_injected(&self) -> usize {
        self.scripts.load(Ordering::SeqCst)
    }
}

/// Builds [`HeadlessSurface`]s.
pub(crate) struct HeadlessFactory {
    privacy: PrivacySettings,
    stats: Arc<SurfaceStats>,
}

impl HeadlessFactory {
    pub(crate) fn new(privacy: PrivacySettings) -> Self {
        Self {
            privacy,
            stats: Arc::new(SurfaceStats::default()),
        }
    }

    pub(crate) fn stats(&self) -> Arc<SurfaceStats> {
        Arc::clone(&self.stats)
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(&self, link: SurfaceLink, mode: NavigationMode) -> Box<dyn Surface> {
        let profile = match mode {
            NavigationMode::Normal => NetworkProfile::Normal,
            NavigationMode::PrivacyRouted => NetworkProfile::PrivacyRouted(self.privacy.clone()),
        };
        self.stats.live.fetch_add(1, Ordering::SeqCst);
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(surface = %link.id(), tab = link.tab, mode = mode.as_str(), "surface created");
        Box::new(HeadlessSurface {
            link,
            profile,
            back: Vec::new(),
            forward: Vec::new(),
            uri: None,
            title: None,
            loading: false,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// An engine that keeps full navigation state without fetching content.
///
/// Every load completes immediately and reports the same event sequence a
/// real engine would: location changed, title changed, load finished.
pub(crate) struct HeadlessSurface {
    link: SurfaceLink,
    profile: NetworkProfile,
    back: Vec<String>,
    forward: Vec<String>,
    uri: Option<String>,
    title: Option<String>,
    loading: bool,
    stats: Arc<SurfaceStats>,
}

impl HeadlessSurface {
    fn load(&mut self, uri: String) {
        self.loading = true;
        self.title = title_for(&uri);
        self.uri = Some(uri.clone());
        self.link.emit(SurfaceEventKind::LocationChanged(uri));
        self.link
            .emit(SurfaceEventKind::TitleChanged(self.title.clone()));
        self.loading = false;
        self.link.emit(SurfaceEventKind::LoadFinished);
    }
}

impl Surface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.link.id()
    }

    fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    fn navigate(&mut self, uri: &str) {
        if let Some(current) = self.uri.take() {
            self.back.push(current);
        }
        self.forward.clear();
        self.load(uri.to_string());
    }

    fn reload(&mut self) {
        if self.uri.is_some() {
            self.link.emit(SurfaceEventKind::LoadFinished);
        }
    }

    fn go_back(&mut self) {
        let Some(previous) = self.back.pop() else {
            return;
        };
        if let Some(current) = self.uri.take() {
            self.forward.push(current);
        }
        self.load(previous);
    }

    fn go_forward(&mut self) {
        let Some(next) = self.forward.pop() else {
            return;
        };
        if let Some(current) = self.uri.take() {
            self.back.push(current);
        }
        self.load(next);
    }

    fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    fn current_uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    fn current_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn execute_script(&mut self, script: &str) {
        self.stats.scripts.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(surface = %self.link.id(), bytes = script.len(), "script injected");
    }
}

static DETACHED_PROFILE: NetworkProfile = NetworkProfile::Normal;

/// Occupies a tab slot while its surface is being replaced. It has no event
/// subscription and ignores every operation.
pub(crate) struct DetachedSurface;

impl Surface for DetachedSurface {
    fn id(&self) -> SurfaceId {
        SurfaceId::DETACHED
    }

    fn profile(&self) -> &NetworkProfile {
        &DETACHED_PROFILE
    }

    fn navigate(&mut self, _uri: &str) {}

    fn reload(&mut self) {}

    fn go_back(&mut self) {}

    fn go_forward(&mut self) {}

    fn can_go_back(&self) -> bool {
        false
    }

    fn can_go_forward(&self) -> bool {
        false
    }

    fn current_uri(&self) -> Option<&str> {
        None
    }

    fn current_title(&self) -> Option<&str> {
        None
    }

    fn is_loading(&self) -> bool {
        false
    }

    fn execute_script(&mut self, _script: &str) {}
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(surface = %self.link.id(), "surface destroyed");
    }
}

fn title_for(uri: &str) -> Option<String> {
    if uri == BLANK_LOCATION {
        return None;
    }
    if uri.starts_with("file://") {
        if uri.ends_with("newtab.html") {
            return Some(NEW_TAB_TITLE.to_string());
        }
        return uri.rsplit('/').next().map(str::to_string);
    }
    host_from_location(uri).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn drain(rx: &crossbeam_channel::Receiver<SurfaceEvent>) -> Vec<SurfaceEventKind> {
        rx.try_iter().map(|event| event.kind).collect()
    }

    #[test]
    fn navigate_reports_location_title_and_finish() {
        let factory = HeadlessFactory::new(PrivacySettings::default());
        let (tx, rx) = unbounded();
        let mut surface = factory.create(SurfaceLink::new(0, tx), NavigationMode::Normal);

        surface.navigate("https://www.example.com/path");

        assert_eq!(
            drain(&rx),
            vec![
                SurfaceEventKind::LocationChanged("https://www.example.com/path".to_string()),
                SurfaceEventKind::TitleChanged(Some("www.example.com".to_string())),
                SurfaceEventKind::LoadFinished,
            ]
        );
        assert_eq!(surface.current_uri(), Some("https://www.example.com/path"));
        assert!(!surface.is_loading());
    }

    #[test]
    fn back_and_forward_walk_the_navigation_stack() {
        let factory = HeadlessFactory::new(PrivacySettings::default());
        let (tx, _rx) = unbounded();
        let mut surface = factory.create(SurfaceLink::new(0, tx), NavigationMode::Normal);

        assert!(!surface.can_go_back());
        surface.navigate("https://a.example");
        surface.navigate("https://b.example");
        assert!(surface.can_go_back());

        surface.go_back();
        assert_eq!(surface.current_uri(), Some("https://a.example"));
        assert!(surface.can_go_forward());

        surface.go_forward();
        assert_eq!(surface.current_uri(), Some("https://b.example"));
        assert!(!surface.can_go_forward());

        surface.go_back();
        surface.navigate("https://c.example");
        assert!(!surface.can_go_forward());
    }

    #[test]
    fn privacy_profile_is_fixed_at_construction() {
        let factory = HeadlessFactory::new(PrivacySettings::default());
        let (tx, _rx) = unbounded();
        let surface = factory.create(SurfaceLink::new(1, tx), NavigationMode::PrivacyRouted);

        match surface.profile() {
            NetworkProfile::PrivacyRouted(settings) => {
                assert_eq!(settings.proxy_uri, DEFAULT_PRIVACY_PROXY);
                assert_eq!(settings.user_agent, DEFAULT_PRIVACY_USER_AGENT);
                assert!(!settings.enable_webrtc);
                assert!(!settings.enable_media_source);
            }
            NetworkProfile::Normal => panic!("expected privacy-routed profile"),
        }
        assert_eq!(surface.mode(), NavigationMode::PrivacyRouted);
    }

    #[test]
    fn dropping_a_surface_updates_live_count() {
        let factory = HeadlessFactory::new(PrivacySettings::default());
        let stats = factory.stats();
        let (tx, _rx) = unbounded();
        let surface = factory.create(SurfaceLink::new(0, tx), NavigationMode::Normal);
        assert_eq!(stats.live(), 1);
        drop(surface);
        assert_eq!(stats.live(), 0);
        assert_eq!(stats.created(), 1);
    }

    #[test]
    fn new_tab_page_has_a_friendly_title() {
        assert_eq!(
            title_for("file:///opt/tabshell/newtab.html").as_deref(),
            Some("New Tab")
        );
        assert_eq!(title_for("about:blank"), None);
    }
}
