use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use flume::Receiver;

use super::workspace_db::{self, BOOTSTRAPPED_FLAG};
use super::{AppCore, ANON_PUBKEY};
use crate::bridge::SurfaceEvent;
use crate::host::{
    BrowserHost, IdentityInfo, IdentityList, IdentityStore, SharedBrowserHost,
    SharedIdentityStore, SurfaceConfig,
};
use crate::state::{AppState, ViewMode, NO_IDENTITY_LABEL};
use crate::updates::{AppUpdate, CoreMsg, InternalEvent};
use crate::AppAction;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostCall {
    Open { tab_id: String, url: String },
    Show(u64),
    Hide(u64),
    Close(u64),
}

#[derive(Default)]
struct FakeHost {
    next_handle: AtomicU64,
    fail_open: AtomicBool,
    calls: Mutex<Vec<HostCall>>,
}

impl FakeHost {
    fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    fn opened(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HostCall::Open { .. }))
            .count()
    }
}

impl BrowserHost for FakeHost {
    fn open_surface(&self, config: SurfaceConfig) -> Option<u64> {
        assert!(config.hidden, "surfaces must start hidden");
        self.calls.lock().unwrap().push(HostCall::Open {
            tab_id: config.tab_id,
            url: config.url,
        });
        if self.fail_open.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.next_handle.fetch_add(1, Ordering::SeqCst) + 100)
    }

    fn show_surface(&self, handle: u64) {
        self.calls.lock().unwrap().push(HostCall::Show(handle));
    }

    fn hide_surface(&self, handle: u64) {
        self.calls.lock().unwrap().push(HostCall::Hide(handle));
    }

    fn close_surface(&self, handle: u64) {
        self.calls.lock().unwrap().push(HostCall::Close(handle));
    }
}

#[derive(Default)]
struct FakeIdentities {
    list: Mutex<IdentityList>,
    to_create: Mutex<VecDeque<String>>,
}

impl FakeIdentities {
    fn with(identities: &[&str], current: Option<&str>) -> Self {
        Self {
            list: Mutex::new(IdentityList {
                identities: identities.iter().map(|s| s.to_string()).collect(),
                current: current.map(str::to_string),
            }),
            to_create: Mutex::new(VecDeque::new()),
        }
    }

    fn will_create(&self, pubkey: &str) {
        self.to_create.lock().unwrap().push_back(pubkey.to_string());
    }
}

impl IdentityStore for FakeIdentities {
    fn list_identities(&self) -> IdentityList {
        self.list.lock().unwrap().clone()
    }

    fn select_identity(&self, pubkey: String) -> Option<String> {
        let mut list = self.list.lock().unwrap();
        if !list.identities.contains(&pubkey) {
            return None;
        }
        list.current = Some(pubkey.clone());
        Some(pubkey)
    }

    fn add_identity(&self) -> Option<String> {
        let pubkey = self.to_create.lock().unwrap().pop_front()?;
        let mut list = self.list.lock().unwrap();
        list.identities.push(pubkey.clone());
        list.current = Some(pubkey.clone());
        Some(pubkey)
    }

    fn edit_identity(&self, _info: IdentityInfo) -> bool {
        true
    }
}

struct Harness {
    core: AppCore,
    host: Arc<FakeHost>,
    identities: Arc<FakeIdentities>,
    updates: Receiver<AppUpdate>,
    _dir: Option<tempfile::TempDir>,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().into_owned();
        let mut h = Self::in_dir(data_dir, FakeIdentities::default());
        h._dir = Some(dir);
        h
    }

    fn in_dir(data_dir: String, identities: FakeIdentities) -> Self {
        let (update_tx, updates) = flume::unbounded();
        let (core_tx, _core_rx) = flume::unbounded();
        let host = Arc::new(FakeHost::default());
        let identities = Arc::new(identities);
        let host_dyn: Arc<dyn BrowserHost> = host.clone();
        let ids_dyn: Arc<dyn IdentityStore> = identities.clone();
        let shared_host: SharedBrowserHost = Arc::new(RwLock::new(Some(host_dyn)));
        let shared_ids: SharedIdentityStore = Arc::new(RwLock::new(Some(ids_dyn)));
        let core = AppCore::new(
            update_tx,
            core_tx,
            data_dir,
            Arc::new(RwLock::new(AppState::empty())),
            shared_host,
            shared_ids,
        );
        Self {
            core,
            host,
            identities,
            updates,
            _dir: None,
        }
    }

    fn act(&mut self, action: AppAction) {
        self.core.handle_message(CoreMsg::Action(action));
    }

    fn surface(&mut self, tab_id: &str, event: SurfaceEvent) {
        self.core
            .handle_message(CoreMsg::Internal(Box::new(InternalEvent::Surface {
                tab_id: tab_id.to_string(),
                event,
            })));
    }

    /// Play the UI's side of a pending view transition.
    fn finish_layout(&mut self) {
        if let Some(token) = self.core.state.workspace.pending_transition {
            self.act(AppAction::ViewTransitionCompleted { token });
        }
    }

    fn open(&mut self, url: &str) -> String {
        self.act(AppAction::OpenUrl {
            url: url.to_string(),
        });
        self.finish_layout();
        self.core.state.workspace.tabs[0].id.clone()
    }

    fn stored_tabs(&self, pubkey: &str) -> Vec<workspace_db::TabRecord> {
        workspace_db::list_tabs(self.core.db().unwrap(), pubkey).unwrap()
    }

    fn stored_pins(&self, pubkey: &str) -> Vec<workspace_db::PinRecord> {
        workspace_db::list_pins(self.core.db().unwrap(), pubkey).unwrap()
    }

    fn handle_of(&self, tab_id: &str) -> u64 {
        *self.core.surfaces.get(tab_id).expect("surface exists")
    }
}

#[test]
fn ensure_bootstrapped_twice_yields_one_catalog() {
    let mut h = Harness::new();
    assert!(h.core.ensure_bootstrapped("pk1").unwrap());
    assert!(!h.core.ensure_bootstrapped("pk1").unwrap());

    let pins = h.stored_pins("pk1");
    assert_eq!(pins.len(), 10);
    let orders: Vec<i64> = pins.iter().map(|p| p.order).collect();
    assert_eq!(orders, (0..10).collect::<Vec<i64>>());
    assert_eq!(pins[0].title, "NostrApp");
    assert_eq!(pins[0].app_naddr.as_deref(), Some("10"));
    assert!(workspace_db::get_flag(h.core.db().unwrap(), "pk1", BOOTSTRAPPED_FLAG).unwrap());
}

#[test]
fn start_without_identities_uses_anonymous_workspace() {
    let mut h = Harness::new();
    h.act(AppAction::Start);

    let state = &h.core.state;
    assert!(state.identities.is_empty());
    assert_eq!(state.current_identity, None);
    assert_eq!(state.identity_label, NO_IDENTITY_LABEL);
    assert_eq!(state.workspace.owner, ANON_PUBKEY);
    assert_eq!(state.workspace.pins.len(), 10);
    assert!(state.workspace.tabs.is_empty());
    assert_eq!(state.workspace.view_mode, ViewMode::PinList);
}

#[test]
fn start_with_current_identity_loads_its_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let mut h = Harness::in_dir(data_dir, FakeIdentities::with(&["pk1", "pk2"], Some("pk1")));
    h.act(AppAction::Start);

    let state = &h.core.state;
    assert_eq!(state.current_identity.as_deref(), Some("pk1"));
    assert_eq!(state.identities.len(), 2);
    assert!(state.identities[0].is_current);
    assert!(!state.identities[1].is_current);
    assert_eq!(state.workspace.owner, "pk1");
    assert!(h.stored_pins(ANON_PUBKEY).is_empty());
}

#[test]
fn open_url_creates_exactly_one_tab() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.act(AppAction::OpenUrl {
        url: "https://example.com".into(),
    });

    let tabs = &h.core.state.workspace.tabs;
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].url, "https://example.com");
    assert_eq!(tabs[0].title, "example.com");
    assert_eq!(tabs[0].icon, "https://example.com/favicon.ico");
    assert_eq!(tabs[0].order, 0);
    assert_eq!(tabs[0].app_naddr, None);

    let stored = h.stored_tabs(ANON_PUBKEY);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, tabs[0].id);
}

#[test]
fn surface_waits_for_view_transition() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.act(AppAction::OpenUrl {
        url: "https://example.com".into(),
    });

    let ws = &h.core.state.workspace;
    assert_eq!(ws.view_mode, ViewMode::TabView);
    let token = ws.pending_transition.expect("transition pending");
    let tab_id = ws.tabs[0].id.clone();
    assert_eq!(h.host.opened(), 0);
    assert!(!ws.tabs[0].is_open);

    // A stale token is dropped, not retried.
    h.act(AppAction::ViewTransitionCompleted { token: token + 7 });
    assert_eq!(h.host.opened(), 0);
    assert_eq!(h.core.state.workspace.pending_transition, Some(token));

    h.act(AppAction::ViewTransitionCompleted { token });
    let handle = h.handle_of(&tab_id);
    assert_eq!(
        h.host.calls(),
        vec![
            HostCall::Open {
                tab_id: tab_id.clone(),
                url: "https://example.com".into()
            },
            HostCall::Show(handle),
        ]
    );
    let ws = &h.core.state.workspace;
    assert_eq!(ws.pending_transition, None);
    assert_eq!(ws.active_tab_id.as_deref(), Some(tab_id.as_str()));
    assert!(ws.tabs[0].is_open && ws.tabs[0].is_active);

    // Replaying the same token does nothing.
    h.act(AppAction::ViewTransitionCompleted { token });
    assert_eq!(h.host.opened(), 1);
}

#[test]
fn hide_before_layout_cancels_pending_show() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.act(AppAction::OpenUrl {
        url: "https://example.com".into(),
    });
    let token = h.core.state.workspace.pending_transition.unwrap();

    h.act(AppAction::HideTab);
    h.act(AppAction::ViewTransitionCompleted { token });

    assert_eq!(h.host.opened(), 0);
    assert_eq!(h.core.state.workspace.view_mode, ViewMode::PinList);
    assert_eq!(h.core.state.workspace.tabs.len(), 1);
}

#[test]
fn open_pin_inherits_title_icon_and_app() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let pin = h.core.state.workspace.pins[2].clone();

    h.act(AppAction::OpenPin {
        pin_id: pin.id.clone(),
    });

    let tab = &h.core.state.workspace.tabs[0];
    assert_eq!(tab.url, pin.url);
    assert_eq!(tab.title, pin.title);
    assert_eq!(tab.icon, pin.icon);
    assert_eq!(tab.app_naddr, pin.app_naddr);
}

#[test]
fn toggle_twice_restores_visible_set() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");
    h.act(AppAction::HideTab);

    let before = h.core.state.workspace.clone();
    assert_eq!(before.active_tab_id, None);
    assert_eq!(before.last_tab_id.as_deref(), Some(tab_id.as_str()));

    h.act(AppAction::ToggleTab {
        tab_id: tab_id.clone(),
    });
    h.finish_layout();
    assert_eq!(
        h.core.state.workspace.active_tab_id.as_deref(),
        Some(tab_id.as_str())
    );

    h.act(AppAction::ToggleTab {
        tab_id: tab_id.clone(),
    });
    let after = &h.core.state.workspace;
    assert_eq!(after.active_tab_id, before.active_tab_id);
    assert_eq!(after.view_mode, before.view_mode);
    assert_eq!(after.tabs, before.tabs);

    // Hidden, not destroyed: still only one surface ever created.
    assert_eq!(h.host.opened(), 1);
    assert!(!h
        .host
        .calls()
        .iter()
        .any(|c| matches!(c, HostCall::Close(_))));
}

#[test]
fn showing_another_tab_hides_the_visible_one() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let first = h.open("https://snort.social/");
    let first_handle = h.handle_of(&first);

    // Already in tab view: no layout change, the surface comes up immediately.
    h.act(AppAction::OpenUrl {
        url: "https://iris.to/".into(),
    });
    assert_eq!(h.core.state.workspace.pending_transition, None);
    let second = h.core.state.workspace.tabs[0].id.clone();
    let second_handle = h.handle_of(&second);

    let calls = h.host.calls();
    let hide_at = calls
        .iter()
        .position(|c| *c == HostCall::Hide(first_handle))
        .expect("first hidden");
    let show_at = calls
        .iter()
        .position(|c| *c == HostCall::Show(second_handle))
        .expect("second shown");
    assert!(hide_at < show_at);

    let active: Vec<_> = h
        .core
        .state
        .workspace
        .tabs
        .iter()
        .filter(|t| t.is_active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second);
}

#[test]
fn close_removes_tab_everywhere_and_later_toggle_is_a_noop() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");
    let handle = h.handle_of(&tab_id);

    h.act(AppAction::CloseTab {
        tab_id: tab_id.clone(),
    });

    assert!(h.core.state.workspace.tabs.is_empty());
    assert!(h.stored_tabs(ANON_PUBKEY).is_empty());
    assert!(h.host.calls().contains(&HostCall::Close(handle)));
    assert_eq!(h.core.state.workspace.view_mode, ViewMode::PinList);
    assert_eq!(h.core.state.workspace.last_tab_id, None);

    let calls_before = h.host.calls().len();
    h.act(AppAction::ToggleTab { tab_id });
    assert_eq!(h.host.calls().len(), calls_before);
    assert_eq!(h.core.state.workspace.view_mode, ViewMode::PinList);
    assert_eq!(h.core.state.workspace.active_tab_id, None);
}

#[test]
fn close_active_tab_from_tab_menu() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.open("https://example.com");
    h.act(AppAction::CloseActiveTab);
    assert!(h.core.state.workspace.tabs.is_empty());
}

#[test]
fn tab_orders_stay_unique_after_close() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let a = h.open("https://a.example/");
    h.open("https://b.example/");
    h.act(AppAction::CloseTab { tab_id: a });
    h.open("https://c.example/");

    let orders: Vec<i64> = h.core.state.workspace.tabs.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![2, 1]);
}

#[test]
fn persisted_tabs_are_not_instantiated_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();

    let tab_id = {
        let mut first = Harness::in_dir(data_dir.clone(), FakeIdentities::default());
        first.act(AppAction::Start);
        first.open("https://example.com")
    };

    let mut second = Harness::in_dir(data_dir, FakeIdentities::default());
    second.act(AppAction::Start);
    assert_eq!(second.core.state.workspace.tabs.len(), 1);
    assert!(!second.core.state.workspace.tabs[0].is_open);
    assert_eq!(second.host.opened(), 0);

    second.act(AppAction::ShowTab {
        tab_id: tab_id.clone(),
    });
    second.finish_layout();
    assert_eq!(second.host.opened(), 1);
    assert!(second.core.state.workspace.tabs[0].is_active);
}

#[test]
fn first_identity_takes_over_anonymous_workspace() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");

    h.identities.will_create("pk1");
    h.act(AppAction::AddIdentity);

    let stored = h.stored_tabs("pk1");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, tab_id);
    assert_eq!(stored[0].pubkey, "pk1");
    assert!(h.stored_tabs(ANON_PUBKEY).is_empty());
    assert!(h.stored_pins(ANON_PUBKEY).is_empty());
    // The migrated catalog counts as pk1's bootstrap.
    assert_eq!(h.stored_pins("pk1").len(), 10);

    let state = &h.core.state;
    assert_eq!(state.current_identity.as_deref(), Some("pk1"));
    assert_eq!(state.workspace.owner, "pk1");
    assert_eq!(state.workspace.tabs.len(), 1);

    // A second key starts fresh; nothing moves off pk1.
    h.identities.will_create("pk2");
    h.act(AppAction::AddIdentity);
    assert_eq!(h.stored_tabs("pk1").len(), 1);
    assert_eq!(h.stored_pins("pk1").len(), 10);
    assert!(h.stored_tabs("pk2").is_empty());
    assert_eq!(h.stored_pins("pk2").len(), 10);
    assert_eq!(h.core.state.workspace.owner, "pk2");
}

#[test]
fn cancelled_add_identity_changes_nothing() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.open("https://example.com");

    h.act(AppAction::AddIdentity);
    assert_eq!(h.stored_tabs(ANON_PUBKEY).len(), 1);
    assert_eq!(h.core.state.workspace.owner, ANON_PUBKEY);
}

#[test]
fn switching_identity_keeps_tabs_apart() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let mut h = Harness::in_dir(data_dir, FakeIdentities::with(&["pk1", "pk2"], Some("pk1")));
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");
    let handle = h.handle_of(&tab_id);

    h.act(AppAction::SwitchIdentity {
        pubkey: "pk2".into(),
    });
    let state = &h.core.state;
    assert_eq!(state.current_identity.as_deref(), Some("pk2"));
    assert_eq!(state.workspace.owner, "pk2");
    assert!(state.workspace.tabs.is_empty());
    assert_eq!(state.workspace.pins.len(), 10);
    assert!(h.host.calls().contains(&HostCall::Close(handle)));
    assert_eq!(h.stored_tabs("pk1").len(), 1);

    h.act(AppAction::SwitchIdentity {
        pubkey: "pk1".into(),
    });
    let ws = &h.core.state.workspace;
    assert_eq!(ws.tabs.len(), 1);
    assert_eq!(ws.tabs[0].id, tab_id);
    assert!(!ws.tabs[0].is_open);
}

#[test]
fn refused_switch_keeps_current_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let mut h = Harness::in_dir(data_dir, FakeIdentities::with(&["pk1"], Some("pk1")));
    h.act(AppAction::Start);

    h.act(AppAction::SwitchIdentity {
        pubkey: "stranger".into(),
    });
    assert_eq!(h.core.state.workspace.owner, "pk1");
    assert!(h.core.state.toast.is_some());

    h.act(AppAction::ClearToast);
    assert!(h.core.state.toast.is_none());
}

#[test]
fn edit_identity_reloads_current_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let mut h = Harness::in_dir(data_dir, FakeIdentities::with(&["pk1"], Some("pk1")));
    h.act(AppAction::Start);
    h.open("https://example.com");

    h.act(AppAction::EditIdentity {
        info: IdentityInfo {
            pubkey: "pk1".into(),
            name: Some("main".into()),
        },
    });
    assert_eq!(h.core.state.workspace.owner, "pk1");
    assert_eq!(h.core.state.workspace.tabs.len(), 1);
}

#[test]
fn load_stop_and_bridge_rewrite_tab_url() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://snort.social/");

    h.surface(
        &tab_id,
        SurfaceEvent::LoadStop {
            url: "https://snort.social/notifications".into(),
        },
    );
    assert_eq!(
        h.core.state.workspace.tabs[0].url,
        "https://snort.social/notifications"
    );
    assert_eq!(
        h.stored_tabs(ANON_PUBKEY)[0].url,
        "https://snort.social/notifications"
    );

    h.core
        .handle_message(CoreMsg::Internal(Box::new(InternalEvent::BridgeSetUrl {
            tab_id: tab_id.clone(),
            url: "https://snort.social/p/abc".into(),
        })));
    assert_eq!(
        h.stored_tabs(ANON_PUBKEY)[0].url,
        "https://snort.social/p/abc"
    );
}

#[test]
fn bridge_set_url_for_unknown_tab_is_ignored() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let rev = h.core.state.rev;
    h.core
        .handle_message(CoreMsg::Internal(Box::new(InternalEvent::BridgeSetUrl {
            tab_id: "gone".into(),
            url: "https://x.example/".into(),
        })));
    assert_eq!(h.core.state.rev, rev);
}

#[test]
fn blank_navigation_opens_a_new_tab() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let origin = h.open("https://coracle.social/");

    h.surface(
        &origin,
        SurfaceEvent::BlankNavigation {
            url: "https://njump.me/npub1xyz".into(),
        },
    );
    h.finish_layout();

    let ws = &h.core.state.workspace;
    assert_eq!(ws.tabs.len(), 2);
    assert_eq!(ws.tabs[0].url, "https://njump.me/npub1xyz");
    assert_eq!(ws.active_tab_id.as_deref(), Some(ws.tabs[0].id.as_str()));
    assert!(!ws.tabs[1].is_active);
    assert!(ws.tabs[1].is_open);
}

#[test]
fn menu_request_closes_the_tab() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");
    h.surface(&tab_id, SurfaceEvent::MenuRequested);
    assert!(h.core.state.workspace.tabs.is_empty());
    assert!(h.stored_tabs(ANON_PUBKEY).is_empty());
}

#[test]
fn page_clicks_pass_through_to_the_ui() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");
    while h.updates.try_recv().is_ok() {}

    h.surface(&tab_id, SurfaceEvent::Click { x: 12.0, y: 640.5 });

    match h.updates.try_recv().unwrap() {
        AppUpdate::ClickPassthrough {
            tab_id: got, x, y, ..
        } => {
            assert_eq!(got, tab_id);
            assert_eq!((x, y), (12.0, 640.5));
        }
        other => panic!("unexpected update {other:?}"),
    }
    assert!(h.updates.try_recv().is_err());
}

#[test]
fn page_reporting_another_known_key_raises_toast() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let mut h = Harness::in_dir(data_dir, FakeIdentities::with(&["pk1", "pk2"], Some("pk1")));
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");

    h.surface(
        &tab_id,
        SurfaceEvent::PubkeyExtracted {
            pubkey: "pk1".into(),
        },
    );
    assert!(h.core.state.toast.is_none());

    h.surface(
        &tab_id,
        SurfaceEvent::PubkeyExtracted {
            pubkey: "pk2".into(),
        },
    );
    assert!(h.core.state.toast.is_some());
    assert_eq!(h.core.state.workspace.owner, "pk1");
}

#[test]
fn surface_failure_is_fatal_only_to_that_tab() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.host.fail_open.store(true, Ordering::SeqCst);
    let tab_id = h.open("https://example.com");

    let ws = &h.core.state.workspace;
    assert_eq!(ws.tabs.len(), 1);
    assert!(!ws.tabs[0].is_open);
    assert_eq!(ws.active_tab_id, None);
    assert_eq!(ws.view_mode, ViewMode::PinList);
    assert!(h.core.state.toast.is_some());

    h.act(AppAction::CloseTab { tab_id });
    assert!(h.core.state.workspace.tabs.is_empty());
    h.host.fail_open.store(false, Ordering::SeqCst);
    h.open("https://example.com");
    assert!(h.core.state.workspace.tabs[0].is_open);
}

#[test]
fn tabs_group_by_originating_app() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let snort = h
        .core
        .state
        .workspace
        .pins
        .iter()
        .find(|p| p.title == "Snort")
        .cloned()
        .unwrap();
    h.act(AppAction::OpenPin {
        pin_id: snort.id.clone(),
    });
    h.finish_layout();
    h.act(AppAction::OpenPin {
        pin_id: snort.id.clone(),
    });
    h.open("https://example.com/a");

    let groups = h.core.state.workspace.tab_groups.clone();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id, "host:example.com");
    assert_eq!(groups[1].id, "app:2");
    assert_eq!(groups[1].title, "Snort");
    assert_eq!(groups[1].tab_ids.len(), 2);

    h.act(AppAction::CloseTabGroup {
        group_id: "app:2".into(),
    });
    let ws = &h.core.state.workspace;
    assert_eq!(ws.tabs.len(), 1);
    assert_eq!(ws.tabs[0].url, "https://example.com/a");
    assert_eq!(h.stored_tabs(ANON_PUBKEY).len(), 1);
}

#[test]
fn pin_tab_appends_to_launcher() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://habla.news/");

    h.act(AppAction::PinTab {
        tab_id: tab_id.clone(),
    });
    let pins = &h.core.state.workspace.pins;
    assert_eq!(pins.len(), 11);
    assert_eq!(pins[10].url, "https://habla.news/");
    assert_eq!(pins[10].order, 10);
    assert_eq!(h.stored_pins(ANON_PUBKEY).len(), 11);

    h.act(AppAction::PinTab { tab_id });
    assert_eq!(h.core.state.workspace.pins.len(), 11);
    assert!(h.core.state.toast.is_some());
}

#[test]
fn invalid_url_is_rejected_with_toast() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.act(AppAction::OpenUrl {
        url: "not a url".into(),
    });
    assert!(h.core.state.workspace.tabs.is_empty());
    assert!(h.core.state.toast.is_some());
    assert_eq!(h.core.state.workspace.view_mode, ViewMode::PinList);
}

#[test]
fn closing_a_background_tab_keeps_the_visible_one() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let a = h.open("https://a.example/");
    let b = h.open("https://b.example/");
    let b_handle = h.handle_of(&b);

    h.act(AppAction::CloseTab { tab_id: a });
    let ws = &h.core.state.workspace;
    assert_eq!(ws.view_mode, ViewMode::TabView);
    assert_eq!(ws.active_tab_id.as_deref(), Some(b.as_str()));
    assert_eq!(ws.tabs.len(), 1);
    assert!(!h.host.calls().contains(&HostCall::Hide(b_handle)));

    h.act(AppAction::ShowTab { tab_id: b.clone() });
    assert_eq!(h.core.state.workspace.view_mode, ViewMode::TabView);
    assert_eq!(
        h.core.state.workspace.active_tab_id.as_deref(),
        Some(b.as_str())
    );
}

#[test]
fn closing_a_background_group_keeps_the_visible_tab() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.open("https://a.example/one");
    h.open("https://a.example/two");
    let visible = h.open("https://b.example/");

    h.act(AppAction::CloseTabGroup {
        group_id: "host:a.example".into(),
    });
    let ws = &h.core.state.workspace;
    assert_eq!(ws.tabs.len(), 1);
    assert_eq!(ws.view_mode, ViewMode::TabView);
    assert_eq!(ws.active_tab_id.as_deref(), Some(visible.as_str()));
}

#[test]
fn toggle_twice_before_layout_completes_is_a_noop() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    let tab_id = h.open("https://example.com");
    h.act(AppAction::HideTab);
    let before = h.core.state.workspace.clone();

    h.act(AppAction::ToggleTab {
        tab_id: tab_id.clone(),
    });
    let token = h
        .core
        .state
        .workspace
        .pending_transition
        .expect("transition pending");
    h.act(AppAction::ToggleTab { tab_id });

    let after = h.core.state.workspace.clone();
    assert_eq!(after.view_mode, before.view_mode);
    assert_eq!(after.pending_transition, None);
    assert_eq!(after.active_tab_id, None);

    // The UI finishing the cancelled layout must not bring the tab back.
    h.act(AppAction::ViewTransitionCompleted { token });
    assert_eq!(h.core.state.workspace.view_mode, ViewMode::PinList);
    assert_eq!(h.core.state.workspace.active_tab_id, None);
}

#[test]
fn first_key_with_existing_workspace_gets_one_catalog() {
    let mut h = Harness::new();
    h.act(AppAction::Start);
    h.open("https://example.com");
    // pk1 was used on this device before and already has its own pins.
    h.core.ensure_bootstrapped("pk1").unwrap();

    h.identities.will_create("pk1");
    h.act(AppAction::AddIdentity);

    let pins = h.stored_pins("pk1");
    assert_eq!(pins.len(), 10);
    let mut orders: Vec<i64> = pins.iter().map(|p| p.order).collect();
    orders.dedup();
    assert_eq!(orders.len(), 10);
    assert_eq!(h.stored_tabs("pk1").len(), 1);
    assert!(h.stored_pins(ANON_PUBKEY).is_empty());
}
