// Tab lifecycle: open/show/hide/toggle/close and the surfaces behind them.
//
// None of these emit state; the dispatcher does once per action.

use super::*;
use crate::bridge::{SurfaceEvents, TabBridge};
use crate::host::SurfaceConfig;
use crate::state::ViewMode;
use workspace::PendingTransition;

impl AppCore {
    pub(super) fn open(&mut self, url: &str, pin: Option<&PinRecord>) {
        let Some((url, parsed)) = parse_tab_url(url) else {
            tracing::warn!("open: unparseable url");
            self.toast("That address doesn't look right");
            return;
        };

        let (title, icon) = match pin {
            Some(p) => (p.title.clone(), p.icon.clone()),
            None => (
                parsed.host_str().unwrap_or(url.as_str()).to_string(),
                format!(
                    "{}{}",
                    parsed.origin().ascii_serialization(),
                    self.config.favicon_path()
                ),
            ),
        };
        let tab = TabRecord {
            id: uuid::Uuid::new_v4().to_string(),
            pubkey: self.session.owner.clone(),
            url,
            title,
            icon,
            app_naddr: pin.and_then(|p| p.app_naddr.clone()),
            order: next_tab_order(&self.tabs),
        };

        let persisted = self
            .db()
            .and_then(|db| workspace_db::insert_tab(db, &tab).context("insert tab"));
        if let Err(e) = persisted {
            tracing::warn!(err = %format!("{e:#}"), "open: failed to persist tab");
            self.toast("Could not open a new tab");
            return;
        }

        tracing::info!(tab_id = %tab.id, order = tab.order, "tab opened");
        let tab_id = tab.id.clone();
        self.tabs.insert(0, tab);
        self.show(&tab_id);
    }

    pub(super) fn show(&mut self, tab_id: &str) {
        if !self.has_tab(tab_id) {
            tracing::warn!(tab_id, "show: unknown tab");
            return;
        }
        if let Some(active) = self.session.active_tab.clone() {
            if active == tab_id {
                self.session.view_mode = ViewMode::TabView;
                return;
            }
            self.hide_surface(&active);
            self.session.active_tab = None;
        }
        self.prepare_view_transition(tab_id);
    }

    /// Hide `tab_id` (if given). When it is the visible tab, or the one a
    /// pending transition is about to show, go back to the pin list. A
    /// background tab only has its surface hidden. Surfaces stay alive.
    pub(super) fn hide(&mut self, tab_id: Option<&str>) {
        let Some(tab_id) = tab_id else {
            self.session.pending = None;
            self.session.view_mode = ViewMode::PinList;
            return;
        };
        self.hide_surface(tab_id);
        if !self.is_foreground(tab_id) {
            return;
        }
        self.session.pending = None;
        self.session.view_mode = ViewMode::PinList;
        self.session.active_tab = None;
        if self.has_tab(tab_id) {
            self.session.last_tab = Some(tab_id.to_string());
        }
    }

    pub(super) fn toggle(&mut self, tab_id: &str) {
        if !self.has_tab(tab_id) {
            tracing::debug!(tab_id, "toggle: unknown tab");
            return;
        }
        if self.is_foreground(tab_id) {
            self.hide(Some(tab_id));
        } else {
            self.show(tab_id);
        }
    }

    pub(super) fn close(&mut self, tab_id: &str) {
        if !self.has_tab(tab_id) {
            tracing::warn!(tab_id, "close: unknown tab");
            return;
        }
        self.hide(Some(tab_id));

        let deleted = self
            .db()
            .and_then(|db| workspace_db::delete_tab(db, tab_id).context("delete tab"));
        if let Err(e) = deleted {
            // Still drop it from this session; it may come back on next load.
            tracing::warn!(err = %format!("{e:#}"), tab_id, "close: failed to delete tab");
            self.toast("Could not remove the tab");
        }

        if let Some(handle) = self.surfaces.remove(tab_id) {
            if let Some(host) = self.browser_host() {
                host.close_surface(handle);
            }
        }
        self.tabs.retain(|t| t.id != tab_id);
        if self.session.last_tab.as_deref() == Some(tab_id) {
            self.session.last_tab = None;
        }
        tracing::info!(tab_id, "tab closed");
    }

    pub(super) fn close_tab_group(&mut self, group_id: &str) {
        let Some(group) = workspace::group_tabs(&self.tabs)
            .into_iter()
            .find(|g| g.id == group_id)
        else {
            tracing::warn!(group_id, "close group: unknown group");
            return;
        };
        for tab_id in group.tab_ids {
            self.close(&tab_id);
        }
    }

    pub(super) fn pin_tab(&mut self, tab_id: &str) {
        let Some(tab) = self.tabs.iter().find(|t| t.id == tab_id).cloned() else {
            tracing::warn!(tab_id, "pin: unknown tab");
            return;
        };
        if self.pins.iter().any(|p| p.url == tab.url) {
            self.toast("Already pinned");
            return;
        }
        let pin = PinRecord {
            id: uuid::Uuid::new_v4().to_string(),
            pubkey: self.session.owner.clone(),
            url: tab.url,
            title: tab.title,
            icon: tab.icon,
            app_naddr: tab.app_naddr,
            order: self.pins.iter().map(|p| p.order + 1).max().unwrap_or(0),
        };
        let persisted = self
            .db()
            .and_then(|db| workspace_db::insert_pin(db, &pin).context("insert pin"));
        match persisted {
            Ok(()) => {
                tracing::info!(tab_id, pin_id = %pin.id, "tab pinned");
                self.pins.push(pin);
            }
            Err(e) => {
                tracing::warn!(err = %format!("{e:#}"), tab_id, "pin: failed to persist");
                self.toast("Could not pin the tab");
            }
        }
    }

    /// Switch to tab view. If the tab bar has to change layout first, park the
    /// surface show behind a token the UI hands back when layout is done.
    pub(super) fn prepare_view_transition(&mut self, tab_id: &str) {
        let layout_pending =
            self.session.view_mode != ViewMode::TabView || self.session.pending.is_some();
        self.session.view_mode = ViewMode::TabView;
        if !layout_pending {
            self.show_surface_now(tab_id);
            return;
        }
        let token = self.next_transition_token;
        self.next_transition_token = self.next_transition_token.wrapping_add(1);
        tracing::debug!(tab_id, token, "view transition pending");
        self.session.pending = Some(PendingTransition {
            token,
            tab_id: tab_id.to_string(),
        });
    }

    /// Second phase: layout is final, create the surface if needed and show it.
    /// Stale tokens (superseded or cancelled transitions) are dropped.
    pub(super) fn commit_surface_creation(&mut self, token: u64) {
        if self.session.pending.as_ref().map(|p| p.token) != Some(token) {
            tracing::debug!(token, "stale view transition ignored");
            return;
        }
        let Some(pending) = self.session.pending.take() else {
            return;
        };
        self.show_surface_now(&pending.tab_id);
    }

    fn show_surface_now(&mut self, tab_id: &str) {
        let Some(tab) = self.tabs.iter().find(|t| t.id == tab_id).cloned() else {
            tracing::warn!(tab_id, "show: tab vanished before commit");
            self.session.view_mode = ViewMode::PinList;
            return;
        };
        let handle = match self.surfaces.get(tab_id).copied() {
            Some(h) => h,
            None => match self.create_surface(&tab) {
                Some(h) => h,
                None => {
                    self.toast(format!("Could not open {}", tab.title));
                    self.session.view_mode = ViewMode::PinList;
                    return;
                }
            },
        };
        if let Some(host) = self.browser_host() {
            host.show_surface(handle);
        }
        self.session.active_tab = Some(tab_id.to_string());
    }

    fn create_surface(&mut self, tab: &TabRecord) -> Option<u64> {
        let Some(host) = self.browser_host() else {
            tracing::warn!(tab_id = %tab.id, "no browser host attached");
            return None;
        };
        let config = SurfaceConfig {
            tab_id: tab.id.clone(),
            url: tab.url.clone(),
            hidden: true,
            bridge: Arc::new(TabBridge::new(tab.id.clone(), self.core_sender.clone())),
            events: Arc::new(SurfaceEvents::new(tab.id.clone(), self.core_sender.clone())),
        };
        match host.open_surface(config) {
            Some(handle) => {
                tracing::info!(tab_id = %tab.id, handle, "surface created");
                self.surfaces.insert(tab.id.clone(), handle);
                Some(handle)
            }
            None => {
                tracing::warn!(tab_id = %tab.id, "browser host failed to create surface");
                None
            }
        }
    }

    fn hide_surface(&self, tab_id: &str) {
        if let (Some(&handle), Some(host)) = (self.surfaces.get(tab_id), self.browser_host()) {
            host.hide_surface(handle);
        }
    }

    /// Rewrite a tab's url after a navigation. Persisting is best-effort.
    pub(super) fn set_tab_url(&mut self, tab_id: &str, url: &str) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == tab_id) else {
            tracing::debug!(tab_id, "set_url: tab not in current workspace");
            return false;
        };
        if tab.url == url {
            return false;
        }
        tab.url = url.to_string();
        let persisted = self
            .db()
            .and_then(|db| workspace_db::update_tab_url(db, tab_id, url).context("update tab url"));
        if let Err(e) = persisted {
            tracing::warn!(err = %format!("{e:#}"), tab_id, "set_url: failed to persist");
        }
        true
    }

    /// Visible, or waiting on layout to become visible.
    fn is_foreground(&self, tab_id: &str) -> bool {
        self.session.active_tab.as_deref() == Some(tab_id)
            || self.session.pending.as_ref().map(|p| p.tab_id.as_str()) == Some(tab_id)
    }

    fn has_tab(&self, tab_id: &str) -> bool {
        self.tabs.iter().any(|t| t.id == tab_id)
    }
}

/// Accept what the user typed: a full URL, or a bare host we assume is https.
fn parse_tab_url(raw: &str) -> Option<(String, url::Url)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(u) = url::Url::parse(raw) {
        if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() {
            return Some((raw.to_string(), u));
        }
        return None;
    }
    if raw.contains("://") || raw.contains(char::is_whitespace) {
        return None;
    }
    let candidate = format!("https://{raw}");
    let u = url::Url::parse(&candidate).ok()?;
    u.host_str()?;
    Some((candidate, u))
}

/// One past the highest order in use, so closing a tab never causes a clash.
fn next_tab_order(tabs: &[TabRecord]) -> i64 {
    tabs.iter().map(|t| t.order + 1).max().unwrap_or(0)
}
