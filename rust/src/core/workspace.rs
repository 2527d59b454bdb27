// Workspace session, bootstrap and migration.

use super::*;
use crate::state::{PinSummary, TabGroup, TabSummary, ViewMode, WorkspaceState};

/// Everything the view layer used to keep in scattered globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct WorkspaceSession {
    pub(super) owner: String,
    pub(super) view_mode: ViewMode,
    /// The one visible tab, if any.
    pub(super) active_tab: Option<String>,
    /// Most recently hidden tab, kept so the tab menu can act on it.
    pub(super) last_tab: Option<String>,
    pub(super) pending: Option<PendingTransition>,
}

/// A surface show that waits for the tab bar to finish its layout change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PendingTransition {
    pub(super) token: u64,
    pub(super) tab_id: String,
}

impl WorkspaceSession {
    pub(super) fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            view_mode: ViewMode::PinList,
            active_tab: None,
            last_tab: None,
            pending: None,
        }
    }
}

impl AppCore {
    /// Seed the default catalog for `pubkey` unless that already happened.
    /// Safe to call on every start and after every identity switch.
    pub(super) fn ensure_bootstrapped(&mut self, pubkey: &str) -> anyhow::Result<bool> {
        if !self.config.bootstrap_enabled() {
            return Ok(false);
        }
        let apps = self
            .config
            .default_apps
            .clone()
            .unwrap_or_else(catalog::default_apps);
        let pins: Vec<PinRecord> = apps
            .into_iter()
            .enumerate()
            .map(|(i, app)| PinRecord {
                id: uuid::Uuid::new_v4().to_string(),
                pubkey: pubkey.to_string(),
                url: app.url,
                title: app.name,
                icon: app.picture,
                app_naddr: Some(app.naddr),
                order: i as i64,
            })
            .collect();
        let count = pins.len();
        let seeded = workspace_db::seed_pins(self.db()?, pubkey, &pins)
            .with_context(|| format!("bootstrap pins for {pubkey}"))?;
        if seeded {
            tracing::info!(pubkey, pins = count, "new workspace, bootstrapped");
        }
        Ok(seeded)
    }

    /// Replace in-memory tabs and pins with what is stored for `pubkey`.
    /// Surfaces are not created here; `show` does that lazily.
    pub(super) fn load_workspace(&mut self, pubkey: &str) -> anyhow::Result<()> {
        let db = self.db()?;
        let tabs = workspace_db::list_tabs(db, pubkey).context("list tabs")?;
        let pins = workspace_db::list_pins(db, pubkey).context("list pins")?;
        tracing::info!(pubkey, tabs = tabs.len(), pins = pins.len(), "workspace loaded");

        self.close_all_surfaces();
        self.tabs = tabs;
        self.pins = pins;
        self.session = WorkspaceSession::new(pubkey);
        Ok(())
    }

    /// Bootstrap (if needed) then load. Failures leave an empty workspace and a toast.
    pub(super) fn enter_workspace(&mut self, pubkey: &str) {
        if let Err(e) = self.ensure_bootstrapped(pubkey) {
            tracing::warn!(err = %format!("{e:#}"), pubkey, "bootstrap failed");
        }
        if let Err(e) = self.load_workspace(pubkey) {
            tracing::warn!(err = %format!("{e:#}"), pubkey, "failed to load workspace");
            self.close_all_surfaces();
            self.tabs.clear();
            self.pins.clear();
            self.session = WorkspaceSession::new(pubkey);
            self.toast("Could not load your apps");
        }
    }

    /// Hand the anonymous workspace to the first real identity. Only ever
    /// moves records owned by the anonymous sentinel, never between two real
    /// identities.
    pub(super) fn migrate_default_workspace(&mut self, pubkey: &str) -> anyhow::Result<()> {
        if pubkey == ANON_PUBKEY {
            return Ok(());
        }
        let moved = workspace_db::reassign_identity(self.db()?, ANON_PUBKEY, pubkey)
            .with_context(|| format!("reassign anonymous workspace to {pubkey}"))?;
        tracing::info!(
            pubkey,
            tabs = moved.tabs,
            pins = moved.pins,
            "migrated anonymous workspace"
        );
        self.ensure_bootstrapped(pubkey)?;
        Ok(())
    }

    pub(super) fn close_all_surfaces(&mut self) {
        let host = self.browser_host();
        for (tab_id, handle) in self.surfaces.drain() {
            tracing::debug!(tab_id, handle, "closing surface");
            if let Some(host) = host.as_ref() {
                host.close_surface(handle);
            }
        }
    }

    pub(super) fn rebuild_workspace_state(&mut self) {
        let session = &self.session;
        let tabs: Vec<TabSummary> = self
            .tabs
            .iter()
            .map(|t| TabSummary {
                id: t.id.clone(),
                url: t.url.clone(),
                title: t.title.clone(),
                icon: t.icon.clone(),
                app_naddr: t.app_naddr.clone(),
                order: t.order,
                is_open: self.surfaces.contains_key(&t.id),
                is_active: session.active_tab.as_deref() == Some(t.id.as_str()),
            })
            .collect();
        let pins = self
            .pins
            .iter()
            .map(|p| PinSummary {
                id: p.id.clone(),
                url: p.url.clone(),
                title: p.title.clone(),
                icon: p.icon.clone(),
                app_naddr: p.app_naddr.clone(),
                order: p.order,
            })
            .collect();
        self.state.workspace = WorkspaceState {
            owner: session.owner.clone(),
            view_mode: session.view_mode,
            pins,
            tab_groups: group_tabs(&self.tabs),
            tabs,
            active_tab_id: session.active_tab.clone(),
            last_tab_id: session.last_tab.clone(),
            pending_transition: session.pending.as_ref().map(|p| p.token),
        };
    }
}

/// Group key: the originating app when known, else the hostname.
pub(super) fn group_key(tab: &TabRecord) -> String {
    if let Some(naddr) = tab.app_naddr.as_deref().filter(|n| !n.is_empty()) {
        return format!("app:{naddr}");
    }
    let host = url::Url::parse(&tab.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| tab.url.clone());
    format!("host:{host}")
}

/// Groups in tab-list order, each titled after its first tab.
pub(super) fn group_tabs(tabs: &[TabRecord]) -> Vec<TabGroup> {
    let mut groups: Vec<TabGroup> = Vec::new();
    for tab in tabs {
        let key = group_key(tab);
        match groups.iter_mut().find(|g| g.id == key) {
            Some(group) => group.tab_ids.push(tab.id.clone()),
            None => groups.push(TabGroup {
                id: key,
                title: tab.title.clone(),
                icon: tab.icon.clone(),
                tab_ids: vec![tab.id.clone()],
            }),
        }
    }
    groups
}
