mod catalog;
mod config;
mod identity;
mod tabs;
mod workspace;
mod workspace_db;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Context;
use flume::Sender;

use crate::actions::AppAction;
use crate::bridge::SurfaceEvent;
use crate::host::{
    read_slot, BrowserHost, IdentityStore, SharedBrowserHost, SharedIdentityStore,
};
use crate::state::AppState;
use crate::updates::{AppUpdate, CoreMsg, InternalEvent};

use workspace::WorkspaceSession;
use workspace_db::{PinRecord, TabRecord};

/// Owner of the anonymous workspace used until the first key exists.
pub const ANON_PUBKEY: &str = "anon";

pub struct AppCore {
    pub state: AppState,
    rev: u64,

    update_sender: Sender<AppUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<AppState>>,
    browser_host: SharedBrowserHost,
    identity_store: SharedIdentityStore,

    data_dir: String,
    config: config::AppConfig,
    workspace_db: Option<rusqlite::Connection>,

    session: WorkspaceSession,
    // Loaded workspace, owned exclusively by the actor. Tabs are newest first.
    tabs: Vec<TabRecord>,
    pins: Vec<PinRecord>,
    // tab_id -> native surface handle. Present iff the host has the surface.
    surfaces: HashMap<String, u64>,
    // Identities the store reported on the last reload.
    identities: Vec<String>,
    next_transition_token: u64,
}

impl AppCore {
    pub fn new(
        update_sender: Sender<AppUpdate>,
        core_sender: Sender<CoreMsg>,
        data_dir: String,
        shared_state: Arc<RwLock<AppState>>,
        browser_host: SharedBrowserHost,
        identity_store: SharedIdentityStore,
    ) -> Self {
        let config = config::load_app_config(&data_dir);

        let workspace_db = match workspace_db::open_workspace_db(&data_dir) {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(%e, "failed to open workspace db");
                None
            }
        };

        let this = Self {
            state: AppState::empty(),
            rev: 0,
            update_sender,
            core_sender,
            shared_state,
            browser_host,
            identity_store,
            data_dir,
            config,
            workspace_db,
            session: WorkspaceSession::new(ANON_PUBKEY),
            tabs: vec![],
            pins: vec![],
            surfaces: HashMap::new(),
            identities: vec![],
            next_transition_token: 1,
        };

        // Ensure FfiApp.state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.rebuild_workspace_state();
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    fn emit_click_passthrough(&mut self, tab_id: String, x: f64, y: f64) {
        let rev = self.next_rev();
        let _ = self
            .update_sender
            .send(AppUpdate::ClickPassthrough { rev, tab_id, x, y });
    }

    fn toast(&mut self, msg: impl Into<String>) {
        self.state.toast = Some(msg.into());
    }

    fn db(&self) -> anyhow::Result<&rusqlite::Connection> {
        self.workspace_db
            .as_ref()
            .context("workspace db unavailable")
    }

    fn browser_host(&self) -> Option<Arc<dyn BrowserHost>> {
        read_slot(&self.browser_host)
    }

    fn identity_store(&self) -> Option<Arc<dyn IdentityStore>> {
        read_slot(&self.identity_store)
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(ref action) => {
                // Never log `?action` directly: urls can carry private deep-link params.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action.clone());
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Start => self.start(),

            AppAction::SwitchIdentity { pubkey } => self.switch_identity(&pubkey),
            AppAction::AddIdentity => self.add_identity(),
            AppAction::EditIdentity { info } => self.edit_identity(info),

            AppAction::OpenUrl { url } => self.open(&url, None),
            AppAction::OpenPin { pin_id } => {
                match self.pins.iter().find(|p| p.id == pin_id).cloned() {
                    Some(pin) => self.open(&pin.url, Some(&pin)),
                    None => tracing::warn!(pin_id, "open: unknown pin"),
                }
            }
            AppAction::ToggleTab { tab_id } => self.toggle(&tab_id),
            AppAction::ShowTab { tab_id } => self.show(&tab_id),
            AppAction::HideTab => {
                let active = self.session.active_tab.clone();
                self.hide(active.as_deref());
            }
            AppAction::CloseTab { tab_id } => self.close(&tab_id),
            AppAction::CloseActiveTab => {
                // The tab menu acts on whatever tab it was opened for.
                let target = self
                    .session
                    .active_tab
                    .clone()
                    .or_else(|| self.session.last_tab.clone());
                if let Some(tab_id) = target {
                    self.close(&tab_id);
                }
            }
            AppAction::CloseTabGroup { group_id } => self.close_tab_group(&group_id),
            AppAction::PinTab { tab_id } => self.pin_tab(&tab_id),
            AppAction::ViewTransitionCompleted { token } => self.commit_surface_creation(token),

            AppAction::ClearToast => {
                self.state.toast = None;
            }
        }
        self.emit_state();
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::Surface { tab_id, event } => self.handle_surface_event(&tab_id, event),
            InternalEvent::BridgeSetUrl { tab_id, url } => {
                if self.set_tab_url(&tab_id, &url) {
                    self.emit_state();
                }
            }
        }
    }

    fn handle_surface_event(&mut self, tab_id: &str, event: SurfaceEvent) {
        tracing::debug!(tab_id, event = event.tag(), "surface event");
        match event {
            SurfaceEvent::LoadStop { url } => {
                if !self.set_tab_url(tab_id, &url) {
                    return;
                }
            }
            SurfaceEvent::PubkeyExtracted { pubkey } => self.on_page_pubkey(tab_id, &pubkey),
            SurfaceEvent::Click { x, y } => {
                self.emit_click_passthrough(tab_id.to_string(), x, y);
                return;
            }
            SurfaceEvent::MenuRequested => self.close(tab_id),
            SurfaceEvent::BlankNavigation { url } => {
                self.hide(Some(tab_id));
                self.open(&url, None);
            }
        }
        self.emit_state();
    }

    /// Start-of-day: resolve identities, then bootstrap and load the workspace.
    fn start(&mut self) {
        tracing::info!(data_dir = %self.data_dir, "start");
        let current = self.load_identities();
        let owner = current.unwrap_or_else(|| ANON_PUBKEY.to_string());
        self.enter_workspace(&owner);
    }
}

#[cfg(test)]
mod tests;
