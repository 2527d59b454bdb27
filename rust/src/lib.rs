mod actions;
mod bridge;
mod core;
mod host;
mod logging;
mod state;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::AppAction;
pub use bridge::*;
pub use crate::core::ANON_PUBKEY;
pub use host::*;
pub use state::*;
pub use updates::*;

uniffi::setup_scaffolding!();

/// Receives every `AppUpdate` on a dedicated listener thread, in rev order.
#[uniffi::export(callback_interface)]
pub trait AppReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: AppUpdate);
}

/// Handle the native shell holds for the app's lifetime. Everything it does
/// is forwarded to the actor thread that owns the workspace.
#[derive(uniffi::Object)]
pub struct FfiApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
    browser_host: SharedBrowserHost,
    identity_store: SharedIdentityStore,
}

#[uniffi::export]
impl FfiApp {
    #[uniffi::constructor]
    pub fn new(data_dir: String) -> Arc<Self> {
        logging::init_logging(&data_dir);
        tracing::info!(data_dir = %data_dir, "starting spring core");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));
        let browser_host: SharedBrowserHost = Arc::new(RwLock::new(None));
        let identity_store: SharedIdentityStore = Arc::new(RwLock::new(None));

        let actor = {
            let core_tx = core_tx.clone();
            let shared_state = shared_state.clone();
            let browser_host = browser_host.clone();
            let identity_store = identity_store.clone();
            move || {
                let mut core = crate::core::AppCore::new(
                    update_tx,
                    core_tx,
                    data_dir,
                    shared_state,
                    browser_host,
                    identity_store,
                );
                while let Ok(msg) = core_rx.recv() {
                    core.handle_message(msg);
                }
                tracing::info!("workspace actor stopped");
            }
        };
        if let Err(e) = thread::Builder::new()
            .name("spring-workspace".into())
            .spawn(actor)
        {
            // Nothing receives actions from here on; state stays empty.
            tracing::error!(%e, "failed to spawn workspace actor");
        }

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
            browser_host,
            identity_store,
        })
    }

    /// Latest committed snapshot. Cheap enough to call on every render.
    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    /// Queue an action for the actor. Never blocks; ordering across calls from
    /// one thread is preserved.
    pub fn dispatch(&self, action: AppAction) {
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn AppReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // A second listener would steal half the updates.
            tracing::warn!("listen_for_updates called twice, ignoring");
            return;
        }

        let rx = self.update_rx.clone();
        let spawned = thread::Builder::new()
            .name("spring-updates".into())
            .spawn(move || {
                while let Ok(update) = rx.recv() {
                    reconciler.reconcile(update);
                }
            });
        if let Err(e) = spawned {
            tracing::error!(%e, "failed to spawn update listener");
            self.listening.store(false, Ordering::SeqCst);
        }
    }

    /// Attach before `AppAction::Start`. Until a host is attached, showing a tab
    /// fails with a toast and the tab stays listed without a surface.
    pub fn set_browser_host(&self, host: Box<dyn BrowserHost>) {
        host::write_slot(&self.browser_host, Arc::from(host));
    }

    /// Attach before `AppAction::Start`, otherwise start resolves no identities
    /// and opens the anonymous workspace. Replacing the store later takes effect
    /// on the next identity action; the loaded workspace is not reloaded.
    pub fn set_identity_store(&self, store: Box<dyn IdentityStore>) {
        host::write_slot(&self.identity_store, Arc::from(store));
    }
}
