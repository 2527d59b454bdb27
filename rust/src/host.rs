//! Native collaborators: the embedded-browser host and the identity store.
//!
//! Both are implemented on the platform side (WKWebView / Android WebView, the
//! platform keystore) and attached to `FfiApp` before `AppAction::Start`.

use std::sync::{Arc, RwLock};

use crate::bridge::{SurfaceEvents, TabBridge};

/// Everything the host needs to build one surface.
#[derive(uniffi::Record, Clone, Debug)]
pub struct SurfaceConfig {
    pub tab_id: String,
    pub url: String,
    /// Surfaces start hidden; the core shows them once layout is committed.
    pub hidden: bool,
    pub bridge: Arc<TabBridge>,
    pub events: Arc<SurfaceEvents>,
}

#[uniffi::export(callback_interface)]
pub trait BrowserHost: Send + Sync + 'static {
    /// Returns an opaque handle, or `None` if the surface could not be created.
    fn open_surface(&self, config: SurfaceConfig) -> Option<u64>;
    fn show_surface(&self, handle: u64);
    fn hide_surface(&self, handle: u64);
    fn close_surface(&self, handle: u64);
}

pub type SharedBrowserHost = Arc<RwLock<Option<Arc<dyn BrowserHost>>>>;

#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityList {
    /// Hex pubkeys of every key in the store.
    pub identities: Vec<String>,
    pub current: Option<String>,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct IdentityInfo {
    pub pubkey: String,
    pub name: Option<String>,
}

#[uniffi::export(callback_interface)]
pub trait IdentityStore: Send + Sync + 'static {
    fn list_identities(&self) -> IdentityList;
    /// Returns the new current identity, or `None` if the switch was refused.
    fn select_identity(&self, pubkey: String) -> Option<String>;
    /// Returns the created identity, or `None` if the user cancelled.
    fn add_identity(&self) -> Option<String>;
    fn edit_identity(&self, info: IdentityInfo) -> bool;
}

pub type SharedIdentityStore = Arc<RwLock<Option<Arc<dyn IdentityStore>>>>;

pub(crate) fn read_slot<T: ?Sized>(slot: &RwLock<Option<Arc<T>>>) -> Option<Arc<T>> {
    match slot.read() {
        Ok(g) => g.clone(),
        Err(poison) => poison.into_inner().clone(),
    }
}

pub(crate) fn write_slot<T: ?Sized>(slot: &RwLock<Option<Arc<T>>>, value: Arc<T>) {
    match slot.write() {
        Ok(mut g) => *g = Some(value),
        Err(poison) => *poison.into_inner() = Some(value),
    }
}
