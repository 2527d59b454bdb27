use crate::bridge::SurfaceEvent;
use crate::state::AppState;
use crate::AppAction;

#[derive(uniffi::Enum, Clone, Debug)]
#[allow(clippy::large_enum_variant)] // uniffi enums cannot use Box<T> indirection
pub enum AppUpdate {
    /// Primary update stream: always send a full state snapshot.
    FullState(AppState),
    /// A tap the page did not consume; the UI should hit-test it against its own views.
    ClickPassthrough {
        rev: u64,
        tab_id: String,
        x: f64,
        y: f64,
    },
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
            AppUpdate::ClickPassthrough { rev, .. } => *rev,
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(AppAction),
    Internal(Box<InternalEvent>),
}

#[derive(Debug)]
pub enum InternalEvent {
    // Page -> host, via the per-tab sink.
    Surface { tab_id: String, event: SurfaceEvent },
    // Page navigation report through the bridge.
    BridgeSetUrl { tab_id: String, url: String },
}
