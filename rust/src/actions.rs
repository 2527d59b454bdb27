use crate::host::IdentityInfo;

#[derive(uniffi::Enum, Debug, Clone)]
pub enum AppAction {
    // Lifecycle
    /// Sent once the native side has attached its browser host and identity store.
    Start,

    // Identities
    SwitchIdentity {
        pubkey: String,
    },
    AddIdentity,
    EditIdentity {
        info: IdentityInfo,
    },

    // Tabs
    OpenUrl {
        url: String,
    },
    OpenPin {
        pin_id: String,
    },
    ToggleTab {
        tab_id: String,
    },
    ShowTab {
        tab_id: String,
    },
    HideTab,
    CloseTab {
        tab_id: String,
    },
    CloseActiveTab,
    CloseTabGroup {
        group_id: String,
    },
    PinTab {
        tab_id: String,
    },
    /// The tab bar finished the layout change requested by a pending transition.
    ViewTransitionCompleted {
        token: u64,
    },

    // UI
    ClearToast,
}

impl AppAction {
    /// Log-safe action tag (never includes urls or identity info).
    pub fn tag(&self) -> &'static str {
        match self {
            // Lifecycle
            AppAction::Start => "Start",

            // Identities
            AppAction::SwitchIdentity { .. } => "SwitchIdentity",
            AppAction::AddIdentity => "AddIdentity",
            AppAction::EditIdentity { .. } => "EditIdentity",

            // Tabs
            AppAction::OpenUrl { .. } => "OpenUrl",
            AppAction::OpenPin { .. } => "OpenPin",
            AppAction::ToggleTab { .. } => "ToggleTab",
            AppAction::ShowTab { .. } => "ShowTab",
            AppAction::HideTab => "HideTab",
            AppAction::CloseTab { .. } => "CloseTab",
            AppAction::CloseActiveTab => "CloseActiveTab",
            AppAction::CloseTabGroup { .. } => "CloseTabGroup",
            AppAction::PinTab { .. } => "PinTab",
            AppAction::ViewTransitionCompleted { .. } => "ViewTransitionCompleted",

            // UI
            AppAction::ClearToast => "ClearToast",
        }
    }
}
