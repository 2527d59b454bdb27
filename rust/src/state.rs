/// Full snapshot handed to the native UI on every change.
#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct AppState {
    pub rev: u64,
    pub identities: Vec<IdentitySummary>,
    pub current_identity: Option<String>,
    /// Header text for the identity dropdown.
    pub identity_label: String,
    pub workspace: WorkspaceState,
    pub toast: Option<String>,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            identities: vec![],
            current_identity: None,
            identity_label: NO_IDENTITY_LABEL.to_string(),
            workspace: WorkspaceState::empty(),
            toast: None,
        }
    }
}

pub const NO_IDENTITY_LABEL: &str = "Key is not chosen";

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct IdentitySummary {
    pub pubkey: String,
    pub npub: String,
    pub label: String,
    pub is_current: bool,
}

#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Footer shows pins and tab icons; no surface visible.
    PinList,
    /// Footer shows the tab menu; at most one surface visible.
    TabView,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct WorkspaceState {
    /// Identity whose tabs and pins are loaded (may be the anonymous sentinel).
    pub owner: String,
    pub view_mode: ViewMode,
    pub pins: Vec<PinSummary>,
    pub tabs: Vec<TabSummary>,
    pub tab_groups: Vec<TabGroup>,
    pub active_tab_id: Option<String>,
    pub last_tab_id: Option<String>,
    /// Set while the UI owes us a `ViewTransitionCompleted` for this token.
    pub pending_transition: Option<u64>,
}

impl WorkspaceState {
    pub fn empty() -> Self {
        Self {
            owner: String::new(),
            view_mode: ViewMode::PinList,
            pins: vec![],
            tabs: vec![],
            tab_groups: vec![],
            active_tab_id: None,
            last_tab_id: None,
            pending_transition: None,
        }
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct PinSummary {
    pub id: String,
    pub url: String,
    pub title: String,
    pub icon: String,
    pub app_naddr: Option<String>,
    pub order: i64,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct TabSummary {
    pub id: String,
    pub url: String,
    pub title: String,
    pub icon: String,
    pub app_naddr: Option<String>,
    pub order: i64,
    /// A native surface exists for this tab.
    pub is_open: bool,
    pub is_active: bool,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct TabGroup {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub tab_ids: Vec<String>,
}

/// `npub1abcdefg...xyz` style shortening used in the identity dropdown.
pub fn short_npub(npub: &str) -> String {
    if npub.len() <= 62 || !npub.is_ascii() {
        return npub.to_string();
    }
    format!("{}...{}", &npub[..10], &npub[59..])
}
