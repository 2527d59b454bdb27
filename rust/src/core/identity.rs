// Identity list, switching, and first-key migration.

use nostr::nips::nip19::ToBech32;
use nostr::PublicKey;

use super::*;
use crate::host::IdentityInfo;
use crate::state::{short_npub, IdentitySummary, NO_IDENTITY_LABEL};

impl AppCore {
    /// Refresh the identity list from the store. Returns the current identity.
    /// An absent or empty store yields no identities without raising anything.
    pub(super) fn load_identities(&mut self) -> Option<String> {
        let list = match self.identity_store() {
            Some(store) => store.list_identities(),
            None => {
                tracing::debug!("no identity store attached");
                Default::default()
            }
        };

        let mut identities: Vec<String> = Vec::with_capacity(list.identities.len());
        for pk in list.identities.into_iter().filter(|pk| !pk.trim().is_empty()) {
            if !identities.contains(&pk) {
                identities.push(pk);
            }
        }
        let current = list.current.filter(|pk| !pk.trim().is_empty());
        if let Some(current) = current.as_ref() {
            if !identities.contains(current) {
                identities.push(current.clone());
            }
        }
        tracing::info!(count = identities.len(), has_current = current.is_some(), "identities loaded");

        self.state.identities = identities
            .iter()
            .map(|pk| {
                let npub = npub_for(pk);
                IdentitySummary {
                    label: short_npub(&npub),
                    npub,
                    pubkey: pk.clone(),
                    is_current: current.as_deref() == Some(pk.as_str()),
                }
            })
            .collect();
        self.state.identity_label = match current.as_deref() {
            Some(pk) => short_npub(&npub_for(pk)),
            None => NO_IDENTITY_LABEL.to_string(),
        };
        self.state.current_identity = current.clone();
        self.identities = identities;
        current
    }

    pub(super) fn switch_identity(&mut self, pubkey: &str) {
        let Some(store) = self.identity_store() else {
            tracing::warn!("switch identity: no identity store attached");
            return;
        };
        if self.state.current_identity.as_deref() == Some(pubkey) {
            return;
        }
        let Some(selected) = store.select_identity(pubkey.to_string()) else {
            tracing::warn!(pubkey, "identity store refused switch");
            self.toast("Could not switch keys");
            return;
        };
        if self.state.current_identity.as_deref() == Some(selected.as_str()) {
            return;
        }
        let current = self.load_identities().unwrap_or(selected);
        tracing::info!(pubkey = %current, "switched identity");
        self.enter_workspace(&current);
    }

    pub(super) fn add_identity(&mut self) {
        let Some(store) = self.identity_store() else {
            tracing::warn!("add identity: no identity store attached");
            return;
        };
        let was_anonymous = self.session.owner == ANON_PUBKEY;
        let Some(created) = store.add_identity().filter(|pk| !pk.trim().is_empty()) else {
            tracing::info!("add identity cancelled");
            return;
        };
        let current = self.load_identities().unwrap_or_else(|| created.clone());
        tracing::info!(pubkey = %created, was_anonymous, "identity added");

        if was_anonymous {
            if let Err(e) = self.migrate_default_workspace(&created) {
                tracing::warn!(err = %format!("{e:#}"), pubkey = %created, "migration failed");
                self.toast("Could not move your tabs to the new key");
            }
        }
        self.enter_workspace(&current);
    }

    pub(super) fn edit_identity(&mut self, info: IdentityInfo) {
        let Some(store) = self.identity_store() else {
            tracing::warn!("edit identity: no identity store attached");
            return;
        };
        if !store.edit_identity(info) {
            tracing::info!("identity edit not applied");
            return;
        }
        let current = self
            .load_identities()
            .unwrap_or_else(|| ANON_PUBKEY.to_string());
        self.enter_workspace(&current);
    }

    /// A page told us which key it is signing with.
    pub(super) fn on_page_pubkey(&mut self, tab_id: &str, pubkey: &str) {
        if self.state.current_identity.as_deref() == Some(pubkey) {
            return;
        }
        let known = self.identities.iter().any(|pk| pk == pubkey);
        tracing::info!(tab_id, known, "page reports a different key");
        if known {
            self.toast("This app is using another of your keys");
        }
    }
}

pub(super) fn npub_for(pubkey_hex: &str) -> String {
    PublicKey::from_hex(pubkey_hex)
        .ok()
        .and_then(|pk| pk.to_bech32().ok())
        .unwrap_or_else(|| pubkey_hex.to_string())
}
