//! Objects handed to each embedded page.
//!
//! `TabBridge` is what the hosted web app may call. It carries exactly two
//! capabilities: report its own navigation, and decode NIP-19 identifiers.
//! `SurfaceEvents` is the host-side sink for page lifecycle callbacks.
//! Both only hold a sender into the actor, so calls from any thread are
//! serialized with every other mutation.

use flume::Sender;
use nostr::nips::nip19::{FromBech32, Nip19};

use crate::updates::{CoreMsg, InternalEvent};

#[derive(uniffi::Object, Debug)]
pub struct TabBridge {
    tab_id: String,
    core_tx: Sender<CoreMsg>,
}

impl TabBridge {
    pub(crate) fn new(tab_id: String, core_tx: Sender<CoreMsg>) -> Self {
        Self { tab_id, core_tx }
    }
}

#[uniffi::export]
impl TabBridge {
    /// Fire-and-forget; the page never learns whether the write succeeded.
    pub fn set_url(&self, url: String) {
        let _ = self
            .core_tx
            .send(CoreMsg::Internal(Box::new(InternalEvent::BridgeSetUrl {
                tab_id: self.tab_id.clone(),
                url,
            })));
    }

    pub fn decode(&self, identifier: String) -> Result<DecodedEntity, DecodeError> {
        decode_identifier(&identifier)
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    LoadStop { url: String },
    PubkeyExtracted { pubkey: String },
    Click { x: f64, y: f64 },
    MenuRequested,
    BlankNavigation { url: String },
}

impl SurfaceEvent {
    pub fn tag(&self) -> &'static str {
        match self {
            SurfaceEvent::LoadStop { .. } => "LoadStop",
            SurfaceEvent::PubkeyExtracted { .. } => "PubkeyExtracted",
            SurfaceEvent::Click { .. } => "Click",
            SurfaceEvent::MenuRequested => "MenuRequested",
            SurfaceEvent::BlankNavigation { .. } => "BlankNavigation",
        }
    }
}

#[derive(uniffi::Object, Debug)]
pub struct SurfaceEvents {
    tab_id: String,
    core_tx: Sender<CoreMsg>,
}

impl SurfaceEvents {
    pub(crate) fn new(tab_id: String, core_tx: Sender<CoreMsg>) -> Self {
        Self { tab_id, core_tx }
    }
}

#[uniffi::export]
impl SurfaceEvents {
    pub fn deliver(&self, event: SurfaceEvent) {
        let _ = self
            .core_tx
            .send(CoreMsg::Internal(Box::new(InternalEvent::Surface {
                tab_id: self.tab_id.clone(),
                event,
            })));
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum DecodedEntity {
    Pubkey {
        pubkey: String,
    },
    Profile {
        pubkey: String,
        relays: Vec<String>,
    },
    Note {
        event_id: String,
    },
    Event {
        event_id: String,
        author: Option<String>,
        kind: Option<u16>,
        relays: Vec<String>,
    },
    Address {
        kind: u16,
        pubkey: String,
        identifier: String,
        relays: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DecodeError {
    #[error("malformed identifier: {reason}")]
    Malformed { reason: String },
    #[error("unsupported identifier type")]
    Unsupported,
}

pub fn decode_identifier(identifier: &str) -> Result<DecodedEntity, DecodeError> {
    let identifier = identifier.trim();
    let identifier = identifier.strip_prefix("nostr:").unwrap_or(identifier);
    let decoded = Nip19::from_bech32(identifier).map_err(|e| DecodeError::Malformed {
        reason: e.to_string(),
    })?;
    match decoded {
        Nip19::Pubkey(pk) => Ok(DecodedEntity::Pubkey {
            pubkey: pk.to_hex(),
        }),
        Nip19::Profile(profile) => Ok(DecodedEntity::Profile {
            pubkey: profile.public_key.to_hex(),
            relays: relays(&profile.relays),
        }),
        Nip19::EventId(id) => Ok(DecodedEntity::Note {
            event_id: id.to_hex(),
        }),
        Nip19::Event(ev) => Ok(DecodedEntity::Event {
            event_id: ev.event_id.to_hex(),
            author: ev.author.map(|pk| pk.to_hex()),
            kind: ev.kind.map(|k| k.as_u16()),
            relays: relays(&ev.relays),
        }),
        Nip19::Coordinate(coord) => Ok(DecodedEntity::Address {
            kind: coord.coordinate.kind.as_u16(),
            pubkey: coord.coordinate.public_key.to_hex(),
            identifier: coord.coordinate.identifier.clone(),
            relays: relays(&coord.relays),
        }),
        // Secret keys never cross into page content.
        _ => Err(DecodeError::Unsupported),
    }
}

fn relays<T: ToString>(list: &[T]) -> Vec<String> {
    list.iter().map(|r| r.to_string()).collect()
}
