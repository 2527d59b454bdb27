use serde::Deserialize;

/// One launcher entry. Field names match the catalog JSON used by config overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(super) struct CatalogApp {
    pub(super) naddr: String,
    pub(super) name: String,
    pub(super) picture: String,
    pub(super) url: String,
}

const DEFAULT_APPS: &[(&str, &str, &str, &str)] = &[
    (
        "10",
        "NostrApp",
        "https://nostrapp.link/logo.png",
        "https://nostrapp.link/",
    ),
    ("1", "Nostr", "asset://icons/nb.png", "https://nostr.band/"),
    ("2", "Snort", "asset://icons/snort.png", "https://snort.social/"),
    ("3", "Iris", "asset://icons/iris.png", "https://iris.to/"),
    (
        "4",
        "Coracle",
        "asset://icons/coracle.png",
        "https://coracle.social/",
    ),
    (
        "5",
        "Satellite",
        "asset://icons/satellite.png",
        "https://satellite.earth/",
    ),
    (
        "6",
        "Zapddit",
        "https://zapddit.com/assets/icons/logo-without-text-zapddit.svg",
        "https://zapddit.com/",
    ),
    (
        "7",
        "Agora",
        "https://agorasocial.app/images/favicon/120.png",
        "https://agorasocial.app/",
    ),
    (
        "8",
        "Pinstr",
        "https://pinstr.app/favicon.ico",
        "https://pinstr.app/",
    ),
    (
        "9",
        "Nosta",
        "https://nosta.me/images/apple-icon-120x120.png",
        "https://nosta.me/",
    ),
];

pub(super) fn default_apps() -> Vec<CatalogApp> {
    DEFAULT_APPS
        .iter()
        .map(|(naddr, name, picture, url)| CatalogApp {
            naddr: (*naddr).to_string(),
            name: (*name).to_string(),
            picture: (*picture).to_string(),
            url: (*url).to_string(),
        })
        .collect()
}
