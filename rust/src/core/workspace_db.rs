use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) const BOOTSTRAPPED_FLAG: &str = "bootstrapped";

const WORKSPACE_DB_FILE: &str = "workspace.sqlite3";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tabs (
        id TEXT PRIMARY KEY,
        pubkey TEXT NOT NULL,
        url TEXT NOT NULL,
        title TEXT NOT NULL,
        icon TEXT NOT NULL,
        app_naddr TEXT,
        sort_order INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_tabs_pubkey ON tabs(pubkey);
    CREATE TABLE IF NOT EXISTS pins (
        id TEXT PRIMARY KEY,
        pubkey TEXT NOT NULL,
        url TEXT NOT NULL,
        title TEXT NOT NULL,
        icon TEXT NOT NULL,
        app_naddr TEXT,
        sort_order INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_pins_pubkey ON pins(pubkey);
    CREATE TABLE IF NOT EXISTS flags (
        pubkey TEXT NOT NULL,
        name TEXT NOT NULL,
        value INTEGER NOT NULL,
        PRIMARY KEY (pubkey, name)
    );
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TabRecord {
    pub(super) id: String,
    pub(super) pubkey: String,
    pub(super) url: String,
    pub(super) title: String,
    pub(super) icon: String,
    pub(super) app_naddr: Option<String>,
    pub(super) order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PinRecord {
    pub(super) id: String,
    pub(super) pubkey: String,
    pub(super) url: String,
    pub(super) title: String,
    pub(super) icon: String,
    pub(super) app_naddr: Option<String>,
    pub(super) order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Reassigned {
    pub(super) tabs: usize,
    pub(super) pins: usize,
}

pub(super) fn open_workspace_db(data_dir: &str) -> rusqlite::Result<Connection> {
    let path = Path::new(data_dir).join(WORKSPACE_DB_FILE);
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

// ── Tabs ─────────────────────────────────────────────────────────────

fn tab_from_row(row: &Row<'_>) -> rusqlite::Result<TabRecord> {
    Ok(TabRecord {
        id: row.get(0)?,
        pubkey: row.get(1)?,
        url: row.get(2)?,
        title: row.get(3)?,
        icon: row.get(4)?,
        app_naddr: row.get(5)?,
        order: row.get(6)?,
    })
}

/// Newest first, matching how freshly opened tabs are prepended.
pub(super) fn list_tabs(conn: &Connection, pubkey: &str) -> rusqlite::Result<Vec<TabRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, pubkey, url, title, icon, app_naddr, sort_order
         FROM tabs
         WHERE pubkey = ?1
         ORDER BY sort_order DESC",
    )?;
    let rows = stmt.query_map([pubkey], tab_from_row)?;
    rows.collect()
}

pub(super) fn insert_tab(conn: &Connection, tab: &TabRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tabs (id, pubkey, url, title, icon, app_naddr, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            tab.id,
            tab.pubkey,
            tab.url,
            tab.title,
            tab.icon,
            tab.app_naddr,
            tab.order,
        ],
    )?;
    Ok(())
}

/// Returns false when no such tab is stored.
pub(super) fn update_tab_url(conn: &Connection, id: &str, url: &str) -> rusqlite::Result<bool> {
    let n = conn.execute("UPDATE tabs SET url = ?2 WHERE id = ?1", params![id, url])?;
    Ok(n > 0)
}

pub(super) fn delete_tab(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM tabs WHERE id = ?1", [id])?;
    Ok(n > 0)
}

#[cfg(test)]
pub(super) fn get_tab(conn: &Connection, id: &str) -> rusqlite::Result<Option<TabRecord>> {
    conn.query_row(
        "SELECT id, pubkey, url, title, icon, app_naddr, sort_order FROM tabs WHERE id = ?1",
        [id],
        tab_from_row,
    )
    .optional()
}

// ── Pins ─────────────────────────────────────────────────────────────

fn pin_from_row(row: &Row<'_>) -> rusqlite::Result<PinRecord> {
    Ok(PinRecord {
        id: row.get(0)?,
        pubkey: row.get(1)?,
        url: row.get(2)?,
        title: row.get(3)?,
        icon: row.get(4)?,
        app_naddr: row.get(5)?,
        order: row.get(6)?,
    })
}

/// Left-to-right launcher order.
pub(super) fn list_pins(conn: &Connection, pubkey: &str) -> rusqlite::Result<Vec<PinRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, pubkey, url, title, icon, app_naddr, sort_order
         FROM pins
         WHERE pubkey = ?1
         ORDER BY sort_order ASC",
    )?;
    let rows = stmt.query_map([pubkey], pin_from_row)?;
    rows.collect()
}

pub(super) fn insert_pin(conn: &Connection, pin: &PinRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO pins (id, pubkey, url, title, icon, app_naddr, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            pin.id,
            pin.pubkey,
            pin.url,
            pin.title,
            pin.icon,
            pin.app_naddr,
            pin.order,
        ],
    )?;
    Ok(())
}

/// Insert `pins` and set the bootstrap flag in one transaction, unless the
/// flag is already set. Returns whether anything was written.
pub(super) fn seed_pins(
    conn: &Connection,
    pubkey: &str,
    pins: &[PinRecord],
) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    if get_flag(&tx, pubkey, BOOTSTRAPPED_FLAG)? {
        return Ok(false);
    }
    for pin in pins {
        insert_pin(&tx, pin)?;
    }
    set_flag(&tx, pubkey, BOOTSTRAPPED_FLAG, true)?;
    tx.commit()?;
    Ok(true)
}

// ── Flags ────────────────────────────────────────────────────────────

pub(super) fn get_flag(conn: &Connection, pubkey: &str, name: &str) -> rusqlite::Result<bool> {
    let value = conn
        .query_row(
            "SELECT value FROM flags WHERE pubkey = ?1 AND name = ?2",
            params![pubkey, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(value.unwrap_or(0) != 0)
}

pub(super) fn set_flag(
    conn: &Connection,
    pubkey: &str,
    name: &str,
    value: bool,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO flags (pubkey, name, value)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(pubkey, name) DO UPDATE SET value = excluded.value",
        params![pubkey, name, value as i64],
    )?;
    Ok(())
}

// ── Migration ────────────────────────────────────────────────────────

/// Move every tab, pin and flag owned by `from` to `to`. All-or-nothing: if
/// any statement fails the transaction rolls back on drop.
///
/// `to` may already own records (a key restored on this device). Pins whose
/// url it already has are dropped, and moved rows are renumbered after its
/// highest order so orders stay unique per identity.
pub(super) fn reassign_identity(
    conn: &Connection,
    from: &str,
    to: &str,
) -> rusqlite::Result<Reassigned> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM pins WHERE pubkey = ?1
           AND url IN (SELECT url FROM pins WHERE pubkey = ?2)",
        params![from, to],
    )?;
    let tab_base = next_order(&tx, "tabs", to)?;
    let pin_base = next_order(&tx, "pins", to)?;
    let tabs = tx.execute(
        "UPDATE tabs SET pubkey = ?2, sort_order = sort_order + ?3 WHERE pubkey = ?1",
        params![from, to, tab_base],
    )?;
    let pins = tx.execute(
        "UPDATE pins SET pubkey = ?2, sort_order = sort_order + ?3 WHERE pubkey = ?1",
        params![from, to, pin_base],
    )?;
    // Flags the target already has win.
    tx.execute(
        "UPDATE OR IGNORE flags SET pubkey = ?2 WHERE pubkey = ?1",
        params![from, to],
    )?;
    tx.execute("DELETE FROM flags WHERE pubkey = ?1", [from])?;
    tx.commit()?;
    Ok(Reassigned { tabs, pins })
}

fn next_order(conn: &Connection, table: &str, pubkey: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {table} WHERE pubkey = ?1"),
        [pubkey],
        |row| row.get(0),
    )
}
