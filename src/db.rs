//! Game database — key/value lookup tables for disc, game, and achievement
//! metadata.
//!
//! The host fetches and parses the database files; this module only holds
//! the resulting tables and answers lookups. The optical-drive module calls
//! [`Database::recognize_disc`] when it reads a disc serial — a direct call
//! replacing the old pattern of patching a callback into the drive.

use std::collections::HashMap;

use log::{info, warn};

use crate::error::DbError;

/// One database entry: free-form string fields keyed by name.
pub type Record = HashMap<String, String>;

/// The three lookup tables, each keyed by its natural id (disc serial,
/// game id, achievement id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Discs,
    Games,
    Achievements,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Discs => "discs",
            Table::Games => "games",
            Table::Achievements => "achievements",
        }
    }
}

/// In-memory database. A table is `None` until its payload arrives; lookups
/// against an unloaded table warn and return nothing rather than failing.
#[derive(Debug, Default)]
pub struct Database {
    discs: Option<HashMap<String, Record>>,
    games: Option<HashMap<String, Record>>,
    achievements: Option<HashMap<String, Record>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a JSON object of the shape
    /// `{ "<key>": { "<field>": "<value>", ... }, ... }`. Replaces any
    /// previous contents and returns the entry count.
    pub fn load_table(&mut self, table: Table, json: &str) -> Result<usize, DbError> {
        let entries: HashMap<String, Record> =
            serde_json::from_str(json).map_err(|e| DbError::BadPayload {
                table: table.name(),
                detail: e.to_string(),
            })?;
        Ok(self.install_table(table, entries))
    }

    /// Install an already-parsed table (the WASM surface hands over tables
    /// deserialized from host objects). Returns the entry count.
    pub fn install_table(&mut self, table: Table, entries: HashMap<String, Record>) -> usize {
        let count = entries.len();
        info!("[db] {} loaded: {count} entries", table.name());
        *self.slot_mut(table) = Some(entries);
        count
    }

    pub fn is_loaded(&self, table: Table) -> bool {
        self.slot(table).is_some()
    }

    pub fn find_disc(&self, serial: &str) -> Option<&Record> {
        self.lookup(Table::Discs, serial)
    }

    pub fn find_game(&self, id: &str) -> Option<&Record> {
        self.lookup(Table::Games, id)
    }

    pub fn find_achievement(&self, id: &str) -> Option<&Record> {
        self.lookup(Table::Achievements, id)
    }

    /// Disc-recognition hook for the optical-drive module: logs the outcome
    /// and hands back the metadata record if the serial is known.
    pub fn recognize_disc(&self, serial: &str) -> Option<&Record> {
        match self.find_disc(serial) {
            Some(record) => {
                info!("[db] disc recognized: {serial}");
                Some(record)
            }
            None => {
                warn!("[db] disc not in database: {serial}");
                None
            }
        }
    }

    fn lookup(&self, table: Table, key: &str) -> Option<&Record> {
        match self.slot(table) {
            Some(entries) => entries.get(key),
            None => {
                warn!("[db] {} not loaded yet", table.name());
                None
            }
        }
    }

    fn slot(&self, table: Table) -> &Option<HashMap<String, Record>> {
        match table {
            Table::Discs => &self.discs,
            Table::Games => &self.games,
            Table::Achievements => &self.achievements,
        }
    }

    fn slot_mut(&mut self, table: Table) -> &mut Option<HashMap<String, Record>> {
        match table {
            Table::Discs => &mut self.discs,
            Table::Games => &mut self.games,
            Table::Achievements => &mut self.achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCS: &str = r#"{
        "SCUS-94163": { "title": "Gran Turismo", "region": "NTSC-U" },
        "SLES-00524": { "title": "Rayman", "region": "PAL" }
    }"#;

    #[test]
    fn load_reports_entry_count() {
        let mut db = Database::new();
        assert_eq!(db.load_table(Table::Discs, DISCS).unwrap(), 2);
        assert!(db.is_loaded(Table::Discs));
        assert!(!db.is_loaded(Table::Games));
    }

    #[test]
    fn lookup_before_load_returns_nothing() {
        let db = Database::new();
        assert!(db.find_disc("SCUS-94163").is_none());
        assert!(db.find_game("anything").is_none());
    }

    #[test]
    fn find_disc_by_serial() {
        let mut db = Database::new();
        db.load_table(Table::Discs, DISCS).unwrap();

        let record = db.find_disc("SCUS-94163").unwrap();
        assert_eq!(record.get("title").unwrap(), "Gran Turismo");
        assert!(db.find_disc("SLUS-00000").is_none());
    }

    #[test]
    fn recognize_disc_is_a_plain_lookup() {
        let mut db = Database::new();
        db.load_table(Table::Discs, DISCS).unwrap();

        assert!(db.recognize_disc("SLES-00524").is_some());
        assert!(db.recognize_disc("not-a-serial").is_none());
    }

    #[test]
    fn reload_replaces_the_table() {
        let mut db = Database::new();
        db.load_table(Table::Discs, DISCS).unwrap();
        db.load_table(Table::Discs, r#"{ "ONLY-ONE": { "title": "X" } }"#)
            .unwrap();

        assert!(db.find_disc("SCUS-94163").is_none());
        assert!(db.find_disc("ONLY-ONE").is_some());
    }

    #[test]
    fn bad_payload_is_an_error() {
        let mut db = Database::new();
        let err = db.load_table(Table::Games, "not json").unwrap_err();
        assert!(matches!(err, DbError::BadPayload { table: "games", .. }));
        assert!(!db.is_loaded(Table::Games));
    }
}
