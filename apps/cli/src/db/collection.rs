//! Reading and writing the collection database inside a package.

use crate::db::error::DbError;
use crate::db::schema::{DEFAULT_CONF, DEFAULT_DCONF, LATEX_POST, LATEX_PRE, LEGACY_SCHEMA, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::{params, Connection, OpenFlags};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use vocab_core::template::ModelKind;
use vocab_core::{BuiltNote, DeckBuild, DeckInfo, FieldMap, NoteModel, UnpackedCard};

type Result<T> = std::result::Result<T, DbError>;

pub const FIELD_SEPARATOR: char = '\x1f';

const DEFAULT_DECK_ID: i64 = 1;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static CLOZE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c(\d+)::").expect("static regex"));

/// Where a collection keeps its note types and decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGeneration {
    /// JSON blobs in `col.models` and `col.decks`.
    Legacy,
    /// Separate `notetypes`, `fields` and `decks` tables.
    Split,
}

/// Name and ordered field names of one note type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub notes: usize,
    pub cards: usize,
    /// Cloze notes without a single deletion, so no card was generated.
    pub cardless_notes: usize,
}

/// Writes a legacy-schema collection.
pub struct CollectionWriter {
    conn: Connection,
}

impl CollectionWriter {
    /// Create the collection file at path.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let writer = Self { conn };
        writer.initialize()?;
        Ok(writer)
    }

    /// In-memory collection (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let writer = Self { conn };
        writer.initialize()?;
        Ok(writer)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(LEGACY_SCHEMA)?;
        Ok(())
    }

    /// Write the collection row, every model of the deck kind, and all notes.
    pub fn write_deck(&mut self, build: &DeckBuild, created: DateTime<Utc>) -> Result<WriteSummary> {
        let deck = build.kind.deck();
        let created_ms = created.timestamp_millis();
        let created_secs = created.timestamp();

        let mut models = Map::new();
        for template in build.kind.templates() {
            let model = template.model();
            models.insert(model.id.to_string(), model_json(&model, deck.id, created_secs));
        }

        let mut decks = Map::new();
        decks.insert(
            DEFAULT_DECK_ID.to_string(),
            deck_json(DEFAULT_DECK_ID, "Default", created_secs),
        );
        decks.insert(deck.id.to_string(), deck_json(deck.id, &deck.name, created_secs));

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags) VALUES (1, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, '{}')",
            params![
                created_secs,
                created_ms,
                created_ms,
                SCHEMA_VERSION,
                DEFAULT_CONF,
                Value::Object(models).to_string(),
                Value::Object(decks).to_string(),
                DEFAULT_DCONF,
            ],
        )?;

        let mut summary = WriteSummary::default();
        let mut next_card_id = created_ms;
        for (index, note) in build.notes.iter().enumerate() {
            let note_id = created_ms + index as i64;
            let model = note.template.model();
            let flds = note.fields.join(&FIELD_SEPARATOR.to_string());
            let sort_field = note.fields.first().map(String::as_str).unwrap_or_default();

            tx.execute(
                "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data) VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
                params![
                    note_id,
                    note.guid,
                    model.id,
                    created_secs,
                    flds,
                    sort_field,
                    field_checksum(sort_field),
                ],
            )?;
            summary.notes += 1;

            let ords = card_ords(&model, note);
            if ords.is_empty() {
                summary.cardless_notes += 1;
            }
            for ord in ords {
                tx.execute(
                    "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data) VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
                    params![next_card_id, note_id, deck.id, ord, created_secs, index as i64 + 1],
                )?;
                next_card_id += 1;
                summary.cards += 1;
            }
        }
        tx.commit()?;

        Ok(summary)
    }
}

/// Card ordinals a note produces: one for standard models, one per distinct
/// cloze number for cloze models.
fn card_ords(model: &NoteModel, note: &BuiltNote) -> Vec<i64> {
    match model.kind {
        ModelKind::Standard => vec![0],
        ModelKind::Cloze => note
            .fields
            .iter()
            .flat_map(|field| CLOZE_NUMBER.captures_iter(field))
            .filter_map(|caps| caps[1].parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n - 1)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

/// First 32 bits of the SHA-256 of the tag-stripped sort field.
fn field_checksum(value: &str) -> i64 {
    let stripped = HTML_TAG.replace_all(value, "");
    let digest = Sha256::digest(stripped.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

fn model_json(model: &NoteModel, deck_id: i64, mod_secs: i64) -> Value {
    let fields: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name, "ord": ord, "sticky": false, "rtl": false,
                "font": "Arial", "size": 20, "media": []
            })
        })
        .collect();

    let model_type = match model.kind {
        ModelKind::Standard => 0,
        ModelKind::Cloze => 1,
    };
    let mut value = json!({
        "id": model.id,
        "name": model.name,
        "type": model_type,
        "mod": mod_secs,
        "usn": -1,
        "sortf": 0,
        "did": deck_id,
        "tmpls": [{
            "name": model.template_name, "ord": 0, "qfmt": model.qfmt, "afmt": model.afmt,
            "did": null, "bqfmt": "", "bafmt": ""
        }],
        "flds": fields,
        "css": model.css,
        "latexPre": LATEX_PRE,
        "latexPost": LATEX_POST,
        "tags": [],
        "vers": []
    });
    if model.kind == ModelKind::Standard {
        value["req"] = json!([[0, "any", [0]]]);
    }
    value
}

fn deck_json(id: i64, name: &str, mod_secs: i64) -> Value {
    json!({
        "id": id, "name": name, "desc": "", "mod": mod_secs, "usn": -1,
        "collapsed": false, "browserCollapsed": false,
        "newToday": [0, 0], "revToday": [0, 0], "lrnToday": [0, 0], "timeToday": [0, 0],
        "dyn": 0, "conf": 1, "extendNew": 10, "extendRev": 50
    })
}

#[derive(Deserialize)]
struct LegacyModel {
    name: String,
    flds: Vec<LegacyField>,
}

#[derive(Deserialize)]
struct LegacyField {
    name: String,
    #[serde(default)]
    ord: Option<usize>,
}

#[derive(Deserialize)]
struct LegacyDeck {
    name: String,
}

/// Everything read back from a collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionContents {
    pub decks: Vec<DeckInfo>,
    pub cards: Vec<UnpackedCard>,
    /// `(note id, model id)` of notes whose model is not defined.
    pub unknown_models: Vec<(i64, i64)>,
}

/// Read-only view of a collection of either schema generation.
pub struct CollectionReader {
    conn: Connection,
}

impl CollectionReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn generation(&self) -> Result<SchemaGeneration> {
        if self.has_table("notetypes")? {
            Ok(SchemaGeneration::Split)
        } else {
            Ok(SchemaGeneration::Legacy)
        }
    }

    /// Note types by id.
    pub fn models(&self) -> Result<HashMap<i64, ModelSchema>> {
        match self.generation()? {
            SchemaGeneration::Split => self.split_models(),
            SchemaGeneration::Legacy => self.legacy_models(),
        }
    }

    fn split_models(&self) -> Result<HashMap<i64, ModelSchema>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM notetypes")?;
        let types = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut fields_stmt = self
            .conn
            .prepare("SELECT name FROM fields WHERE ntid = ?1 ORDER BY ord")?;
        let mut models = HashMap::with_capacity(types.len());
        for (id, name) in types {
            let fields = fields_stmt
                .query_map(params![id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            models.insert(id, ModelSchema { name, fields });
        }
        Ok(models)
    }

    fn legacy_models(&self) -> Result<HashMap<i64, ModelSchema>> {
        let raw: String = self.conn.query_row("SELECT models FROM col", [], |row| row.get(0))?;
        let parsed: HashMap<String, LegacyModel> = serde_json::from_str(&raw)?;

        let mut models = HashMap::with_capacity(parsed.len());
        for (key, mut model) in parsed {
            let id = parse_id("models", &key)?;
            model.flds.sort_by_key(|f| f.ord.unwrap_or(usize::MAX));
            models.insert(
                id,
                ModelSchema {
                    name: model.name,
                    fields: model.flds.into_iter().map(|f| f.name).collect(),
                },
            );
        }
        Ok(models)
    }

    /// Decks sorted by id.
    pub fn decks(&self) -> Result<Vec<DeckInfo>> {
        let mut decks = if self.has_table("decks")? {
            let mut stmt = self.conn.prepare("SELECT id, name FROM decks")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DeckInfo {
                        id: row.get(0)?,
                        // nested deck names are stored with 0x1f between levels
                        name: row.get::<_, String>(1)?.replace(FIELD_SEPARATOR, "::"),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let raw: String = self.conn.query_row("SELECT decks FROM col", [], |row| row.get(0))?;
            let parsed: HashMap<String, LegacyDeck> = serde_json::from_str(&raw)?;
            parsed
                .into_iter()
                .map(|(key, deck)| Ok(DeckInfo { id: parse_id("decks", &key)?, name: deck.name }))
                .collect::<Result<Vec<_>>>()?
        };
        decks.sort_by_key(|d| d.id);
        Ok(decks)
    }

    /// Every note with its fields named after its model, in note id order.
    pub fn read(&self) -> Result<CollectionContents> {
        let models = self.models()?;
        let decks = self.decks()?;

        let mut stmt = self
            .conn
            .prepare("SELECT id, guid, mid, flds, tags FROM notes ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut contents = CollectionContents {
            decks,
            cards: Vec::with_capacity(rows.len()),
            unknown_models: Vec::new(),
        };
        for (note_id, guid, model_id, flds, tags) in rows {
            let Some(model) = models.get(&model_id) else {
                contents.unknown_models.push((note_id, model_id));
                continue;
            };
            let values: Vec<&str> = flds.split(FIELD_SEPARATOR).collect();
            contents.cards.push(UnpackedCard {
                note_id,
                guid,
                model_id,
                model_name: model.name.clone(),
                tags,
                fields: FieldMap::zip_padded(&model.fields, &values),
            });
        }
        Ok(contents)
    }
}

/// Keys of the legacy `col.models` / `col.decks` maps are decimal ids.
fn parse_id(column: &'static str, key: &str) -> Result<i64> {
    key.parse().map_err(|_| DbError::BadIdKey {
        column,
        key: key.to_string(),
    })
}
