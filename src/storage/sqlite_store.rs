use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{BlobStorage, DiskStorage};
use crate::config::StoreConfig;
use crate::entity::{compute_checksum, Attachment, FileUpload, Note, Project, User};
use crate::error::{NoteStoreError, Result};
use crate::search::{contains_ignore_case, SearchFilter};

pub const STORE_DIR: &str = ".notestore";
const NOTES_DB: &str = "notes.db";

/// SQL function backing message search: `notestore_contains(message, term)`
const CONTAINS_FN: &str = "notestore_contains";

const NOTE_SELECT: &str = "
    SELECT n.id, n.message, n.created_at, n.updated_at,
           u.id, u.name, u.email, u.created_at,
           p.id, p.name, p.description, p.owner_id, p.created_at,
           a.key, a.filename, a.content_type, a.byte_size, a.checksum, a.created_at
    FROM notes n
    JOIN users u ON u.id = n.user_id
    JOIN projects p ON p.id = n.project_id
    LEFT JOIN attachments a ON a.note_id = n.id";

/// SQLite-backed note store with attachment bytes in blob storage
pub struct NoteStore {
    conn: Connection,
    blobs: Box<dyn BlobStorage>,
}

impl NoteStore {
    /// Initialize a new store under `root/.notestore`
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(STORE_DIR);

        if dir.exists() {
            return Err(NoteStoreError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;
        let config = StoreConfig::default();
        config.save(&dir)?;

        info!(dir = %dir.display(), "initialized note store");
        Self::open_dir(&dir, &config)
    }

    /// Open an existing store under `root/.notestore`
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(STORE_DIR);

        if !dir.join(NOTES_DB).exists() {
            return Err(NoteStoreError::NotInitialized);
        }

        let config = StoreConfig::load(&dir)?;
        Self::open_dir(&dir, &config)
    }

    fn open_dir(dir: &Path, config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(dir.join(NOTES_DB))?;
        let blobs = DiskStorage::new(config.storage_path(dir));
        Self::with_storage(conn, Box::new(blobs))
    }

    /// Wrap an open connection and a blob backend, creating tables as needed
    pub fn with_storage(conn: Connection, blobs: Box<dyn BlobStorage>) -> Result<Self> {
        register_functions(&conn)?;
        let store = Self { conn, blobs };
        store.init_schema()?;
        Ok(store)
    }

    /// Path of the `.notestore` directory for a project root
    pub fn store_dir(root: &Path) -> PathBuf {
        root.join(STORE_DIR)
    }

    fn init_schema(&self) -> Result<()> {
        // Attachments cascade with their note
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                owner_id TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                message TEXT NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id),
                project_id TEXT NOT NULL REFERENCES projects(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS attachments (
                note_id TEXT PRIMARY KEY REFERENCES notes(id) ON DELETE CASCADE,
                key TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                content_type TEXT NOT NULL,
                byte_size INTEGER NOT NULL,
                checksum TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_project ON notes(project_id);
            CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
            ",
        )?;

        Ok(())
    }

    pub fn create_user(&self, name: String, email: Option<String>) -> Result<User> {
        let user = User::new(name, email);
        self.conn.execute(
            "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                timestamp(&user.created_at),
            ],
        )?;
        info!(user_id = %user.id, "created user");
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                [id.to_string()],
                |row| user_from_row(row, 0),
            )
            .optional()?
            .ok_or_else(|| NoteStoreError::NotFound(format!("user {}", id)))
    }

    pub fn create_project(
        &self,
        name: String,
        description: Option<String>,
        owner: &User,
    ) -> Result<Project> {
        let mut project = Project::new(name, owner);
        project.description = description;
        self.conn.execute(
            "INSERT INTO projects (id, name, description, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id.to_string(),
                project.name,
                project.description,
                project.owner_id.to_string(),
                timestamp(&project.created_at),
            ],
        )?;
        info!(project_id = %project.id, owner_id = %owner.id, "created project");
        Ok(project)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Project> {
        self.conn
            .query_row(
                "SELECT id, name, description, owner_id, created_at FROM projects WHERE id = ?1",
                [id.to_string()],
                |row| project_from_row(row, 0),
            )
            .optional()?
            .ok_or_else(|| NoteStoreError::NotFound(format!("project {}", id)))
    }

    /// Persist a note. Invalid notes are rejected before anything is written.
    pub fn insert_note(&self, note: &Note) -> Result<()> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (id, message, user_id, project_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id.to_string(),
                note.message,
                note.user_id().map(|id| id.to_string()),
                note.project_id().map(|id| id.to_string()),
                timestamp(&note.created_at),
                timestamp(&note.updated_at),
            ],
        )?;

        info!(note_id = %note.id, "created note");
        Ok(())
    }

    pub fn get_note(&self, id: Uuid) -> Result<Note> {
        let sql = format!("{} WHERE n.id = ?1", NOTE_SELECT);
        self.conn
            .query_row(&sql, [id.to_string()], note_from_row)
            .optional()?
            .ok_or_else(|| NoteStoreError::NotFound(format!("note {}", id)))
    }

    /// Resolve a full note id or a unique prefix of one
    pub fn find_note(&self, id_or_prefix: &str) -> Result<Note> {
        if let Ok(id) = Uuid::parse_str(id_or_prefix) {
            return self.get_note(id);
        }

        let prefix = id_or_prefix.to_lowercase();
        let well_formed =
            !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
        if !well_formed {
            return Err(NoteStoreError::NotFound(format!("note {}", id_or_prefix)));
        }

        let sql = format!("{} WHERE n.id LIKE ?1 ORDER BY n.rowid LIMIT 2", NOTE_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut matches = stmt
            .query_map([format!("{}%", prefix)], note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match matches.len() {
            0 => Err(NoteStoreError::NotFound(format!("note {}", id_or_prefix))),
            1 => Ok(matches.remove(0)),
            _ => Err(NoteStoreError::AmbiguousId(id_or_prefix.to_string())),
        }
    }

    /// All notes in insertion order
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        self.query_notes(&format!("{} ORDER BY n.rowid", NOTE_SELECT), Vec::new())
    }

    pub fn notes_for_project(&self, project_id: Uuid) -> Result<Vec<Note>> {
        self.query_notes(
            &format!("{} WHERE n.project_id = ?1 ORDER BY n.rowid", NOTE_SELECT),
            vec![project_id.to_string()],
        )
    }

    pub fn count_notes(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Notes whose message contains `term`, ignoring case, in insertion order
    pub fn search(&self, term: &str) -> Result<Vec<Note>> {
        self.search_filtered(term, &SearchFilter::default())
    }

    /// Like [`NoteStore::search`], narrowed by project, user and creation time
    pub fn search_filtered(&self, term: &str, filter: &SearchFilter) -> Result<Vec<Note>> {
        let mut sql = format!("{} WHERE {}(n.message, ?1)", NOTE_SELECT, CONTAINS_FN);
        let mut args = vec![term.to_string()];

        if let Some(project_id) = filter.project_id {
            args.push(project_id.to_string());
            sql.push_str(&format!(" AND n.project_id = ?{}", args.len()));
        }
        if let Some(user_id) = filter.user_id {
            args.push(user_id.to_string());
            sql.push_str(&format!(" AND n.user_id = ?{}", args.len()));
        }
        if let Some(after) = filter.created_after {
            args.push(timestamp(&after));
            sql.push_str(&format!(" AND n.created_at > ?{}", args.len()));
        }
        if let Some(before) = filter.created_before {
            args.push(timestamp(&before));
            sql.push_str(&format!(" AND n.created_at < ?{}", args.len()));
        }
        sql.push_str(" ORDER BY n.rowid");

        debug!(term, filtered = !filter.is_empty(), "searching notes");
        self.query_notes(&sql, args)
    }

    fn query_notes(&self, sql: &str, args: Vec<String>) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let notes = stmt
            .query_map(params_from_iter(args.iter()), note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Attach a file to a persisted note, replacing any previous attachment
    pub fn attach(&self, note: &mut Note, upload: FileUpload) -> Result<()> {
        let previous = self.attachment_key(note.id)?;
        let attachment = Attachment::for_upload(&upload);
        let now = Utc::now();

        self.blobs.write(&attachment.key, &upload.data)?;

        if let Err(e) = self.record_attachment(note.id, &attachment, &now) {
            if let Err(cleanup) = self.blobs.delete(&attachment.key) {
                warn!(key = %attachment.key, error = %cleanup, "failed to remove orphaned blob");
            }
            return Err(e);
        }

        if let Some(old_key) = previous {
            if let Err(e) = self.blobs.delete(&old_key) {
                warn!(key = %old_key, error = %e, "failed to purge replaced attachment");
            }
        }

        info!(
            note_id = %note.id,
            filename = %attachment.filename,
            byte_size = attachment.byte_size,
            "attached file"
        );
        note.attachment = Some(attachment);
        note.updated_at = now;
        Ok(())
    }

    fn record_attachment(
        &self,
        note_id: Uuid,
        attachment: &Attachment,
        now: &DateTime<Utc>,
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let updated = tx.execute(
            "UPDATE notes SET updated_at = ?1 WHERE id = ?2",
            params![timestamp(now), note_id.to_string()],
        )?;
        if updated == 0 {
            return Err(NoteStoreError::NotFound(format!("note {}", note_id)));
        }

        tx.execute(
            "INSERT OR REPLACE INTO attachments
             (note_id, key, filename, content_type, byte_size, checksum, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                note_id.to_string(),
                attachment.key,
                attachment.filename,
                attachment.content_type,
                attachment.byte_size as i64,
                attachment.checksum,
                timestamp(&attachment.created_at),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Remove a note's attachment. Returns false if there was none.
    pub fn detach(&self, note: &mut Note) -> Result<bool> {
        let Some(key) = self.attachment_key(note.id)? else {
            note.attachment = None;
            return Ok(false);
        };

        self.conn.execute(
            "DELETE FROM attachments WHERE note_id = ?1",
            [note.id.to_string()],
        )?;
        self.blobs.delete(&key)?;

        info!(note_id = %note.id, "detached file");
        note.attachment = None;
        Ok(true)
    }

    /// Read back the bytes of a note's attachment, verifying the checksum
    pub fn attachment_data(&self, note: &Note) -> Result<Vec<u8>> {
        let attachment = note.attachment.as_ref().ok_or_else(|| {
            NoteStoreError::NotFound(format!("attachment for note {}", note.id))
        })?;

        let data = self.blobs.read(&attachment.key)?;
        if compute_checksum(&data) != attachment.checksum {
            return Err(NoteStoreError::Attachment(format!(
                "checksum mismatch for '{}'",
                attachment.filename
            )));
        }
        Ok(data)
    }

    /// Delete a note together with its attachment
    pub fn delete_note(&self, id: Uuid) -> Result<()> {
        let key = self.attachment_key(id)?;

        let deleted = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(NoteStoreError::NotFound(format!("note {}", id)));
        }

        if let Some(key) = key {
            self.blobs.delete(&key)?;
        }

        info!(note_id = %id, "deleted note");
        Ok(())
    }

    fn attachment_key(&self, note_id: Uuid) -> Result<Option<String>> {
        let key = self
            .conn
            .query_row(
                "SELECT key FROM attachments WHERE note_id = ?1",
                [note_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key)
    }
}

/// SQLite's LIKE only folds ASCII case, so matching is done in Rust
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        CONTAINS_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let message: Option<String> = ctx.get(0)?;
            let term: String = ctx.get(1)?;
            Ok(message.is_some_and(|m| contains_ignore_case(&m, &term)))
        },
    )?;
    Ok(())
}

/// Fixed-width UTC timestamps so text comparison matches time order
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: get_uuid(row, start)?,
        name: row.get(start + 1)?,
        email: row.get(start + 2)?,
        created_at: get_timestamp(row, start + 3)?,
    })
}

fn project_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Project> {
    Ok(Project {
        id: get_uuid(row, start)?,
        name: row.get(start + 1)?,
        description: row.get(start + 2)?,
        owner_id: get_uuid(row, start + 3)?,
        created_at: get_timestamp(row, start + 4)?,
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let key: Option<String> = row.get(13)?;
    let attachment = match key {
        Some(key) => Some(Attachment {
            key,
            filename: row.get(14)?,
            content_type: row.get(15)?,
            byte_size: row.get::<_, i64>(16)? as u64,
            checksum: row.get(17)?,
            created_at: get_timestamp(row, 18)?,
        }),
        None => None,
    };

    Ok(Note {
        id: get_uuid(row, 0)?,
        message: Some(row.get(1)?),
        created_at: get_timestamp(row, 2)?,
        updated_at: get_timestamp(row, 3)?,
        user: Some(user_from_row(row, 4)?),
        project: Some(project_from_row(row, 8)?),
        attachment,
    })
}
