use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::entity::{format_elapsed, FileUpload, Note};
use crate::error::{NoteStoreError, Result};
use crate::search::parse_query;
use crate::storage::{NoteStore, STORE_DIR};

/// Find the project root by looking for .notestore/ or .git/
pub fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(STORE_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_store() -> Result<NoteStore> {
    NoteStore::open(&find_project_root())
}

fn short_id(id: &Uuid) -> String {
    id.to_string()[..7].to_string()
}

fn read_upload(path: &Path) -> Result<FileUpload> {
    let data = fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| NoteStoreError::Attachment(format!("not a file: {}", path.display())))?;
    Ok(FileUpload::guess(filename, data))
}

fn print_note_line(note: &Note) {
    let attached = if note.is_attached() { " [file]" } else { "" };
    println!(
        "{}  {}{}  ({}, {} ago)",
        short_id(&note.id),
        note.message.as_deref().unwrap_or_default(),
        attached,
        note.user_name().unwrap_or("unknown"),
        format_elapsed(note.age())
    );
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let _store = NoteStore::init(&root)?;

    println!("Initialized note store in {}", root.display());
    Ok(())
}

pub fn handle_user_add(name: String, email: Option<String>, json: bool) -> Result<()> {
    let store = open_store()?;
    let user = store.create_user(name, email)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Created user {} - {}", user.id, user.name);
    }
    Ok(())
}

pub fn handle_project_add(
    name: String,
    owner: Uuid,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let store = open_store()?;
    let owner = store.get_user(owner)?;
    let project = store.create_project(name, description, &owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!("Created project {} - {}", project.id, project.name);
    }
    Ok(())
}

pub fn handle_note_add(
    message: String,
    user: Uuid,
    project: Uuid,
    attach: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let store = open_store()?;
    let user = store.get_user(user)?;
    let project = store.get_project(project)?;

    // Read the file up front so a bad path doesn't leave a note behind
    let upload = attach.as_deref().map(read_upload).transpose()?;

    let mut note = Note::new(message, user, project);
    store.insert_note(&note)?;

    if let Some(upload) = upload {
        // A failed attach must not leave a half-created note behind
        if let Err(e) = store.attach(&mut note, upload) {
            store.delete_note(note.id)?;
            return Err(e);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!(
            "Created note {} - {}",
            short_id(&note.id),
            note.message.as_deref().unwrap_or_default()
        );
        if let Some(attachment) = &note.attachment {
            println!("  attached {}", attachment.filename);
        }
    }
    Ok(())
}

pub fn handle_note_get(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    println!(
        "{} {}",
        short_id(&note.id),
        note.message.as_deref().unwrap_or_default()
    );
    println!(
        "  by {} on {}, {} ago",
        note.user_name().unwrap_or("unknown"),
        note.project.as_ref().map(|p| p.name.as_str()).unwrap_or("unknown"),
        format_elapsed(note.age())
    );
    if let Some(attachment) = &note.attachment {
        println!(
            "  attachment: {} ({}, {} bytes)",
            attachment.filename, attachment.content_type, attachment.byte_size
        );
    }
    Ok(())
}

pub fn handle_note_list(project: Option<Uuid>, json: bool) -> Result<()> {
    let store = open_store()?;
    let notes = match project {
        Some(project_id) => store.notes_for_project(project_id)?,
        None => store.list_notes()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        for note in &notes {
            print_note_line(note);
        }
    }
    Ok(())
}

pub fn handle_note_search(query: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let (term, filter) = parse_query(&query);
    let notes = store.search_filtered(&term, &filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes match \"{}\".", term);
    } else {
        for note in &notes {
            print_note_line(note);
        }
    }
    Ok(())
}

pub fn handle_note_attach(id: String, path: PathBuf) -> Result<()> {
    let store = open_store()?;
    let mut note = store.find_note(&id)?;
    let upload = read_upload(&path)?;

    store.attach(&mut note, upload)?;

    if let Some(attachment) = &note.attachment {
        println!(
            "Attached {} to note {}",
            attachment.filename,
            short_id(&note.id)
        );
    }
    Ok(())
}

pub fn handle_note_delete(id: String) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;

    store.delete_note(note.id)?;

    println!("Deleted note {}", short_id(&note.id));
    Ok(())
}
