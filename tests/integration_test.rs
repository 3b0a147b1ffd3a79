use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn notestore_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_notestore"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    notestore_cmd()
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    serde_json::from_str(&run_ok(dir, args)).unwrap()
}

/// Initialized store with one user and one project; returns their ids.
fn setup(tmp: &TempDir) -> (String, String) {
    run_ok(tmp.path(), &["init"]);
    let user = run_json(
        tmp.path(),
        &["user", "add", "Aaron Sumner", "--email=aaron@example.com", "--json"],
    );
    let user_id = user["id"].as_str().unwrap().to_string();
    let project = run_json(
        tmp.path(),
        &["project", "add", "Test Project", "--owner", &user_id, "--json"],
    );
    let project_id = project["id"].as_str().unwrap().to_string();
    (user_id, project_id)
}

fn add_note(tmp: &TempDir, user_id: &str, project_id: &str, message: &str) -> String {
    let note = run_json(
        tmp.path(),
        &[
            "note", "add", message, "--user", user_id, "--project", project_id, "--json",
        ],
    );
    note["id"].as_str().unwrap().to_string()
}

#[test]
fn test_init_creates_store_directory() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["init"]);

    assert!(output.status.success());
    assert!(tmp.path().join(".notestore").exists());
    assert!(tmp.path().join(".notestore/notes.db").exists());
    assert!(tmp.path().join(".notestore/config.yaml").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    run_ok(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["init"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Already initialized"));
}

#[test]
fn test_commands_without_init_fail() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["note", "list"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not in a notestore project"));
}

#[test]
fn test_add_and_get_note() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);

    let note_id = add_note(&tmp, &user_id, &project_id, "This is a sample note.");

    let note = run_json(tmp.path(), &["note", "get", &note_id[..8], "--json"]);
    assert_eq!(note["message"], "This is a sample note.");
    assert_eq!(note["user"]["name"], "Aaron Sumner");
    assert_eq!(note["project"]["id"], project_id.as_str());
    assert!(note["attachment"].is_null());

    let text = run_ok(tmp.path(), &["note", "get", &note_id]);
    assert!(text.contains("This is a sample note."));
    assert!(text.contains("by Aaron Sumner on Test Project"));
}

#[test]
fn test_add_note_with_blank_message_fails() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);

    let output = run(
        tmp.path(),
        &["note", "add", "   ", "--user", &user_id, "--project", &project_id],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Message can't be blank"));

    let notes = run_json(tmp.path(), &["note", "list", "--json"]);
    assert_eq!(notes.as_array().unwrap().len(), 0);
}

#[test]
fn test_add_note_for_unknown_project_fails() {
    let tmp = TempDir::new().unwrap();
    let (user_id, _) = setup(&tmp);

    let output = run(
        tmp.path(),
        &[
            "note",
            "add",
            "Lost",
            "--user",
            &user_id,
            "--project",
            "00000000-0000-4000-8000-000000000000",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not found: project"));
}

#[test]
fn test_search_workflow() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);

    let note1 = add_note(&tmp, &user_id, &project_id, "This is the first note.");
    let note2 = add_note(&tmp, &user_id, &project_id, "This is the second note.");
    let note3 = add_note(&tmp, &user_id, &project_id, "First, preheat the oven.");

    let found = run_json(tmp.path(), &["note", "search", "first", "--json"]);
    let ids: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![note1.as_str(), note3.as_str()]);
    assert!(!ids.contains(&note2.as_str()));

    let text = run_ok(tmp.path(), &["note", "search", "message"]);
    assert!(text.contains("No notes match \"message\"."));

    let all = run_json(tmp.path(), &["note", "list", "--json"]);
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[test]
fn test_search_with_project_filter() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    let other = run_json(
        tmp.path(),
        &["project", "add", "Kitchen", "--owner", &user_id, "--json"],
    );
    let other_id = other["id"].as_str().unwrap().to_string();

    add_note(&tmp, &user_id, &project_id, "First draft");
    let kitchen = add_note(&tmp, &user_id, &other_id, "First, preheat the oven.");

    let query = format!("project:{} first", other_id);
    let found = run_json(tmp.path(), &["note", "search", &query, "--json"]);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], kitchen.as_str());
}

#[test]
fn test_attach_and_delete_workflow() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    let note_id = add_note(&tmp, &user_id, &project_id, "Recipe card");

    let file = tmp.path().join("test_attachment.txt");
    std::fs::write(&file, "Preheat to 350.").unwrap();

    let text = run_ok(
        tmp.path(),
        &["note", "attach", &note_id[..8], file.to_str().unwrap()],
    );
    assert!(text.contains("Attached test_attachment.txt"));

    let note = run_json(tmp.path(), &["note", "get", &note_id, "--json"]);
    assert_eq!(note["attachment"]["filename"], "test_attachment.txt");
    assert_eq!(note["attachment"]["content_type"], "text/plain");
    assert_eq!(note["attachment"]["byte_size"], 15);

    run_ok(tmp.path(), &["note", "delete", &note_id]);

    let output = run(tmp.path(), &["note", "get", &note_id]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not found"));
}

#[test]
fn test_add_note_with_attachment() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    let file = tmp.path().join("photo.png");
    std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

    let note = run_json(
        tmp.path(),
        &[
            "note",
            "add",
            "With a photo",
            "--user",
            &user_id,
            "--project",
            &project_id,
            "--attach",
            file.to_str().unwrap(),
            "--json",
        ],
    );

    assert_eq!(note["attachment"]["filename"], "photo.png");
    assert_eq!(note["attachment"]["content_type"], "image/png");
}

#[test]
fn test_add_note_rolls_back_when_storage_unusable() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    // A plain file where the blob directory should be
    std::fs::write(tmp.path().join(".notestore/storage"), "not a directory").unwrap();
    let file = tmp.path().join("a.txt");
    std::fs::write(&file, "hello").unwrap();

    let output = run(
        tmp.path(),
        &[
            "note",
            "add",
            "hello",
            "--user",
            &user_id,
            "--project",
            &project_id,
            "--attach",
            file.to_str().unwrap(),
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Attachment error"));

    let notes = run_json(tmp.path(), &["note", "list", "--json"]);
    assert_eq!(notes.as_array().unwrap().len(), 0);
}

#[test]
fn test_search_keeps_whitespace_in_term() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    let spaced = add_note(&tmp, &user_id, &project_id, "first  note");
    add_note(&tmp, &user_id, &project_id, "first note");

    let found = run_json(tmp.path(), &["note", "search", "first  note", "--json"]);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], spaced.as_str());
}

#[test]
fn test_search_folds_accented_capitals() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    add_note(&tmp, &user_id, &project_id, "Éclair recipe");

    let found = run_json(tmp.path(), &["note", "search", "éclair", "--json"]);
    assert_eq!(found.as_array().unwrap().len(), 1);
}

#[test]
fn test_list_by_project() {
    let tmp = TempDir::new().unwrap();
    let (user_id, project_id) = setup(&tmp);
    let other = run_json(
        tmp.path(),
        &["project", "add", "Other", "--owner", &user_id, "--json"],
    );
    let other_id = other["id"].as_str().unwrap().to_string();

    add_note(&tmp, &user_id, &project_id, "One");
    add_note(&tmp, &user_id, &project_id, "Two");
    add_note(&tmp, &user_id, &other_id, "Three");

    let notes = run_json(
        tmp.path(),
        &["note", "list", "--project", &project_id, "--json"],
    );
    let messages: Vec<&str> = notes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["One", "Two"]);

    let text = run_ok(tmp.path(), &["note", "list"]);
    assert!(text.contains("Three"));
    assert!(text.contains("(Aaron Sumner, less than a minute ago)"));
}
