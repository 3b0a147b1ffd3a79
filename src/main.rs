use clap::Parser;
use notestore::cli::{
    find_project_root, handle_init, handle_note_add, handle_note_attach, handle_note_delete,
    handle_note_get, handle_note_list, handle_note_search, handle_project_add, handle_user_add,
    Cli, Commands, NoteAction, ProjectAction, UserAction,
};
use notestore::storage::NoteStore;
use notestore::StoreConfig;
use tracing_subscriber::EnvFilter;

/// Log to stderr. RUST_LOG wins over the store's configured filter.
fn init_logging() {
    let store_dir = NoteStore::store_dir(&find_project_root());
    let default_filter = StoreConfig::load(&store_dir)
        .unwrap_or_default()
        .log_filter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::User(user_cmd) => match user_cmd.action {
            UserAction::Add { name, email, json } => handle_user_add(name, email, json),
        },
        Commands::Project(project_cmd) => match project_cmd.action {
            ProjectAction::Add {
                name,
                owner,
                description,
                json,
            } => handle_project_add(name, owner, description, json),
        },
        Commands::Note(note_cmd) => match note_cmd.action {
            NoteAction::Add {
                message,
                user,
                project,
                attach,
                json,
            } => handle_note_add(message, user, project, attach, json),
            NoteAction::Get { id, json } => handle_note_get(id, json),
            NoteAction::List { project, json } => handle_note_list(project, json),
            NoteAction::Search { query, json } => handle_note_search(query, json),
            NoteAction::Attach { id, path } => handle_note_attach(id, path),
            NoteAction::Delete { id } => handle_note_delete(id),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
