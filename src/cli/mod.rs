mod commands;
mod handlers;

pub use commands::{
    Cli, Commands, NoteAction, NoteCommand, ProjectAction, ProjectCommand, UserAction, UserCommand,
};
pub use handlers::{
    find_project_root, handle_init, handle_note_add, handle_note_attach, handle_note_delete,
    handle_note_get, handle_note_list, handle_note_search, handle_project_add, handle_user_add,
};
