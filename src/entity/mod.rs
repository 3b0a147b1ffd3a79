mod attachment;
mod note;
mod project;
mod user;

pub use attachment::{compute_checksum, Attachment, FileUpload};
pub use note::{format_elapsed, Note};
pub use project::Project;
pub use user::User;
