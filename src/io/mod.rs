//! Filesystem side of the tool: path resolution, pattern expansion,
//! directory traversal and password entry.

mod password;
mod path;
mod walk;

pub use password::{PROMPT, PasswordPrompt, TerminalPrompt, get_password};
pub use path::{
    archive_name, archive_name_with_stamp, canonicalize, entry_name, extraction_target,
    resolve_absolute, resolve_base,
};
pub use walk::{PatternSet, Walk, expand, walk};
