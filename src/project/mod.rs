//! Project loading — declaration batches from disk.
//!
//! An external parser (or an export of one) writes each parsed source file
//! as a JSON [`RawFile`](crate::decl::RawFile). This module walks a
//! directory for those batches and feeds them to a
//! [`TypeSystemHost`](crate::state::TypeSystemHost).

mod loader;

pub use loader::{load_directory, load_directory_into_host, load_file, load_file_into_host};
