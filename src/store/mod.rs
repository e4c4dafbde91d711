//! Persistent registry of documentation folders.

mod error;
mod folders;
mod schema;
mod types;

pub use error::StoreError;
pub use folders::{default_data_dir, FolderStore, DATABASE_FILE};
pub use schema::{apply_schema, SCHEMA, SCHEMA_VERSION};
pub use types::Folder;
