pub mod loader;
pub mod store;

pub use loader::{load_project, load_raw_project};
pub use store::{new_store, EntryKind, FileStore, MemoryStore, StoreEntry, TempDirStore};
