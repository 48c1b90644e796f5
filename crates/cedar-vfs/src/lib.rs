//! Virtual filesystem for Cedar.
//!
//! A single tree of [`FileNode`]s rooted at `/`, plus a bookmark table that
//! maps names to absolute paths. Both are written through a [`Storage`] port
//! after every mutation, as two independent JSON blobs.

mod filesystem;
pub mod node;
pub mod path;
pub mod storage;

/// The filesystem: tree, bookmarks, and their persistence.
pub use filesystem::{BOOKMARKS_KEY, FS_KEY, FileSystem, FsOptions};
/// Tree node and its metadata views.
pub use node::{DirEntry, FileNode, NodeKind, NodeStat};
/// Pure path resolution.
pub use path::resolve_path;
/// Persistence port and its implementations.
pub use storage::{DirStorage, MemoryStorage, Storage};
