mod base;
mod memory;

pub use base::{BookmarkStore, bookmark_key};
pub use memory::MemoryBookmarkStore;
