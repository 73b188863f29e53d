/*
 * docgen-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Storage abstraction layer for the docgen template pipeline.
 *
 * The generator reads templates, writes artifacts, deletes stale outputs
 * and persists its manifest exclusively through the FileStore trait:
 *
 * - NativeFileStore: the local filesystem (default for the CLI)
 * - MemoryFileStore: an in-memory tree with read counting (tests, embedders)
 */

mod memory;
mod native;
pub mod paths;
mod traits;

// Re-export core types (API surface)
pub use traits::{FileStore, PathKind, RuntimeError, RuntimeResult};

// Re-export store implementations
pub use memory::MemoryFileStore;
pub use native::NativeFileStore;

/// Create the default store for the current platform.
pub fn default_store() -> NativeFileStore {
    NativeFileStore::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_stores_agree_on_missing_paths() {
        let native = default_store();
        let memory = MemoryFileStore::new();
        let missing = Path::new("/definitely/not/here.md");

        assert!(!native.path_exists(missing, None).unwrap());
        assert!(!memory.path_exists(missing, None).unwrap());
        assert!(matches!(
            memory.file_read(missing),
            Err(RuntimeError::NotFound(_))
        ));
    }
}
