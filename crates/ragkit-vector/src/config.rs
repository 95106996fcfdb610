//! Configuration for ragkit-vector.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the vector database.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to store data on disk. If None, data is kept in memory only.
    pub data_path: Option<PathBuf>,

    /// Searches fail with `NotLoaded` unless a load scope is active.
    pub require_load: bool,
}

impl Config {
    /// Create an in-memory configuration.
    ///
    /// Data will not be persisted and will be lost when the process exits.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a persistent configuration.
    ///
    /// Collections are written under `path` on every flush and restored on open.
    pub fn persistent<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Require an active load scope for searches.
    pub fn with_require_load(mut self, required: bool) -> Self {
        self.require_load = required;
        self
    }
}

/// HNSW index parameters.
///
/// These control the trade-off between search accuracy, speed, and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Maximum number of connections per element per layer.
    ///
    /// Typical values: 12-48. Default: 16.
    pub m: usize,

    /// Size of the dynamic candidate list during construction.
    ///
    /// Typical values: 100-500. Default: 200.
    pub ef_construction: usize,

    /// Size of the dynamic candidate list during search. Default: 64.
    pub ef_search: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}

impl IndexParams {
    /// Lower accuracy, faster construction and search.
    pub fn fast() -> Self {
        Self {
            m: 8,
            ef_construction: 100,
            ef_search: 32,
        }
    }

    /// Higher accuracy, slower and larger.
    pub fn accurate() -> Self {
        Self {
            m: 32,
            ef_construction: 400,
            ef_search: 200,
        }
    }

    /// Set the M parameter (connections per layer).
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    /// Set the ef_construction parameter.
    pub fn with_ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    /// Set the ef_search parameter.
    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }
}

/// Per-query search options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Overrides the index's `ef_search` for this query.
    pub ef_search: Option<usize>,
}

impl SearchParams {
    /// Use a specific candidate list size.
    pub fn with_ef_search(ef: usize) -> Self {
        Self { ef_search: Some(ef) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config() {
        let config = Config::memory();
        assert!(config.data_path.is_none());
        assert!(!config.require_load);
    }

    #[test]
    fn test_persistent_config() {
        let config = Config::persistent("/tmp/vectors").with_require_load(true);
        assert!(config.data_path.is_some());
        assert!(config.require_load);
    }

    #[test]
    fn test_index_presets() {
        let fast = IndexParams::fast();
        let accurate = IndexParams::accurate();

        assert!(fast.m < accurate.m);
        assert!(fast.ef_construction < accurate.ef_construction);
        assert_eq!(IndexParams::default().with_m(24).m, 24);
    }
}
