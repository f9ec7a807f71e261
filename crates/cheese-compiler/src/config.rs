//! Compiler configuration.

use std::path::PathBuf;

use cheese_core::GcConfig;

/// Settings for one compilation unit.
///
/// Built with [`Default`] and adjusted with the `with_*` methods:
///
/// ```
/// use cheese_compiler::CompilerConfig;
///
/// let config = CompilerConfig::default()
///     .with_gc_threshold(64)
///     .with_library_root("/usr/lib/cheese");
/// assert_eq!(config.gc.threshold, 64);
/// assert_eq!(config.source_extension, "chs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Collector tuning for the unit's object heap.
    pub gc: GcConfig,
    /// Directories searched for imports after the importing file's directory.
    pub library_roots: Vec<PathBuf>,
    /// Extension of source files, without the dot.
    pub source_extension: String,
    /// File name (without extension) of a directory package's entry file.
    pub package_entry: String,
    /// Width of a pointer in bytes, used for `__size__`.
    pub pointer_size: u64,
    /// Name of the fallback entry function when none is flagged `entry`.
    pub entry_name: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            gc: GcConfig::default(),
            library_roots: Vec::new(),
            source_extension: "chs".to_string(),
            package_entry: "lib".to_string(),
            pointer_size: 8,
            entry_name: "main".to_string(),
        }
    }
}

impl CompilerConfig {
    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc.threshold = threshold;
        self
    }

    pub fn with_library_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.library_roots.push(root.into());
        self
    }

    pub fn with_pointer_size(mut self, bytes: u64) -> Self {
        self.pointer_size = bytes;
        self
    }

    pub fn with_entry_name(mut self, name: impl Into<String>) -> Self {
        self.entry_name = name.into();
        self
    }
}
