//! Process-wide configuration values (§6, §9).
//!
//! Unlike the Python original, where `EMBEDDING_CACHE` is a module-level
//! global read once from the environment, these are explicit values
//! threaded into the loader. Reading them from the environment is a
//! policy of the CLI collaborator, not of this crate.

use std::path::PathBuf;

/// Controls whether `levUp`/`levDown` (§4.4) are preloaded to RAM
/// immediately after a corpus is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingCacheMode {
    /// Preload both embedding CSRs right after load (the default).
    On,
    /// Never auto-preload; callers may still call `preload()` manually.
    Off,
    /// Reserved for a future lazy/background preload policy; for now
    /// behaves like `On` except it does not block the caller before
    /// the first embedding access (the core treats `Lazy` and `On`
    /// identically since there is no background thread, see §5).
    Lazy,
}

impl EmbeddingCacheMode {
    /// Parses the mode the way the core's stricter rule requires:
    /// only the exact lowercase token `"off"` means `Off`. Any other
    /// string, including `"OFF"`, is treated as `On`. Lowercasing an
    /// environment variable before calling this is a boundary concern
    /// (§9 open question) — this function does not do it for you.
    pub fn from_exact_token(token: &str) -> EmbeddingCacheMode {
        match token {
            "off" => EmbeddingCacheMode::Off,
            "lazy" => EmbeddingCacheMode::Lazy,
            _ => EmbeddingCacheMode::On,
        }
    }

    pub(crate) fn auto_preloads(self) -> bool {
        !matches!(self, EmbeddingCacheMode::Off)
    }
}

impl Default for EmbeddingCacheMode {
    fn default() -> Self {
        EmbeddingCacheMode::On
    }
}

/// Verbosity of load/compile diagnostics. The core never prints;
/// collaborators (CLI, MCP server) use this to decide their own
/// logging verbosity. Kept here only because the manifest/loader
/// plumb it through as an explicit value (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceLevel {
    Normal,
    Deep,
}

impl Default for SilenceLevel {
    fn default() -> Self {
        SilenceLevel::Normal
    }
}

/// Loader-wide configuration, passed explicitly to `Corpus::open`.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Name of the cache subdirectory under the source directory.
    /// Default `.cfm`.
    pub cache_dir_name: String,
    pub embedding_cache: EmbeddingCacheMode,
    pub silence: SilenceLevel,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            cache_dir_name: ".cfm".to_string(),
            embedding_cache: EmbeddingCacheMode::default(),
            silence: SilenceLevel::default(),
        }
    }
}

impl LoaderConfig {
    pub fn cache_dir(&self, source_dir: &std::path::Path) -> PathBuf {
        source_dir.join(&self.cache_dir_name)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
