//! Decode configuration.

use std::path::PathBuf;

/// What to do when a payload fails to decompress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompressErrorPolicy {
    /// Abort the whole decode.
    #[default]
    Abort,
    /// Drop the row and continue with the next one.
    SkipRow,
}

/// Options controlling a single decode pass.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Write each decompressed payload next to the blob.
    pub extract: bool,

    /// Log header and per-row diagnostics at debug level.
    pub verbose: bool,

    /// Decompression failure handling.
    pub on_decompress_error: DecompressErrorPolicy,

    /// Arena budget in bytes. Derived from the entry count when unset.
    pub arena_capacity: Option<usize>,

    /// Manifest location. Derived from the blob path when unset.
    pub manifest_path: Option<PathBuf>,
}

impl DecodeOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether decompressed payloads are written to disk.
    pub fn extract(mut self, value: bool) -> Self {
        self.extract = value;
        self
    }

    /// Sets verbose diagnostics.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Sets the decompression failure policy.
    pub fn on_decompress_error(mut self, policy: DecompressErrorPolicy) -> Self {
        self.on_decompress_error = policy;
        self
    }

    /// Overrides the arena budget.
    pub fn arena_capacity(mut self, bytes: usize) -> Self {
        self.arena_capacity = Some(bytes);
        self
    }

    /// Overrides the manifest location.
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert!(!options.extract);
        assert!(!options.verbose);
        assert_eq!(options.on_decompress_error, DecompressErrorPolicy::Abort);
        assert!(options.arena_capacity.is_none());
        assert!(options.manifest_path.is_none());
    }

    #[test]
    fn test_builder() {
        let options = DecodeOptions::new()
            .extract(true)
            .verbose(true)
            .on_decompress_error(DecompressErrorPolicy::SkipRow)
            .arena_capacity(4096)
            .manifest_path("names.manifest");

        assert!(options.extract);
        assert!(options.verbose);
        assert_eq!(options.on_decompress_error, DecompressErrorPolicy::SkipRow);
        assert_eq!(options.arena_capacity, Some(4096));
        assert_eq!(options.manifest_path, Some(PathBuf::from("names.manifest")));
    }
}
