//! Companion manifest lookup.
//!
//! A blob `foo.blob` may ship with `foo.manifest`, a text table mapping
//! content hashes to assembly names:
//!
//! ```text
//! Hash 32     Hash 64             Blob ID  Blob idx  Name
//! 0x1a2b3c4d  0x0011223344556677  000      0000      Mono.Android
//! ```
//!
//! Lines that do not parse as five whitespace-separated fields (such as the
//! column titles) are ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Longest name, including the `.dll` suffix, accepted from a manifest.
pub const MAX_NAME_LEN: usize = 1024;

/// Why a manifest name was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name is {len} bytes, limit is {MAX_NAME_LEN}")]
    TooLong { len: usize },

    #[error("name {0:?} still contains a path separator after flattening")]
    Nested(String),
}

/// Manifest path for a blob: the blob's extension replaced by `.manifest`.
pub fn manifest_path(blob_path: &Path) -> PathBuf {
    blob_path.with_extension("manifest")
}

/// Synthesized name used when no manifest is available.
pub fn fallback_name(hash32: u32) -> String {
    format!("0x{:08x}.dll", hash32)
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Derive an output file name from a manifest base name.
///
/// Appends `.dll` and rewrites the last path separator to `_`, so a
/// culture-specific resource such as `fr/Foo.resources` becomes
/// `fr_Foo.resources.dll`. Only one directory level is flattened; deeper
/// names are refused.
pub fn dll_name(base_name: &str) -> Result<String, NameError> {
    let mut name = String::with_capacity(base_name.len() + 4);
    name.push_str(base_name);
    name.push_str(".dll");

    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong { len: name.len() });
    }

    if let Some(pos) = name.rfind(is_separator) {
        name.replace_range(pos..pos + 1, "_");
    }

    if name.contains(is_separator) {
        return Err(NameError::Nested(name));
    }

    Ok(name)
}

/// One parsed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub hash32: u32,
    pub hash64: u64,
    pub index: u32,
    pub index2: u32,
    pub base_name: String,
}

impl ManifestRecord {
    /// Parse a manifest line, returning `None` for anything that is not a
    /// record.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();

        let hash32 = parse_hex(fields.next()?)?;
        let hash64 = parse_hex(fields.next()?)?;
        let index = fields.next()?.parse().ok()?;
        let index2 = fields.next()?.parse().ok()?;
        let base_name = fields.next()?.to_string();

        Some(Self {
            hash32: u32::try_from(hash32).ok()?,
            hash64,
            index,
            index2,
            base_name,
        })
    }

    /// Whether this record describes the given hash.
    ///
    /// The 64-bit column is compared against the widened 32-bit hash.
    #[inline]
    pub fn matches(&self, hash: u32) -> bool {
        self.hash32 == hash || self.hash64 == u64::from(hash)
    }

    /// Output file name for this record.
    pub fn dll_name(&self) -> Result<String, NameError> {
        dll_name(&self.base_name)
    }
}

fn parse_hex(field: &str) -> Option<u64> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// An open manifest.
///
/// Every lookup rescans the manifest from the start; manifests are small
/// next to the payloads they describe.
pub struct Manifest<R> {
    reader: R,
    line: Vec<u8>,
}

impl Manifest<BufReader<File>> {
    /// Open a manifest file.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Seek> Manifest<R> {
    /// Wrap an already-open manifest stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(256),
        }
    }

    /// Find the first record matching `hash`.
    pub fn find(&mut self, hash: u32) -> io::Result<Option<ManifestRecord>> {
        self.reader.seek(SeekFrom::Start(0))?;

        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }

            let Ok(text) = std::str::from_utf8(&self.line) else {
                continue;
            };

            if let Some(record) = ManifestRecord::parse(text) {
                if record.matches(hash) {
                    return Ok(Some(record));
                }
            }
        }
    }
}

impl<R> std::fmt::Debug for Manifest<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manifest").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const SAMPLE: &str = "\
Hash 32     Hash 64             Blob ID  Blob idx  Name
0x1a2b3c4d  0x0011223344556677  000      0000      Mono.Android
0x00001234  0x0000000000001234  0        0         mylib
0xdeadbeef  0x00000000cafef00d  000      0002      fr/Foo.resources
";

    fn manifest() -> Manifest<Cursor<&'static [u8]>> {
        Manifest::new(Cursor::new(SAMPLE.as_bytes()))
    }

    #[test]
    fn test_parse_record() {
        let record = ManifestRecord::parse("0x1234  0x1234  0  0  mylib").unwrap();
        assert_eq!(record.hash32, 0x1234);
        assert_eq!(record.hash64, 0x1234);
        assert_eq!(record.base_name, "mylib");
    }

    #[test]
    fn test_parse_rejects_non_records() {
        assert!(ManifestRecord::parse("Hash 32 Hash 64 Blob ID Blob idx Name").is_none());
        assert!(ManifestRecord::parse("0x1234 0x1234 0 0").is_none());
        assert!(ManifestRecord::parse("").is_none());
        assert!(ManifestRecord::parse("0x1ffffffff 0x0 0 0 big").is_none());
    }

    #[test]
    fn test_find_by_hash32() {
        let mut manifest = manifest();
        let record = manifest.find(0x1a2b3c4d).unwrap().unwrap();
        assert_eq!(record.dll_name().unwrap(), "Mono.Android.dll");
    }

    #[test]
    fn test_find_by_hash64_column() {
        let mut manifest = manifest();
        let record = manifest.find(0xcafef00d).unwrap().unwrap();
        assert_eq!(record.base_name, "fr/Foo.resources");
    }

    #[test]
    fn test_repeated_lookups_rescan() {
        let mut manifest = manifest();
        assert!(manifest.find(0xdeadbeef).unwrap().is_some());
        assert!(manifest.find(0x1234).unwrap().is_some());
        assert!(manifest.find(0x99999999).unwrap().is_none());
        assert!(manifest.find(0x1a2b3c4d).unwrap().is_some());
    }

    #[test]
    fn test_dll_name_flattens_one_level() {
        let name = dll_name("fr/Foo.resources").unwrap();
        assert_eq!(name, "fr_Foo.resources.dll");
        assert!(name.ends_with(".dll"));
        assert!(!name.contains('/'));

        assert_eq!(dll_name("de\\Bar").unwrap(), "de_Bar.dll");
    }

    #[test]
    fn test_dll_name_refuses_deep_paths() {
        assert!(matches!(dll_name("../../etc/passwd"), Err(NameError::Nested(_))));
    }

    #[test]
    fn test_dll_name_length_limit() {
        let base = "a".repeat(MAX_NAME_LEN - 4);
        assert_eq!(dll_name(&base).unwrap().len(), MAX_NAME_LEN);

        let base = "a".repeat(MAX_NAME_LEN);
        assert_eq!(
            dll_name(&base),
            Err(NameError::TooLong {
                len: MAX_NAME_LEN + 4
            })
        );
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_name(0x1234), "0x00001234.dll");
        assert_eq!(fallback_name(0xDEADBEEF), "0xdeadbeef.dll");
    }

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            manifest_path(Path::new("dir/assemblies.blob")),
            PathBuf::from("dir/assemblies.manifest")
        );
    }
}
