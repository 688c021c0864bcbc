//! LZ4 payload decompression.

use lz4::liblz4::{c_char, c_int};

use crate::{Error, Result};

// Built into liblz4 by lz4-sys, which does not declare it.
extern "C" {
    fn LZ4_decompress_safe_partial(
        src: *const c_char,
        dst: *mut c_char,
        src_size: c_int,
        target_output_size: c_int,
        dst_capacity: c_int,
    ) -> c_int;
}

/// Decompress a raw LZ4 block into `output`, which must be filled exactly.
///
/// The output length comes from the payload's inner header. Decoding stops
/// once `output` is full, so bytes after the end of the block (padding, or
/// the zero-filled tail of a payload cut short by end of file) are ignored.
/// A stream that expands to fewer bytes is an error rather than a
/// truncated result.
pub fn decompress_lz4(row: usize, compressed: &[u8], output: &mut [u8]) -> Result<()> {
    let expected = output.len();
    let size = i32::try_from(expected).map_err(|_| Error::Decompression {
        row,
        reason: format!("declared size {} exceeds the LZ4 block limit", expected),
    })?;
    let src_size = i32::try_from(compressed.len()).map_err(|_| Error::Decompression {
        row,
        reason: format!("compressed size {} exceeds the LZ4 block limit", compressed.len()),
    })?;

    // SAFETY: both pointers come from live slices whose lengths are passed
    // alongside them, and liblz4 never writes past `dst_capacity`.
    let written = unsafe {
        LZ4_decompress_safe_partial(
            compressed.as_ptr().cast::<c_char>(),
            output.as_mut_ptr().cast::<c_char>(),
            src_size,
            size,
            size,
        )
    };

    if written < 0 {
        return Err(Error::Decompression {
            row,
            reason: "malformed LZ4 block".to_string(),
        });
    }
    if written as usize != expected {
        return Err(Error::Decompression {
            row,
            reason: format!("expected {} bytes, got {}", expected, written),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(data: &[u8]) -> Vec<u8> {
        lz4::block::compress(data, None, false).unwrap()
    }

    fn repetitive(len: usize) -> Vec<u8> {
        b"System.Private.CoreLib "
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_lz4_roundtrip() {
        let original = b"Hello, World! This is a test of LZ4 block compression.";
        let compressed = compress(original);

        let mut output = vec![0u8; original.len()];
        decompress_lz4(0, &compressed, &mut output).unwrap();

        assert_eq!(output, original);
    }

    #[test]
    fn test_trailing_input_is_ignored() {
        let original = repetitive(300);
        let mut compressed = compress(&original);
        assert!(compressed.len() < original.len());
        compressed.extend_from_slice(&[0u8; 12]);

        let mut output = vec![0u8; original.len()];
        decompress_lz4(0, &compressed, &mut output).unwrap();

        assert_eq!(output, original);
    }

    #[test]
    fn test_declared_size_too_large() {
        let compressed = compress(b"hello world");

        let mut output = vec![0u8; 32];
        let err = decompress_lz4(4, &compressed, &mut output).unwrap_err();
        assert!(matches!(err, Error::Decompression { row: 4, .. }));
    }

    #[test]
    fn test_declared_size_too_small_keeps_prefix() {
        let compressed = compress(b"hello world, hello world, hello world");

        let mut output = vec![0u8; 5];
        decompress_lz4(0, &compressed, &mut output).unwrap();
        assert_eq!(&output, b"hello");
    }

    #[test]
    fn test_truncated_block() {
        let original = repetitive(300);
        let compressed = compress(&original);

        let mut output = vec![0u8; original.len()];
        let err = decompress_lz4(0, &compressed[..compressed.len() / 2], &mut output).unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Decompression);
    }

    #[test]
    fn test_empty_input() {
        let mut output = vec![0u8; 11];
        assert!(decompress_lz4(0, &[], &mut output).is_err());
    }

    #[test]
    fn test_garbage_input() {
        let mut output = vec![0u8; 11];
        assert!(decompress_lz4(0, &[0xFF; 4], &mut output).is_err());
    }
}
