//! Transport layer: base64 text to decompressed bytes, and back.
//!
//! Decoding is two strictly ordered steps, base64 then gzip. Neither step knows anything about
//! the document inside the bytes, and neither retries: the bytes have already been fetched.

use std::io::{Read, Write};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::{BlobError, BlobResult};

/// Standard alphabet, padded on encode, padding optional on decode.
const TRANSPORT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode transport text into the decompressed blob bytes.
///
/// ASCII whitespace inside the text (line wrapping) is ignored.
///
/// # Errors
///
/// - [`BlobError::Decode`] if the text is not valid base64.
/// - [`BlobError::Decompression`] if the decoded bytes are empty or not a gzip stream.
pub fn decode_transport(text: &str) -> BlobResult<Vec<u8>> {
    let compact: String = text.split_ascii_whitespace().collect();
    let compressed = TRANSPORT_ENGINE.decode(compact.as_bytes())?;

    if compressed.is_empty() {
        return Err(BlobError::Decompression(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "empty gzip stream",
        )));
    }

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(BlobError::Decompression)?;

    tracing::debug!(
        compressed = compressed.len(),
        decompressed = bytes.len(),
        "decoded transport text"
    );

    Ok(bytes)
}

/// Encode raw blob bytes as gzip-compressed base64 transport text.
///
/// # Errors
///
/// Returns [`BlobError::Decompression`] if the gzip encoder fails to write.
pub fn encode_transport(bytes: &[u8]) -> BlobResult<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(BlobError::Decompression)?;
    let compressed = encoder.finish().map_err(BlobError::Decompression)?;
    Ok(TRANSPORT_ENGINE.encode(compressed))
}
