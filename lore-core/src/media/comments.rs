//! Comment Extension text. `image` decodes frames but drops comments, so the
//! stream is walked again with `gif`'s low-level decoder, skipping pixel data.

use gif::Extension;
use gif::streaming_decoder::{Block, Decoded, OutputBuffer, StreamingDecoder};

use crate::error::{LoreError, Result};

/// Text of every Comment Extension in the stream, in file order.
pub fn gif_comments(bytes: &[u8]) -> Result<Vec<String>> {
    let mut decoder = StreamingDecoder::new();
    let mut comments = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let (consumed, decoded) = decoder
            .update(&bytes[pos..], &mut OutputBuffer::None)
            .map_err(|e| LoreError::Format(format!("gif: {e}")))?;
        pos += consumed;
        match decoded {
            Decoded::BlockFinished(ext) if ext.into_known() == Some(Extension::Comment) => {
                // the first byte is the leading sub-block length
                let (_, data, _) = decoder.last_ext();
                let text = data.get(1..).unwrap_or_default();
                comments.push(String::from_utf8_lossy(text).into_owned());
            }
            Decoded::BlockStart(Block::Trailer) => return Ok(comments),
            _ => {}
        }
    }
    Err(LoreError::Format(format!("gif truncated at byte {pos}")))
}
