use std::io::Cursor;

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use crate::domain::{FrameSequence, FrameState};
use crate::error::Result;

/// Decode every frame and classify the probe pixel. `None` when the probe
/// lies outside the canvas.
pub fn read_frames(bytes: &[u8], probe: (u32, u32)) -> Result<Option<FrameSequence>> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let mut states = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let duration_ms = if denom == 0 {
            0
        } else {
            u64::from(numer) / u64::from(denom)
        };

        // frames come back composited onto the full canvas
        let buf = frame.buffer();
        let (x, y) = probe;
        if x >= buf.width() || y >= buf.height() {
            return Ok(None);
        }
        let px = buf.get_pixel(x, y).0;
        states.push(FrameState {
            black: px[0] == 0 && px[1] == 0 && px[2] == 0,
            duration_ms,
        });
    }
    Ok(Some(FrameSequence(states)))
}
