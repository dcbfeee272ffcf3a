use crate::frame::{Frame, BGR_BYTES_PER_PIXEL};

/// Apply the red tint in place: halve the blue and green channels and scale
/// the red channel by 1.5, saturating at 255.
///
/// Pure per-pixel transform with no cross-pixel dependency.
pub fn apply_red_tint(frame: &mut Frame) {
    for px in frame.data_mut().chunks_exact_mut(BGR_BYTES_PER_PIXEL) {
        px[0] /= 2;
        px[1] /= 2;
        px[2] = ((px[2] as u16 * 3) / 2).min(255) as u8;
    }
}
