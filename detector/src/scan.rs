use motion_cam_common::BYTES_PER_PIXEL;

/// 8-bit luma of a big-endian RGB565 pixel.
///
/// Channels are widened by shifting (not rescaling) and weighted
/// 38/75/15 out of 128.
#[inline]
pub fn luma(hi: u8, lo: u8) -> u8 {
    let r = (hi & 0xF8) as u32;
    let g = (((hi & 0x07) << 5) | ((lo & 0xE0) >> 3)) as u32;
    let b = ((lo & 0x1F) << 3) as u32;
    ((r * 38 + g * 75 + b * 15) >> 7).min(255) as u8
}

/// Count sampled pixels whose luma changed by more than `threshold`.
///
/// Samples every `stride`-th pixel of every `stride`-th row, starting at
/// the origin. A stride of 0 samples every pixel. Both buffers must hold
/// at least `width * height` RGB565 pixels.
pub fn moving_points(
    current: &[u8],
    previous: &[u8],
    width: usize,
    height: usize,
    stride: u8,
    threshold: u8,
) -> u32 {
    let stride = effective_stride(stride);
    debug_assert!(current.len() >= width * height * BYTES_PER_PIXEL);
    debug_assert!(previous.len() >= width * height * BYTES_PER_PIXEL);

    let mut count = 0u32;
    for y in (0..height).step_by(stride) {
        let row = y * width;
        for x in (0..width).step_by(stride) {
            let offset = (row + x) * BYTES_PER_PIXEL;
            let now = luma(current[offset], current[offset + 1]);
            let before = luma(previous[offset], previous[offset + 1]);
            if now.abs_diff(before) > threshold {
                count += 1;
            }
        }
    }
    count
}

/// Moving-point ratio: `moving_points / pixel_count * stride²`.
///
/// Approximates the fraction of sampled pixels that moved by assuming
/// `pixel_count / stride²` samples; exact only when both dimensions are
/// multiples of the stride. Default thresholds are tuned against this.
pub fn moving_ratio(moving_points: u32, pixel_count: usize, stride: u8) -> f32 {
    if pixel_count == 0 {
        return 0.0;
    }
    let stride = effective_stride(stride) as f32;
    moving_points as f32 / pixel_count as f32 * stride * stride
}

#[inline]
fn effective_stride(stride: u8) -> usize {
    stride.max(1) as usize
}
