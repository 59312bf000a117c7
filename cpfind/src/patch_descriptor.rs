/// Samples per side of the patch grid.
pub const PATCH_GRID: usize = 8;
/// Distance in pixels between neighbouring samples.
pub const PATCH_SPACING: usize = 2;
/// Distance from the keypoint to the outermost sample.
pub const PATCH_HALF_EXTENT: usize = (PATCH_GRID - 1) * PATCH_SPACING / 2;
pub const PATCH_DESCRIPTOR_DIM: usize = PATCH_GRID * PATCH_GRID;

/// Describes the neighbourhood of `(x, y)` by an 8x8 grid of luminance
/// samples, normalized to zero mean and unit length.
///
/// Normalization makes the descriptor invariant to affine brightness
/// changes. A perfectly flat patch yields the zero vector.
pub fn describe_patch(luma: &[f32], width: usize, height: usize, x: usize, y: usize) -> [f32; PATCH_DESCRIPTOR_DIM] {
    let mut samples = [0.0f32; PATCH_DESCRIPTOR_DIM];
    if width == 0 || height == 0 {
        return samples;
    }

    let half = PATCH_HALF_EXTENT as isize;
    for row in 0..PATCH_GRID {
        let sy = (y as isize - half + (row * PATCH_SPACING) as isize).clamp(0, height as isize - 1) as usize;
        for col in 0..PATCH_GRID {
            let sx = (x as isize - half + (col * PATCH_SPACING) as isize).clamp(0, width as isize - 1) as usize;
            samples[row * PATCH_GRID + col] = luma[sy * width + sx];
        }
    }

    let mean = samples.iter().sum::<f32>() / PATCH_DESCRIPTOR_DIM as f32;
    samples.iter_mut().for_each(|v| *v -= mean);
    let norm = samples.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 1e-6 {
        samples.iter_mut().for_each(|v| *v /= norm);
    } else {
        samples = [0.0; PATCH_DESCRIPTOR_DIM];
    }
    samples
}
