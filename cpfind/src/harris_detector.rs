/// A detected corner in pixel coordinates of the analyzed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: usize,
    pub y: usize,
    /// Harris response; larger is more corner-like.
    pub response: f32,
}

/// Harris corner detection on a luminance plane.
///
/// Gradients come from 3x3 Sobel kernels, the structure tensor is summed
/// over a square window, and corners are local maxima of
/// `det - k * trace^2` above a fraction of the strongest response.
#[derive(Debug, Clone, PartialEq)]
pub struct HarrisDetector {
    /// Harris sensitivity parameter (typically 0.04-0.06).
    pub k: f32,
    /// Half size of the structure tensor window.
    pub window_radius: usize,
    /// Half size of the non-maximum suppression neighborhood.
    pub nms_radius: usize,
    /// Pixels closer than this to the image edge never become corners.
    pub border: usize,
    /// Responses at or below `min_relative_response * max_response` are discarded.
    pub min_relative_response: f32,
}

impl Default for HarrisDetector {
    fn default() -> Self {
        HarrisDetector {
            k: 0.04,
            window_radius: 2,
            nms_radius: 2,
            border: 8,
            min_relative_response: 0.01,
        }
    }
}

impl HarrisDetector {
    /// Detects at most `max_corners` corners, strongest first.
    ///
    /// Ties in response are ordered by row, then column, so the result is
    /// fully deterministic.
    pub fn detect(&self, luma: &[f32], width: usize, height: usize, max_corners: usize) -> Vec<Corner> {
        let margin = self.border.max(self.window_radius + 1);
        if max_corners == 0 || width <= 2 * margin || height <= 2 * margin {
            return Vec::new();
        }
        debug_assert_eq!(luma.len(), width * height);

        // Products of Sobel gradients.
        let mut gxx = vec![0.0f32; width * height];
        let mut gyy = vec![0.0f32; width * height];
        let mut gxy = vec![0.0f32; width * height];
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let p = |dx: usize, dy: usize| luma[(y + dy - 1) * width + (x + dx - 1)];
                let gx = (p(2, 0) + 2.0 * p(2, 1) + p(2, 2)) - (p(0, 0) + 2.0 * p(0, 1) + p(0, 2));
                let gy = (p(0, 2) + 2.0 * p(1, 2) + p(2, 2)) - (p(0, 0) + 2.0 * p(1, 0) + p(2, 0));
                let idx = y * width + x;
                gxx[idx] = gx * gx;
                gyy[idx] = gy * gy;
                gxy[idx] = gx * gy;
            }
        }

        let r = self.window_radius;
        let mut response = vec![0.0f32; width * height];
        let mut max_response = 0.0f32;
        for y in margin..height - margin {
            for x in margin..width - margin {
                let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
                for wy in y - r..=y + r {
                    let row = wy * width;
                    for wx in x - r..=x + r {
                        a += gxx[row + wx];
                        b += gxy[row + wx];
                        c += gyy[row + wx];
                    }
                }
                let det = a * c - b * b;
                let trace = a + c;
                let value = det - self.k * trace * trace;
                response[y * width + x] = value;
                max_response = max_response.max(value);
            }
        }

        if max_response <= 0.0 {
            return Vec::new();
        }
        let threshold = max_response * self.min_relative_response;

        let mut corners = Vec::new();
        for y in margin..height - margin {
            for x in margin..width - margin {
                let value = response[y * width + x];
                if value > threshold && self.is_local_maximum(&response, width, height, x, y) {
                    corners.push(Corner { x, y, response: value });
                }
            }
        }

        corners.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        corners.truncate(max_corners);
        corners
    }

    fn is_local_maximum(&self, response: &[f32], width: usize, height: usize, x: usize, y: usize) -> bool {
        let value = response[y * width + x];
        let r = self.nms_radius;
        for ny in y.saturating_sub(r)..=(y + r).min(height - 1) {
            for nx in x.saturating_sub(r)..=(x + r).min(width - 1) {
                if (nx, ny) == (x, y) {
                    continue;
                }
                let other = response[ny * width + nx];
                // On plateaus the first pixel in raster order wins.
                let earlier = (ny, nx) < (y, x);
                if other > value || (earlier && other == value) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A bright square on a dark background: four strong corners.
    fn square_image(size: usize, lo: usize, hi: usize) -> Vec<f32> {
        let mut luma = vec![0.0f32; size * size];
        for y in lo..hi {
            for x in lo..hi {
                luma[y * size + x] = 1.0;
            }
        }
        luma
    }

    #[test]
    fn finds_square_corners() {
        let luma = square_image(48, 16, 32);
        let corners = HarrisDetector::default().detect(&luma, 48, 48, 4);

        assert_eq!(corners.len(), 4);
        for corner in &corners {
            let near = |v: usize, target: usize| (v as isize - target as isize).abs() <= 3;
            assert!(near(corner.x, 16) || near(corner.x, 31), "{corner:?}");
            assert!(near(corner.y, 16) || near(corner.y, 31), "{corner:?}");
        }
    }

    #[test]
    fn results_are_sorted_and_truncated() {
        let luma = square_image(48, 16, 32);
        let corners = HarrisDetector::default().detect(&luma, 48, 48, 2);
        assert_eq!(corners.len(), 2);
        assert!(corners[0].response >= corners[1].response);
    }

    #[test]
    fn flat_and_tiny_images_have_no_corners() {
        let detector = HarrisDetector::default();
        assert!(detector.detect(&vec![0.5; 40 * 40], 40, 40, 10).is_empty());
        assert!(detector.detect(&vec![0.5; 10 * 10], 10, 10, 10).is_empty());
        assert!(detector.detect(&square_image(48, 16, 32), 48, 48, 0).is_empty());
    }

    #[test]
    fn border_is_respected() {
        let luma = square_image(48, 4, 44);
        let detector = HarrisDetector {
            border: 8,
            ..HarrisDetector::default()
        };
        for corner in detector.detect(&luma, 48, 48, 100) {
            assert!(corner.x >= 8 && corner.x < 40);
            assert!(corner.y >= 8 && corner.y < 40);
        }
    }
}
