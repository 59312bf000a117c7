use crate::photo::Photo;

/// Number of components in [CircularFeatureDescriptor::feature_vector].
pub const CIRCULAR_DESCRIPTOR_DIM: usize = 6;

/// Stores information about the "center of mass" of three color channels in
/// a circular region of an image. Each channel has its total sum recorded as
/// well as its center of mass rotated relative to the overall (combined)
/// center of mass, which makes the aligned coordinates rotation invariant.
///
/// Single-channel photos use the intensity, its square and its square root
/// as the three channels.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct CircularFeatureDescriptor {
    /// The x-coordinate of the descriptor's center.
    pub center_x: usize,

    /// The y-coordinate of the descriptor's center.
    pub center_y: usize,

    /// The combined angle (using `atan2`) for the total color center of mass in this region.
    pub total_angle: f32,

    /// The magnitude (radius) of the total color center of mass in this region.
    pub total_radius: f32,

    /// Channel sums within the circular region.
    pub sums: [f32; 3],

    /// Per-channel center of mass, rotated so that `total_angle` is the zero angle.
    pub aligned: [(f32, f32); 3],
}

impl CircularFeatureDescriptor {
    /// Computes the descriptor for the circular region of `radius` pixels
    /// around `(center_x, center_y)`. Pixels outside the photo are clamped
    /// to the nearest edge pixel.
    pub fn compute(photo: &Photo, center_x: usize, center_y: usize, radius: usize) -> Self {
        let mut descriptor = CircularFeatureDescriptor {
            center_x,
            center_y,
            ..Default::default()
        };
        if photo.width == 0 || photo.height == 0 {
            return descriptor;
        }

        let radius = radius as isize;
        let max_x = photo.width as isize - 1;
        let max_y = photo.height as isize - 1;

        let mut sums = [0.0f32; 3];
        let mut weighted_x = [0.0f32; 3];
        let mut weighted_y = [0.0f32; 3];

        for dy in -radius..=radius {
            // For each row, calculate how far we can extend in the x-direction.
            let row_radius = ((radius * radius - dy * dy) as f64).sqrt().round() as isize;
            let y = (center_y as isize + dy).clamp(0, max_y) as usize;
            for dx in -row_radius..=row_radius {
                let x = (center_x as isize + dx).clamp(0, max_x) as usize;
                let values = channel_values(photo, x, y);
                for channel in 0..3 {
                    sums[channel] += values[channel];
                    weighted_x[channel] += dx as f32 * values[channel];
                    weighted_y[channel] += dy as f32 * values[channel];
                }
            }
        }

        let center_of_mass = |wx: f32, wy: f32, sum: f32| {
            if sum == 0.0 {
                (0.0, 0.0)
            } else {
                (wx / sum, wy / sum)
            }
        };

        let sum_all: f32 = sums.iter().sum();
        let (total_cm_x, total_cm_y) = center_of_mass(
            weighted_x.iter().sum(),
            weighted_y.iter().sum(),
            sum_all,
        );
        let total_angle = if sum_all == 0.0 { 0.0 } else { total_cm_y.atan2(total_cm_x) };

        descriptor.total_angle = total_angle;
        descriptor.total_radius = (total_cm_x * total_cm_x + total_cm_y * total_cm_y).sqrt();
        descriptor.sums = sums;

        // Rotate each channel so that the total angle becomes the zero angle.
        for channel in 0..3 {
            let (cm_x, cm_y) = center_of_mass(weighted_x[channel], weighted_y[channel], sums[channel]);
            let angle = if sums[channel] == 0.0 { 0.0 } else { cm_y.atan2(cm_x) };
            let radius = (cm_x * cm_x + cm_y * cm_y).sqrt();
            descriptor.aligned[channel] = (
                (angle - total_angle).cos() * radius,
                (angle - total_angle).sin() * radius,
            );
        }

        descriptor
    }

    /// The aligned channel coordinates as a flat vector.
    pub fn feature_vector(&self) -> [f32; CIRCULAR_DESCRIPTOR_DIM] {
        let [(rx, ry), (gx, gy), (bx, by)] = self.aligned;
        [rx, ry, gx, gy, bx, by]
    }

    /// Computes the Euclidean distance between two descriptors based on
    /// their aligned channel coordinates.
    pub fn distance(&self, other: &CircularFeatureDescriptor) -> f32 {
        self.feature_vector()
            .iter()
            .zip(other.feature_vector().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

fn channel_values(photo: &Photo, x: usize, y: usize) -> [f32; 3] {
    if photo.channels >= 3 {
        [photo.get(0, x, y), photo.get(1, x, y), photo.get(2, x, y)]
    } else {
        let v = photo.get(0, x, y);
        [v, v * v, v.sqrt()]
    }
}
