use crate::error::{CpFindError, Result};

/// A decoded image as a channel-first array of normalized samples.
///
/// Samples are stored plane by plane (`[channels, height, width]`) and lie
/// in `[0, 1]`. Photos have either one (grayscale) or three (RGB) channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    /// Sample data, one plane per channel.
    pub data: Vec<f32>,
    /// Number of channels (1 or 3).
    pub channels: usize,
    /// The width (in pixels) of the image.
    pub width: usize,
    /// The height (in pixels) of the image.
    pub height: usize,
}

impl Default for Photo {
    /// Creates an empty single-channel `Photo` with zero width and height.
    fn default() -> Photo {
        Photo {
            data: Vec::new(),
            channels: 1,
            width: 0,
            height: 0,
        }
    }
}

impl Photo {
    /// Builds a photo after checking that `data` matches the declared shape.
    pub fn new(channels: usize, width: usize, height: usize, data: Vec<f32>) -> Result<Photo> {
        if channels != 1 && channels != 3 {
            return Err(CpFindError::InvalidPhoto(format!(
                "expected 1 or 3 channels, got {channels}"
            )));
        }
        if data.len() != channels * width * height {
            return Err(CpFindError::InvalidPhoto(format!(
                "{} samples for a {channels}x{height}x{width} photo",
                data.len()
            )));
        }
        Ok(Photo {
            data,
            channels,
            width,
            height,
        })
    }

    /// Returns the sample of `channel` at pixel `(x, y)`.
    ///
    /// Out-of-bounds coordinates return `0.0`.
    pub fn get(&self, channel: usize, x: usize, y: usize) -> f32 {
        if channel >= self.channels || x >= self.width || y >= self.height {
            0.0
        } else {
            self.data[(channel * self.height + y) * self.width + x]
        }
    }

    /// Returns one plane per channel.
    pub fn planes(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact((self.width * self.height).max(1))
    }

    /// Returns the luminance plane (Rec. 601 weights for RGB photos).
    pub fn luma(&self) -> Vec<f32> {
        let plane_len = self.width * self.height;
        if self.channels == 1 {
            return self.data.clone();
        }
        let (r, rest) = self.data.split_at(plane_len);
        let (g, b) = rest.split_at(plane_len);
        r.iter()
            .zip(g)
            .zip(b)
            .map(|((r, g), b)| 0.299 * r + 0.587 * g + 0.114 * b)
            .collect()
    }

    /// Produces a new `Photo` scaled down proportionally to `new_width`.
    ///
    /// The aspect ratio is preserved by computing a scale factor and rounding
    /// the new height accordingly. Each output pixel is the average of the
    /// source pixels that fall into the region it covers.
    ///
    /// # Parameters
    /// - `new_width`: The desired width. Must be greater than 0 and no larger
    ///   than the current width.
    ///
    /// # Returns
    /// A new `Photo` with width = `new_width` and a proportionally scaled height
    /// (at least one row).
    pub fn get_scaled_proportional(&self, new_width: usize) -> Result<Photo> {
        if new_width == 0 || new_width > self.width || self.height == 0 {
            return Err(CpFindError::InvalidPhoto(format!(
                "cannot scale a photo of width {} to width {new_width}",
                self.width
            )));
        }

        let scale_factor = new_width as f32 / self.width as f32;
        let new_height = ((self.height as f32 * scale_factor).round() as usize).max(1);

        let mut new_data = vec![0.0f32; self.channels * new_width * new_height];

        for new_y in 0..new_height {
            // Rows of the source image covered by this output row.
            let orig_y_start = (((new_y as f32) / scale_factor).round() as usize).min(self.height - 1);
            let orig_y_end = ((((new_y + 1) as f32) / scale_factor).round() as usize)
                .min(self.height - 1)
                .max(orig_y_start);

            for new_x in 0..new_width {
                let orig_x_start = (((new_x as f32) / scale_factor).round() as usize).min(self.width - 1);
                let orig_x_end = ((((new_x + 1) as f32) / scale_factor).round() as usize)
                    .min(self.width - 1)
                    .max(orig_x_start);

                let pixel_count =
                    ((orig_y_end - orig_y_start + 1) * (orig_x_end - orig_x_start + 1)) as f32;

                for channel in 0..self.channels {
                    let mut total = 0.0f32;
                    for orig_y in orig_y_start..=orig_y_end {
                        let row = (channel * self.height + orig_y) * self.width;
                        total += self.data[row + orig_x_start..=row + orig_x_end]
                            .iter()
                            .sum::<f32>();
                    }
                    new_data[(channel * new_height + new_y) * new_width + new_x] = total / pixel_count;
                }
            }
        }

        Ok(Photo {
            data: new_data,
            channels: self.channels,
            width: new_width,
            height: new_height,
        })
    }

    /// Scales the photo so that its longer side is at most `max_dimension`.
    ///
    /// Returns `None` when no scaling is needed, `max_dimension` is 0 or the
    /// photo has no pixels.
    pub fn fit_within(&self, max_dimension: usize) -> Result<Option<Photo>> {
        let longest = self.width.max(self.height);
        if max_dimension == 0 || longest <= max_dimension || self.width == 0 || self.height == 0 {
            return Ok(None);
        }
        let new_width = if self.width >= self.height {
            max_dimension
        } else {
            ((self.width as f32 * max_dimension as f32 / self.height as f32).round() as usize).max(1)
        };
        self.get_scaled_proportional(new_width).map(Some)
    }
}
