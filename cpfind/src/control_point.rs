//! Control points and their project file representation.

use std::io::{self, Write};

/// Control point type written for every correspondence (a plain point pair).
pub const CONTROL_POINT_TYPE: u32 = 0;

/// Decimal places used for coordinates unless configured otherwise.
pub const DEFAULT_COORDINATE_PRECISION: usize = 6;

/// A correspondence between a pixel of one image and a pixel of another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub src_image: usize,
    pub dst_image: usize,
    pub src_x: f32,
    pub src_y: f32,
    pub dst_x: f32,
    pub dst_y: f32,
}

impl ControlPoint {
    /// Formats the point as a project file line, terminator included:
    /// `c n{src} N{dst} x{sx} y{sy} X{dx} Y{dy} t0`.
    ///
    /// Coordinates are written with exactly `precision` decimal places so the
    /// output is reproducible byte for byte.
    pub fn to_line(&self, precision: usize) -> String {
        format!(
            "c n{} N{} x{:.p$} y{:.p$} X{:.p$} Y{:.p$} t{}\n",
            self.src_image,
            self.dst_image,
            self.src_x,
            self.src_y,
            self.dst_x,
            self.dst_y,
            CONTROL_POINT_TYPE,
            p = precision,
        )
    }
}

/// Writes control point lines into the output project stream.
#[derive(Debug, Clone, Copy)]
pub struct ControlPointEmitter {
    precision: usize,
}

impl Default for ControlPointEmitter {
    fn default() -> Self {
        ControlPointEmitter {
            precision: DEFAULT_COORDINATE_PRECISION,
        }
    }
}

impl ControlPointEmitter {
    pub fn new(precision: usize) -> Self {
        ControlPointEmitter { precision }
    }

    /// Writes every point, in order, and returns how many lines were written.
    pub fn write_all<W: Write>(&self, points: &[ControlPoint], out: &mut W) -> io::Result<usize> {
        for point in points {
            out.write_all(point.to_line(self.precision).as_bytes())?;
        }
        Ok(points.len())
    }
}
