//! Streaming reader/writer for line-oriented panorama project files.
//!
//! The project is processed in one forward pass. Everything up to and
//! including the `# control points` marker is copied verbatim while image
//! declarations are collected; the pass then stops so that new control
//! points can be written right after the marker. Resuming the pass copies
//! the rest of the file and drops every stale control point line.
//!
//! Lines are handled as raw bytes with their original terminators, so
//! untouched content comes out byte-for-byte identical.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::image_registry::ImageRegistry;

/// The literal line separating the header from the control point section.
pub const CONTROL_POINT_MARKER: &str = "# control points";

const IMAGE_LINE_PREFIX: u8 = b'i';
const CONTROL_POINT_LINE_PREFIX: u8 = b'c';

/// Position of a [ProjectReader] within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No image declaration has been seen yet.
    Header,
    /// At least one image is declared; still looking for the marker.
    AwaitingMarker,
    /// The marker was consumed; the trailer has not been copied yet.
    Trailer,
    /// The input is fully consumed.
    Exhausted,
}

/// Result of the header pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderScan {
    /// Images declared before the marker, in declaration order.
    pub registry: ImageRegistry,
    /// Whether the pass stopped on the marker line rather than at end of input.
    pub marker_found: bool,
    /// Number of lines written through, marker included.
    pub lines_copied: usize,
    /// Image lines whose path could not be parsed.
    pub skipped_image_lines: usize,
}

/// Result of the trailer pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailerCopy {
    pub lines_copied: usize,
    /// Pre-existing control point lines that were discarded.
    pub control_points_dropped: usize,
}

/// Forward-only reader over a project file.
pub struct ProjectReader<R> {
    input: R,
    state: ReaderState,
    line: Vec<u8>,
}

impl<R: BufRead> ProjectReader<R> {
    pub fn new(input: R) -> Self {
        ProjectReader {
            input,
            state: ReaderState::Header,
            line: Vec::with_capacity(256),
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Reads the next raw line (terminator included) into `self.line`.
    /// Returns `false` at end of input.
    fn next_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        Ok(self.input.read_until(b'\n', &mut self.line)? > 0)
    }

    /// Copies header lines to `out` until the marker line has been written
    /// or the input ends, collecting image declarations on the way.
    pub fn read_header<W: Write>(&mut self, out: &mut W) -> io::Result<HeaderScan> {
        let mut scan = HeaderScan::default();

        while matches!(self.state, ReaderState::Header | ReaderState::AwaitingMarker) {
            if !self.next_line()? {
                self.state = ReaderState::Exhausted;
                break;
            }
            out.write_all(&self.line)?;
            scan.lines_copied += 1;

            if self.line.first() == Some(&IMAGE_LINE_PREFIX) {
                match parse_image_path(&self.line) {
                    Some(path) => {
                        let index = scan.registry.push(path);
                        debug!("Declared image {index}: {path}");
                        self.state = ReaderState::AwaitingMarker;
                    }
                    None => {
                        scan.skipped_image_lines += 1;
                        debug!(
                            "Skipping image line without a path: {}",
                            String::from_utf8_lossy(&self.line).trim_end()
                        );
                    }
                }
            }

            if is_marker_line(&self.line) {
                self.state = ReaderState::Trailer;
            }
        }

        scan.marker_found = self.state == ReaderState::Trailer;
        Ok(scan)
    }

    /// Copies the remaining lines to `out`, dropping control point lines.
    ///
    /// Does nothing unless the header pass stopped on the marker.
    pub fn copy_trailer<W: Write>(&mut self, out: &mut W) -> io::Result<TrailerCopy> {
        let mut copy = TrailerCopy::default();
        if self.state != ReaderState::Trailer {
            return Ok(copy);
        }

        while self.next_line()? {
            if is_control_point_line(&self.line) {
                copy.control_points_dropped += 1;
                continue;
            }
            out.write_all(&self.line)?;
            copy.lines_copied += 1;
        }

        self.state = ReaderState::Exhausted;
        Ok(copy)
    }
}

/// Extracts the image path from an image declaration line.
///
/// The path is the text between the double quotes that directly follow a
/// whitespace-separated `n` token, e.g. `i w4000 h3000 f0 n"img0.jpg"`.
/// Returns `None` for lines that are not image lines, have no such token,
/// an unterminated or empty path, or are not valid UTF-8.
pub fn parse_image_path(line: &[u8]) -> Option<&str> {
    if line.first() != Some(&IMAGE_LINE_PREFIX) {
        return None;
    }
    let text = std::str::from_utf8(line).ok()?;
    let bytes = text.as_bytes();

    let start = (1..bytes.len().saturating_sub(1)).find(|&pos| {
        bytes[pos] == b'n' && bytes[pos + 1] == b'"' && bytes[pos - 1].is_ascii_whitespace()
    })? + 2;

    let rest = &text[start..];
    let end = rest.find('"')?;
    let path = &rest[..end];
    (!path.is_empty()).then_some(path)
}

/// Whether `line` is the control point marker, ignoring its line terminator.
pub fn is_marker_line(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line == CONTROL_POINT_MARKER.as_bytes()
}

pub fn is_control_point_line(line: &[u8]) -> bool {
    line.first() == Some(&CONTROL_POINT_LINE_PREFIX)
}
