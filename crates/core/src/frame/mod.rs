use crate::{Path, Point};

/// Fixed-length window into a [`Path`], refilled in place every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    points: Box<[Point]>,
}

impl Frame {
    /// Creates a zeroed frame of `len` points.
    pub fn new(len: usize) -> Self {
        Self {
            points: vec![Point::default(); len].into_boxed_slice(),
        }
    }

    /// Allocates a frame of `len` points and fills it from `path` at `start`.
    pub fn from_path(path: &Path, start: usize, len: usize) -> Self {
        let mut frame = Self::new(len);
        extract_frame(path, start, &mut frame);
        frame
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Copies `frame.len()` consecutive points of `path` into `frame`, starting at
/// `start mod path.len()` and wrapping back to the first point.
///
/// An empty path leaves the frame untouched.
pub fn extract_frame(path: &Path, start: usize, frame: &mut Frame) {
    let source = path.points();
    if source.is_empty() {
        return;
    }

    let len = source.len();
    let mut index = start % len;
    for slot in frame.points.iter_mut() {
        *slot = source[index];
        index += 1;
        if index == len {
            index = 0;
        }
    }
}
