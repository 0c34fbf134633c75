use std::{fmt, ops::Index, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{config::CurveConfig, InfinityError};

/// Screen-space coordinate in whole pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Places a sampled coordinate relative to `origin`. The fractional part is
    /// truncated toward zero.
    pub fn from_sample(x: f32, y: f32, origin: Point) -> Self {
        Self {
            x: (x + origin.x as f32) as i32,
            y: (y + origin.y as f32) as i32,
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// The three curves making up the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Base,
    Outer,
    Third,
}

impl CurveKind {
    pub const ALL: [CurveKind; 3] = [CurveKind::Base, CurveKind::Outer, CurveKind::Third];

    /// Position in [`CurveKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            CurveKind::Base => 0,
            CurveKind::Outer => 1,
            CurveKind::Third => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CurveKind::Base => "base",
            CurveKind::Outer => "outer",
            CurveKind::Third => "third",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveKind {
    type Err = InfinityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurveKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| InfinityError::msg(format!("unknown curve `{s}`")))
    }
}

/// Per-branch scaling rule. The branch is picked from the sign of the
/// unscaled `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsymmetryPolicy {
    /// Scale the left lobe (`x < 0`).
    ShrinkLeft(f32),
    /// Scale the right lobe (`x > 0`).
    ShrinkRight(f32),
    /// Scale both lobes, `right` when `x > 0` and `left` otherwise.
    Skewed { right: f32, left: f32 },
}

impl AsymmetryPolicy {
    pub fn for_curve(kind: CurveKind, asymmetry: f32) -> Self {
        match kind {
            CurveKind::Base => AsymmetryPolicy::ShrinkLeft(asymmetry),
            CurveKind::Outer => AsymmetryPolicy::ShrinkRight(asymmetry),
            CurveKind::Third => AsymmetryPolicy::Skewed {
                right: asymmetry - 0.2,
                left: 2.0 - asymmetry,
            },
        }
    }

    pub fn factor(&self, x: f32) -> f32 {
        match *self {
            AsymmetryPolicy::ShrinkLeft(k) if x < 0.0 => k,
            AsymmetryPolicy::ShrinkRight(k) if x > 0.0 => k,
            AsymmetryPolicy::Skewed { right, .. } if x > 0.0 => right,
            AsymmetryPolicy::Skewed { left, .. } => left,
            _ => 1.0,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let factor = self.factor(x);
        (x * factor, y * factor)
    }
}

/// Screen positions the three curves are centered on. The outer and third
/// curves are shifted right by multiples of the line width so their strokes
/// do not overlap the base curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveOffsets {
    pub base: Point,
    pub outer: Point,
    pub third: Point,
}

impl CurveOffsets {
    pub fn new(center: Point, line_width: i32) -> Self {
        Self {
            base: center,
            outer: center.offset(line_width << 1, 0),
            third: center.offset(line_width << 2, 0),
        }
    }

    pub fn get(&self, kind: CurveKind) -> Point {
        match kind {
            CurveKind::Base => self.base,
            CurveKind::Outer => self.outer,
            CurveKind::Third => self.third,
        }
    }
}

/// Immutable sequence of points sampled once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Path {
    points: Box<[Point]>,
}

impl Path {
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

impl From<Vec<Point>> for Path {
    fn from(points: Vec<Point>) -> Self {
        Self {
            points: points.into_boxed_slice(),
        }
    }
}

impl Index<usize> for Path {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

/// The three sampled paths.
#[derive(Debug, Clone)]
pub struct CurvePaths {
    pub base: Path,
    pub outer: Path,
    pub third: Path,
}

impl CurvePaths {
    pub fn get(&self, kind: CurveKind) -> &Path {
        match kind {
            CurveKind::Base => &self.base,
            CurveKind::Outer => &self.outer,
            CurveKind::Third => &self.third,
        }
    }
}

/// Point of the lemniscate (infinity figure) at angle `t`, centered on the
/// origin.
pub fn lemniscate(amplitude: f64, t: f64) -> (f64, f64) {
    let (sin, cos) = t.sin_cos();
    let denom = 1.0 + cos * cos;
    (amplitude * sin / denom, amplitude * sin * cos / denom)
}

/// Samples the base, outer and third paths around their `offsets`.
///
/// The angle advances by repeated addition of `config.precision`, so the
/// number of steps that satisfy `t <= config.sweep` can exceed the path
/// capacity by one or two because of float drift. Those extra samples are
/// dropped.
pub fn compute_all_paths(config: &CurveConfig, offsets: CurveOffsets) -> CurvePaths {
    let capacity = config.sample_count();
    let policies = CurveKind::ALL.map(|kind| AsymmetryPolicy::for_curve(kind, config.asymmetry));

    let mut buffers: [Vec<Point>; 3] = std::array::from_fn(|_| Vec::with_capacity(capacity));
    let mut t = 0.0_f64;
    while t <= config.sweep && buffers[0].len() < capacity {
        let (x, y) = lemniscate(config.amplitude, t);
        let (x, y) = (x as f32, y as f32);

        for ((kind, policy), buffer) in CurveKind::ALL.iter().zip(&policies).zip(&mut buffers) {
            let (sx, sy) = policy.apply(x, y);
            buffer.push(Point::from_sample(sx, sy, offsets.get(*kind)));
        }

        t += config.precision;
    }

    let sampled = buffers[0].len();
    if t <= config.sweep {
        tracing::debug!(capacity, t, "sweep reached path capacity, dropping remaining samples");
    }
    if sampled < capacity {
        tracing::warn!(sampled, capacity, "sweep ended early, padding paths with origin points");
        for buffer in &mut buffers {
            buffer.resize(capacity, Point::default());
        }
    }

    let [base, outer, third] = buffers.map(Path::from);
    tracing::info!(samples = capacity, "sampled infinity paths");
    CurvePaths { base, outer, third }
}
