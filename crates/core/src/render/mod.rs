use embedded_graphics::{
    draw_target::DrawTarget,
    pixelcolor::{Rgb565, Rgb888},
};
use serde::{Deserialize, Serialize};

use crate::{config::DisplayConfig, timeline::ticks_since, InfinityError, Point, Result};

mod raster;

use raster::Band;
pub use raster::{Area, FlushTarget, Framebuffer};

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(u32);

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00FF_FFFF)
    }

    pub fn hex(self) -> u32 {
        self.0
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl From<Color> for Rgb565 {
    fn from(color: Color) -> Self {
        let (r, g, b) = color.rgb();
        Rgb888::new(r, g, b).into()
    }
}

/// Panel orientation, clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Appearance of a line element. Lines are always drawn fully opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    pub width: i32,
    /// Round caps and joints. Square ones otherwise.
    pub rounded: bool,
    pub color: Color,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 5,
            rounded: true,
            color: Color::from_hex(0xFF6F61),
        }
    }
}

/// Opaque reference to a line element created on a [`RenderSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle(pub(crate) usize);

impl LineHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Consumer of point sequences. Each line element is redrawn from the full
/// replacement sequence it was last given.
pub trait RenderSink {
    fn create_line(&mut self, style: LineStyle) -> LineHandle;

    fn set_line_points(&mut self, line: LineHandle, points: &[Point]) -> Result<()>;
}

/// Line element state held by the [`Display`].
#[derive(Debug, Clone)]
pub struct Line {
    style: LineStyle,
    points: Vec<Point>,
    updates: u64,
}

impl Line {
    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    /// Points from the latest replacement.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of point replacements received so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

/// Software display. Keeps the latest points of every line and rasterizes
/// them in horizontal bands through the caller's draw buffer.
#[derive(Debug)]
pub struct Display {
    config: DisplayConfig,
    draw_buf: Vec<u8>,
    lines: Vec<Line>,
    dirty: bool,
    last_refresh_ms: Option<u32>,
    refreshes: u64,
}

impl Display {
    /// Creates the display. Fails when the configuration is unusable or the
    /// draw buffer is smaller than [`Display::required_buffer_size`].
    pub fn new(config: DisplayConfig, draw_buf: Vec<u8>) -> Result<Self> {
        config.validate()?;

        let required = Self::required_buffer_size(&config);
        if draw_buf.len() < required {
            return Err(InfinityError::DrawBufferTooSmall {
                required,
                actual: draw_buf.len(),
            });
        }

        tracing::info!(
            hor_res = config.hor_res,
            ver_res = config.ver_res,
            rotation = ?config.rotation,
            draw_buf = draw_buf.len(),
            "display created"
        );

        Ok(Self {
            config,
            draw_buf,
            lines: Vec::new(),
            dirty: true,
            last_refresh_ms: None,
            refreshes: 0,
        })
    }

    /// Allocates a draw buffer of exactly the minimum size.
    pub fn with_default_buffer(config: DisplayConfig) -> Result<Self> {
        let size = Self::required_buffer_size(&config);
        Self::new(config, vec![0; size])
    }

    /// [`DisplayConfig::draw_buffer_size`], raised to one full row of the
    /// longer panel side so every rotation fits at least one row per band.
    pub fn required_buffer_size(config: &DisplayConfig) -> usize {
        let longest = config.hor_res.max(config.ver_res) as usize;
        config
            .draw_buffer_size()
            .max(longest * config.bytes_per_pixel())
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        if self.config.rotation != rotation {
            self.config.rotation = rotation;
            self.dirty = true;
        }
    }

    /// Drawing surface size after rotation.
    pub fn size(&self) -> (u32, u32) {
        self.config.logical_size()
    }

    pub fn line(&self, handle: LineHandle) -> Option<&Line> {
        self.lines.get(handle.index())
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Runs the refresh timer. Redraws into `target` when the refresh period
    /// has passed and some line changed since the last refresh. Returns
    /// whether a refresh happened.
    pub fn tick(&mut self, now_ms: u32, target: &mut dyn FlushTarget) -> bool {
        let due = match self.last_refresh_ms {
            Some(last) => ticks_since(now_ms, last) >= self.config.refresh_period_ms,
            None => true,
        };
        if !due {
            return false;
        }
        self.last_refresh_ms = Some(now_ms);
        if !self.dirty {
            return false;
        }
        self.refresh(target);
        true
    }

    /// Redraws the whole surface immediately.
    pub fn refresh(&mut self, target: &mut dyn FlushTarget) {
        let (width, height) = self.size();
        let row_bytes = Self::row_bytes(&self.config);
        let rows_per_band = self.draw_buf.len() / row_bytes;
        if rows_per_band == 0 {
            tracing::warn!(
                draw_buf = self.draw_buf.len(),
                row_bytes,
                "draw buffer cannot hold a row, skipping refresh"
            );
            return;
        }
        let background = Rgb565::from(self.config.background);

        let mut y = 0;
        while y < height {
            let rows = (rows_per_band as u32).min(height - y);
            let area = Area {
                x: 0,
                y,
                width,
                height: rows,
            };
            let mut band = Band::new(&mut self.draw_buf[..row_bytes * rows as usize], area);
            band.clear(background)
                .and_then(|()| {
                    self.lines
                        .iter()
                        .try_for_each(|line| raster::draw_line(&mut band, line))
                })
                .unwrap_or_else(|never| match never {});
            target.flush(area, band.bytes());
            y += rows;
        }

        self.dirty = false;
        self.refreshes += 1;
        tracing::debug!(refreshes = self.refreshes, "display refreshed");
    }

    fn row_bytes(config: &DisplayConfig) -> usize {
        let (width, _) = config.logical_size();
        width as usize * config.bytes_per_pixel()
    }
}

impl RenderSink for Display {
    fn create_line(&mut self, style: LineStyle) -> LineHandle {
        self.lines.push(Line {
            style,
            points: Vec::new(),
            updates: 0,
        });
        self.dirty = true;
        LineHandle(self.lines.len() - 1)
    }

    fn set_line_points(&mut self, line: LineHandle, points: &[Point]) -> Result<()> {
        let entry = self
            .lines
            .get_mut(line.index())
            .ok_or(InfinityError::UnknownLine(line.index()))?;
        entry.points.clear();
        entry.points.extend_from_slice(points);
        entry.updates += 1;
        self.dirty = true;
        Ok(())
    }
}
