use std::{f64::consts::PI, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    curve::{CurveKind, CurveOffsets},
    render::{Color, LineStyle, Rotation},
    InfinityError, Point, Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub curve: CurveConfig,
    pub animation: AnimationConfig,
    pub style: StyleConfig,
}

impl AppConfig {
    /// Parses a JSON document. Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects values that cannot drive a display or a scene. Curve and
    /// stroke sizes are bounded by the logical screen.
    pub fn validate(&self) -> Result<()> {
        self.display.validate()?;
        let (width, height) = self.display.logical_size();
        self.curve.validate(width.max(height))?;
        self.style.validate(width.min(height))?;
        self.animation.validate()
    }

    /// Centers of the three curves. The lateral shift comes from the stroke
    /// width, so the drawn lines sit side by side.
    pub fn curve_offsets(&self) -> CurveOffsets {
        CurveOffsets::new(self.display.center(), self.style.line.width)
    }
}

/// Panel geometry and refresh behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Native horizontal resolution of the panel, before rotation.
    pub hor_res: u32,
    /// Native vertical resolution of the panel, before rotation.
    pub ver_res: u32,
    pub rotation: Rotation,
    /// Bits per pixel. Only 16 (RGB565) is supported by the software display.
    pub color_depth: u8,
    pub refresh_period_ms: u32,
    pub background: Color,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            hor_res: 176,
            ver_res: 220,
            rotation: Rotation::Deg90,
            color_depth: 16,
            refresh_period_ms: 33,
            background: Color::from_hex(0x0A0A15),
        }
    }
}

impl DisplayConfig {
    /// Width and height of the drawing surface once rotation is applied.
    pub fn logical_size(&self) -> (u32, u32) {
        if self.rotation.swaps_axes() {
            (self.ver_res, self.hor_res)
        } else {
            (self.hor_res, self.ver_res)
        }
    }

    /// Middle of the logical drawing surface.
    pub fn center(&self) -> Point {
        let (width, height) = self.logical_size();
        Point::new((width / 2) as i32, (height / 2) as i32)
    }

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.color_depth / 8)
    }

    /// Minimum draw buffer size: a tenth of the screen at the configured depth.
    pub fn draw_buffer_size(&self) -> usize {
        self.hor_res as usize * self.ver_res as usize / 10 * self.bytes_per_pixel()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.hor_res == 0 || self.ver_res == 0 {
            return Err(InfinityError::InvalidConfig(
                "display resolution must be non-zero",
            ));
        }
        if self.color_depth != 16 {
            return Err(InfinityError::InvalidConfig(
                "only 16-bit color depth is supported",
            ));
        }
        Ok(())
    }
}

/// Constants of the sampled curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Amplitude `A` of the lemniscate, in pixels.
    pub amplitude: f64,
    /// Step added to the angle parameter on every sample.
    pub precision: f64,
    /// Upper bound of the angle sweep, in radians.
    pub sweep: f64,
    /// Share of the path visible in a single frame.
    pub frame_fraction: f64,
    /// Asymmetry factor `k` applied to one lobe of each curve.
    pub asymmetry: f32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            amplitude: 80.0,
            precision: 0.01,
            sweep: 4.0 * PI,
            frame_fraction: 0.2,
            asymmetry: 0.8,
        }
    }
}

impl CurveConfig {
    /// Path length `N`.
    pub fn sample_count(&self) -> usize {
        (self.sweep / self.precision) as usize
    }

    /// Frame length `W`.
    pub fn frame_len(&self) -> usize {
        (self.sample_count() as f64 * self.frame_fraction) as usize
    }

    fn validate(&self, max_amplitude: u32) -> Result<()> {
        if !(self.amplitude.is_finite()
            && self.amplitude > 0.0
            && self.amplitude <= f64::from(max_amplitude))
        {
            return Err(InfinityError::InvalidConfig(
                "curve amplitude must be positive and fit the screen",
            ));
        }
        if !(self.asymmetry.is_finite() && self.asymmetry > 0.0 && self.asymmetry <= 2.0) {
            return Err(InfinityError::InvalidConfig(
                "curve asymmetry must lie in (0, 2]",
            ));
        }
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(InfinityError::InvalidConfig(
                "curve precision must be a positive number",
            ));
        }
        if !(self.sweep.is_finite() && self.sweep > 0.0) {
            return Err(InfinityError::InvalidConfig(
                "curve sweep must be a positive number",
            ));
        }
        let frame_len = self.frame_len();
        if frame_len == 0 || frame_len >= self.sample_count() {
            return Err(InfinityError::InvalidConfig(
                "frame length must be non-zero and shorter than the path",
            ));
        }
        Ok(())
    }
}

/// Durations of the three timelines and the pacing of the main loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub base_duration_ms: u32,
    pub outer_duration_ms: u32,
    pub third_duration_ms: u32,
    /// Sleep between two pumps of the main loop.
    pub tick_interval_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            base_duration_ms: 4000,
            outer_duration_ms: 6000,
            third_duration_ms: 8000,
            tick_interval_ms: 5,
        }
    }
}

impl AnimationConfig {
    pub fn duration_ms(&self, kind: CurveKind) -> u32 {
        match kind {
            CurveKind::Base => self.base_duration_ms,
            CurveKind::Outer => self.outer_duration_ms,
            CurveKind::Third => self.third_duration_ms,
        }
    }

    fn validate(&self) -> Result<()> {
        if CurveKind::ALL.iter().any(|kind| self.duration_ms(*kind) == 0) {
            return Err(InfinityError::InvalidConfig(
                "animation durations must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Line appearance. The outer and third curves share the base style and only
/// override its color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub line: LineStyle,
    pub outer_color: Color,
    pub third_color: Color,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            line: LineStyle::default(),
            outer_color: Color::from_hex(0x32CD32),
            third_color: Color::from_hex(0x87CEEB),
        }
    }
}

impl StyleConfig {
    pub fn line_style(&self, kind: CurveKind) -> LineStyle {
        let color = match kind {
            CurveKind::Base => self.line.color,
            CurveKind::Outer => self.outer_color,
            CurveKind::Third => self.third_color,
        };
        LineStyle {
            color,
            ..self.line.clone()
        }
    }

    fn validate(&self, max_width: u32) -> Result<()> {
        if self.line.width <= 0 || self.line.width as u32 > max_width {
            return Err(InfinityError::InvalidConfig(
                "line width must be positive and fit the screen",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_match_the_firmware_constants() {
        let curve = CurveConfig::default();
        assert_eq!(curve.sample_count(), 1256);
        assert_eq!(curve.frame_len(), 251);

        let display = DisplayConfig::default();
        assert_eq!(display.logical_size(), (220, 176));
        assert_eq!(display.center(), Point::new(110, 88));
        assert_eq!(display.draw_buffer_size(), 7744);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "animation": { "base_duration_ms": 1000 }, "curve": { "amplitude": 40.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.animation.base_duration_ms, 1000);
        assert_eq!(config.animation.outer_duration_ms, 6000);
        assert_eq!(config.curve.amplitude, 40.0);
        assert_eq!(config.style.line.width, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn style_width_drives_strokes_and_offsets() {
        let config = AppConfig::from_json_str(r#"{ "style": { "line": { "width": 9 } } }"#).unwrap();
        assert!(config.validate().is_ok());

        for kind in CurveKind::ALL {
            assert_eq!(config.style.line_style(kind).width, 9);
        }
        let offsets = config.curve_offsets();
        assert_eq!(offsets.base, Point::new(110, 88));
        assert_eq!(offsets.outer, Point::new(128, 88));
        assert_eq!(offsets.third, Point::new(146, 88));
    }

    #[test]
    fn rejects_amplitudes_beyond_the_screen() {
        for amplitude in [1e10, f64::INFINITY, f64::NAN, 0.0, -5.0] {
            let mut config = AppConfig::default();
            config.curve.amplitude = amplitude;
            assert!(
                matches!(config.validate(), Err(InfinityError::InvalidConfig(_))),
                "amplitude {amplitude} accepted"
            );
        }
    }

    #[test]
    fn rejects_oversized_line_width_and_asymmetry() {
        let mut config = AppConfig::default();
        config.style.line.width = i32::MAX;
        assert!(config.validate().is_err());

        config.style.line.width = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.curve.asymmetry = 1e9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_frames_as_long_as_the_path() {
        let mut config = AppConfig::default();
        config.curve.frame_fraction = 1.0;

        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("frame length"));
    }

    #[test]
    fn rejects_zero_durations() {
        let mut config = AppConfig::default();
        config.animation.third_duration_ms = 0;

        assert!(matches!(
            config.validate(),
            Err(InfinityError::InvalidConfig(_))
        ));
    }

    #[test]
    fn outer_and_third_only_override_color() {
        let style = StyleConfig::default();
        let outer = style.line_style(CurveKind::Outer);

        assert_eq!(outer.color, Color::from_hex(0x32CD32));
        assert_eq!(outer.width, 5);
        assert_eq!(outer.rounded, style.line.rounded);
        assert_eq!(style.line_style(CurveKind::Base).color, style.line.color);
    }
}
