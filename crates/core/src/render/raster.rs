use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, Point as EgPoint, Size},
    pixelcolor::{raw::RawU16, IntoStorage, Rgb565},
    primitives::{
        Circle, ContainsPoint, Line as EgLine, Primitive, PrimitiveStyle, PrimitiveStyleBuilder,
        Rectangle,
    },
    Drawable, Pixel,
};

use crate::{render::Line, Color, Point};

/// Coordinates beyond this distance from the origin are never drawn. Keeps
/// primitive arithmetic far away from `i32` overflow.
const COORD_LIMIT: u32 = i16::MAX as u32;

/// Rectangle of the drawing surface handed to a [`FlushTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Receiver of rendered bands. `pixels` holds `area.width * area.height`
/// little-endian RGB565 values, row-major.
pub trait FlushTarget {
    fn flush(&mut self, area: Area, pixels: &[u8]);
}

impl From<Point> for EgPoint {
    fn from(point: Point) -> Self {
        EgPoint::new(point.x, point.y)
    }
}

/// Horizontal slice of the screen backed by the display's draw buffer.
pub(super) struct Band<'a> {
    pixels: &'a mut [u8],
    area: Area,
}

impl<'a> Band<'a> {
    pub(super) fn new(pixels: &'a mut [u8], area: Area) -> Self {
        Self { pixels, area }
    }

    pub(super) fn bytes(&self) -> &[u8] {
        self.pixels
    }
}

impl Dimensions for Band<'_> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(
            EgPoint::new(self.area.x as i32, self.area.y as i32),
            Size::new(self.area.width, self.area.height),
        )
    }
}

impl DrawTarget for Band<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            let row = (point.y - bounds.top_left.y) as usize;
            let col = (point.x - bounds.top_left.x) as usize;
            let offset = (row * self.area.width as usize + col) * 2;
            if let Some(slot) = self.pixels.get_mut(offset..offset + 2) {
                slot.copy_from_slice(&color.into_storage().to_le_bytes());
            }
        }
        Ok(())
    }
}

/// Strokes the polyline of `line` into `band`. Rounded lines get a filled
/// circle on every vertex for round caps and joints.
pub(super) fn draw_line(band: &mut Band<'_>, line: &Line) -> Result<(), Infallible> {
    let color = Rgb565::from(line.style.color);
    let width = line.style.width.max(1) as u32;
    let stroke = PrimitiveStyleBuilder::new()
        .stroke_color(color)
        .stroke_width(width)
        .build();
    let fill = PrimitiveStyle::with_fill(color);
    let reach = width as i32;
    let bounds = band.bounding_box();

    let points = line.points.as_slice();
    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if touches(&bounds, from, to, reach) {
            EgLine::new(from.into(), to.into())
                .into_styled(stroke)
                .draw(band)?;
        }
    }

    for &point in points {
        if !touches(&bounds, point, point, reach) {
            continue;
        }
        if line.style.rounded {
            Circle::with_center(point.into(), width)
                .into_styled(fill)
                .draw(band)?;
        } else if points.len() == 1 {
            Rectangle::with_center(point.into(), Size::new(width, width))
                .into_styled(fill)
                .draw(band)?;
        }
    }
    Ok(())
}

/// Whether the segment, widened by `reach`, can land inside `bounds`.
/// Segments with coordinates past [`COORD_LIMIT`] never do.
fn touches(bounds: &Rectangle, from: Point, to: Point, reach: i32) -> bool {
    let in_range =
        |p: Point| p.x.unsigned_abs() <= COORD_LIMIT && p.y.unsigned_abs() <= COORD_LIMIT;
    if !(in_range(from) && in_range(to)) {
        return false;
    }
    let left = from.x.min(to.x) - reach;
    let right = from.x.max(to.x) + reach;
    let top = from.y.min(to.y) - reach;
    let bottom = from.y.max(to.y) + reach;
    let size = bounds.size;
    right >= bounds.top_left.x
        && left < bounds.top_left.x + size.width as i32
        && bottom >= bounds.top_left.y
        && top < bounds.top_left.y + size.height as i32
}

/// Full-screen RGB565 image assembled from flushed bands.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
    bands: u64,
    frames: u64,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb565::from(RawU16::new(0)); width as usize * height as usize],
            bands: 0,
            frames: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Bands received so far.
    pub fn bands(&self) -> u64 {
        self.bands
    }

    /// Completed frames, counted when a band reaches the bottom edge.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Coarse text rendering, `cols` by `rows` cells. A cell shows the glyph
    /// of the first `legend` color found among its pixels, or a space.
    pub fn to_ascii(&self, cols: u32, rows: u32, legend: &[(Color, char)]) -> String {
        let cols = cols.clamp(1, self.width.max(1));
        let rows = rows.clamp(1, self.height.max(1));
        let legend: Vec<(Rgb565, char)> = legend
            .iter()
            .map(|(color, glyph)| (Rgb565::from(*color), *glyph))
            .collect();

        let mut out = String::with_capacity(((cols + 1) * rows) as usize);
        for row in 0..rows {
            let y0 = row * self.height / rows;
            let y1 = ((row + 1) * self.height / rows).max(y0 + 1);
            for col in 0..cols {
                let x0 = col * self.width / cols;
                let x1 = ((col + 1) * self.width / cols).max(x0 + 1);
                let glyph = legend
                    .iter()
                    .find(|(color, _)| {
                        (y0..y1).any(|y| (x0..x1).any(|x| self.pixel(x, y) == Some(*color)))
                    })
                    .map(|(_, glyph)| *glyph)
                    .unwrap_or(' ');
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl FlushTarget for Framebuffer {
    fn flush(&mut self, area: Area, pixels: &[u8]) {
        for row in 0..area.height {
            let y = area.y + row;
            if y >= self.height {
                break;
            }
            for col in 0..area.width {
                let x = area.x + col;
                if x >= self.width {
                    continue;
                }
                let offset = ((row * area.width + col) * 2) as usize;
                if let Some(bytes) = pixels.get(offset..offset + 2) {
                    let raw = RawU16::new(u16::from_le_bytes([bytes[0], bytes[1]]));
                    self.pixels[(y * self.width + x) as usize] = Rgb565::from(raw);
                }
            }
        }
        self.bands += 1;
        if area.y + area.height >= self.height {
            self.frames += 1;
        }
    }
}
