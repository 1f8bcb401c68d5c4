use image::{Pixel, Rgba, RgbaImage};
use log::warn;

use super::{Rect, Surface};

/// Software [`Surface`]: sprite sheets and the target are plain RGBA images.
///
/// Blits alpha-blend source pixels over the target; fully transparent
/// pixels are skipped.
pub struct ImageSurface {
    target: RgbaImage,
    sheets: Vec<RgbaImage>,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { target: RgbaImage::new(width, height), sheets: Vec::new() }
    }

    /// Register a sheet and return its number.
    pub fn add_sheet(&mut self, sheet: RgbaImage) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    /// Decode a PNG (or any format `image` was built with) into a new sheet.
    pub fn load_sheet(&mut self, bytes: &[u8]) -> Result<usize, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        Ok(self.add_sheet(img))
    }

    pub fn sheet(&self, index: usize) -> Option<&RgbaImage> {
        self.sheets.get(index)
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for px in self.target.pixels_mut() {
            *px = Rgba(color);
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_image(self) -> RgbaImage {
        self.target
    }
}

impl Surface for ImageSurface {
    fn blit(&mut self, sheet: usize, src: Rect, x: i32, y: i32) {
        let Some(source) = self.sheets.get(sheet) else {
            warn!("blit from unknown sheet {sheet}");
            return;
        };
        let (tw, th) = self.target.dimensions();
        let (sw, sh) = source.dimensions();

        for dy in 0..src.h {
            let sy = src.y + dy;
            let ty = y + dy as i32;
            if sy >= sh || ty < 0 || ty >= th as i32 {
                continue;
            }
            for dx in 0..src.w {
                let sx = src.x + dx;
                let tx = x + dx as i32;
                if sx >= sw || tx < 0 || tx >= tw as i32 {
                    continue;
                }
                let px = *source.get_pixel(sx, sy);
                match px.0[3] {
                    0 => {}
                    255 => self.target.put_pixel(tx as u32, ty as u32, px),
                    _ => self.target.get_pixel_mut(tx as u32, ty as u32).blend(&px),
                }
            }
        }
    }
}
