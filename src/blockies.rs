//! Blockies identicons: the pixel-grid avatars ethereum wallets show for an
//! address without a profile picture.
//!
//! The generator must stay bit-compatible with the javascript `blockies`
//! implementation so an address gets the same icon here as it does in every
//! wallet. That means reproducing its xorshift generator, including the
//! quirk that `rand()` returns values in `[0, 2)`.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const DEFAULT_SIZE: usize = 8;
pub const DEFAULT_SCALE: u32 = 10;

struct XorShift {
    state: [i32; 4],
}

impl XorShift {
    fn seeded(seed: &str) -> Self {
        let mut state = [0i32; 4];
        for (i, unit) in seed.encode_utf16().enumerate() {
            let s = state[i % 4];
            state[i % 4] = s.wrapping_shl(5).wrapping_sub(s).wrapping_add(unit as i32);
        }
        XorShift { state }
    }

    fn rand(&mut self) -> f64 {
        let t = self.state[0] ^ self.state[0].wrapping_shl(11);
        self.state[0] = self.state[1];
        self.state[1] = self.state[2];
        self.state[2] = self.state[3];
        let w = self.state[3];
        self.state[3] = w ^ (w >> 19) ^ t ^ (t >> 8);
        (self.state[3] as u32) as f64 / 2_147_483_648.0
    }

    fn color(&mut self) -> [u8; 3] {
        let hue = (self.rand() * 360.0).floor();
        let saturation = self.rand() * 60.0 + 40.0;
        let lightness = (self.rand() + self.rand() + self.rand() + self.rand()) * 25.0;
        hsl_to_rgb(hue, saturation / 100.0, lightness / 100.0)
    }
}

/// CSS `hsl()` semantics: hue wraps, saturation and lightness clamp.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };

    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Background,
    Color,
    Spot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blockies {
    size: usize,
    scale: u32,
    color: [u8; 3],
    bgcolor: [u8; 3],
    spotcolor: [u8; 3],
    cells: Vec<Cell>,
}

impl Blockies {
    pub fn new(address: &str) -> Self {
        Self::with_size(address, DEFAULT_SIZE, DEFAULT_SCALE)
    }

    /// `size` cells per side, each drawn `scale` pixels wide. The seed is
    /// case-insensitive.
    pub fn with_size(address: &str, size: usize, scale: u32) -> Self {
        let mut rng = XorShift::seeded(&address.to_lowercase());

        // draw order matters: it is part of the seed stream
        let color = rng.color();
        let bgcolor = rng.color();
        let spotcolor = rng.color();

        let data_width = size.div_ceil(2);
        let mirror_width = size - data_width;
        let mut cells = Vec::with_capacity(size * size);

        for _ in 0..size {
            let row: Vec<Cell> = (0..data_width)
                .map(|_| match (rng.rand() * 2.3).floor() as u32 {
                    0 => Cell::Background,
                    1 => Cell::Color,
                    _ => Cell::Spot,
                })
                .collect();

            cells.extend_from_slice(&row);
            cells.extend(row[..mirror_width].iter().rev());
        }

        Blockies {
            size,
            scale,
            color,
            bgcolor,
            spotcolor,
            cells,
        }
    }

    pub fn pixel_size(&self) -> u32 {
        self.size as u32 * self.scale
    }

    fn cell_color(&self, cell: Cell) -> [u8; 3] {
        match cell {
            Cell::Background => self.bgcolor,
            Cell::Color => self.color,
            Cell::Spot => self.spotcolor,
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        let scale = self.scale.max(1);
        RgbaImage::from_fn(self.pixel_size(), self.pixel_size(), |x, y| {
            let col = (x / scale) as usize;
            let row = (y / scale) as usize;
            let [r, g, b] = self.cell_color(self.cells[row * self.size + col]);
            Rgba([r, g, b, 0xff])
        })
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png = Cursor::new(Vec::new());
        self.to_rgba_image()
            .write_to(&mut png, ImageOutputFormat::Png)?;
        Ok(png.into_inner())
    }

    /// For `<img src>` on the html page
    pub fn to_data_uri(&self) -> Result<String> {
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(self.to_png()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";
    const BOB: &str = "0xde0B295669a9FD93d5F28D9Ec85E40f4cb697BAe";

    #[test]
    fn test_same_address_same_pixels() {
        let a = Blockies::new(ALICE);
        let b = Blockies::new(&ALICE.to_lowercase());
        let c = Blockies::new(&ALICE.to_uppercase().replacen("0X", "0x", 1));

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.to_rgba_image().as_raw(), b.to_rgba_image().as_raw());
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn test_different_addresses_differ() {
        let a = Blockies::new(ALICE);
        let b = Blockies::new(BOB);
        assert_ne!(a.to_rgba_image().as_raw(), b.to_rgba_image().as_raw());
    }

    #[test]
    fn test_grid_is_mirrored() {
        let icon = Blockies::new(ALICE);
        assert_eq!(icon.cells.len(), DEFAULT_SIZE * DEFAULT_SIZE);
        for row in icon.cells.chunks(DEFAULT_SIZE) {
            let reversed: Vec<Cell> = row.iter().rev().copied().collect();
            assert_eq!(row, reversed.as_slice());
        }
    }

    #[test]
    fn test_dimensions() {
        let icon = Blockies::new(ALICE);
        let image = icon.to_rgba_image();
        assert_eq!((image.width(), image.height()), (80, 80));

        let odd = Blockies::with_size(ALICE, 5, 3);
        assert_eq!(odd.cells.len(), 25);
        assert_eq!(odd.to_rgba_image().width(), 15);
    }

    #[test]
    fn test_contexts_agree() {
        let icon = Blockies::new(ALICE);
        let rgba = icon.to_rgba_image();
        let png = image::load_from_memory(&icon.to_png().unwrap()).unwrap().into_rgba8();
        assert_eq!(rgba.as_raw(), png.as_raw());
    }

    #[test]
    fn test_data_uri() {
        let uri = Blockies::new(ALICE).to_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_hsl_to_rgb() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(600.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(42.0, 1.6, 1.7), [255, 255, 255]);
    }
}
