use crate::blockies::Blockies;
use egui::{Color32, ColorImage};
use image::imageops::FilterType;
use image::DynamicImage;

/// Side of the round avatar on the preview image
pub const PFP_SIZE: u32 = 79;

/// Clear everything outside the inscribed circle, fading the one pixel
/// band along the edge so it doesn't look jagged.
pub fn round_image(image: &mut ColorImage) {
    let [width, height] = image.size;
    let radius = width.min(height) as f32 / 2.0;

    for (i, pixel) in image.pixels.iter_mut().enumerate() {
        let dx = radius - (i % width) as f32;
        let dy = radius - (i / width) as f32;
        let edge_distance = radius - (dx * dx + dy * dy).sqrt();

        if edge_distance < 0.0 {
            *pixel = Color32::TRANSPARENT;
        } else if edge_distance <= 1.0 {
            let [r, g, b, a] = pixel.to_array();
            let fade = |c: u8| (c as f32 * edge_distance) as u8;
            *pixel = Color32::from_rgba_premultiplied(fade(r), fade(g), fade(b), fade(a));
        }
    }
}

fn to_color_image(image: DynamicImage) -> ColorImage {
    let rgba = image.into_rgba8();
    ColorImage::from_rgba_unmultiplied(
        [rgba.width() as usize, rgba.height() as usize],
        rgba.as_flat_samples().as_slice(),
    )
}

/// Center-crop to a square, scale to `size` and round.
pub fn process_pfp_bitmap(size: u32, image: &DynamicImage, filter: FilterType) -> ColorImage {
    let side = image.width().min(image.height());
    let x = (image.width() - side) / 2;
    let y = (image.height() - side) / 2;

    let square = image.crop_imm(x, y, side, side).resize_exact(size, size, filter);
    let mut pfp = to_color_image(square);
    round_image(&mut pfp);
    pfp
}

/// Identicon stand-in for authors without a profile picture
pub fn blockies_pfp(address: &str, size: u32) -> ColorImage {
    let icon = DynamicImage::ImageRgba8(Blockies::new(address).to_rgba_image());
    process_pfp_bitmap(size, &icon, FilterType::Nearest)
}

/// Scale and crop so the image covers a `width` x `height` box, like css
/// `object-fit: cover`.
pub fn cover_image(image: &DynamicImage, width: u32, height: u32) -> ColorImage {
    to_color_image(image.resize_to_fill(width, height, FilterType::CatmullRom))
}
