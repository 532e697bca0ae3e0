use std::path::Path;
use tracing::{info, warn};

const FONT_NAME: &str = "calink";

/// Read a TTF/OTF from disk. Missing or unreadable fonts just mean egui's
/// built-in fonts are used.
pub fn load_font(path: &Path) -> Option<egui::FontData> {
    match std::fs::read(path) {
        Ok(bytes) => {
            info!("using font {}", path.display());
            Some(egui::FontData::from_owned(bytes))
        }
        Err(err) => {
            warn!("could not read font {}: {}", path.display(), err);
            None
        }
    }
}

/// Put `font_data` ahead of egui's defaults for proportional text.
pub fn setup_fonts(font_data: &egui::FontData, ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    fonts
        .font_data
        .insert(FONT_NAME.to_owned(), font_data.clone());

    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .insert(0, FONT_NAME.to_owned());

    ctx.set_fonts(fonts);
}
