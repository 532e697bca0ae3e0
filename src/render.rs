use crate::author::AuthorInfo;
use crate::comment::{ChainId, Comment, CommentId};
use crate::error::{Error, Result};
use crate::fonts;
use crate::format::{calculate_font_size, format_date};
use crate::images::fetch_image;
use crate::pfp::{blockies_pfp, cover_image, process_pfp_bitmap, PFP_SIZE};
use crate::references::{enhance_references, EnhancedReference};
use egui::text::{LayoutJob, TextFormat, TextWrapping};
use egui::{
    pos2, vec2, Align2, Color32, ColorImage, FontId, Rect, Rounding, Stroke, TextureHandle,
    TextureOptions, Visuals,
};
use futures_util::future::join_all;
use image::imageops::FilterType;
use std::path::Path;
use tracing::{error, warn};

pub const NO_CONTENT: &str = "No content";

/// How many references fit next to the text on the preview image
pub const PREVIEW_MAX_REFERENCES: usize = 2;

pub const PREVIEW_WIDTH: f32 = 1200.0;
pub const PREVIEW_HEIGHT: f32 = 800.0;

const PADDING: f32 = 60.0;
const HEADER_GAP: f32 = 16.0;
const HEADER_BOTTOM_MARGIN: f32 = 40.0;
const COLUMN_GAP: f32 = 40.0;
const REFERENCE_COLUMN_WIDTH: f32 = 300.0;
const REFERENCE_GAP: f32 = 16.0;
const LOGO_SIZE: [f32; 2] = [72.0, 66.0];

const TEXT: Color32 = Color32::from_rgb(0x11, 0x18, 0x27);
const MUTED: Color32 = Color32::from_rgb(0x6B, 0x72, 0x80);
const FAINT: Color32 = Color32::from_rgb(0xD1, 0xD5, 0xDB);
const BORDER: Color32 = Color32::from_rgb(0xE5, 0xE7, 0xEB);

static LOGO_SVG: &[u8] = include_bytes!("../assets/ecp-logo.svg");

/// Everything both renderings need, derived from one indexer record.
#[derive(Debug, Clone)]
pub struct CommentRenderData {
    pub id: CommentId,
    pub chain_id: ChainId,
    pub author: AuthorInfo,
    pub content: String,
    pub date: Option<String>,
    pub references: Vec<EnhancedReference>,
}

impl CommentRenderData {
    pub fn new(id: CommentId, chain_id: ChainId, comment: &Comment) -> Self {
        let content = comment
            .content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_CONTENT)
            .to_owned();

        CommentRenderData {
            id,
            chain_id,
            author: AuthorInfo::resolve(comment.author.as_ref()),
            content,
            date: comment.created_at.as_ref().and_then(format_date),
            references: enhance_references(&comment.references).collect(),
        }
    }

    pub fn font_size(&self) -> u32 {
        calculate_font_size(self.content.encode_utf16().count())
    }

    pub fn preview_references(&self) -> &[EnhancedReference] {
        let n = self.references.len().min(PREVIEW_MAX_REFERENCES);
        &self.references[..n]
    }
}

/// Where things go on the preview image, which depends on whether there
/// is a reference column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewLayout {
    pub content_width: f32,
    pub max_rows: usize,
    pub reference_height: f32,
}

impl PreviewLayout {
    pub fn new(references: usize) -> Self {
        let full_width = PREVIEW_WIDTH - 2.0 * PADDING;
        match references {
            0 => PreviewLayout {
                content_width: full_width,
                max_rows: 22,
                reference_height: 0.0,
            },
            1 => PreviewLayout {
                content_width: full_width - COLUMN_GAP - REFERENCE_COLUMN_WIDTH,
                max_rows: 16,
                reference_height: 200.0,
            },
            _ => PreviewLayout {
                content_width: full_width - COLUMN_GAP - REFERENCE_COLUMN_WIDTH,
                max_rows: 16,
                reference_height: 140.0,
            },
        }
    }
}

/// Process-wide inputs to the rasterizer, loaded once at startup.
#[derive(Default)]
pub struct PreviewAssets {
    pub font: Option<egui::FontData>,
    pub logo: Option<ColorImage>,
}

impl PreviewAssets {
    pub fn load(font_path: Option<&Path>) -> Self {
        let logo = match egui_extras::image::load_svg_bytes(LOGO_SVG) {
            Ok(logo) => Some(logo),
            Err(err) => {
                error!("could not rasterize logo: {}", err);
                None
            }
        };

        PreviewAssets {
            font: font_path.and_then(fonts::load_font),
            logo,
        }
    }
}

pub enum PreviewAvatar {
    Image(ColorImage),
    /// A grey circle with a question mark
    Placeholder,
}

/// Remote pictures for one preview, already cropped to their slots.
/// A reference whose image failed to load is `None` and drawn as an empty
/// frame.
pub struct PreviewImages {
    pub avatar: PreviewAvatar,
    pub references: Vec<Option<ColorImage>>,
}

impl PreviewImages {
    /// Fetches the avatar and the reference thumbnails concurrently.
    pub async fn load(client: &reqwest::Client, data: &CommentRenderData) -> Self {
        let refs = data.preview_references();
        let height = PreviewLayout::new(refs.len()).reference_height as u32;

        let avatar = async {
            let Some(url) = &data.author.avatar_url else {
                return None;
            };
            match fetch_image(client, url).await {
                Ok(image) => Some(process_pfp_bitmap(PFP_SIZE, &image, FilterType::CatmullRom)),
                Err(err) => {
                    warn!("avatar {} unavailable: {}", url, err);
                    None
                }
            }
        };

        let references = join_all(refs.iter().map(|reference| async move {
            match fetch_image(client, &reference.image).await {
                Ok(image) => Some(cover_image(&image, REFERENCE_COLUMN_WIDTH as u32, height)),
                Err(err) => {
                    warn!("reference image {} unavailable: {}", reference.image, err);
                    None
                }
            }
        }));

        let (avatar, references) = tokio::join!(avatar, references);

        let avatar = match (avatar, &data.author.address) {
            (Some(pfp), _) => PreviewAvatar::Image(pfp),
            (None, Some(address)) => PreviewAvatar::Image(blockies_pfp(address, PFP_SIZE)),
            (None, None) => PreviewAvatar::Placeholder,
        };

        PreviewImages { avatar, references }
    }
}

fn full_uv() -> Rect {
    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0))
}

fn setup_visuals(assets: &PreviewAssets, ctx: &egui::Context) {
    ctx.set_visuals(Visuals::light());
    if let Some(font) = &assets.font {
        fonts::setup_fonts(font, ctx);
    }
}

/// Text clamped to `max_rows` inside `rect`, ending in an ellipsis when cut.
fn clamped_text(ui: &mut egui::Ui, rect: Rect, text: &str, size: f32, color: Color32, max_rows: usize) {
    let mut job = LayoutJob::single_section(
        text.to_owned(),
        TextFormat {
            font_id: FontId::proportional(size),
            color,
            line_height: Some(size * 1.4),
            ..Default::default()
        },
    );
    job.wrap = TextWrapping {
        max_width: rect.width(),
        max_rows,
        break_anywhere: true,
        overflow_character: Some('…'),
        ..Default::default()
    };

    ui.allocate_ui_at_rect(rect, |ui| {
        ui.label(job);
    });
}

fn author_header(
    ui: &mut egui::Ui,
    data: &CommentRenderData,
    avatar: Option<&TextureHandle>,
) {
    let painter = ui.painter().clone();
    let pfp_rect = Rect::from_min_size(pos2(PADDING, PADDING), vec2(PFP_SIZE as f32, PFP_SIZE as f32));

    match avatar {
        Some(texture) => painter.image(texture.id(), pfp_rect, full_uv(), Color32::WHITE),
        None => {
            painter.circle_filled(pfp_rect.center(), pfp_rect.width() / 2.0, BORDER);
            painter.text(
                pfp_rect.center(),
                Align2::CENTER_CENTER,
                "?",
                FontId::proportional(31.0),
                MUTED,
            );
        }
    }

    let x = pfp_rect.right() + HEADER_GAP;
    painter.text(
        pos2(x, PADDING + 2.0),
        Align2::LEFT_TOP,
        &data.author.name,
        FontId::proportional(36.0),
        TEXT,
    );

    let meta_font = FontId::proportional(27.0);
    let mut cursor = pos2(x, PADDING + 46.0);
    if let Some(username) = &data.author.username {
        let rect = painter.text(cursor, Align2::LEFT_TOP, format!("@{username}"), meta_font.clone(), MUTED);
        let rect = painter.text(
            pos2(rect.right() + 8.0, cursor.y),
            Align2::LEFT_TOP,
            "•",
            meta_font.clone(),
            FAINT,
        );
        cursor.x = rect.right() + 8.0;
    }
    if let Some(date) = &data.date {
        painter.text(cursor, Align2::LEFT_TOP, date, meta_font, MUTED);
    }
}

fn reference_column(
    ui: &mut egui::Ui,
    references: &[EnhancedReference],
    textures: &[Option<TextureHandle>],
    layout: &PreviewLayout,
    top: f32,
) {
    let x = PREVIEW_WIDTH - PADDING - REFERENCE_COLUMN_WIDTH;
    let mut y = top;

    for (reference, texture) in references.iter().zip(textures) {
        let rect = Rect::from_min_size(pos2(x, y), vec2(REFERENCE_COLUMN_WIDTH, layout.reference_height));
        let painter = ui.painter().clone();
        match texture {
            Some(texture) => painter.image(texture.id(), rect, full_uv(), Color32::WHITE),
            None => painter.rect_filled(rect, Rounding::same(12.0), Color32::from_gray(0xF3)),
        }
        painter.rect_stroke(rect, Rounding::same(12.0), Stroke::new(1.0, BORDER));
        y = rect.bottom() + 8.0;

        if let Some(title) = &reference.title {
            let rect = Rect::from_min_size(pos2(x, y), vec2(REFERENCE_COLUMN_WIDTH, 18.0));
            clamped_text(ui, rect, title, 14.0, TEXT, 1);
            y += 20.0;
        }
        if let Some(subtitle) = &reference.subtitle {
            let rect = Rect::from_min_size(pos2(x, y), vec2(REFERENCE_COLUMN_WIDTH, 16.0));
            clamped_text(ui, rect, subtitle, 12.0, MUTED, 1);
            y += 16.0;
        }

        y += REFERENCE_GAP;
    }
}

fn preview_ui(
    ctx: &egui::Context,
    assets: &PreviewAssets,
    data: &CommentRenderData,
    images: &PreviewImages,
) {
    setup_visuals(assets, ctx);

    let references = data.preview_references();
    let layout = PreviewLayout::new(references.len());

    // handles stay alive until the frame is painted
    let logo = assets
        .logo
        .as_ref()
        .map(|logo| ctx.load_texture("logo", logo.clone(), TextureOptions::LINEAR));
    let avatar = match &images.avatar {
        PreviewAvatar::Image(pfp) => Some(ctx.load_texture("pfp", pfp.clone(), TextureOptions::LINEAR)),
        PreviewAvatar::Placeholder => None,
    };
    let reference_textures: Vec<Option<TextureHandle>> = images
        .references
        .iter()
        .enumerate()
        .map(|(i, image)| {
            image
                .as_ref()
                .map(|image| ctx.load_texture(format!("reference-{i}"), image.clone(), TextureOptions::LINEAR))
        })
        .collect();

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::WHITE))
        .show(ctx, |ui| {
            if let Some(logo) = &logo {
                let rect = Rect::from_min_size(
                    pos2(PREVIEW_WIDTH - PADDING - LOGO_SIZE[0], PADDING),
                    vec2(LOGO_SIZE[0], LOGO_SIZE[1]),
                );
                ui.painter().image(logo.id(), rect, full_uv(), Color32::WHITE);
            }

            author_header(ui, data, avatar.as_ref());

            let top = PADDING + PFP_SIZE as f32 + HEADER_BOTTOM_MARGIN;
            let content_rect = Rect::from_min_size(
                pos2(PADDING, top),
                vec2(layout.content_width, PREVIEW_HEIGHT - PADDING - top),
            );
            clamped_text(
                ui,
                content_rect,
                &data.content,
                data.font_size() as f32,
                TEXT,
                layout.max_rows,
            );

            reference_column(ui, references, &reference_textures, &layout, top);
        });
}

/// Rasterize the 1200x800 preview card to png bytes.
pub fn render_preview(
    assets: &PreviewAssets,
    data: &CommentRenderData,
    images: &PreviewImages,
) -> Result<Vec<u8>> {
    use egui_skia::{rasterize, RasterizeOptions};
    use skia_safe::EncodedImageFormat;

    let options = RasterizeOptions {
        pixels_per_point: 1.0,
        frames_before_screenshot: 1,
    };

    let mut surface = rasterize(
        (1200, 800),
        |ctx| preview_ui(ctx, assets, data, images),
        Some(options),
    );

    let png = surface
        .image_snapshot()
        .encode_to_data(EncodedImageFormat::PNG)
        .ok_or_else(|| Error::Render("png encoding failed".to_string()))?;

    Ok(png.as_bytes().into())
}
