//! Draws one timeline instant into an RGBA canvas. Pure CPU path: the
//! preview surface and exporters both consume the output buffer.

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::rect::Rect;
use std::collections::HashMap;
use tracing::warn;

use project::{Background, ProjectSettings};
use timeline::{
    sorted_track_indices, ElementKind, MediaKind, MediaSource, Sec, TextAlign, TextStyle,
    Timeline, TimelineElement, TrackKind,
};

use crate::{FrameSource, RendererError};

/// Host-registered fonts, keyed by family name. Text falls back to the
/// first registered font when its family is missing, and is skipped with
/// a warning when the book is empty.
#[derive(Default)]
pub struct FontBook {
    fonts: HashMap<String, FontVec>,
    fallback: Option<String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, family: impl Into<String>, data: Vec<u8>) -> Result<(), RendererError> {
        let family = family.into();
        let font = FontVec::try_from_vec(data)
            .map_err(|_| RendererError::InvalidFont(family.clone()))?;
        if self.fallback.is_none() {
            self.fallback = Some(family.clone());
        }
        self.fonts.insert(family, font);
        Ok(())
    }

    fn resolve(&self, family: &str) -> Option<&FontVec> {
        self.fonts
            .get(family)
            .or_else(|| self.fallback.as_ref().and_then(|f| self.fonts.get(f)))
    }
}

pub struct Compositor {
    fonts: FontBook,
}

impl Compositor {
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Composite the frame at `time`. Tracks paint bottom-up in display
    /// order, so the topmost track wins where elements overlap spatially.
    /// A media element whose frame cannot be produced paints a dim
    /// placeholder instead of failing the whole frame.
    pub fn render_frame(
        &self,
        timeline: &Timeline,
        media: &dyn MediaSource,
        frames: &mut dyn FrameSource,
        settings: &ProjectSettings,
        time: Sec,
    ) -> RgbaImage {
        let width = settings.canvas_size.width;
        let height = settings.canvas_size.height;
        let mut canvas = RgbaImage::from_pixel(
            width,
            height,
            Rgba([0, 0, 0, 255]),
        );

        self.paint_background(&mut canvas, timeline, media, frames, settings, time);

        let tracks = timeline.tracks();
        for &index in sorted_track_indices(tracks).iter().rev() {
            let track = &tracks[index];
            if track.kind == TrackKind::Audio {
                continue;
            }
            for element in &track.elements {
                if element.hidden || !element.is_active_at(time) {
                    continue;
                }
                match &element.kind {
                    ElementKind::Media { media_id } => {
                        if media.media_kind(*media_id) == Some(MediaKind::Audio) {
                            continue;
                        }
                        self.paint_media(&mut canvas, frames, element, time);
                    }
                    ElementKind::Text { content, style } => {
                        self.paint_text(&mut canvas, content, style);
                    }
                }
            }
        }
        canvas
    }

    fn paint_background(
        &self,
        canvas: &mut RgbaImage,
        timeline: &Timeline,
        media: &dyn MediaSource,
        frames: &mut dyn FrameSource,
        settings: &ProjectSettings,
        time: Sec,
    ) {
        match &settings.background {
            Background::Color { color } => {
                if let Some(color) = parse_hex_color(color) {
                    for pixel in canvas.pixels_mut() {
                        *pixel = color;
                    }
                }
            }
            Background::Blur { intensity } => {
                let Some(source) = first_visual_frame(timeline, media, frames, time) else {
                    return;
                };
                let covered = cover_scale(&source, canvas.width(), canvas.height());
                let sigma = (*intensity as f32).max(0.5);
                let blurred = imageops::blur(&covered, sigma);
                imageops::overlay(canvas, &blurred, 0, 0);
            }
        }
    }

    fn paint_media(
        &self,
        canvas: &mut RgbaImage,
        frames: &mut dyn FrameSource,
        element: &TimelineElement,
        time: Sec,
    ) {
        let Some(media_id) = element.media_id() else {
            return;
        };
        let local_time = element.local_time(time);
        let frame = match frames.frame_at(media_id, local_time) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(media = %media_id, error = %err, "frame unavailable, painting placeholder");
                paint_placeholder(canvas);
                return;
            }
        };
        let (scaled, x, y) = contain_scale(&frame, canvas.width(), canvas.height());
        imageops::overlay(canvas, &scaled, x, y);
    }

    fn paint_text(&self, canvas: &mut RgbaImage, content: &str, style: &TextStyle) {
        let Some(font) = self.fonts.resolve(&style.font_family) else {
            warn!(family = %style.font_family, "no font registered, skipping text element");
            return;
        };
        let Some(color) = parse_hex_color(&style.color) else {
            return;
        };
        let scale = PxScale::from(style.font_size);
        let (text_w, text_h) = text_size(scale, font, content);
        if text_w == 0 || text_h == 0 {
            return;
        }
        let pad = (style.font_size * 0.2).ceil() as u32;
        let mut layer = RgbaImage::from_pixel(
            text_w + pad * 2,
            text_h + pad * 2,
            Rgba([0, 0, 0, 0]),
        );
        if let Some(bg) = style
            .background_color
            .as_deref()
            .and_then(parse_hex_color)
        {
            let (layer_w, layer_h) = (layer.width(), layer.height());
            draw_filled_rect_mut(
                &mut layer,
                Rect::at(0, 0).of_size(layer_w, layer_h),
                bg,
            );
        }
        draw_text_mut(&mut layer, color, pad as i32, pad as i32, scale, font, content);
        if style.opacity < 1.0 {
            apply_opacity(&mut layer, style.opacity.clamp(0.0, 1.0));
        }
        if style.rotation.abs() > f32::EPSILON {
            layer = rotate_about_center(
                &layer,
                style.rotation.to_radians(),
                Interpolation::Bilinear,
                Rgba([0, 0, 0, 0]),
            );
        }

        // x/y offsets are relative to the canvas center; alignment moves
        // the horizontal anchor.
        let anchor_x = canvas.width() as f32 / 2.0 + style.x;
        let anchor_y = canvas.height() as f32 / 2.0 + style.y;
        let left = match style.align {
            TextAlign::Left => anchor_x,
            TextAlign::Center => anchor_x - layer.width() as f32 / 2.0,
            TextAlign::Right => anchor_x - layer.width() as f32,
        };
        let top = anchor_y - layer.height() as f32 / 2.0;
        imageops::overlay(canvas, &layer, left.round() as i64, top.round() as i64);
    }
}

/// Decoded frame of the first visible media element at `time`, scanning
/// display order top-down.
fn first_visual_frame(
    timeline: &Timeline,
    media: &dyn MediaSource,
    frames: &mut dyn FrameSource,
    time: Sec,
) -> Option<RgbaImage> {
    let tracks = timeline.tracks();
    for &index in &sorted_track_indices(tracks) {
        let track = &tracks[index];
        if track.kind == TrackKind::Audio {
            continue;
        }
        for element in &track.elements {
            if element.hidden || !element.is_active_at(time) {
                continue;
            }
            let Some(media_id) = element.media_id() else {
                continue;
            };
            if media.media_kind(media_id) == Some(MediaKind::Audio) {
                continue;
            }
            if let Ok(frame) = frames.frame_at(media_id, element.local_time(time)) {
                return Some(frame);
            }
        }
    }
    None
}

/// Fit inside the canvas preserving aspect ratio; returns the scaled
/// image and its centered top-left corner.
fn contain_scale(frame: &RgbaImage, width: u32, height: u32) -> (RgbaImage, i64, i64) {
    let scale = (width as f64 / frame.width() as f64)
        .min(height as f64 / frame.height() as f64);
    let w = ((frame.width() as f64 * scale).round() as u32).max(1);
    let h = ((frame.height() as f64 * scale).round() as u32).max(1);
    let scaled = imageops::resize(frame, w, h, FilterType::Triangle);
    let x = (width as i64 - w as i64) / 2;
    let y = (height as i64 - h as i64) / 2;
    (scaled, x, y)
}

/// Fill the canvas preserving aspect ratio, cropping the overflow.
fn cover_scale(frame: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let scale = (width as f64 / frame.width() as f64)
        .max(height as f64 / frame.height() as f64);
    let w = ((frame.width() as f64 * scale).ceil() as u32).max(width);
    let h = ((frame.height() as f64 * scale).ceil() as u32).max(height);
    let scaled = imageops::resize(frame, w, h, FilterType::Triangle);
    let x = (w - width) / 2;
    let y = (h - height) / 2;
    imageops::crop_imm(&scaled, x, y, width, height).to_image()
}

fn paint_placeholder(canvas: &mut RgbaImage) {
    let w = canvas.width() / 2;
    let h = canvas.height() / 2;
    if w == 0 || h == 0 {
        return;
    }
    draw_filled_rect_mut(
        canvas,
        Rect::at((canvas.width() / 4) as i32, (canvas.height() / 4) as i32).of_size(w, h),
        Rgba([32, 32, 32, 255]),
    );
}

fn apply_opacity(image: &mut RgbaImage, opacity: f32) {
    for pixel in image.pixels_mut() {
        pixel.0[3] = (pixel.0[3] as f32 * opacity).round() as u8;
    }
}

/// Parse "#rrggbb" or "#rrggbbaa". Invalid input yields `None`; callers
/// skip the paint rather than erroring the frame.
pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.strip_prefix('#')?;
    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba([parse(0..2)?, parse(2..4)?, parse(4..6)?, 255])),
        8 => Some(Rgba([
            parse(0..2)?,
            parse(2..4)?,
            parse(4..6)?,
            parse(6..8)?,
        ])),
        _ => None,
    }
}
