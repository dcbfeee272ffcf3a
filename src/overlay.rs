use crate::config::OverlayConfig;
use crate::error::{Result, TintcamError};
use crate::frame::{FaceRegion, Frame};
use image::{ImageBuffer, Rgb};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use tracing::warn;

/// Overlay text anchor and line spacing
const TEXT_X: i32 = 10;
const TEXT_TOP: i32 = 8;

/// White in both BGR and RGB channel orders
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

type FrameView<'a> = ImageBuffer<Rgb<u8>, &'a mut [u8]>;

/// Borrow the frame's BGR buffer as a drawable image. The channel order
/// differs from `Rgb`, which is irrelevant for the white-only overlays.
fn as_image_mut(frame: &mut Frame) -> Result<FrameView<'_>> {
    let (width, height) = (frame.width(), frame.height());
    ImageBuffer::from_raw(width, height, frame.data_mut())
        .ok_or_else(|| TintcamError::overlay("frame buffer does not match its dimensions"))
}

/// Draw a white 2 px hollow rectangle around each detected face
pub fn draw_face_boxes(frame: &mut Frame, regions: &[FaceRegion]) -> Result<()> {
    if regions.is_empty() {
        return Ok(());
    }

    let mut view = as_image_mut(frame)?;
    for region in regions {
        if region.width < 4 || region.height < 4 {
            continue;
        }
        let outer = Rect::at(region.x, region.y).of_size(region.width, region.height);
        let inner =
            Rect::at(region.x + 1, region.y + 1).of_size(region.width - 2, region.height - 2);
        draw_hollow_rect_mut(&mut view, outer, WHITE);
        draw_hollow_rect_mut(&mut view, inner, WHITE);
    }
    Ok(())
}

/// Renders the telemetry text block onto frames.
///
/// A missing or unparsable font degrades to a renderer that draws nothing;
/// the demo keeps running with boxes and tint only.
pub struct OverlayRenderer {
    font: Option<Font<'static>>,
    scale: Scale,
    line_height: i32,
}

impl OverlayRenderer {
    pub fn from_config(config: &OverlayConfig) -> Self {
        let font = match std::fs::read(&config.font_path) {
            Ok(bytes) => match Font::try_from_vec(bytes) {
                Some(font) => Some(font),
                None => {
                    warn!(
                        "Failed to parse font file '{}', status text disabled",
                        config.font_path
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read font file '{}' ({}), status text disabled",
                    config.font_path, e
                );
                None
            }
        };

        Self {
            font,
            scale: Scale::uniform(config.font_size),
            line_height: (config.font_size * 1.25) as i32,
        }
    }

    /// Renderer without a font, for headless use
    pub fn disabled() -> Self {
        Self {
            font: None,
            scale: Scale::uniform(1.0),
            line_height: 1,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the status lines top-down at a fixed left margin
    pub fn draw_status_lines(&self, frame: &mut Frame, lines: &[String]) -> Result<()> {
        let font = match &self.font {
            Some(font) => font,
            None => return Ok(()),
        };

        let mut view = as_image_mut(frame)?;
        for (i, line) in lines.iter().enumerate() {
            let y = TEXT_TOP + i as i32 * self.line_height;
            draw_text_mut(&mut view, WHITE, TEXT_X, y, self.scale, font, line);
        }
        Ok(())
    }
}
