use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::{Annotation, FrameAnnotator};
use crate::shared::frame::Frame;

use super::glyphs;

const DEFAULT_THICKNESS: u32 = 2;
const DEFAULT_TEXT_SCALE: u32 = 2;
const LABEL_PADDING: u32 = 2;

const PALETTE: &[[u8; 3]] = &[
    [255, 56, 56],
    [56, 255, 56],
    [56, 120, 255],
    [255, 210, 40],
    [255, 56, 255],
    [40, 230, 230],
    [255, 140, 30],
    [160, 90, 255],
];

/// Draws a colored rectangle and an `ID <n>` tag per subject.
///
/// The color is stable per subject ID so the same subject keeps its color
/// across frames. Labels sit above the box, or inside its top edge when
/// the box touches the top of the frame.
pub struct BoxAnnotator {
    thickness: u32,
    text_scale: u32,
}

impl BoxAnnotator {
    pub fn new(thickness: u32, text_scale: u32) -> Self {
        Self {
            thickness: thickness.max(1),
            text_scale: text_scale.max(1),
        }
    }

    pub fn color_for(subject_id: u32) -> Rgb<u8> {
        Rgb(PALETTE[subject_id as usize % PALETTE.len()])
    }

    fn draw_one(&self, image: &mut RgbImage, annotation: &Annotation) {
        let Some(region) = annotation.region.clamp(image.width(), image.height()) else {
            return;
        };
        let color = Self::color_for(annotation.subject_id);

        for inset in 0..self.thickness as i32 {
            let w = region.width() - 2 * inset;
            let h = region.height() - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(region.x1 + inset, region.y1 + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, color);
        }

        let text = format!("ID {}", annotation.subject_id);
        let (text_w, text_h) = glyphs::text_size(&text, self.text_scale);
        let label_w = text_w + 2 * LABEL_PADDING;
        let label_h = text_h + 2 * LABEL_PADDING;
        let label_y = if region.y1 >= label_h as i32 {
            region.y1 - label_h as i32
        } else {
            region.y1
        };

        draw_filled_rect_mut(
            image,
            Rect::at(region.x1, label_y).of_size(label_w, label_h),
            color,
        );
        glyphs::draw_text_mut(
            image,
            &text,
            region.x1 + LABEL_PADDING as i32,
            label_y + LABEL_PADDING as i32,
            self.text_scale,
            Rgb([0, 0, 0]),
        );
    }
}

impl Default for BoxAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_THICKNESS, DEFAULT_TEXT_SCALE)
    }
}

impl FrameAnnotator for BoxAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        annotations: &[Annotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if annotations.is_empty() {
            return Ok(());
        }
        if frame.channels() != 3 {
            return Err(format!(
                "BoxAnnotator: expected RGB frame, got {} channels",
                frame.channels()
            )
            .into());
        }

        let mut image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        for annotation in annotations {
            self.draw_one(&mut image, annotation);
        }

        frame.data_mut().copy_from_slice(image.as_raw());
        Ok(())
    }
}
