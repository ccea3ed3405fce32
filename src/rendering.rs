#![cfg(feature = "gpui")]

use crate::path::{PathCommand, SpatialPathBatch};
use gpui::*;

/// Strokes a finished batch onto the window. Invisible points are skipped and
/// every run starts with a move-to.
pub fn paint_path_batch(window: &mut Window, batch: &SpatialPathBatch, color: Hsla, line_width: f32) {
    if batch.is_empty() {
        return;
    }

    let mut builder = PathBuilder::stroke(px(line_width));
    for command in batch.commands() {
        match command {
            PathCommand::MoveTo { x, y } => builder.move_to(point(px(x as f32), px(y as f32))),
            PathCommand::LineTo { x, y } => builder.line_to(point(px(x as f32), px(y as f32))),
        }
    }

    if let Ok(path) = builder.build() {
        window.paint_path(path, color);
    }
}
