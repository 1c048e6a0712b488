// src/ui/sankey.rs
use eframe::egui;
use egui::epaint::CubicBezierShape;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke};

use crate::analysis::sankey::NodeGeometry;
use crate::analysis::{format_amount, layout, FlowGraph, SankeyOptions};

pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(0x88, 0x88, 0x88);

pub fn node_color(name: &str) -> Color32 {
    match name {
        "Revenue" => Color32::from_rgb(0x22, 0xc5, 0x5e),
        "COGs" => Color32::from_rgb(0xef, 0x44, 0x44),
        "Operating Expenses" => Color32::from_rgb(0xf5, 0x9e, 0x42),
        "Net Profit" => Color32::from_rgb(0x3b, 0x82, 0xf6),
        _ => FALLBACK_COLOR,
    }
}

pub fn node_label(node: &NodeGeometry) -> String {
    format!("{}: {}", node.name, format_amount(node.value))
}

fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Lays out and paints the whole diagram. Called every frame, so any change to
/// the flows or the canvas size shows up on the next repaint.
pub fn show_sankey(ui: &mut egui::Ui, flows: &FlowGraph, options: &SankeyOptions) {
    if flows.is_empty() {
        ui.group(|ui| {
            ui.set_min_size(egui::vec2(options.width, 80.0));
            ui.centered_and_justified(|ui| {
                ui.label("No data to display");
            });
        });
        return;
    }

    let layout = match layout(flows, options) {
        Ok(layout) => layout,
        Err(e) => {
            ui.colored_label(Color32::RED, format!("Cannot draw diagram: {e}"));
            return;
        }
    };

    let (response, painter) = ui.allocate_painter(
        egui::vec2(options.width, options.height),
        Sense::hover(),
    );
    let origin = response.rect.min;
    let to_screen = |x: f32, y: f32| origin + egui::vec2(x, y);
    let pointer = response.hover_pos();

    painter.rect_filled(response.rect, 4.0, ui.visuals().extreme_bg_color);

    for link in &layout.links {
        let color = node_color(&layout.nodes[link.target].name);
        let points = link.curve().map(|(x, y)| to_screen(x, y));
        let band = CubicBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            Stroke::new(link.width.max(1.0), with_alpha(color, 128)),
        );

        if link.deficit {
            let path: Vec<Pos2> = band.flatten(None);
            painter.extend(Shape::dashed_line(&path, Stroke::new(1.5, color), 6.0, 4.0));
        } else {
            painter.add(band);
        }
    }

    let text_color = ui.visuals().text_color();
    for node in &layout.nodes {
        // Zero-height nodes still get a visible sliver.
        let rect = Rect::from_min_max(
            to_screen(node.x0, node.y0),
            to_screen(node.x1, node.y1.max(node.y0 + 1.0)),
        );
        let hovered = pointer.map_or(false, |p| rect.expand(2.0).contains(p));
        painter.rect_filled(rect, 0.0, node_color(&node.name));
        painter.rect_stroke(
            rect,
            0.0,
            Stroke::new(if hovered { 2.0 } else { 1.0 }, Color32::BLACK),
        );

        let (anchor, align) = if node.x0 < options.width / 2.0 {
            (to_screen(node.x1 + 6.0, node.center_y()), Align2::LEFT_CENTER)
        } else {
            (to_screen(node.x0 - 6.0, node.center_y()), Align2::RIGHT_CENTER)
        };
        painter.text(anchor, align, node_label(node), FontId::proportional(12.0), text_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_lines_have_fixed_colors() {
        assert_eq!(node_color("Revenue"), Color32::from_rgb(0x22, 0xc5, 0x5e));
        assert_eq!(node_color("Net Profit"), Color32::from_rgb(0x3b, 0x82, 0xf6));
        assert_eq!(node_color("Something else"), FALLBACK_COLOR);
    }

    #[test]
    fn labels_show_signed_value() {
        let node = NodeGeometry {
            name: "Net Profit".to_string(),
            x0: 0.0,
            y0: 0.0,
            x1: 15.0,
            y1: 0.0,
            depth: 1,
            value: -50.0,
            magnitude: 0.0,
        };
        assert_eq!(node_label(&node), "Net Profit: -50");
    }
}
