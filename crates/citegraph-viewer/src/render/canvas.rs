use bevy::math::Vec2;
use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};
use citegraph_core::render::{Rgba, Scene, HOVER_RING, LABEL_COLOR};

use crate::graph::ViewState;
use crate::ui::tooltips::render_tooltip;

fn color(c: Rgba) -> egui::Color32 {
    let a = (c.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, a)
}

fn at(origin: egui::Pos2, p: Vec2) -> egui::Pos2 {
    origin + egui::vec2(p.x, p.y)
}

fn paint(painter: &egui::Painter, origin: egui::Pos2, scene: &Scene) {
    for edge in &scene.edges {
        let stroke = egui::Stroke::new(1.0, color(edge.color));
        painter.line_segment([at(origin, edge.start), at(origin, edge.end)], stroke);
        for tri in &edge.arrows {
            painter.add(egui::Shape::convex_polygon(
                tri.iter().map(|p| at(origin, *p)).collect(),
                color(edge.color),
                egui::Stroke::NONE,
            ));
        }
    }

    for node in &scene.nodes {
        let center = at(origin, node.center);
        painter.circle_filled(center, node.radius, color(node.fill));
        if node.hovered {
            painter.circle_stroke(
                center,
                node.radius + 2.0,
                egui::Stroke::new(1.5, color(HOVER_RING)),
            );
        }
        painter.text(
            at(origin, node.label_anchor),
            egui::Align2::CENTER_BOTTOM,
            &node.label,
            egui::FontId::proportional(node.font_size.max(1.0)),
            color(LABEL_COLOR),
        );
    }
}

/// Central drawing area: feeds pointer input to the session, advances one
/// simulation step and paints the result.
pub fn graph_canvas(mut contexts: EguiContexts, mut st: ResMut<ViewState>) {
    let ctx = contexts.ctx_mut();
    let dpr = ctx.pixels_per_point();
    let loading = st.ui.loading;

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(egui::Color32::WHITE))
        .show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let session = &mut st.session;

            if rect.width() > 0.0 && rect.height() > 0.0 {
                // failure is kept on the session and reported below
                let _ = session.sync_surface(rect.width(), rect.height(), dpr);
            }
            if let Some(err) = session.surface_error() {
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("cannot draw graph: {err}"),
                    egui::FontId::proportional(14.0),
                    egui::Color32::DARK_RED,
                );
                return;
            }

            let (pressed, released, pointer, scroll) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.latest_pos(),
                    i.raw_scroll_delta.y,
                )
            });
            let local = |p: egui::Pos2| Vec2::new(p.x - rect.min.x, p.y - rect.min.y);

            match pointer {
                Some(pos) => {
                    let inside = rect.contains(pos);
                    let p = local(pos);
                    if pressed && inside {
                        session.pointer_down(p);
                    }
                    if inside || response.dragged() {
                        session.pointer_move(p);
                    }
                    if released {
                        if let Some(focus) = session.pointer_up(p) {
                            tracing::debug!(%focus, "refocused by click");
                        }
                    }
                    if inside && scroll != 0.0 {
                        session.wheel(p, -scroll);
                    }
                }
                None => session.pointer_left(),
            }

            let painter = ui.painter_at(rect);
            if let Some(scene) = session.tick() {
                paint(&painter, rect.min, &scene);
                if scene.is_empty() && !loading {
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "nothing to show for this focus",
                        egui::FontId::proportional(14.0),
                        egui::Color32::GRAY,
                    );
                }
            }
            if loading {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "resolving citations…",
                    egui::FontId::proportional(14.0),
                    egui::Color32::GRAY,
                );
            }

            if let (Some(lines), Some(pos)) = (session.hovered_tooltip(), pointer) {
                render_tooltip(ui.ctx(), "graph-tooltip", pos + egui::vec2(14.0, 14.0), lines);
            }
            if session.is_running() {
                ui.ctx().request_repaint();
            }
        });
}
