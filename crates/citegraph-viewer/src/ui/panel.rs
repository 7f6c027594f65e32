use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};
use citegraph_core::{GraphKind, Hops};

use crate::graph::ViewState;
use crate::util::config;

pub fn ui_panel(mut contexts: EguiContexts, mut st: ResMut<ViewState>) {
    let ctx = contexts.ctx_mut();
    egui::TopBottomPanel::top("citegraph-top").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let title = match st.kind() {
                GraphKind::Author => "Co-author network",
                GraphKind::Citation => "Citation network",
            };
            ui.heading(title);
            ui.separator();

            let focal = st
                .session
                .focal()
                .map(|id| {
                    st.session
                        .graph()
                        .node(id)
                        .map_or_else(|| id.to_string(), |n| n.label.clone())
                })
                .unwrap_or_else(|| "none".to_string());
            ui.label(format!("Focus: {focal}"));

            ui.separator();
            let mut hops = st.session.hops();
            ui.label("Hops:");
            ui.selectable_value(&mut hops, Hops::One, "1");
            ui.selectable_value(&mut hops, Hops::Two, "2");
            if hops != st.session.hops() {
                st.set_hops(hops);
            }

            if st.kind() == GraphKind::Citation {
                ui.separator();
                let mut external = st.ui.use_external;
                let toggle = ui.add_enabled(
                    st.is_online(),
                    egui::Checkbox::new(&mut external, "Look up citations (OpenAlex)"),
                );
                if toggle.changed() {
                    st.ui.use_external = external;
                    st.ui.rebuild_requested = true;
                }
                ui.label(format!("{} papers with DOI", st.candidates().len()));
                if st.ui.loading {
                    ui.spinner();
                }
            }

            ui.separator();
            let ego = st.session.ego();
            ui.label(format!("{} nodes, {} edges", ego.nodes.len(), ego.edges.len()));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Close").clicked() {
                    st.ui.close_requested = true;
                }
                if ui.button("Save defaults").clicked() {
                    let hops = st.session.hops();
                    let kind = st.kind();
                    st.cfg.default_hops = hops;
                    st.cfg.default_mode = kind;
                    st.ui.status = Some(match config::save(&st.cfg) {
                        Ok(path) => format!("saved {}", path.display()),
                        Err(err) => {
                            tracing::warn!(error = %err, "saving viewer config failed");
                            format!("save failed: {err}")
                        }
                    });
                }
                if let Some(status) = &st.ui.status {
                    ui.weak(status.as_str());
                }
            });
        });
    });
}
