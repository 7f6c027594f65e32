use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};
use citegraph_core::Hops;

use crate::graph::ViewState;

/// `Esc` closes the view, `1`/`2` pick the hop count.
pub fn handle_shortcuts(mut contexts: EguiContexts, mut st: ResMut<ViewState>) {
    let ctx = contexts.ctx_mut();
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        st.ui.close_requested = true;
        return;
    }
    if ctx.wants_keyboard_input() {
        return;
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Num1)) {
        st.set_hops(Hops::One);
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Num2)) {
        st.set_hops(Hops::Two);
    }
}
