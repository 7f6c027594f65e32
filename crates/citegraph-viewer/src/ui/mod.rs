pub mod panel;
pub mod shortcuts;
pub mod tooltips;

pub use panel::ui_panel;
pub use shortcuts::handle_shortcuts;
