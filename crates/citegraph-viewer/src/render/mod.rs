pub mod canvas;

pub use canvas::graph_canvas;
