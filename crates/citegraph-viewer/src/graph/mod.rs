pub mod state;

pub use state::{UiState, ViewState};
