pub mod app;
pub mod event;
pub mod input;
pub mod layout;
pub mod photo_cache;
pub mod scroll;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use theme::Theme;
