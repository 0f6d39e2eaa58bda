mod headshot;
mod popup;
mod status_bar;
mod timeline;

pub use headshot::HeadshotWidget;
pub use popup::PopupWidget;
pub use status_bar::StatusBarWidget;
pub use timeline::TimelineWidget;
