mod popup;

pub use popup::{centered_rect_constrained, popup_frame};
