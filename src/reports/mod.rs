// Reports module - ROI and share reports derived from an allocation run

pub mod roi;

pub use roi::{calculate_roi, PositionResult, RoiReport};
