//! Shared color constants for the UI.

use egui::Color32;

/// Forest green for active badges and success toasts.
pub const COLOR_GREEN: Color32 = Color32::from_rgb(34, 139, 34);

/// Red for errors and destructive actions.
pub const COLOR_RED: Color32 = Color32::from_rgb(220, 53, 69);

/// Amber for warnings.
pub const COLOR_AMBER: Color32 = Color32::from_rgb(255, 193, 7);

/// Neutral gray for inactive badges and info toasts.
pub const COLOR_GRAY: Color32 = Color32::from_rgb(108, 117, 125);

/// Border around tables.
pub const TABLE_BORDER_COLOR: Color32 = Color32::from_rgb(200, 200, 200);

/// Light gray behind header cells and skeleton bars.
pub const HEADER_BG_COLOR: Color32 = Color32::from_rgb(245, 245, 245);
