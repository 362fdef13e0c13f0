//! Which setting fields warrant a re-render of the OCT display.

use octview_core::catalog::{display, lrp, oct};

/// Display toggles that change what is drawn over the scan.
pub const DISPLAY_TRIGGERS: &[&str] = &[display::DISPLAY_SCALE_BARS_ON_OCT];

/// Processing settings that change the transformed raster or its physical scale.
pub const OCT_TRIGGERS: &[&str] = &[
    oct::APPLY_CONTRAST_ADJUSTMENT,
    oct::APPLY_NOISE_REDUCTION,
    oct::DISPLAY_LOG_OCT,
    oct::SHARPEN_KERNEL_RADIUS,
    oct::SHARPEN_WEIGHT,
    oct::SMOOTHING_FACTOR,
    oct::X_SCALE,
    oct::Y_SCALE,
];

/// LRP window size; only relevant while an LRP selection is shown.
pub const LRP_TRIGGERS: &[&str] = &[lrp::LRP_HEIGHT, lrp::LRP_WIDTH];

#[cfg(test)]
mod tests {
    use super::*;
    use octview_core::catalog::{display_settings, lrp_settings, oct_settings};

    #[test]
    fn test_triggers_name_declared_fields() {
        let groups = [
            (display_settings(), DISPLAY_TRIGGERS),
            (oct_settings(), OCT_TRIGGERS),
            (lrp_settings(), LRP_TRIGGERS),
        ];
        for (group, fields) in groups {
            for field in fields {
                assert!(group.contains(field), "{} missing {}", group.name(), field);
            }
        }
    }
}
