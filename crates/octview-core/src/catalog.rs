//! The setting groups of the viewer, their field names and defaults.
//!
//! Field names are the keys listeners match on; the constructors here are the
//! single source of the construction-time defaults restored by
//! [`SettingGroup::reset_to_defaults`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::settings::{SettingGroup, SettingValue};

/// Overlay visibility toggles and on-image annotations.
pub mod display {
    pub const GROUP: &str = "display";
    pub const DISPLAY_FILE_NAME: &str = "displayFileName";
    pub const DISPLAY_SCALE_BARS_ON_OCT: &str = "displayScaleBarsOnOct";
    pub const SHOW_LRP_PEAKS: &str = "showLrpPeaks";
    pub const SHOW_FWHM_ON_LRP: &str = "showFwhmOnLrp";
}

/// Processing applied to the scan before it reaches the compositor.
pub mod oct {
    pub const GROUP: &str = "oct";
    pub const APPLY_CONTRAST_ADJUSTMENT: &str = "applyContrastAdjustment";
    pub const APPLY_NOISE_REDUCTION: &str = "applyNoiseReduction";
    pub const DISPLAY_LOG_OCT: &str = "displayLogOct";
    pub const SHARPEN_KERNEL_RADIUS: &str = "sharpenKernelRadius";
    pub const SHARPEN_WEIGHT: &str = "sharpenWeight";
    pub const SMOOTHING_FACTOR: &str = "smoothingFactor";
    /// Micrometres per pixel along X.
    pub const X_SCALE: &str = "xScale";
    /// Micrometres per pixel along Y.
    pub const Y_SCALE: &str = "yScale";
}

/// Longitudinal reflectivity profile (LRP) sampling window.
pub mod lrp {
    pub const GROUP: &str = "lrp";
    pub const LRP_WIDTH: &str = "lrpWidth";
    pub const LRP_HEIGHT: &str = "lrpHeight";
}

pub mod analysis {
    pub const GROUP: &str = "analysis";
    pub const CURRENT_ANALYSIS_MODE: &str = "currentAnalysisMode";
}

pub fn display_settings() -> SettingGroup {
    SettingGroup::new(display::GROUP)
        .with_field(display::DISPLAY_FILE_NAME, true)
        .with_field(display::DISPLAY_SCALE_BARS_ON_OCT, true)
        .with_field(display::SHOW_LRP_PEAKS, true)
        .with_field(display::SHOW_FWHM_ON_LRP, false)
}

pub fn oct_settings() -> SettingGroup {
    SettingGroup::new(oct::GROUP)
        .with_field(oct::APPLY_CONTRAST_ADJUSTMENT, false)
        .with_field(oct::APPLY_NOISE_REDUCTION, false)
        .with_field(oct::DISPLAY_LOG_OCT, true)
        .with_field(oct::SHARPEN_KERNEL_RADIUS, 0.0)
        .with_field(oct::SHARPEN_WEIGHT, 0.0)
        .with_field(oct::SMOOTHING_FACTOR, 0.0)
        .with_field(oct::X_SCALE, 1.0)
        .with_field(oct::Y_SCALE, 1.0)
}

pub fn lrp_settings() -> SettingGroup {
    SettingGroup::new(lrp::GROUP)
        .with_field(lrp::LRP_WIDTH, 5)
        .with_field(lrp::LRP_HEIGHT, 450)
}

pub fn analysis_settings() -> SettingGroup {
    SettingGroup::new(analysis::GROUP)
        .with_field(analysis::CURRENT_ANALYSIS_MODE, AnalysisMode::default())
}

/// How the analysis tools place their measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Preformatted,
    Fovea,
    Manual,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Preformatted => "preformatted",
            AnalysisMode::Fovea => "fovea",
            AnalysisMode::Manual => "manual",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preformatted" => Ok(AnalysisMode::Preformatted),
            "fovea" => Ok(AnalysisMode::Fovea),
            "manual" => Ok(AnalysisMode::Manual),
            other => Err(format!("unknown analysis mode '{}'", other)),
        }
    }
}

impl From<AnalysisMode> for SettingValue {
    fn from(mode: AnalysisMode) -> Self {
        SettingValue::Enum(mode.as_str().to_string())
    }
}
