//! The immutable request record threaded through every pipeline stage.
//!
//! Field names on the wire match the historical operator options
//! (`Fpu`, `Emboss_height`, ...). Missing fields take their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{DisplacementParams, EdgeMask, SpikeParams, WeightMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{field}` must be {rule}, got {value}")]
    OutOfRange {
        field: &'static str,
        rule: &'static str,
        value: f64,
    },
    #[error("taper angle must be in (0, 90] degrees, got {0}")]
    InvalidTaperAngle(f64),
    #[error("invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Plate edge that abuts a fixture and keeps full relief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExternalEdge {
    #[default]
    None,
    Top,
    Bottom,
    Left,
    Right,
}

impl ExternalEdge {
    #[must_use]
    pub fn mask(self) -> EdgeMask {
        let mut mask = EdgeMask::NONE;
        match self {
            Self::None => {}
            Self::Top => mask.pos_y = true,
            Self::Bottom => mask.neg_y = true,
            Self::Right => mask.pos_x = true,
            Self::Left => mask.neg_x = true,
        }
        mask
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliefRequest {
    /// Faces per unit length across the top of the plate.
    #[serde(rename = "Fpu")]
    pub faces_per_unit: f64,
    #[serde(rename = "Emboss_height")]
    pub emboss_height: f64,
    #[serde(rename = "Base_height")]
    pub base_height: f64,
    #[serde(rename = "Border_width")]
    pub border_width: f64,
    #[serde(rename = "Invert_image")]
    pub invert_image: bool,
    #[serde(rename = "External_edge")]
    pub external_edge: ExternalEdge,
    /// Texture filter width in pixels.
    #[serde(rename = "Noise_filter")]
    pub noise_filter: f64,
    #[serde(rename = "Spike_removal")]
    pub spike_removal: bool,
    #[serde(rename = "Spike_threshold")]
    pub spike_threshold: f64,
    #[serde(rename = "Spike_reduction_factor")]
    pub spike_reduction_factor: f64,
    #[serde(rename = "Name_plate")]
    pub name_plate: bool,
    #[serde(rename = "Name_plate_Y")]
    pub name_plate_y: f64,
    #[serde(rename = "Name_plate_text")]
    pub name_plate_text: String,
    #[serde(rename = "Name_plate_text_size")]
    pub name_plate_text_size: f64,
    #[serde(rename = "Back_frame")]
    pub back_frame: bool,
    #[serde(rename = "Gap_size")]
    pub gap_size: f64,
    #[serde(rename = "Weight_mode")]
    pub weight_mode: WeightMode,
    /// Relaxation levels of the trailing smoothing stage.
    #[serde(rename = "Smooth_levels")]
    pub smooth_levels: u32,
}

impl Default for ReliefRequest {
    fn default() -> Self {
        Self {
            faces_per_unit: 2.0,
            emboss_height: 3.0,
            base_height: 3.0,
            border_width: 3.0,
            invert_image: false,
            external_edge: ExternalEdge::None,
            noise_filter: 1.0,
            spike_removal: false,
            spike_threshold: 0.75,
            spike_reduction_factor: 0.75,
            name_plate: false,
            name_plate_y: 20.0,
            name_plate_text: "Example".to_owned(),
            name_plate_text_size: 18.0,
            back_frame: true,
            gap_size: 1.0,
            weight_mode: WeightMode::Step,
            smooth_levels: 2,
        }
    }
}

impl ReliefRequest {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let request: Self = serde_json::from_str(text)?;
        request.validate()?;
        Ok(request)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, f64, f64, &'static str); 10] = [
            ("Fpu", self.faces_per_unit, 0.0, ">= 0"),
            ("Emboss_height", self.emboss_height, 0.1, ">= 0.1"),
            ("Base_height", self.base_height, 0.1, ">= 0.1"),
            ("Border_width", self.border_width, 0.1, ">= 0.1"),
            ("Gap_size", self.gap_size, 0.0, ">= 0"),
            ("Noise_filter", self.noise_filter, 1.0, ">= 1"),
            ("Spike_threshold", self.spike_threshold, 0.0, ">= 0"),
            ("Spike_reduction_factor", self.spike_reduction_factor, 0.0, "in [0, 1]"),
            ("Name_plate_Y", self.name_plate_y, 0.0, ">= 0"),
            ("Name_plate_text_size", self.name_plate_text_size, 0.0, ">= 0"),
        ];
        for (field, value, min, rule) in checks {
            if !value.is_finite() || value < min {
                return Err(ConfigError::OutOfRange { field, rule, value });
            }
        }
        if self.spike_reduction_factor > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "Spike_reduction_factor",
                rule: "in [0, 1]",
                value: self.spike_reduction_factor,
            });
        }
        if let WeightMode::Tapered { angle } = self.weight_mode {
            if !angle.is_finite() || angle <= 0.0 || angle > 90.0 {
                return Err(ConfigError::InvalidTaperAngle(angle));
            }
        }
        Ok(())
    }

    /// Emboss plus base height: the extrusion depth.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.emboss_height + self.base_height
    }

    #[must_use]
    pub fn displacement_params(&self) -> DisplacementParams {
        DisplacementParams {
            emboss_height: self.emboss_height,
            invert: self.invert_image,
            filter_size: self.noise_filter,
        }
    }

    #[must_use]
    pub fn spike_params(&self) -> SpikeParams {
        SpikeParams {
            threshold: self.spike_threshold,
            reduction: self.spike_reduction_factor,
            invert: self.invert_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_operator() {
        let request = ReliefRequest::default();
        assert_eq!(request.faces_per_unit, 2.0);
        assert_eq!(request.external_edge, ExternalEdge::None);
        assert!(request.back_frame);
        assert_eq!(request.name_plate_text, "Example");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn json_uses_option_names_and_fills_defaults() {
        let request =
            ReliefRequest::from_json(r#"{"Fpu": 4, "External_edge": "LEFT", "Spike_removal": true}"#)
                .unwrap();
        assert_eq!(request.faces_per_unit, 4.0);
        assert_eq!(request.external_edge, ExternalEdge::Left);
        assert!(request.spike_removal);
        assert_eq!(request.border_width, 3.0);
    }

    #[test]
    fn tapered_mode_round_trips_through_json() {
        let request = ReliefRequest::from_json(
            r#"{"Weight_mode": {"mode": "tapered", "angle": 45.0}}"#,
        )
        .unwrap();
        assert_eq!(request.weight_mode, WeightMode::Tapered { angle: 45.0 });
        let text = request.to_json_pretty().unwrap();
        assert!(text.contains("\"tapered\""));
    }

    #[test]
    fn validate_rejects_thin_base_and_bad_factor() {
        let thin = ReliefRequest {
            base_height: 0.05,
            ..ReliefRequest::default()
        };
        assert!(matches!(
            thin.validate(),
            Err(ConfigError::OutOfRange { field: "Base_height", .. })
        ));

        let factor = ReliefRequest {
            spike_reduction_factor: 1.5,
            ..ReliefRequest::default()
        };
        assert!(factor.validate().is_err());

        let filter = ReliefRequest {
            noise_filter: 0.5,
            ..ReliefRequest::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn external_edge_masks_one_side() {
        assert_eq!(ExternalEdge::Top.mask(), EdgeMask { pos_y: true, ..EdgeMask::NONE });
        assert_eq!(ExternalEdge::Left.mask(), EdgeMask { neg_x: true, ..EdgeMask::NONE });
        assert_eq!(ExternalEdge::None.mask(), EdgeMask::NONE);
    }
}
