//! Hull-form inputs to the resistance models.

use serde::{Deserialize, Serialize};

/// Appendages with tabulated Holtrop 1+k₂ resistance factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Appendage {
    RudderBehindSkeg,
    RudderBehindStern,
    TwinScrewBalanceRudders,
    ShaftBrackets,
    Skeg,
    StrutBossings,
    HullBossings,
    ExposedShafts,
    StabilizerFins,
    Dome,
    BilgeKeels,
}

impl Appendage {
    /// Holtrop appendage resistance factor 1+k₂.
    pub fn resistance_factor(&self) -> f64 {
        match self {
            Appendage::RudderBehindSkeg => 1.75,
            Appendage::RudderBehindStern => 1.4,
            Appendage::TwinScrewBalanceRudders => 2.8,
            Appendage::ShaftBrackets => 3.0,
            Appendage::Skeg => 1.75,
            Appendage::StrutBossings => 3.0,
            Appendage::HullBossings => 2.0,
            Appendage::ExposedShafts => 3.0,
            Appendage::StabilizerFins => 2.8,
            Appendage::Dome => 2.7,
            Appendage::BilgeKeels => 1.4,
        }
    }
}

/// Afterbody shape parameter C_stern of the Holtrop regressions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SternShape {
    /// Pram with gondola
    PramWithGondola,
    /// V-shaped sections
    VShaped,
    /// Normal section shape
    Normal,
    /// U-shaped sections with Hogner stern
    UShapedHogner,
}

impl SternShape {
    pub fn coefficient(&self) -> f64 {
        match self {
            SternShape::PramWithGondola => -25.0,
            SternShape::VShaped => -10.0,
            SternShape::Normal => 0.0,
            SternShape::UShapedHogner => 10.0,
        }
    }
}

/// The hull quantities the resistance models read.
///
/// All lengths in meters, areas in square meters, volumes in cubic meters.
/// The propeller diameter and expanded-area ratio feed the Holtrop wake and
/// relative-rotative regressions; they describe the hull/propeller
/// interaction, not the propeller performance itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HullInput {
    /// Waterline length L_WL (m), the authoritative length of the method
    pub lwl: f64,
    /// Length between perpendiculars L_BP (m)
    pub lbp: f64,
    /// Moulded beam B (m)
    pub beam: f64,
    /// Mean draft T (m)
    pub mean_draft: f64,
    /// Draft at the forward perpendicular T_F (m)
    pub draft_forward: f64,
    /// Draft at the aft perpendicular T_A (m)
    pub draft_aft: f64,
    /// Volumetric displacement ∇ (m³)
    pub volumetric_displacement: f64,
    /// Wetted hull surface S (m²)
    pub wetted_surface: f64,
    /// Transverse bulbous bow area at the forward perpendicular A_BT (m²)
    pub bulbous_bow_area: f64,
    /// Height of the bulb area centroid above keel h_B (m)
    pub bulbous_center_height: f64,
    /// Immersed transom area A_T (m²)
    pub immersed_transom_area: f64,
    /// Half angle of waterline entrance i_E (degrees)
    pub half_entrance_angle_deg: f64,
    /// Block coefficient C_B
    pub cb: f64,
    /// Midship section coefficient C_M
    pub cm: f64,
    /// Prismatic coefficient C_P
    pub cp: f64,
    /// Waterplane area coefficient C_WP
    pub cwp: f64,
    /// Longitudinal center of buoyancy, % of L_WL forward of midships
    pub lcb_percent: f64,
    /// Afterbody shape
    pub stern_shape: SternShape,
    /// Hull surface roughness k_s (m); the ITTC standard value is 150 µm
    pub surface_roughness_m: f64,
    /// Appendages and their wetted surfaces (m²)
    pub appendages: Vec<(Appendage, f64)>,
    /// Transverse above-waterline projected area A_V (m²), for air drag
    pub above_water_transverse_area: f64,
    /// Lengthwise above-waterline projected area A_L (m²), for wind forces
    pub lengthwise_projection_area: f64,
    /// Propeller diameter D (m), for the wake/thrust-deduction regressions
    pub propeller_diameter: f64,
    /// Propeller expanded area ratio A_E/A_0
    pub propeller_expanded_area_ratio: f64,
}

impl HullInput {
    /// Total appendage wetted surface (m²).
    pub fn total_appendage_surface(&self) -> f64 {
        self.appendages.iter().map(|(_, area)| area).sum()
    }

    /// Equivalent 1+k₂ factor, surface-weighted over all appendages.
    pub fn equivalent_appendage_factor(&self) -> f64 {
        let total = self.total_appendage_surface();
        if total <= 0.0 {
            return 1.0;
        }
        self.appendages
            .iter()
            .map(|(kind, area)| kind.resistance_factor() * area)
            .sum::<f64>()
            / total
    }

    /// Length of run L_R (m) by Holtrop's regression.
    pub fn run_length(&self) -> f64 {
        self.lwl
            * (1.0 - self.cp + 0.06 * self.cp * self.lcb_percent / (4.0 * self.cp - 1.0))
    }

    /// A 200 m bulk-carrier hull used across the test suites.
    pub fn example_bulk_carrier() -> Self {
        Self {
            lwl: 200.0,
            lbp: 196.0,
            beam: 32.0,
            mean_draft: 10.0,
            draft_forward: 10.0,
            draft_aft: 10.0,
            volumetric_displacement: 44_800.0,
            wetted_surface: 7_890.0,
            bulbous_bow_area: 20.0,
            bulbous_center_height: 4.0,
            immersed_transom_area: 16.0,
            half_entrance_angle_deg: 30.0,
            cb: 0.7,
            cm: 0.98,
            cp: 0.72,
            cwp: 0.78,
            lcb_percent: -0.75,
            stern_shape: SternShape::Normal,
            surface_roughness_m: 150.0e-6,
            appendages: vec![(Appendage::RudderBehindStern, 45.0)],
            above_water_transverse_area: 650.0,
            lengthwise_projection_area: 2_400.0,
            propeller_diameter: 6.5,
            propeller_expanded_area_ratio: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equivalent_appendage_factor_weighting() {
        let mut hull = HullInput::example_bulk_carrier();
        hull.appendages = vec![
            (Appendage::RudderBehindStern, 50.0),
            (Appendage::BilgeKeels, 50.0),
        ];
        assert_relative_eq!(hull.equivalent_appendage_factor(), (1.4 + 1.4) / 2.0);
    }

    #[test]
    fn test_no_appendages_is_neutral() {
        let mut hull = HullInput::example_bulk_carrier();
        hull.appendages.clear();
        assert_relative_eq!(hull.equivalent_appendage_factor(), 1.0);
    }

    #[test]
    fn test_run_length_positive() {
        let hull = HullInput::example_bulk_carrier();
        assert!(hull.run_length() > 0.0);
        assert!(hull.run_length() < hull.lwl);
    }
}
