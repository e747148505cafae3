//! Closed dispatch over the resistance strategies.

use crate::environment::Environment;
use crate::holtrop::{CalmResistanceBreakdown, HoltropMennenMethod};
use crate::hull::HullInput;
use crate::langmao::{DynamicResistanceBreakdown, LangMaoMethod};
use crate::Result;

/// Calm-water resistance strategies. A closed set: adding a method means
/// adding a variant here and covering the dispatch arms.
#[derive(Debug, Clone)]
pub enum CalmResistanceModel {
    HoltropMennen(HoltropMennenMethod),
}

impl CalmResistanceModel {
    pub fn holtrop_mennen() -> Self {
        CalmResistanceModel::HoltropMennen(HoltropMennenMethod::new())
    }

    pub fn total_resistance(
        &self,
        hull: &HullInput,
        env: &Environment,
        speed_ms: f64,
    ) -> Result<CalmResistanceBreakdown> {
        match self {
            CalmResistanceModel::HoltropMennen(m) => m.total_resistance(hull, env, speed_ms),
        }
    }

    pub fn hull_efficiency(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        match self {
            CalmResistanceModel::HoltropMennen(m) => m.hull_efficiency(hull, env, speed_ms),
        }
    }

    pub fn wake_fraction(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        match self {
            CalmResistanceModel::HoltropMennen(m) => m.wake_fraction(hull, env, speed_ms),
        }
    }

    pub fn propeller_rotation_efficiency(&self, hull: &HullInput) -> f64 {
        match self {
            CalmResistanceModel::HoltropMennen(m) => m.propeller_rotation_efficiency(hull),
        }
    }

    pub fn thrust_deduction_fraction(&self, hull: &HullInput) -> f64 {
        match self {
            CalmResistanceModel::HoltropMennen(m) => m.thrust_deduction_fraction(hull),
        }
    }

    pub fn speed_of_advance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        match self {
            CalmResistanceModel::HoltropMennen(m) => m.speed_of_advance(hull, env, speed_ms),
        }
    }
}

impl Default for CalmResistanceModel {
    fn default() -> Self {
        Self::holtrop_mennen()
    }
}

/// Dynamic (weather-dependent) resistance strategies.
#[derive(Debug, Clone)]
pub enum DynamicResistanceModel {
    LangMao(LangMaoMethod),
}

impl DynamicResistanceModel {
    pub fn lang_mao() -> Self {
        DynamicResistanceModel::LangMao(LangMaoMethod::new())
    }

    pub fn total_resistance(
        &self,
        hull: &HullInput,
        env: &Environment,
        speed_ms: f64,
        heading_deg: f64,
    ) -> Result<DynamicResistanceBreakdown> {
        match self {
            DynamicResistanceModel::LangMao(m) => {
                m.total_resistance(hull, env, speed_ms, heading_deg)
            }
        }
    }
}

impl Default for DynamicResistanceModel {
    fn default() -> Self {
        Self::lang_mao()
    }
}

/// The resistance stack a ship carries: a calm-water strategy and an
/// optional dynamic strategy, both fixed at construction.
#[derive(Debug, Clone)]
pub struct ResistanceStack {
    pub calm: CalmResistanceModel,
    pub dynamic: Option<DynamicResistanceModel>,
}

impl ResistanceStack {
    pub fn new(calm: CalmResistanceModel, dynamic: Option<DynamicResistanceModel>) -> Self {
        Self { calm, dynamic }
    }

    /// Calm plus dynamic resistance (N).
    pub fn total_resistance(
        &self,
        hull: &HullInput,
        env: &Environment,
        speed_ms: f64,
        heading_deg: f64,
    ) -> Result<f64> {
        let mut total = self.calm.total_resistance(hull, env, speed_ms)?.total;
        if let Some(dynamic) = &self.dynamic {
            total += dynamic
                .total_resistance(hull, env, speed_ms, heading_deg)?
                .total;
        }
        Ok(total)
    }
}

impl Default for ResistanceStack {
    fn default() -> Self {
        Self {
            calm: CalmResistanceModel::default(),
            dynamic: Some(DynamicResistanceModel::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_without_dynamic_is_calm_only() {
        let hull = HullInput::example_bulk_carrier();
        let env = Environment::calm(35.0, 15.0);
        let stack = ResistanceStack::new(CalmResistanceModel::holtrop_mennen(), None);
        let with_dynamic = ResistanceStack::default();

        let a = stack.total_resistance(&hull, &env, 8.0, 0.0).unwrap();
        let b = with_dynamic.total_resistance(&hull, &env, 8.0, 0.0).unwrap();
        // Calm environment: dynamic adds nothing
        assert_eq!(a, b);
    }
}
