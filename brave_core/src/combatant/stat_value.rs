//! StatValue - a stat with flat additions and stacked multipliers

use serde::{Deserialize, Serialize};

/// Final value is `(base + flat) × Π(multipliers)`, floored at zero
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatValue {
    pub base: f64,
    /// Sum of all flat additions
    pub flat: f64,
    /// Each entry multiplies the result (1.0 = unchanged)
    pub multipliers: Vec<f64>,
}

impl StatValue {
    pub fn with_base(base: f64) -> Self {
        StatValue {
            base,
            flat: 0.0,
            multipliers: Vec::new(),
        }
    }

    pub fn compute(&self) -> f64 {
        let total: f64 = self.multipliers.iter().product();
        ((self.base + self.flat) * total).max(0.0)
    }

    pub fn add_flat(&mut self, value: f64) {
        self.flat += value;
    }

    pub fn add_multiplier(&mut self, value: f64) {
        self.multipliers.push(value);
    }

    pub fn total_multiplier(&self) -> f64 {
        self.multipliers.iter().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_basic() {
        let stat = StatValue::with_base(100.0);
        assert!((stat.compute() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_full_formula() {
        // (100 + 20) × 1.2 × 0.5 = 72
        let mut stat = StatValue::with_base(100.0);
        stat.add_flat(20.0);
        stat.add_multiplier(1.2);
        stat.add_multiplier(0.5);
        assert!((stat.compute() - 72.0).abs() < 1e-9);
        assert!((stat.total_multiplier() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_negative_flat_floors_at_zero() {
        let mut stat = StatValue::with_base(10.0);
        stat.add_flat(-30.0);
        assert!(stat.compute().abs() < f64::EPSILON);
    }
}
