//! Hit chance
//!
//! Hit rate follows a log curve over the accuracy/evasion ratio:
//! `clamp(base + slope * log10(accuracy / max(1, evasion)), min, max)` percent.
//! Equal accuracy and evasion gives exactly the base rate (65% by default),
//! ten times the evasion gives base + slope, clamped to the ceiling.

use crate::config::HitConstants;
use rand::Rng;

/// Hit chance in percent
pub fn hit_rate(accuracy: f64, evasion: f64, constants: &HitConstants) -> f64 {
    let ratio = accuracy.max(0.0) / evasion.max(1.0);
    if ratio <= 0.0 {
        return constants.min_rate;
    }
    let rate = constants.base_rate + constants.log_slope * ratio.log10();
    rate.clamp(constants.min_rate, constants.max_rate)
}

/// Roll against a hit rate in percent
pub fn roll_hit(rate: f64, rng: &mut impl Rng) -> bool {
    rng.gen::<f64>() * 100.0 < rate
}
