//! A single combatant's action gauge

use crate::config::AtbConstants;
use crate::types::CombatantId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Statuses that change how a gauge fills
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GaugeFlags: u8 {
        const STUNNED   = 1 << 0;
        const PARALYZED = 1 << 1;
        const SLEEPING  = 1 << 2;
        const CONFUSED  = 1 << 3;
    }
}

impl GaugeFlags {
    /// Flags that stop the gauge from filling
    pub const FROZEN: GaugeFlags = GaugeFlags::STUNNED
        .union(GaugeFlags::PARALYZED)
        .union(GaugeFlags::SLEEPING);

    /// Flags that stop the owner from taking a turn
    pub const NO_TURN: GaugeFlags = GaugeFlags::STUNNED.union(GaugeFlags::SLEEPING);
}

/// What the owner is doing with its gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingState {
    #[default]
    Idle,
    Ready,
    /// Growth is routed into the active cast
    Casting,
}

/// Action gauge for one combatant. The scheduler does not own the combatant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtbGauge {
    pub owner: CombatantId,
    pub current: u32,
    pub max: u32,
    pub threshold: u32,
    /// Fractional growth not yet added to `current`
    pub carry: f64,
    /// Speed after traits; statuses apply through flags
    pub speed: f64,
    pub flags: GaugeFlags,
    pub haste: bool,
    pub slow: bool,
    pub state: SchedulingState,
    pub alive: bool,
    /// Growth banked while frozen below the threshold; a full threshold is
    /// one turn lost to the freezing status
    #[serde(default)]
    pub frozen_progress: f64,
}

impl AtbGauge {
    pub fn new(owner: CombatantId, speed: f64, constants: &AtbConstants) -> Self {
        AtbGauge {
            owner,
            current: 0,
            max: constants.max_gauge,
            threshold: constants.threshold,
            carry: 0.0,
            speed: speed.max(0.0),
            flags: GaugeFlags::empty(),
            haste: false,
            slow: false,
            state: SchedulingState::Idle,
            alive: true,
            frozen_progress: 0.0,
        }
    }

    /// Speed after haste, slow and confusion; zero when frozen or dead
    pub fn effective_speed(&self, constants: &AtbConstants) -> f64 {
        if self.flags.intersects(GaugeFlags::FROZEN) {
            return 0.0;
        }
        self.unfrozen_speed(constants)
    }

    /// Speed the gauge would fill at without freezing statuses
    pub fn unfrozen_speed(&self, constants: &AtbConstants) -> f64 {
        if !self.alive {
            return 0.0;
        }
        let mut modifier = 1.0;
        if self.haste {
            modifier *= constants.haste_multiplier;
        }
        if self.slow && constants.slow_multiplier > 0.0 {
            modifier /= constants.slow_multiplier;
        }
        if self.flags.contains(GaugeFlags::CONFUSED) {
            modifier *= constants.confusion_factor;
        }
        self.speed * modifier
    }

    /// Turn the fractional carry plus `gain` into whole points
    pub(crate) fn accrue(&mut self, gain: f64) -> u32 {
        self.carry += gain.max(0.0);
        let whole = self.carry.floor();
        self.carry -= whole;
        whole as u32
    }

    /// Add points, clamped to max
    pub(crate) fn fill(&mut self, points: u32) {
        self.current = self.current.saturating_add(points).min(self.max);
        if self.current == self.max {
            self.carry = 0.0;
        }
    }

    /// Alive, frozen and unable to reach a turn on its own
    pub fn is_held(&self) -> bool {
        self.alive && self.flags.intersects(GaugeFlags::FROZEN) && !self.can_act()
    }

    pub fn can_act(&self) -> bool {
        self.alive
            && self.current >= self.threshold
            && !self.flags.intersects(GaugeFlags::NO_TURN)
            && self.state != SchedulingState::Casting
    }

    /// Fill level from 0.0 to 1.0
    pub fn percentage(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f64 / self.max as f64
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.carry = 0.0;
        if self.state == SchedulingState::Ready {
            self.state = SchedulingState::Idle;
        }
    }

    pub(crate) fn refresh_state(&mut self) {
        if self.state == SchedulingState::Casting {
            return;
        }
        self.state = if self.can_act() {
            SchedulingState::Ready
        } else {
            SchedulingState::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_gauge(speed: f64) -> AtbGauge {
        AtbGauge::new(CombatantId(1), speed, &AtbConstants::default())
    }

    #[test]
    fn test_effective_speed_modifiers() {
        let constants = AtbConstants::default();
        let mut gauge = make_gauge(20.0);
        assert!((gauge.effective_speed(&constants) - 20.0).abs() < f64::EPSILON);

        gauge.haste = true;
        assert!((gauge.effective_speed(&constants) - 30.0).abs() < 1e-9);
        gauge.slow = true;
        // 20 × 1.5 / 2 = 15
        assert!((gauge.effective_speed(&constants) - 15.0).abs() < 1e-9);
        gauge.flags.insert(GaugeFlags::CONFUSED);
        // 15 × 0.7 = 10.5
        assert!((gauge.effective_speed(&constants) - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_frozen_and_dead_have_no_speed() {
        let constants = AtbConstants::default();
        for flag in [GaugeFlags::STUNNED, GaugeFlags::PARALYZED, GaugeFlags::SLEEPING] {
            let mut gauge = make_gauge(20.0);
            gauge.flags.insert(flag);
            assert!(gauge.effective_speed(&constants).abs() < f64::EPSILON);
        }
        let mut gauge = make_gauge(20.0);
        gauge.alive = false;
        assert!(gauge.effective_speed(&constants).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accrue_carries_fraction() {
        let mut gauge = make_gauge(1.0);
        assert_eq!(gauge.accrue(0.4), 0);
        assert_eq!(gauge.accrue(0.4), 0);
        assert_eq!(gauge.accrue(0.4), 1);
        assert!((gauge.carry - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_can_act_rules() {
        let mut gauge = make_gauge(10.0);
        gauge.fill(1000);
        assert!(gauge.can_act());

        gauge.flags.insert(GaugeFlags::PARALYZED);
        assert!(gauge.can_act());
        gauge.flags.insert(GaugeFlags::SLEEPING);
        assert!(!gauge.can_act());
        gauge.flags = GaugeFlags::empty();

        gauge.state = SchedulingState::Casting;
        assert!(!gauge.can_act());
    }

    #[test]
    fn test_held_only_when_frozen_and_not_ready() {
        let constants = AtbConstants::default();
        let mut gauge = make_gauge(20.0);
        assert!(!gauge.is_held());

        gauge.flags.insert(GaugeFlags::PARALYZED);
        assert!(gauge.is_held());
        assert!((gauge.unfrozen_speed(&constants) - 20.0).abs() < f64::EPSILON);

        // Paralysis lets a full gauge act
        gauge.fill(1000);
        assert!(!gauge.is_held());
        gauge.flags.insert(GaugeFlags::STUNNED);
        assert!(gauge.is_held());

        gauge.alive = false;
        assert!(!gauge.is_held());
    }

    #[test]
    fn test_fill_clamps_to_max() {
        let mut gauge = make_gauge(10.0);
        gauge.fill(5000);
        assert_eq!(gauge.current, 2000);
        assert!((gauge.percentage() - 1.0).abs() < f64::EPSILON);
    }
}
