//! ATB scheduler - who acts next
//!
//! Every registered combatant has an [`AtbGauge`]. Each tick a gauge grows by
//! its effective speed scaled by `delta`. A combatant may take a turn once its
//! gauge reaches the threshold; acting consumes one threshold's worth.
//! Entries are kept in registration order, which breaks ties.

mod gauge;

pub use gauge::{AtbGauge, GaugeFlags, SchedulingState};

use crate::casting::CastingRegistry;
use crate::combat::{CombatEvent, EventSink};
use crate::config::{AtbConstants, SpeedModel};
use crate::status::{StatusKind, StatusRegistry};
use crate::types::CombatantId;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    constants: AtbConstants,
    gauges: Vec<AtbGauge>,
    /// Freezes every gauge (wait mode)
    paused: bool,
    /// Frozen combatants whose turn came round, oldest first
    lost_turns: Vec<CombatantId>,
}

impl TurnScheduler {
    pub fn new(constants: AtbConstants) -> Self {
        TurnScheduler {
            constants,
            gauges: Vec::new(),
            paused: false,
            lost_turns: Vec::new(),
        }
    }

    pub fn constants(&self) -> &AtbConstants {
        &self.constants
    }

    /// Add a combatant. Re-registering only updates its speed.
    pub fn register(&mut self, id: CombatantId, speed: f64) {
        if let Some(gauge) = self.gauge_mut(id) {
            gauge.speed = speed.max(0.0);
            return;
        }
        debug!(combatant = %id, speed, "gauge registered");
        self.gauges.push(AtbGauge::new(id, speed, &self.constants));
    }

    pub fn unregister(&mut self, id: CombatantId) -> bool {
        let before = self.gauges.len();
        self.gauges.retain(|g| g.owner != id);
        self.gauges.len() != before
    }

    pub fn get(&self, id: CombatantId) -> Option<&AtbGauge> {
        self.gauges.iter().find(|g| g.owner == id)
    }

    fn gauge_mut(&mut self, id: CombatantId) -> Option<&mut AtbGauge> {
        self.gauges.iter_mut().find(|g| g.owner == id)
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Gauges in registration order
    pub fn gauges(&self) -> &[AtbGauge] {
        &self.gauges
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn average_speed(&self) -> f64 {
        let living: Vec<f64> = self
            .gauges
            .iter()
            .filter(|g| g.alive)
            .map(|g| g.speed)
            .collect();
        if living.is_empty() {
            return 1.0;
        }
        let average = living.iter().sum::<f64>() / living.len() as f64;
        if average > 0.0 {
            average
        } else {
            1.0
        }
    }

    /// Growth at `speed` over `delta`
    fn growth(&self, speed: f64, delta: f64, average_speed: f64) -> f64 {
        match self.constants.speed_model {
            SpeedModel::Effective => speed * delta / self.constants.speed_divisor,
            SpeedModel::Relative => speed / average_speed * self.constants.relative_base_rate * delta,
        }
    }

    /// Advance every gauge by `delta` and return who can act, best first
    ///
    /// Casting gauges feed their growth into `casting`; a finished cast
    /// returns the gauge to idle without refilling it. A frozen gauge below
    /// the threshold banks its unfrozen growth instead, and each full
    /// threshold banked queues a lost turn (see [`Self::take_lost_turns`]).
    pub fn tick(
        &mut self,
        delta: f64,
        casting: &mut CastingRegistry,
        events: &mut dyn EventSink,
    ) -> Vec<CombatantId> {
        if self.paused || delta <= 0.0 {
            return self.ready_order();
        }

        let average_speed = self.average_speed();
        let growth: Vec<(f64, f64)> = self
            .gauges
            .iter()
            .map(|g| {
                (
                    self.growth(g.effective_speed(&self.constants), delta, average_speed),
                    self.growth(g.unfrozen_speed(&self.constants), delta, average_speed),
                )
            })
            .collect();
        let threshold = self.constants.threshold.max(1) as f64;

        for (gauge, (gain, held_gain)) in self.gauges.iter_mut().zip(growth) {
            if gauge.is_held() {
                gauge.frozen_progress += held_gain;
                while gauge.frozen_progress >= threshold {
                    gauge.frozen_progress -= threshold;
                    debug!(combatant = %gauge.owner, "turn lost while frozen");
                    self.lost_turns.push(gauge.owner);
                }
                continue;
            }
            gauge.frozen_progress = 0.0;

            let points = gauge.accrue(gain);
            if gauge.state == SchedulingState::Casting {
                if !casting.is_casting(gauge.owner) {
                    gauge.state = SchedulingState::Idle;
                } else if casting.update(gauge.owner, points, events) {
                    gauge.state = SchedulingState::Idle;
                }
                continue;
            }
            gauge.fill(points);
            gauge.refresh_state();
        }

        self.ready_order()
    }

    /// Combatants that can act, highest gauge first, ties in registration order
    pub fn ready_order(&self) -> Vec<CombatantId> {
        let mut ready: Vec<&AtbGauge> = self.gauges.iter().filter(|g| g.can_act()).collect();
        ready.sort_by(|a, b| b.current.cmp(&a.current));
        ready.into_iter().map(|g| g.owner).collect()
    }

    pub fn can_act(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(AtbGauge::can_act)
    }

    /// Drain the turns frozen combatants lost since the last call
    pub fn take_lost_turns(&mut self) -> Vec<CombatantId> {
        std::mem::take(&mut self.lost_turns)
    }

    /// Spend one threshold after acting
    pub fn consume(&mut self, id: CombatantId) -> bool {
        let threshold = self.constants.threshold;
        self.consume_amount(id, threshold)
    }

    pub fn consume_amount(&mut self, id: CombatantId, amount: u32) -> bool {
        let Some(gauge) = self.gauge_mut(id) else {
            return false;
        };
        gauge.current = gauge.current.saturating_sub(amount);
        gauge.refresh_state();
        debug!(combatant = %id, amount, remaining = gauge.current, "gauge consumed");
        true
    }

    /// Raise a gauge by a fraction of the threshold (first-strike style boosts)
    pub fn boost(&mut self, id: CombatantId, fraction: f64) {
        let threshold = self.constants.threshold;
        if let Some(gauge) = self.gauge_mut(id) {
            let points = (threshold as f64 * fraction.max(0.0)).floor() as u32;
            gauge.fill(points);
            gauge.refresh_state();
        }
    }

    /// Reflect a status on the gauge. Returns false for statuses the gauge ignores.
    pub fn apply_status(&mut self, id: CombatantId, kind: StatusKind) -> bool {
        self.set_status(id, kind, true)
    }

    pub fn remove_status(&mut self, id: CombatantId, kind: StatusKind) -> bool {
        self.set_status(id, kind, false)
    }

    fn set_status(&mut self, id: CombatantId, kind: StatusKind, on: bool) -> bool {
        let Some(gauge) = self.gauge_mut(id) else {
            return false;
        };
        match kind {
            StatusKind::Stun => gauge.flags.set(GaugeFlags::STUNNED, on),
            StatusKind::Paralyze => gauge.flags.set(GaugeFlags::PARALYZED, on),
            StatusKind::Sleep => gauge.flags.set(GaugeFlags::SLEEPING, on),
            StatusKind::Confusion => gauge.flags.set(GaugeFlags::CONFUSED, on),
            StatusKind::Haste => gauge.haste = on,
            StatusKind::Slow => gauge.slow = on,
            _ => return false,
        }
        gauge.refresh_state();
        true
    }

    /// Rebuild a gauge's flags from a status registry
    pub fn sync_statuses(&mut self, id: CombatantId, statuses: &StatusRegistry) {
        let Some(gauge) = self.gauge_mut(id) else {
            return;
        };
        let mut flags = GaugeFlags::empty();
        flags.set(GaugeFlags::STUNNED, statuses.has(StatusKind::Stun));
        flags.set(GaugeFlags::PARALYZED, statuses.has(StatusKind::Paralyze));
        flags.set(GaugeFlags::SLEEPING, statuses.has(StatusKind::Sleep));
        flags.set(GaugeFlags::CONFUSED, statuses.has(StatusKind::Confusion));
        gauge.flags = flags;
        gauge.haste = statuses.has(StatusKind::Haste);
        gauge.slow = statuses.has(StatusKind::Slow);
        gauge.refresh_state();
    }

    /// BREAK empties the broken combatant's gauge
    pub fn on_break(&mut self, id: CombatantId, events: &mut dyn EventSink) {
        if let Some(gauge) = self.gauge_mut(id) {
            gauge.reset();
            debug!(combatant = %id, "gauge reset by break");
            events.emit(&CombatEvent::GaugeReset { combatant: id });
        }
    }

    pub fn start_casting(&mut self, id: CombatantId) {
        if let Some(gauge) = self.gauge_mut(id) {
            gauge.state = SchedulingState::Casting;
        }
    }

    pub fn stop_casting(&mut self, id: CombatantId) {
        if let Some(gauge) = self.gauge_mut(id) {
            if gauge.state == SchedulingState::Casting {
                gauge.state = SchedulingState::Idle;
                gauge.refresh_state();
            }
        }
    }

    pub fn set_alive(&mut self, id: CombatantId, alive: bool) {
        if let Some(gauge) = self.gauge_mut(id) {
            gauge.alive = alive;
            if !alive {
                gauge.state = SchedulingState::Idle;
            }
            gauge.refresh_state();
        }
    }

    pub fn set_speed(&mut self, id: CombatantId, speed: f64) {
        if let Some(gauge) = self.gauge_mut(id) {
            gauge.speed = speed.max(0.0);
        }
    }

    /// Fill level from 0.0 to 1.0; 0.0 for unknown ids
    pub fn percentage(&self, id: CombatantId) -> f64 {
        self.get(id).map_or(0.0, AtbGauge::percentage)
    }

    pub fn reset_all(&mut self) {
        for gauge in &mut self.gauges {
            gauge.reset();
            gauge.state = SchedulingState::Idle;
        }
    }

    pub fn clear(&mut self) {
        self.gauges.clear();
        self.lost_turns.clear();
        self.paused = false;
    }
}
