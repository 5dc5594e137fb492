//! Casting - multi-tick skills charged from the caster's gauge growth
//!
//! A cast needs `floor(cast_time_ratio * threshold)` points of gauge growth.
//! While it charges, the scheduler routes the caster's growth here instead of
//! into the gauge. Completed casts wait in a queue until the session resolves
//! them on its next tick.

use crate::combat::{CombatError, CombatEvent, EventSink};
use crate::config::CastingConstants;
use crate::skill::Skill;
use crate::types::CombatantId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastState {
    Casting,
    Complete,
    Interrupted,
}

/// A skill being charged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastInfo {
    pub caster: CombatantId,
    pub skill: Skill,
    pub target: Option<CombatantId>,
    pub required: u32,
    pub accumulated: u32,
    pub state: CastState,
    pub interruptible: bool,
}

impl CastInfo {
    /// Progress from 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.required == 0 {
            return 1.0;
        }
        (self.accumulated as f64 / self.required as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.accumulated >= self.required
    }
}

/// Active casts for one session
#[derive(Debug, Clone, Default)]
pub struct CastingRegistry {
    constants: CastingConstants,
    active: BTreeMap<CombatantId, CastInfo>,
    completed: VecDeque<CastInfo>,
}

impl CastingRegistry {
    pub fn new(constants: CastingConstants) -> Self {
        CastingRegistry {
            constants,
            active: BTreeMap::new(),
            completed: VecDeque::new(),
        }
    }

    /// Begin charging `skill`. Any cast the caster already had is dropped.
    pub fn start_cast(
        &mut self,
        caster: CombatantId,
        skill: Skill,
        target: Option<CombatantId>,
        threshold: u32,
        events: &mut dyn EventSink,
    ) -> &CastInfo {
        if let Some(previous) = self.active.remove(&caster) {
            debug!(caster = %caster, skill = %previous.skill.id, "cast replaced");
            events.emit(&CombatEvent::CastInterrupted {
                caster,
                skill: previous.skill.id,
            });
        }

        let required = (skill.cast_time_ratio.max(0.0) * threshold as f64).floor() as u32;
        info!(caster = %caster, skill = %skill.id, required, "cast started");
        events.emit(&CombatEvent::CastStarted {
            caster,
            skill: skill.id.clone(),
            required,
        });

        let interruptible = skill.interruptible;
        self.active.entry(caster).or_insert(CastInfo {
            caster,
            skill,
            target,
            required,
            accumulated: 0,
            state: CastState::Casting,
            interruptible,
        })
    }

    /// Add progress. Returns true when this update completed the cast.
    pub fn update(&mut self, caster: CombatantId, amount: u32, events: &mut dyn EventSink) -> bool {
        let Some(cast) = self.active.get_mut(&caster) else {
            return false;
        };
        if cast.state != CastState::Casting {
            return false;
        }

        cast.accumulated = cast.accumulated.saturating_add(amount);
        if !cast.is_complete() {
            return false;
        }

        let Some(mut done) = self.active.remove(&caster) else {
            return false;
        };
        done.state = CastState::Complete;
        info!(caster = %caster, skill = %done.skill.id, "cast complete");
        events.emit(&CombatEvent::CastCompleted {
            caster,
            skill: done.skill.id.clone(),
        });
        self.completed.push_back(done);
        true
    }

    /// Cancel a cast at the caller's request
    ///
    /// Returns `Ok(false)` if the cast cannot be interrupted.
    pub fn cancel(
        &mut self,
        caster: CombatantId,
        events: &mut dyn EventSink,
    ) -> Result<bool, CombatError> {
        let cast = self
            .active
            .get(&caster)
            .ok_or(CombatError::NoActiveCast(caster))?;
        if !cast.interruptible {
            debug!(caster = %caster, "cast cannot be interrupted");
            return Ok(false);
        }
        Ok(self.abort(caster, events).is_some())
    }

    /// Drop a cast regardless of `interruptible`
    pub fn abort(&mut self, caster: CombatantId, events: &mut dyn EventSink) -> Option<CastInfo> {
        let mut cast = self.active.remove(&caster)?;
        cast.state = CastState::Interrupted;
        info!(caster = %caster, skill = %cast.skill.id, "cast interrupted");
        events.emit(&CombatEvent::CastInterrupted {
            caster,
            skill: cast.skill.id.clone(),
        });
        Some(cast)
    }

    /// Roll for an interrupt after `damage` HP damage. Returns true if interrupted.
    pub fn interrupt_on_damage(
        &mut self,
        caster: CombatantId,
        damage: u32,
        rng: &mut impl Rng,
        events: &mut dyn EventSink,
    ) -> bool {
        let Some(cast) = self.active.get(&caster) else {
            return false;
        };
        if !cast.interruptible || damage == 0 {
            return false;
        }
        let chance = (damage as f64 / self.constants.interrupt_damage_scale)
            .min(self.constants.interrupt_chance_cap);
        if rng.gen::<f64>() < chance {
            self.abort(caster, events).is_some()
        } else {
            false
        }
    }

    pub fn is_casting(&self, caster: CombatantId) -> bool {
        self.active.contains_key(&caster)
    }

    pub fn get(&self, caster: CombatantId) -> Option<&CastInfo> {
        self.active.get(&caster)
    }

    pub fn progress(&self, caster: CombatantId) -> Option<f64> {
        self.active.get(&caster).map(CastInfo::progress)
    }

    /// Drain casts completed since the last call, in completion order
    pub fn take_completed(&mut self) -> Vec<CastInfo> {
        self.completed.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::EventLog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_skill(ratio: f64, interruptible: bool) -> Skill {
        let mut skill = Skill::new("meteor", "Meteor").with_cast_time(ratio);
        skill.interruptible = interruptible;
        skill
    }

    #[test]
    fn test_required_points_from_ratio() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        let cast = registry.start_cast(CombatantId(1), make_skill(0.3, true), None, 1000, &mut events);
        assert_eq!(cast.required, 300);
        assert_eq!(cast.state, CastState::Casting);
        assert!(registry.is_casting(CombatantId(1)));
    }

    #[test]
    fn test_update_completes_and_queues() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        registry.start_cast(CombatantId(1), make_skill(0.5, true), Some(CombatantId(2)), 1000, &mut events);

        assert!(!registry.update(CombatantId(1), 300, &mut events));
        assert!((registry.progress(CombatantId(1)).unwrap() - 0.6).abs() < 1e-9);
        assert!(registry.update(CombatantId(1), 200, &mut events));
        assert!(!registry.is_casting(CombatantId(1)));

        let done = registry.take_completed();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].state, CastState::Complete);
        assert_eq!(done[0].target, Some(CombatantId(2)));
        assert!(registry.take_completed().is_empty());
    }

    #[test]
    fn test_new_cast_replaces_old() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        registry.start_cast(CombatantId(1), make_skill(0.5, true), None, 1000, &mut events);
        registry.update(CombatantId(1), 100, &mut events);
        let cast = registry.start_cast(CombatantId(1), make_skill(0.2, true), None, 1000, &mut events);
        assert_eq!(cast.accumulated, 0);
        assert_eq!(cast.required, 200);
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, CombatEvent::CastInterrupted { .. })));
    }

    #[test]
    fn test_cancel_rules() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        assert_eq!(
            registry.cancel(CombatantId(1), &mut events),
            Err(CombatError::NoActiveCast(CombatantId(1)))
        );

        registry.start_cast(CombatantId(1), make_skill(0.5, false), None, 1000, &mut events);
        assert_eq!(registry.cancel(CombatantId(1), &mut events), Ok(false));
        assert!(registry.is_casting(CombatantId(1)));

        registry.start_cast(CombatantId(2), make_skill(0.5, true), None, 1000, &mut events);
        assert_eq!(registry.cancel(CombatantId(2), &mut events), Ok(true));
        assert!(!registry.is_casting(CombatantId(2)));
    }

    #[test]
    fn test_interrupt_on_damage() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(12345);

        registry.start_cast(CombatantId(1), make_skill(0.5, true), None, 1000, &mut events);
        // Zero damage never interrupts
        assert!(!registry.interrupt_on_damage(CombatantId(1), 0, &mut rng, &mut events));

        // 90% per hit: twenty heavy hits in a row will land one
        let interrupted = (0..20)
            .any(|_| registry.interrupt_on_damage(CombatantId(1), 1000, &mut rng, &mut events));
        assert!(interrupted);
        assert!(!registry.is_casting(CombatantId(1)));
    }

    #[test]
    fn test_uninterruptible_ignores_damage() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(7);
        registry.start_cast(CombatantId(1), make_skill(0.5, false), None, 1000, &mut events);
        for _ in 0..50 {
            assert!(!registry.interrupt_on_damage(CombatantId(1), 1000, &mut rng, &mut events));
        }
        assert!(registry.abort(CombatantId(1), &mut events).is_some());
        assert!(!registry.is_casting(CombatantId(1)));
    }

    #[test]
    fn test_clear() {
        let mut registry = CastingRegistry::default();
        let mut events = EventLog::new();
        registry.start_cast(CombatantId(1), make_skill(0.0, true), None, 1000, &mut events);
        registry.update(CombatantId(1), 0, &mut events);
        registry.clear();
        assert!(registry.take_completed().is_empty());
    }
}
