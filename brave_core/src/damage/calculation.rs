//! Damage calculation - turning two combatants and a multiplier into a DamageResult

use super::element::element_factor;
use super::hit::{hit_rate, roll_hit};
use super::result::{DamageDetails, DamageResult};
use super::DamagePhase;
use crate::combatant::{Combatant, EffectiveStats};
use crate::config::{DamageConstants, HitConstants};
use crate::status::StatusKind;
use crate::traits::{DamageQuery, TraitContext, TraitEngine};
use crate::types::{DamageKind, Element};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a single attack is delivered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackOptions {
    #[serde(default)]
    pub kind: DamageKind,
    #[serde(default)]
    pub element: Option<Element>,
    /// Skip the hit roll
    #[serde(default)]
    pub ignore_evasion: bool,
    /// Fraction of the defense stat ignored (0.0 - 1.0)
    #[serde(default)]
    pub pierce: f64,
    /// Flat amount subtracted from the defense stat after percent pierce
    #[serde(default)]
    pub defense_pierce_fixed: f64,
}

impl AttackOptions {
    pub fn physical() -> Self {
        AttackOptions::default()
    }

    pub fn magical() -> Self {
        AttackOptions {
            kind: DamageKind::Magical,
            ..AttackOptions::default()
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn ignoring_evasion(mut self) -> Self {
        self.ignore_evasion = true;
        self
    }

    pub fn with_pierce(mut self, pierce: f64) -> Self {
        self.pierce = pierce.clamp(0.0, 1.0);
        self
    }

    pub fn with_fixed_pierce(mut self, amount: f64) -> Self {
        self.defense_pierce_fixed = amount.max(0.0);
        self
    }
}

/// Computes Brave and HP damage
#[derive(Debug, Clone, Default)]
pub struct DamageResolver {
    pub damage: DamageConstants,
    pub hit: HitConstants,
}

/// Attacker and defender stats resolved for one hit
struct Matchup {
    attacker: EffectiveStats,
    defender: EffectiveStats,
}

impl Matchup {
    fn resolve(
        attacker: &Combatant,
        defender: &Combatant,
        traits: &TraitEngine,
        context: &TraitContext,
    ) -> Self {
        Matchup {
            attacker: EffectiveStats::compute(attacker, traits, context),
            defender: EffectiveStats::compute(defender, traits, &TraitContext::new()),
        }
    }

    /// Attack stat over pierced defense stat + 1
    fn stat_modifier(&self, options: &AttackOptions) -> f64 {
        let (atk, def) = match options.kind {
            DamageKind::Physical => (self.attacker.attack, self.defender.defense),
            DamageKind::Magical => (self.attacker.magic, self.defender.spirit),
        };
        let pierced = (def * (1.0 - options.pierce.clamp(0.0, 1.0)) - options.defense_pierce_fixed)
            .max(0.0);
        atk / (pierced + 1.0)
    }
}

impl DamageResolver {
    pub fn new(damage: DamageConstants, hit: HitConstants) -> Self {
        DamageResolver { damage, hit }
    }

    /// Roll to hit. Returns the hit rate used and whether the attack landed.
    pub fn check_hit(
        &self,
        attacker: &EffectiveStats,
        defender: &Combatant,
        defender_stats: &EffectiveStats,
        options: &AttackOptions,
        rng: &mut impl Rng,
    ) -> (f64, bool) {
        if options.ignore_evasion {
            return (100.0, true);
        }
        if defender.statuses.has(StatusKind::AbsoluteEvasion) {
            return (0.0, false);
        }
        let rate = hit_rate(attacker.accuracy, defender_stats.evasion, &self.hit);
        (rate, roll_hit(rate, rng))
    }

    fn roll_variance(&self, rng: &mut impl Rng) -> f64 {
        if self.damage.variance_min >= self.damage.variance_max {
            self.damage.variance_min
        } else {
            rng.gen_range(self.damage.variance_min..=self.damage.variance_max)
        }
    }

    /// Returns the crit multiplier to apply, 1.0 if the roll failed
    fn roll_critical(
        &self,
        attacker: &Combatant,
        stats: &EffectiveStats,
        traits: &TraitEngine,
        context: &TraitContext,
        rng: &mut impl Rng,
    ) -> f64 {
        let chance = (self.damage.critical_base_chance
            + stats.luck / 100.0
            + traits.critical_bonus(attacker, context))
            * stats.critical_rate;
        let chance = chance.clamp(0.0, self.damage.critical_cap);
        if rng.gen::<f64>() < chance {
            self.damage.critical_multiplier * traits.critical_damage(attacker, context)
        } else {
            1.0
        }
    }

    /// Brave damage for an attack with the given skill multiplier
    #[allow(clippy::too_many_arguments)]
    pub fn brv_damage(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        multiplier: f64,
        options: &AttackOptions,
        traits: &TraitEngine,
        context: &TraitContext,
        rng: &mut impl Rng,
    ) -> DamageResult {
        let matchup = Matchup::resolve(attacker, defender, traits, context);

        let (rate, hit) = self.check_hit(
            &matchup.attacker,
            defender,
            &matchup.defender,
            options,
            rng,
        );
        if !hit {
            debug!(attacker = %attacker.id, defender = %defender.id, rate, "brave attack missed");
            return DamageResult::miss(rate);
        }

        let stat_modifier = matchup.stat_modifier(options);
        let base = ((stat_modifier * multiplier * self.damage.brv_multiplier).floor() as u32).max(1);

        let query = DamageQuery::new(options.kind, DamagePhase::Brave).elemental(options.element.is_some());
        let trait_multiplier = traits.damage_multiplier(attacker, &query, context)
            * traits.hp_scaling_multiplier(attacker, context);
        let element = element_factor(defender, options.element, matchup.defender.spirit, &self.damage);
        let variance = self.roll_variance(rng);
        let critical = self.roll_critical(attacker, &matchup.attacker, traits, context, rng);

        let total = trait_multiplier * element * variance * critical;
        let final_damage = ((base as f64 * total).floor() as u32).max(1);

        debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            base,
            final_damage,
            critical = critical > 1.0,
            "brave damage"
        );

        DamageResult {
            base,
            final_damage,
            is_critical: critical > 1.0,
            is_miss: false,
            multiplier: total,
            variance,
            details: DamageDetails {
                hit_rate: rate,
                stat_modifier,
                trait_multiplier,
                element_factor: element,
                critical_multiplier: critical,
                break_multiplier: 1.0,
                damage_reduction: 0.0,
            },
        }
    }

    /// HP damage paid for with `brave_pool` points of the attacker's Brave
    ///
    /// HP attacks always connect; the Brave spent is the cost of the swing.
    #[allow(clippy::too_many_arguments)]
    pub fn hp_damage(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        brave_pool: u32,
        hp_multiplier: f64,
        is_break: bool,
        options: &AttackOptions,
        traits: &TraitEngine,
        context: &TraitContext,
        rng: &mut impl Rng,
    ) -> DamageResult {
        let matchup = Matchup::resolve(attacker, defender, traits, context);
        let stat_modifier = matchup.stat_modifier(options);

        let level_scale =
            1.0 + attacker.level.saturating_sub(1) as f64 * self.damage.level_scale_per_level;
        let base = (brave_pool as f64
            * hp_multiplier
            * stat_modifier
            * self.damage.hp_multiplier
            * level_scale)
            .floor()
            .max(0.0) as u32;

        let query = DamageQuery::new(options.kind, DamagePhase::Hp).elemental(options.element.is_some());
        let trait_multiplier = traits.damage_multiplier(attacker, &query, context)
            * traits.hp_scaling_multiplier(attacker, context);
        let element = element_factor(defender, options.element, matchup.defender.spirit, &self.damage);
        let critical = self.roll_critical(attacker, &matchup.attacker, traits, context, rng);

        let break_multiplier = if is_break {
            let bonus = traits.break_bonus(attacker, context);
            if bonus > 0.0 {
                bonus
            } else {
                self.damage.break_bonus
            }
        } else {
            1.0
        };

        let mut defender_context = TraitContext::new();
        defender_context.on_hit = true;
        let reduction = traits.damage_reduction(defender, &defender_context);

        let total = trait_multiplier * element * critical * break_multiplier * (1.0 - reduction);
        let final_damage = ((base as f64 * total).floor() as u32).max(self.damage.min_hp_damage);

        debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            brave_pool,
            base,
            final_damage,
            is_break,
            "hp damage"
        );

        DamageResult {
            base,
            final_damage,
            is_critical: critical > 1.0,
            is_miss: false,
            multiplier: total,
            variance: 1.0,
            details: DamageDetails {
                hit_rate: 100.0,
                stat_modifier,
                trait_multiplier,
                element_factor: element,
                critical_multiplier: critical,
                break_multiplier,
                damage_reduction: reduction,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::StatSet;
    use crate::status::StatusEffect;
    use crate::types::{CombatantId, Side};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Resolver with no variance and no crits so results are exact
    fn make_flat_resolver() -> DamageResolver {
        let mut damage = DamageConstants::default();
        damage.variance_min = 1.0;
        damage.variance_max = 1.0;
        damage.critical_base_chance = 0.0;
        DamageResolver::new(damage, HitConstants::default())
    }

    fn make_attacker() -> Combatant {
        let stats = StatSet {
            attack: 100,
            magic: 60,
            luck: 0,
            ..StatSet::default()
        };
        Combatant::new(CombatantId(1), "Attacker", Side::Ally, stats).with_hp(1000)
    }

    fn make_defender() -> Combatant {
        let stats = StatSet {
            defense: 9,
            spirit: 19,
            ..StatSet::default()
        };
        Combatant::new(CombatantId(2), "Defender", Side::Enemy, stats).with_hp(1000)
    }

    #[test]
    fn test_brv_damage_formula() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(12345);
        let options = AttackOptions::physical().ignoring_evasion();

        let result = resolver.brv_damage(
            &make_attacker(),
            &make_defender(),
            2.0,
            &options,
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );

        // 100 / (9 + 1) = 10; 10 × 2.0 × 1.5 = 30
        assert_eq!(result.base, 30);
        assert_eq!(result.final_damage, 30);
        assert!(!result.is_critical);
        assert!(!result.is_miss);
    }

    #[test]
    fn test_brv_damage_magical_uses_spirit() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(1);
        let options = AttackOptions::magical().ignoring_evasion();

        let result = resolver.brv_damage(
            &make_attacker(),
            &make_defender(),
            1.0,
            &options,
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );

        // 60 / (19 + 1) = 3; 3 × 1.0 × 1.5 = 4.5 -> 4
        assert_eq!(result.base, 4);
    }

    #[test]
    fn test_brv_damage_minimum_one() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(1);
        let weak = Combatant::new(
            CombatantId(3),
            "Weak",
            Side::Ally,
            StatSet {
                attack: 0,
                ..StatSet::default()
            },
        );

        let result = resolver.brv_damage(
            &weak,
            &make_defender(),
            1.0,
            &AttackOptions::physical().ignoring_evasion(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        assert_eq!(result.final_damage, 1);
    }

    #[test]
    fn test_pierce_reduces_defense() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(1);
        let options = AttackOptions::physical().ignoring_evasion().with_pierce(1.0);

        let result = resolver.brv_damage(
            &make_attacker(),
            &make_defender(),
            1.0,
            &options,
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        // defense fully ignored: 100 / 1 × 1.5 = 150
        assert_eq!(result.base, 150);
    }

    #[test]
    fn test_absolute_evasion_misses() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(1);
        let mut defender = make_defender();
        defender
            .statuses
            .add(StatusEffect::new(StatusKind::AbsoluteEvasion, 1, 1.0), true);

        let result = resolver.brv_damage(
            &make_attacker(),
            &defender,
            1.0,
            &AttackOptions::physical(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        assert!(result.is_miss);
        assert_eq!(result.final_damage, 0);
    }

    #[test]
    fn test_variance_within_bounds() {
        let resolver = DamageResolver::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let result = resolver.brv_damage(
                &make_attacker(),
                &make_defender(),
                2.0,
                &AttackOptions::physical().ignoring_evasion(),
                &TraitEngine::default(),
                &TraitContext::new(),
                &mut rng,
            );
            assert!(result.variance >= 0.9 && result.variance <= 1.1);
        }
    }

    #[test]
    fn test_hp_damage_formula() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(12345);

        let result = resolver.hp_damage(
            &make_attacker(),
            &make_defender(),
            500,
            1.0,
            false,
            &AttackOptions::physical(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        // 500 × 1.0 × 10 × 0.15 × 1.0 = 750
        assert_eq!(result.base, 750);
        assert_eq!(result.final_damage, 750);
    }

    #[test]
    fn test_hp_damage_level_scale_and_break() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(12345);
        let attacker = make_attacker().with_level(3);

        let result = resolver.hp_damage(
            &attacker,
            &make_defender(),
            100,
            1.0,
            true,
            &AttackOptions::physical(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        // level scale 1 + 2 × 0.3 = 1.6; 100 × 10 × 0.15 × 1.6 = 240; × 1.5 break = 360
        assert_eq!(result.base, 240);
        assert_eq!(result.final_damage, 360);
        assert!((result.details.break_multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hp_damage_trait_break_bonus_replaces_default() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(7);
        let attacker = make_attacker().with_traits(&["break_master"]);

        let result = resolver.hp_damage(
            &attacker,
            &make_defender(),
            100,
            1.0,
            true,
            &AttackOptions::physical(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        // 100 × 10 × 0.15 = 150 × 1.5 (trait) = 225
        assert_eq!(result.final_damage, 225);
    }

    #[test]
    fn test_hp_damage_reduction_then_floor() {
        let resolver = make_flat_resolver();
        let mut rng = StdRng::seed_from_u64(7);
        let defender = make_defender().with_traits(&["damage_reduction"]);

        let result = resolver.hp_damage(
            &make_attacker(),
            &defender,
            100,
            1.0,
            false,
            &AttackOptions::physical(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        // 150 × (1 - 0.1) = 135
        assert_eq!(result.final_damage, 135);

        let tiny = resolver.hp_damage(
            &make_attacker(),
            &defender,
            1,
            1.0,
            false,
            &AttackOptions::physical(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        assert_eq!(tiny.final_damage, 5);
    }

    #[test]
    fn test_certain_crit_with_status_rate() {
        let mut damage = DamageConstants::default();
        damage.variance_min = 1.0;
        damage.variance_max = 1.0;
        damage.critical_base_chance = 1.0;
        damage.critical_cap = 1.0;
        let resolver = DamageResolver::new(damage, HitConstants::default());
        let mut rng = StdRng::seed_from_u64(3);

        let result = resolver.brv_damage(
            &make_attacker(),
            &make_defender(),
            2.0,
            &AttackOptions::physical().ignoring_evasion(),
            &TraitEngine::default(),
            &TraitContext::new(),
            &mut rng,
        );
        assert!(result.is_critical);
        // 30 × 1.5 = 45
        assert_eq!(result.final_damage, 45);
    }
}
