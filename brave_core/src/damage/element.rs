//! Elemental mitigation

use crate::combatant::Combatant;
use crate::config::DamageConstants;
use crate::types::Element;

/// Damage factor for an elemental hit against `defender`
///
/// With a resistance table the factor is `1 / resistance` (a missing entry is
/// neutral). Without one, spirit grants a small flat mitigation.
pub fn element_factor(
    defender: &Combatant,
    element: Option<Element>,
    spirit: f64,
    constants: &DamageConstants,
) -> f64 {
    let Some(element) = element else {
        return 1.0;
    };

    match &defender.resistances {
        Some(table) => match table.get(&element) {
            Some(resistance) if *resistance > 0.0 => 1.0 / resistance,
            _ => 1.0,
        },
        None => {
            let mitigation = (spirit * constants.elemental_mitigation_per_spirit)
                .clamp(0.0, constants.elemental_mitigation_cap);
            1.0 - mitigation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::StatSet;
    use crate::types::{CombatantId, Side};
    use std::collections::HashMap;

    fn make_defender() -> Combatant {
        Combatant::new(CombatantId(2), "Golem", Side::Enemy, StatSet::default())
    }

    #[test]
    fn test_non_elemental_is_neutral() {
        let constants = DamageConstants::default();
        assert!((element_factor(&make_defender(), None, 50.0, &constants) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resistance_table() {
        let constants = DamageConstants::default();
        let mut table = HashMap::new();
        table.insert(Element::Fire, 2.0);
        table.insert(Element::Ice, 0.5);
        let defender = make_defender().with_resistances(table);

        assert!((element_factor(&defender, Some(Element::Fire), 0.0, &constants) - 0.5).abs() < 1e-9);
        assert!((element_factor(&defender, Some(Element::Ice), 0.0, &constants) - 2.0).abs() < 1e-9);
        assert!((element_factor(&defender, Some(Element::Holy), 0.0, &constants) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spirit_mitigation_capped() {
        let constants = DamageConstants::default();
        let defender = make_defender();
        // 50 × 0.002 = 0.1
        assert!((element_factor(&defender, Some(Element::Dark), 50.0, &constants) - 0.9).abs() < 1e-9);
        // 500 × 0.002 = 1.0, capped at 0.2
        assert!((element_factor(&defender, Some(Element::Dark), 500.0, &constants) - 0.8).abs() < 1e-9);
    }
}
