//! Subgroup enumeration.
//!
//! Subgroups are the Cartesian product of the distinct values of each
//! requested attribute, enumerated as nested loops: the first attribute is
//! the outermost loop and the last attribute the innermost.

use std::collections::BTreeSet;

use crate::domain::{SubgroupKey, Trial};
use crate::error::EvalError;

/// Sorted distinct values of `attribute` across `trials`.
///
/// Trials without the attribute contribute nothing.
pub fn distinct_values(trials: &[Trial], attribute: &str) -> Vec<String> {
    trials
        .iter()
        .filter_map(|t| t.attr(attribute))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Check an attribute list: non-empty, no duplicates.
pub fn validate_attributes(attributes: &[String]) -> Result<(), EvalError> {
    if attributes.is_empty() {
        return Err(EvalError::invalid("at least one subgroup attribute is required"));
    }
    let mut seen = BTreeSet::new();
    for name in attributes {
        if name.trim().is_empty() {
            return Err(EvalError::invalid("empty subgroup attribute name"));
        }
        if !seen.insert(name.as_str()) {
            return Err(EvalError::invalid(format!("duplicate subgroup attribute '{name}'")));
        }
    }
    Ok(())
}

/// Every combination of observed attribute values, in nested-loop order.
pub fn enumerate_keys(trials: &[Trial], attributes: &[String]) -> Result<Vec<SubgroupKey>, EvalError> {
    validate_attributes(attributes)?;

    let mut combos: Vec<Vec<(String, String)>> = vec![Vec::new()];
    for name in attributes {
        let values = distinct_values(trials, name);
        if values.is_empty() {
            return Err(EvalError::invalid(format!(
                "no trial has a value for attribute '{name}'"
            )));
        }
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                values.iter().map(move |v| {
                    let mut entries = prefix.clone();
                    entries.push((name.clone(), v.clone()));
                    entries
                })
            })
            .collect();
    }

    Ok(combos.into_iter().map(SubgroupKey::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(nat: &str, gender: &str) -> Trial {
        Trial::new(0.0, 0)
            .with_attr("nat", nat)
            .with_attr("gender", gender)
    }

    fn attrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn distinct_values_are_sorted_and_skip_missing() {
        let trials = vec![trial("usa", "m"), trial("india", "f"), Trial::new(0.0, 1)];
        assert_eq!(distinct_values(&trials, "nat"), vec!["india", "usa"]);
    }

    #[test]
    fn enumeration_is_nested_loop_ordered() {
        let trials = vec![trial("usa", "m"), trial("india", "f")];
        let keys = enumerate_keys(&trials, &attrs(&["nat", "gender"])).unwrap();
        let ids: Vec<String> = keys.iter().map(SubgroupKey::id).collect();
        assert_eq!(ids, vec!["india_f", "india_m", "usa_f", "usa_m"]);
    }

    #[test]
    fn three_attributes_multiply_out() {
        let trials = vec![
            trial("usa", "m").with_attr("age", "20s"),
            trial("india", "f").with_attr("age", "30s"),
            trial("uk", "f").with_attr("age", "40s"),
        ];
        let keys = enumerate_keys(&trials, &attrs(&["nat", "gender", "age"])).unwrap();
        assert_eq!(keys.len(), 3 * 2 * 3);
        assert_eq!(keys[0].id(), "india_f_20s");
        assert_eq!(keys[keys.len() - 1].id(), "usa_m_40s");
    }

    #[test]
    fn single_attribute_degenerates_to_values() {
        let trials = vec![trial("usa", "m"), trial("india", "f")];
        let keys = enumerate_keys(&trials, &attrs(&["gender"])).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].entries(), [("gender".to_string(), "f".to_string())]);
    }

    #[test]
    fn bad_attribute_lists_are_rejected() {
        let trials = vec![trial("usa", "m")];
        assert!(enumerate_keys(&trials, &[]).is_err());
        assert!(enumerate_keys(&trials, &attrs(&["nat", "nat"])).is_err());
        assert!(enumerate_keys(&trials, &attrs(&["age"])).is_err());
    }
}
