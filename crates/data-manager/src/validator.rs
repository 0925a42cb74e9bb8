//! Shape checks for untrusted imported JSON
//!
//! Every predicate is total and side-effect free. [`validate`] wraps them and
//! reports the first problem found as a [`FormatError`] naming the dataset.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sr2map_shared::{Dataset, FoundKey, FormatError};

/// How strictly a found object is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoundValidation {
    /// At least one known key, and every known key maps to an array
    Strict,
    /// At least one known key, or exactly as many keys as there are known keys
    Lenient,
}

pub fn is_valid_plots_export(value: &Value) -> bool {
    check_plots(value).is_ok()
}

pub fn is_valid_pins_export(value: &Value) -> bool {
    check_pins(value).is_ok()
}

pub fn is_valid_found_export(value: &Value, mode: FoundValidation) -> bool {
    check_found(value, mode).is_ok()
}

/// Validate `value` as the payload of `dataset`
pub fn validate(dataset: Dataset, value: &Value, mode: FoundValidation) -> Result<(), FormatError> {
    let result = match dataset {
        Dataset::Plots => check_plots(value),
        Dataset::Pins => check_pins(value),
        Dataset::Found => check_found(value, mode),
    };
    result.map_err(|reason| FormatError::new(dataset, reason))
}

fn check_plots(value: &Value) -> Result<(), String> {
    let items = value.as_array().ok_or("expected an array")?;

    for (i, item) in items.iter().enumerate() {
        if !item.get("site").is_some_and(Value::is_string) {
            return Err(format!("element {i} has no string site"));
        }
        if !item.get("plotPlans").is_some_and(Value::is_array) {
            return Err(format!("element {i} has no plotPlans array"));
        }
    }
    Ok(())
}

fn check_pins(value: &Value) -> Result<(), String> {
    let items = value.as_array().ok_or("expected an array")?;

    for (i, item) in items.iter().enumerate() {
        if !item.get("icon").is_some_and(Value::is_string) {
            return Err(format!("element {i} has no string icon"));
        }
        let pos = item
            .get("pos")
            .filter(|p| p.is_object())
            .ok_or_else(|| format!("element {i} has no pos object"))?;
        for axis in ["x", "y"] {
            if !pos.get(axis).is_some_and(Value::is_number) {
                return Err(format!("element {i} has no numeric pos.{axis}"));
            }
        }
        if item
            .get("dimension")
            .is_some_and(|d| !d.is_string() && !d.is_null())
        {
            return Err(format!("element {i} has a non-string dimension"));
        }
    }
    Ok(())
}

fn check_found(value: &Value, mode: FoundValidation) -> Result<(), String> {
    let obj = value.as_object().ok_or("expected an object")?;
    let known = obj
        .keys()
        .filter(|k| FoundKey::from_any_name(k).is_some())
        .count();

    match mode {
        FoundValidation::Lenient => {
            if known == 0 && obj.len() != FoundKey::ALL.len() {
                return Err("no known found keys".to_string());
            }
        }
        FoundValidation::Strict => {
            if known == 0 {
                return Err("no known found keys".to_string());
            }
            if let Some((key, _)) = obj
                .iter()
                .find(|(k, v)| FoundKey::from_any_name(k).is_some() && !v.is_array())
            {
                return Err(format!("{key} is not an array"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plots() {
        assert!(is_valid_plots_export(&json!([])));
        assert!(is_valid_plots_export(
            &json!([{"site": "conservatory", "plotPlans": [{"plot": 1}]}])
        ));
        assert!(!is_valid_plots_export(&json!({"site": "x", "plotPlans": []})));
        assert!(!is_valid_plots_export(&json!([{"site": 3, "plotPlans": []}])));
        assert!(!is_valid_plots_export(&json!([{"site": "x"}])));
        assert!(!is_valid_plots_export(&json!([null])));
    }

    #[test]
    fn test_pins_accepts_empty_array() {
        assert!(is_valid_pins_export(&json!([])));
    }

    #[test]
    fn test_pins_rejects_missing_coordinates() {
        let ok = json!({"icon": "a", "pos": {"x": 1, "y": 2}});
        assert!(is_valid_pins_export(&json!([ok.clone()])));

        let no_x = json!({"icon": "a", "pos": {"y": 2}});
        let no_y = json!({"icon": "a", "pos": {"x": 1}});
        let string_x = json!({"icon": "a", "pos": {"x": "1", "y": 2}});
        let no_pos = json!({"icon": "a"});

        for bad in [no_x, no_y, string_x, no_pos] {
            assert!(!is_valid_pins_export(&json!([ok.clone(), bad])));
        }
        assert!(!is_valid_pins_export(&json!([{"pos": {"x": 1, "y": 2}}])));
    }

    #[test]
    fn test_pins_dimension_must_be_a_map_name() {
        let pos = json!({"x": 1, "y": 2});
        assert!(is_valid_pins_export(&json!([
            {"icon": "a", "pos": pos, "dimension": "sr2"},
            {"icon": "b", "pos": pos, "dimension": null},
        ])));

        for dimension in [json!(2), json!({"id": "sr2"}), json!(["sr1"]), json!(true)] {
            let pins = json!([{"icon": "a", "pos": pos, "dimension": dimension}]);
            assert!(!is_valid_pins_export(&pins), "accepted dimension {dimension}");
        }

        // Everything that passes must also load as typed records
        let accepted = json!([{"icon": "a", "pos": pos, "dimension": "sr1", "note": 3}]);
        assert!(is_valid_pins_export(&accepted));
        assert!(serde_json::from_value::<Vec<sr2map_shared::PinRecord>>(accepted).is_ok());
    }

    #[test]
    fn test_found_strict() {
        let mode = FoundValidation::Strict;
        assert!(is_valid_found_export(&json!({"gordos": ["g1"]}), mode));
        assert!(is_valid_found_export(&json!({"found_gordos": []}), mode));
        assert!(!is_valid_found_export(&json!({"gordos": "g1"}), mode));
        assert!(!is_valid_found_export(&json!([]), mode));

        let seven_unknown = json!({"a": [], "b": [], "c": [], "d": [], "e": [], "f": [], "g": []});
        assert!(!is_valid_found_export(&seven_unknown, mode));
    }

    #[test]
    fn test_found_lenient_keeps_cardinality_rule() {
        let mode = FoundValidation::Lenient;
        let seven_unknown = json!({"a": [], "b": [], "c": [], "d": [], "e": [], "f": [], "g": []});
        assert!(is_valid_found_export(&seven_unknown, mode));
        assert!(is_valid_found_export(&json!({"gordos": "g1"}), mode));
        assert!(!is_valid_found_export(&json!({"slimes": []}), mode));
    }

    #[test]
    fn test_validate_names_dataset() {
        let err = validate(Dataset::Pins, &json!({}), FoundValidation::Strict).unwrap_err();
        assert_eq!(err.dataset, Dataset::Pins);
        assert_eq!(err.reason, "expected an array");
    }
}
