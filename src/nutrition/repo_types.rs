use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::calculators::{
    calories::{bmr, tdee},
    ActivityLevel, Goal, MacroSplit, Sex,
};
use crate::extract::positive;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MacroTarget {
    pub macro_split: MacroSplit,
    #[validate(custom(function = "positive", message = "Protein target must be positive"))]
    pub protein: f64,
    #[validate(custom(function = "positive", message = "Carbs target must be positive"))]
    pub carbs: f64,
    #[validate(custom(function = "positive", message = "Fat target must be positive"))]
    pub fat: f64,
}

/// Stored as JSONB on the user row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub goal: Goal,
    /// cm
    pub height: f64,
    /// kg
    pub current_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdee: Option<f64>,
    pub calorie_target: f64,
    pub macro_target: MacroTarget,
}

impl NutritionProfile {
    /// Recomputes bmr/tdee from the stored body metrics. Both are cleared
    /// when age, gender or activity level is unknown.
    pub fn refresh_derived(&mut self) {
        match (self.gender, self.age, self.activity_level) {
            (Some(sex), Some(age), Some(activity)) => {
                let b = bmr(sex, self.current_weight, self.height, age);
                self.bmr = Some(b.round());
                self.tdee = Some(tdee(b, activity).round());
            }
            _ => {
                self.bmr = None;
                self.tdee = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> NutritionProfile {
        NutritionProfile {
            goal: Goal::Lose,
            height: 180.0,
            current_weight: 80.0,
            target_weight: Some(75.0),
            age: Some(30),
            gender: Some(Sex::Male),
            activity_level: Some(ActivityLevel::Moderate),
            bmr: None,
            tdee: None,
            calorie_target: 2373.0,
            macro_target: MacroTarget {
                macro_split: MacroSplit::Balanced,
                protein: 178.0,
                carbs: 237.0,
                fat: 79.0,
            },
        }
    }

    #[test]
    fn derived_fields_follow_metrics() {
        let mut p = profile();
        p.refresh_derived();
        assert_eq!(p.bmr, Some(1854.0));
        assert_eq!(p.tdee, Some(2873.0));

        p.activity_level = None;
        p.refresh_derived();
        assert_eq!(p.bmr, None);
        assert_eq!(p.tdee, None);
    }

    #[test]
    fn serializes_camel_case_without_unknowns() {
        let mut p = profile();
        p.age = None;
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["currentWeight"], 80.0);
        assert_eq!(v["macroTarget"]["macroSplit"], "40-30-30");
        assert!(v.get("age").is_none());
        assert!(v.get("bmr").is_none());
    }
}
