use serde::{Deserialize, Serialize};
use validator::Validate;

use super::repo_types::{MacroTarget, NutritionProfile};
use crate::calculators::{ActivityLevel, Goal, MacroGrams, MacroSplit, Sex};
use crate::extract::positive;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    #[validate(range(min = 100.0, max = 250.0, message = "Height must be between 100 and 250 cm"))]
    pub height: f64,
    #[validate(range(min = 30.0, max = 300.0, message = "Weight must be between 30 and 300 kg"))]
    pub weight: f64,
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: u32,
    pub gender: Sex,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goal: Option<Goal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub bmr: f64,
    pub tdee: f64,
    pub goal: Goal,
    pub calorie_target: i64,
    pub macros: MacroGrams,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MacrosRequest {
    #[validate(range(min = 1000, max = 10000, message = "Calories must be between 1000 and 10000"))]
    pub calories: i64,
    #[serde(default)]
    pub split: Option<MacroSplit>,
    #[serde(default)]
    pub goal: Option<Goal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacrosResponse {
    pub calories: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<MacroSplit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    pub macros: MacroGrams,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub goal: Goal,
    #[validate(custom(function = "positive", message = "Height must be positive"))]
    pub height: f64,
    #[validate(custom(function = "positive", message = "Current weight must be positive"))]
    pub current_weight: f64,
    #[validate(custom(function = "positive", message = "Target weight must be positive"))]
    pub target_weight: Option<f64>,
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: Option<u32>,
    pub gender: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
    #[validate(custom(function = "positive", message = "Calorie target must be positive"))]
    pub calorie_target: f64,
    #[validate]
    pub macro_target: MacroTarget,
}

impl From<CreateProfileRequest> for NutritionProfile {
    fn from(r: CreateProfileRequest) -> Self {
        let mut profile = NutritionProfile {
            goal: r.goal,
            height: r.height,
            current_weight: r.current_weight,
            target_weight: r.target_weight,
            age: r.age,
            gender: r.gender,
            activity_level: r.activity_level,
            bmr: None,
            tdee: None,
            calorie_target: r.calorie_target,
            macro_target: r.macro_target,
        };
        profile.refresh_derived();
        profile
    }
}

/// Keys a profile update may touch; anything else rejects the request.
pub const ALLOWED_UPDATES: &[&str] = &[
    "goal",
    "height",
    "currentWeight",
    "targetWeight",
    "age",
    "gender",
    "activityLevel",
    "calorieTarget",
    "macroTarget",
];

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub goal: Option<Goal>,
    #[validate(custom(function = "positive", message = "Height must be positive"))]
    pub height: Option<f64>,
    #[validate(custom(function = "positive", message = "Current weight must be positive"))]
    pub current_weight: Option<f64>,
    #[validate(custom(function = "positive", message = "Target weight must be positive"))]
    pub target_weight: Option<f64>,
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: Option<u32>,
    pub gender: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
    #[validate(custom(function = "positive", message = "Calorie target must be positive"))]
    pub calorie_target: Option<f64>,
    #[validate]
    pub macro_target: Option<MacroTarget>,
}

impl UpdateProfileRequest {
    pub fn apply(self, p: &mut NutritionProfile) {
        if let Some(v) = self.goal {
            p.goal = v;
        }
        if let Some(v) = self.height {
            p.height = v;
        }
        if let Some(v) = self.current_weight {
            p.current_weight = v;
        }
        if self.target_weight.is_some() {
            p.target_weight = self.target_weight;
        }
        if self.age.is_some() {
            p.age = self.age;
        }
        if self.gender.is_some() {
            p.gender = self.gender;
        }
        if self.activity_level.is_some() {
            p.activity_level = self.activity_level;
        }
        if let Some(v) = self.calorie_target {
            p.calorie_target = v;
        }
        if let Some(v) = self.macro_target {
            p.macro_target = v;
        }
        p.refresh_derived();
    }
}

/// `{success: true, data}` envelope of the profile routes.
#[derive(Debug, Serialize)]
pub struct ProfileEnvelope {
    pub success: bool,
    pub data: NutritionProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn metrics_ranges() {
        let req: MetricsRequest = serde_json::from_str(
            r#"{"height": 90, "weight": 80, "age": 12, "gender": "female", "activityLevel": "very_active"}"#,
        )
        .unwrap();
        let errs = req.validate().unwrap_err();
        let fields = errs.field_errors();
        assert!(fields.contains_key("height"));
        assert!(fields.contains_key("age"));
        assert!(!fields.contains_key("weight"));
    }

    #[test]
    fn unknown_split_is_rejected_at_parse() {
        let res = serde_json::from_str::<MacrosRequest>(r#"{"calories": 2000, "split": "60-20-20"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn fractional_amounts_above_zero_are_accepted() {
        let create: CreateProfileRequest = serde_json::from_str(
            r#"{
                "goal": "lose", "height": 170, "currentWeight": 70, "targetWeight": 0.8,
                "calorieTarget": 1800,
                "macroTarget": { "macroSplit": "30-40-30", "protein": 180, "carbs": 135, "fat": 0.5 }
            }"#,
        )
        .unwrap();
        assert!(create.validate().is_ok());

        let update: UpdateProfileRequest =
            serde_json::from_str(r#"{"currentWeight": 0, "targetWeight": -1}"#).unwrap();
        let AppError::Validation(fields) = update.validate().unwrap_err().into() else {
            panic!("expected validation error");
        };
        let params: Vec<_> = fields.iter().map(|f| f.param.as_str()).collect();
        assert_eq!(params, vec!["currentWeight", "targetWeight"]);
        assert_eq!(fields[0].msg, "Current weight must be positive");
    }

    #[test]
    fn update_keeps_untouched_fields_and_recomputes() {
        let create: CreateProfileRequest = serde_json::from_str(
            r#"{
                "goal": "maintain", "height": 165, "currentWeight": 60,
                "calorieTarget": 2000,
                "macroTarget": { "macroSplit": "50-25-25", "protein": 125, "carbs": 250, "fat": 56 }
            }"#,
        )
        .unwrap();
        assert!(create.validate().is_ok());
        let mut profile = NutritionProfile::from(create);
        assert_eq!(profile.bmr, None);

        let update: UpdateProfileRequest = serde_json::from_str(
            r#"{"goal": "gain", "age": 25, "gender": "female", "activityLevel": "light"}"#,
        )
        .unwrap();
        update.apply(&mut profile);
        assert_eq!(profile.goal, Goal::Gain);
        assert_eq!(profile.height, 165.0);
        assert_eq!(profile.macro_target.macro_split, MacroSplit::HighCarb);
        assert!(profile.bmr.is_some());
        assert!(profile.tdee.unwrap() > profile.bmr.unwrap());
    }
}
