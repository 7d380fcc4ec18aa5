use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    #[serde(alias = "veryActive")]
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Maintain,
    Lose,
    Gain,
}

impl Goal {
    /// Daily kcal adjustment applied on top of TDEE.
    pub fn calorie_offset(self) -> i64 {
        match self {
            Goal::Maintain => 0,
            Goal::Lose => -500,
            Goal::Gain => 500,
        }
    }
}

/// Harris-Benedict (revised) basal metabolic rate in kcal/day.
///
/// Anything other than `Male` uses the female coefficients.
pub fn bmr(sex: Sex, weight_kg: f64, height_cm: f64, age: u32) -> f64 {
    let age = f64::from(age);
    match sex {
        Sex::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        Sex::Female | Sex::Other => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
    }
}

pub fn tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.multiplier()
}

pub fn daily_calories(
    sex: Sex,
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    activity: ActivityLevel,
    goal: Goal,
) -> i64 {
    let maintenance = tdee(bmr(sex, weight_kg, height_cm, age), activity).round() as i64;
    maintenance + goal.calorie_offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn male_bmr_matches_formula() {
        let v = bmr(Sex::Male, 80.0, 180.0, 30);
        assert!((v - 1853.632).abs() < 1e-9, "{v}");
    }

    #[test]
    fn non_male_uses_female_coefficients() {
        let female = bmr(Sex::Female, 60.0, 165.0, 25);
        assert!((female - 1405.333).abs() < 1e-9, "{female}");
        assert_eq!(female, bmr(Sex::Other, 60.0, 165.0, 25));
    }

    #[test]
    fn tdee_scales_by_activity() {
        assert!((tdee(1000.0, ActivityLevel::Sedentary) - 1200.0).abs() < 1e-9);
        assert!((tdee(1000.0, ActivityLevel::VeryActive) - 1900.0).abs() < 1e-9);
    }

    #[test]
    fn lose_and_gain_offset_maintenance_by_500() {
        let args = (Sex::Male, 82.5, 178.0, 34, ActivityLevel::Moderate);
        let maintain = daily_calories(args.0, args.1, args.2, args.3, args.4, Goal::Maintain);
        let lose = daily_calories(args.0, args.1, args.2, args.3, args.4, Goal::Lose);
        let gain = daily_calories(args.0, args.1, args.2, args.3, args.4, Goal::Gain);
        assert_eq!(lose, maintain - 500);
        assert_eq!(gain, maintain + 500);
    }

    #[test]
    fn activity_level_accepts_both_spellings() {
        let a: ActivityLevel = serde_json::from_str("\"very_active\"").unwrap();
        let b: ActivityLevel = serde_json::from_str("\"veryActive\"").unwrap();
        assert_eq!(a, b);
    }
}
