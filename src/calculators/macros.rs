use serde::{Deserialize, Serialize};

use super::Goal;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Preset percentage splits, written carbs-protein-fat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MacroSplit {
    #[serde(rename = "40-30-30")]
    Balanced,
    #[serde(rename = "50-25-25")]
    HighCarb,
    #[serde(rename = "30-40-30")]
    HighProtein,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratios {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroSplit {
    pub fn ratios(self) -> Ratios {
        match self {
            MacroSplit::Balanced => Ratios { protein: 0.30, carbs: 0.40, fat: 0.30 },
            MacroSplit::HighCarb => Ratios { protein: 0.25, carbs: 0.50, fat: 0.25 },
            MacroSplit::HighProtein => Ratios { protein: 0.40, carbs: 0.30, fat: 0.30 },
        }
    }
}

impl Goal {
    pub fn macro_ratios(self) -> Ratios {
        match self {
            Goal::Maintain => Ratios { protein: 0.30, carbs: 0.40, fat: 0.30 },
            Goal::Gain => Ratios { protein: 0.35, carbs: 0.45, fat: 0.20 },
            Goal::Lose => Ratios { protein: 0.40, carbs: 0.35, fat: 0.25 },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroGrams {
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
}

impl MacroGrams {
    pub fn kcal(&self) -> i64 {
        self.protein * 4 + self.carbs * 4 + self.fat * 9
    }
}

pub fn macros_from_ratios(calories: f64, r: Ratios) -> MacroGrams {
    MacroGrams {
        protein: (calories * r.protein / KCAL_PER_G_PROTEIN).round() as i64,
        carbs: (calories * r.carbs / KCAL_PER_G_CARBS).round() as i64,
        fat: (calories * r.fat / KCAL_PER_G_FAT).round() as i64,
    }
}

pub fn macros_for_goal(calories: f64, goal: Goal) -> MacroGrams {
    macros_from_ratios(calories, goal.macro_ratios())
}

pub fn macros_for_split(calories: f64, split: MacroSplit) -> MacroGrams {
    macros_from_ratios(calories, split.ratios())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maintain_2000() {
        let m = macros_for_goal(2000.0, Goal::Maintain);
        assert_eq!(m, MacroGrams { protein: 150, carbs: 200, fat: 67 });
    }

    #[test]
    fn grams_resum_to_calories_within_rounding() {
        for kcal in [1200.0, 1850.0, 2437.0, 3100.0, 4999.0] {
            for goal in [Goal::Maintain, Goal::Lose, Goal::Gain] {
                let m = macros_for_goal(kcal, goal);
                let diff = (m.kcal() as f64 - kcal).abs();
                assert!(diff <= 8.5, "{kcal} {goal:?} -> {m:?} off by {diff}");
            }
            for split in [MacroSplit::Balanced, MacroSplit::HighCarb, MacroSplit::HighProtein] {
                let m = macros_for_split(kcal, split);
                assert!((m.kcal() as f64 - kcal).abs() <= 8.5);
            }
        }
    }

    #[test]
    fn split_reads_carbs_first() {
        let m = macros_for_split(2000.0, MacroSplit::HighCarb);
        assert_eq!(m.carbs, 250);
        assert_eq!(m.protein, 125);
        let s: MacroSplit = serde_json::from_str("\"30-40-30\"").unwrap();
        assert_eq!(s, MacroSplit::HighProtein);
    }
}
