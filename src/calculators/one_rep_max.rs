use serde::Serialize;

use super::CalcError;

/// Brzycki estimate, only trusted for sets of 1 to 10 reps.
pub fn one_rep_max(weight: f64, reps: u32) -> Result<f64, CalcError> {
    if weight.is_nan() || weight <= 0.0 {
        return Err(CalcError::NonPositive("weight"));
    }
    if !(1..=10).contains(&reps) {
        return Err(CalcError::RepsOutOfRange);
    }
    if reps == 1 {
        return Ok(weight);
    }
    Ok((weight * (36.0 / (37.0 - f64::from(reps)))).round())
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingWeights {
    pub warmup: f64,
    pub endurance: f64,
    pub hypertrophy: f64,
    pub strength: f64,
    pub max_effort: f64,
}

pub fn training_weights(one_rep_max: f64) -> TrainingWeights {
    let pct = |p: f64| (one_rep_max * p).round();
    TrainingWeights {
        warmup: pct(0.50),
        endurance: pct(0.60),
        hypertrophy: pct(0.70),
        strength: pct(0.85),
        max_effort: pct(0.95),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rep_is_identity() {
        assert_eq!(one_rep_max(100.0, 1), Ok(100.0));
        assert_eq!(one_rep_max(62.5, 1), Ok(62.5));
    }

    #[test]
    fn brzycki_rounds() {
        // 100 * 36 / 32 = 112.5
        assert_eq!(one_rep_max(100.0, 5), Ok(113.0));
        assert_eq!(one_rep_max(80.0, 10), Ok(107.0));
    }

    #[test]
    fn rejects_reps_outside_range() {
        assert_eq!(one_rep_max(100.0, 0), Err(CalcError::RepsOutOfRange));
        assert_eq!(one_rep_max(100.0, 11), Err(CalcError::RepsOutOfRange));
    }

    #[test]
    fn rejects_non_positive_weight() {
        assert_eq!(one_rep_max(0.0, 3), Err(CalcError::NonPositive("weight")));
        assert_eq!(one_rep_max(-5.0, 3), Err(CalcError::NonPositive("weight")));
        assert_eq!(one_rep_max(f64::NAN, 3), Err(CalcError::NonPositive("weight")));
    }

    #[test]
    fn percentage_table() {
        let t = training_weights(200.0);
        assert_eq!(t.warmup, 100.0);
        assert_eq!(t.endurance, 120.0);
        assert_eq!(t.hypertrophy, 140.0);
        assert_eq!(t.strength, 170.0);
        assert_eq!(t.max_effort, 190.0);
    }
}
