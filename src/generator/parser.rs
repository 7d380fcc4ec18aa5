use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use validator::Validate;

use super::client::ChatCompletion;
use super::error::PlanParseError;
use crate::workouts::repo_types::{AlternateExercise, Exercise, PlanDraft, RequestParams, Session};

lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").unwrap();
    static ref DIGITS_RE: Regex = Regex::new(r"\d+").unwrap();
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn as_count(&self, field: &'static str) -> Result<i32, PlanParseError> {
        let invalid = || PlanParseError::InvalidField {
            field,
            value: self.as_text(),
        };
        let n = match self {
            Scalar::Int(n) => *n,
            Scalar::Float(f) => f.round() as i64,
            // "3", "3 sets", "3-4" all read as the leading number
            Scalar::Text(s) => DIGITS_RE
                .find(s)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .ok_or_else(invalid)?,
        };
        i32::try_from(n).ok().filter(|n| *n >= 1).ok_or_else(invalid)
    }

    fn as_text(&self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AiPlan {
    #[serde(rename = "Plan_Name")]
    plan_name: String,
    #[serde(rename = "Program_Theme", default)]
    program_theme: String,
    #[serde(rename = "Strong_Points", default)]
    strong_points: Vec<String>,
    #[serde(rename = "Neutral_Points", default)]
    neutral_points: Vec<String>,
    #[serde(rename = "Weak_Points", default)]
    weak_points: Vec<String>,
    #[serde(rename = "Training_Days")]
    training_days: Scalar,
    #[serde(rename = "Workout_Schedule")]
    workout_schedule: Vec<AiSession>,
}

#[derive(Debug, Deserialize)]
struct AiSession {
    #[serde(rename = "Workout_Day")]
    workout_day: Option<Scalar>,
    #[serde(rename = "Focus_Areas", default)]
    focus_areas: Vec<String>,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
    #[serde(rename = "Exercises", default)]
    exercises: Vec<AiExercise>,
}

#[derive(Debug, Deserialize)]
struct AiExercise {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Sets")]
    sets: Scalar,
    #[serde(rename = "Reps")]
    reps: Scalar,
    #[serde(rename = "Alternates", alias = "Alternatives", default)]
    alternates: Vec<AiAlternate>,
}

#[derive(Debug, Deserialize)]
struct AiAlternate {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Sets")]
    sets: Scalar,
    #[serde(rename = "Reps")]
    reps: Scalar,
}

fn strip_fence(text: &str) -> &str {
    match FENCE_RE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Day number from `Workout_Day`, or the 1-based position when the label
/// carries no usable number.
fn session_order(day: Option<&Scalar>, position: usize) -> i32 {
    let parsed = match day {
        Some(Scalar::Int(n)) => i32::try_from(*n).ok(),
        Some(Scalar::Text(s)) => DIGITS_RE.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    };
    parsed
        .filter(|n| *n >= 1)
        .unwrap_or_else(|| i32::try_from(position + 1).unwrap_or(i32::MAX))
}

/// Maps a chat-completion reply onto the plan document shape.
pub fn parse_workout_plan(completion: &ChatCompletion) -> Result<PlanDraft, PlanParseError> {
    let choice = completion
        .choices
        .first()
        .ok_or(PlanParseError::NoChoices)?;

    let plan: AiPlan = match &choice.message.content {
        Value::String(text) => serde_json::from_str(strip_fence(text))?,
        obj @ Value::Object(_) => serde_json::from_value(obj.clone())?,
        _ => return Err(PlanParseError::MissingContent),
    };

    let training_days = plan.training_days.as_count("Training_Days")?;
    if plan.workout_schedule.is_empty() {
        return Err(PlanParseError::InvalidField {
            field: "Workout_Schedule",
            value: "[]".into(),
        });
    }

    let mut sessions = Vec::with_capacity(plan.workout_schedule.len());
    for (idx, s) in plan.workout_schedule.into_iter().enumerate() {
        let mut exercises = Vec::with_capacity(s.exercises.len());
        for e in s.exercises {
            let mut alternates = Vec::with_capacity(e.alternates.len());
            for a in e.alternates {
                alternates.push(AlternateExercise {
                    name: a.name.trim().to_string(),
                    sets: a.sets.as_count("Sets")?,
                    rep_range: a.reps.as_text(),
                });
            }
            exercises.push(Exercise {
                name: e.name.trim().to_string(),
                sets: e.sets.as_count("Sets")?,
                rep_range: e.reps.as_text(),
                alternates,
            });
        }
        let session = Session {
            session_order: session_order(s.workout_day.as_ref(), idx),
            focus_areas: s.focus_areas,
            exercises,
            notes: s.notes.unwrap_or_default(),
        };
        // same rules an admin-authored session has to pass
        session
            .validate()
            .map_err(|errors| PlanParseError::InvalidSession {
                order: session.session_order,
                errors,
            })?;
        sessions.push(session);
    }

    Ok(PlanDraft {
        request_params: Some(RequestParams {
            plan_name: Some(plan.plan_name.clone()),
            training_days: Some(training_days),
            archetype: None,
        }),
        plan_name: plan.plan_name,
        program_theme: plan.program_theme,
        prioritized_muscles: plan.strong_points,
        neutral_points: plan.neutral_points,
        weak_points: plan.weak_points,
        training_days,
        sessions,
        created_at: OffsetDateTime::from_unix_timestamp(completion.created).ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::generator::client::{Choice, ChoiceMessage};
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "Plan_Name": "Asgardian Power",
        "Program_Theme": "Thor",
        "Strong_Points": ["Shoulders", "Back"],
        "Neutral_Points": ["Chest"],
        "Weak_Points": ["Calves"],
        "Training_Days": 3,
        "Workout_Schedule": [
            {
                "Workout_Day": "Day 1",
                "Focus_Areas": ["Shoulders", "Triceps"],
                "Notes": "Heavy overhead work",
                "Exercises": [
                    { "Name": "Overhead Press", "Sets": 4, "Reps": "5-8",
                      "Alternates": [{ "Name": "Push Press", "Sets": "4", "Reps": 6 }] },
                    { "Name": "Lateral Raise", "Sets": "3", "Reps": "AMRAP" }
                ]
            },
            {
                "Workout_Day": "Day 2",
                "Focus_Areas": ["Back"],
                "Exercises": [
                    { "Name": "Deadlift", "Sets": 5, "Reps": 5 },
                    { "Name": "Farmer Carry", "Sets": 3, "Reps": "40m" }
                ]
            },
            {
                "Workout_Day": "Rest then legs",
                "Exercises": [{ "Name": "Plank", "Sets": 3, "Reps": " 60s " }]
            }
        ]
    }"#;

    fn completion(content: Value) -> ChatCompletion {
        ChatCompletion {
            id: Some("chatcmpl-test".into()),
            created: 1_717_171_717,
            model: None,
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: Some("assistant".into()),
                    content,
                },
                finish_reason: Some("stop".into()),
            }],
        }
    }

    #[test]
    fn maps_sample_reply_onto_plan_shape() {
        let draft = parse_workout_plan(&completion(Value::String(SAMPLE.into()))).unwrap();
        assert_eq!(draft.plan_name, "Asgardian Power");
        assert_eq!(draft.program_theme, "Thor");
        assert_eq!(draft.prioritized_muscles, vec!["Shoulders", "Back"]);
        assert_eq!(draft.weak_points, vec!["Calves"]);
        assert_eq!(draft.training_days, 3);
        assert_eq!(draft.sessions.len(), 3);

        let day1 = &draft.sessions[0];
        assert_eq!(day1.session_order, 1);
        assert_eq!(day1.notes, "Heavy overhead work");
        assert_eq!(day1.exercises[0].name, "Overhead Press");
        assert_eq!(day1.exercises[0].sets, 4);
        assert_eq!(day1.exercises[0].rep_range, "5-8");
        assert_eq!(
            day1.exercises[0].alternates,
            vec![AlternateExercise {
                name: "Push Press".into(),
                sets: 4,
                rep_range: "6".into(),
            }]
        );
        assert_eq!(day1.exercises[1].sets, 3);
        assert_eq!(day1.exercises[1].rep_range, "AMRAP");

        assert_eq!(draft.sessions[1].exercises[1].rep_range, "40m");
        assert_eq!(draft.sessions[1].notes, "");
        // no digits in the day label: falls back to position
        assert_eq!(draft.sessions[2].session_order, 3);
        assert_eq!(draft.sessions[2].exercises[0].rep_range, "60s");

        assert_eq!(
            draft.created_at.unwrap().unix_timestamp(),
            1_717_171_717
        );
        let params = draft.request_params.unwrap();
        assert_eq!(params.plan_name.as_deref(), Some("Asgardian Power"));
        assert_eq!(params.training_days, Some(3));
    }

    #[test]
    fn accepts_object_content_and_code_fences() {
        let value: Value = serde_json::from_str(SAMPLE).unwrap();
        let from_obj = parse_workout_plan(&completion(value)).unwrap();
        let fenced = format!("```json\n{SAMPLE}\n```");
        let from_fence = parse_workout_plan(&completion(Value::String(fenced))).unwrap();
        assert_eq!(from_obj, from_fence);
    }

    #[test]
    fn malformed_reply_is_a_parse_error() {
        let err = parse_workout_plan(&completion(json!("Sure! Here is your plan:"))).unwrap_err();
        assert!(matches!(err, PlanParseError::Json(_)));

        let err = parse_workout_plan(&completion(Value::Null)).unwrap_err();
        assert!(matches!(err, PlanParseError::MissingContent));

        let mut empty = completion(Value::Null);
        empty.choices.clear();
        assert!(matches!(
            parse_workout_plan(&empty).unwrap_err(),
            PlanParseError::NoChoices
        ));
    }

    fn single_session(session: Value) -> ChatCompletion {
        completion(json!({
            "Plan_Name": "x", "Training_Days": 3, "Workout_Schedule": [session]
        }))
    }

    #[test]
    fn non_positive_day_falls_back_to_position() {
        let reply = json!({
            "Plan_Name": "x", "Training_Days": 3,
            "Workout_Schedule": [
                { "Workout_Day": 0, "Exercises": [{ "Name": "Squat", "Sets": 5, "Reps": 5 }] },
                { "Workout_Day": -4, "Exercises": [{ "Name": "Bench", "Sets": 5, "Reps": 5 }] }
            ]
        });
        let draft = parse_workout_plan(&completion(reply)).unwrap();
        let orders: Vec<_> = draft.sessions.iter().map(|s| s.session_order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn sessions_breaking_plan_rules_are_rejected() {
        let empty = single_session(json!({ "Workout_Day": 0, "Exercises": [] }));
        assert!(matches!(
            parse_workout_plan(&empty).unwrap_err(),
            PlanParseError::InvalidSession { order: 1, .. }
        ));

        let blank = single_session(json!({
            "Workout_Day": -4,
            "Exercises": [{ "Name": " ", "Sets": 3, "Reps": "" }]
        }));
        let PlanParseError::InvalidSession { errors, .. } = parse_workout_plan(&blank).unwrap_err()
        else {
            panic!("expected invalid session");
        };
        let AppError::Validation(fields) = errors.into() else {
            panic!("expected validation error");
        };
        let params: Vec<_> = fields.iter().map(|f| f.param.as_str()).collect();
        assert_eq!(params, vec!["exercises[0].name", "exercises[0].repRange"]);

        let blank_alternate = single_session(json!({
            "Workout_Day": 1,
            "Exercises": [{ "Name": "Row", "Sets": 3, "Reps": 10,
                            "Alternates": [{ "Name": "", "Sets": 3, "Reps": 10 }] }]
        }));
        assert!(parse_workout_plan(&blank_alternate).is_err());
    }

    #[test]
    fn invalid_session_surfaces_as_plan_parse_failure() {
        let reply = single_session(json!({ "Workout_Day": 1, "Exercises": [] }));
        let err = AppError::from(parse_workout_plan(&reply).unwrap_err());
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn zero_sets_are_rejected() {
        let reply = json!({
            "Plan_Name": "x", "Training_Days": 3,
            "Workout_Schedule": [{ "Workout_Day": 1, "Exercises": [{ "Name": "Row", "Sets": 0, "Reps": 10 }] }]
        });
        let err = parse_workout_plan(&completion(reply)).unwrap_err();
        assert!(matches!(err, PlanParseError::InvalidField { field: "Sets", .. }));
    }
}
