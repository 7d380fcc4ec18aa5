use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

pub(crate) fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::invalid("body", e.body_text()),
        JsonRejection::JsonSyntaxError(_) => AppError::BadRequest("Malformed JSON body".into()),
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected Content-Type: application/json".into())
        }
        other => AppError::BadRequest(other.body_text()),
    }
}

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
}

pub(crate) fn contains_html(value: &str) -> bool {
    HTML_TAG_RE.is_match(value)
}

/// `validator` custom rule rejecting free text that carries markup.
pub(crate) fn reject_html(value: &str) -> Result<(), ValidationError> {
    if contains_html(value) {
        let mut err = ValidationError::new("html");
        err.message = Some("cannot contain HTML tags".into());
        return Err(err);
    }
    Ok(())
}

/// Non-blank free text without markup.
pub(crate) fn plain_text(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    reject_html(value)
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Strictly greater than zero; NaN fails too.
pub(crate) fn positive(value: f64) -> Result<(), ValidationError> {
    if value > 0.0 {
        return Ok(());
    }
    let mut err = ValidationError::new("positive");
    err.message = Some("must be greater than 0".into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_detection() {
        assert!(contains_html("<script>alert(1)</script>"));
        assert!(contains_html("Goku <b>SSJ</b>"));
        assert!(!contains_html("Goku 3 < 4"));
        assert!(reject_html("plain name").is_ok());
        assert!(reject_html("<img src=x>").is_err());
    }

    #[test]
    fn blank_detection() {
        assert!(not_blank("   ").is_err());
        assert!(not_blank(" x ").is_ok());
        assert!(plain_text(" ").is_err());
        assert!(plain_text("<i>x</i>").is_err());
        assert!(plain_text("Leg day").is_ok());
    }

    #[test]
    fn positive_is_exclusive_of_zero() {
        assert!(positive(0.5).is_ok());
        assert!(positive(0.0).is_err());
        assert!(positive(-2.0).is_err());
        assert!(positive(f64::NAN).is_err());
    }
}
