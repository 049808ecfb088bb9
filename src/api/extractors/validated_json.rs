//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;

/// JSON body that has passed its `validator` rules.
///
/// Every failed rule is reported, one message per entry.
///
/// ```rust,ignore
/// async fn place_bid(ValidatedJson(payload): ValidatedJson<PlaceBidRequest>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(validation_messages(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// One message per failed rule, ordered by field name.
fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct Sample {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
        password: String,
    }

    #[test]
    fn every_failed_rule_is_listed() {
        let sample = Sample {
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let errors = sample.validate().unwrap_err();

        assert_eq!(
            validation_messages(&errors),
            vec![
                "Invalid email format".to_string(),
                "Password must be at least 8 characters".to_string(),
            ]
        );
    }
}
