//! Validated query extractor - Query-string counterpart of `ValidatedJson`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::validated_json::format_validation_errors;
use crate::errors::AppError;

/// Query-string extractor whose rejections use the standard error envelope.
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(format_validation_errors(&e)))?;

        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Window {
        #[validate(range(min = 1, max = 31, message = "days must be between 1 and 31"))]
        days: Option<u32>,
    }

    async fn extract(uri: &str) -> Result<ValidatedQuery<Window>, AppError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ValidatedQuery::<Window>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_query_parsed_and_validated() {
        let ValidatedQuery(window) = extract("/x?days=5").await.unwrap();
        assert_eq!(window.days, Some(5));
        let ValidatedQuery(window) = extract("/x").await.unwrap();
        assert_eq!(window.days, None);
    }

    #[tokio::test]
    async fn test_bad_query_is_validation_error() {
        assert!(matches!(extract("/x?days=abc").await, Err(AppError::Validation(_))));
        assert!(matches!(
            extract("/x?days=0").await,
            Err(AppError::Validation(ref m)) if m == "days must be between 1 and 31"
        ));
    }
}
