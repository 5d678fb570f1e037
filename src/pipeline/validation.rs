use async_trait::async_trait;

use super::{Next, PipelineBehavior, Request};
use crate::error::{AppError, AppResult};

/// Rejects requests whose own rules fail before any other stage runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationBehavior;

#[async_trait]
impl PipelineBehavior for ValidationBehavior {
    async fn handle<R: Request>(&self, request: R, next: Next<'_, R>) -> AppResult<R::Response> {
        if let Err(errors) = request.validate() {
            tracing::info!("Request rejected by validation: {:?}", errors);
            return Err(AppError::Validation(errors));
        }
        next.run(request).await
    }
}

/// Collects rule failures for one request.
#[derive(Debug, Default)]
pub struct Rules {
    errors: Vec<String>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    pub fn required(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        let present = value.is_some_and(|v| !v.trim().is_empty());
        self.check(present, format!("{} is required.", field))
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        let fits = value.is_none_or(|v| v.chars().count() <= max);
        self.check(fits, format!("{} must not exceed {} characters.", field, max))
    }

    pub fn positive(&mut self, field: &str, value: i64) -> &mut Self {
        self.check(value > 0, format!("{} must be greater than 0.", field))
    }

    pub fn finish(&mut self) -> Result<(), Vec<String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}
