//! Function-level retry resolution
//!
//! A function may carry at most one retry annotation, fixed delay or exponential backoff.
//! Arguments are validated strictly and the first violation aborts resolution, so a policy is
//! either fully valid or absent. A valid policy is rejected as well unless every binding of
//! the function supports function-level retry.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use fnmeta_manifest::timespan::parse_interval;
use fnmeta_manifest::{Diagnostic, DiagnosticId, RetryPolicy};

use crate::naming::{EXPONENTIAL_BACKOFF_RETRY_ATTRIBUTE, FIXED_DELAY_RETRY_ATTRIBUTE, WORKER_NAMESPACE};
use crate::symbols::{AnnotationSymbol, ArgumentValue};

const VALID_COUNT: &str = "integer greater than 0";
const VALID_INTERVAL: &str = "valid positive TimeSpan";

pub struct RetryPolicyResolver<'a> {
    location: Option<&'a Arc<str>>,
}

impl<'a> RetryPolicyResolver<'a> {
    /// Resolver reporting diagnostics at the function's location
    pub fn new(location: Option<&'a Arc<str>>) -> Self {
        RetryPolicyResolver { location }
    }

    pub fn is_retry_annotation(annotation: &AnnotationSymbol) -> bool {
        annotation.is(WORKER_NAMESPACE, FIXED_DELAY_RETRY_ATTRIBUTE)
            || annotation.is(WORKER_NAMESPACE, EXPONENTIAL_BACKOFF_RETRY_ATTRIBUTE)
    }

    /// Resolve the policy declared among `annotations`
    pub fn resolve<'s, I>(
        &self,
        annotations: I,
        retry_supported: bool,
    ) -> Result<Option<RetryPolicy>, Diagnostic>
    where
        I: IntoIterator<Item = &'s AnnotationSymbol>,
    {
        let mut retries = annotations
            .into_iter()
            .filter(|a| Self::is_retry_annotation(a));
        let Some(annotation) = retries.next() else {
            return Ok(None);
        };
        if retries.next().is_some() {
            return Err(self.invalid_argument("retry attribute", "at most 1"));
        }

        let policy = if annotation.class_name.as_ref() == FIXED_DELAY_RETRY_ATTRIBUTE {
            self.fixed_delay(annotation)?
        } else {
            self.exponential_backoff(annotation)?
        };

        if !retry_supported {
            return Err(Diagnostic::new(
                DiagnosticId::InvalidRetryOptions,
                self.location.cloned(),
                &[],
            ));
        }

        debug!("Resolved retry policy: {}", policy);
        Ok(Some(policy))
    }

    fn fixed_delay(&self, annotation: &AnnotationSymbol) -> Result<RetryPolicy, Diagnostic> {
        Ok(RetryPolicy::FixedDelay {
            max_retry_count: self.max_retry_count(annotation)?,
            delay_interval: self.interval(annotation, "delayInterval", 1)?,
        })
    }

    fn exponential_backoff(&self, annotation: &AnnotationSymbol) -> Result<RetryPolicy, Diagnostic> {
        let max_retry_count = self.max_retry_count(annotation)?;
        let minimum_interval = self.interval(annotation, "minimumInterval", 1)?;
        let maximum_interval = self.interval(annotation, "maximumInterval", 2)?;
        if minimum_interval > maximum_interval {
            return Err(self.invalid_argument(
                "minimumInterval",
                "not be greater than the maximumInterval",
            ));
        }
        Ok(RetryPolicy::ExponentialBackoff {
            max_retry_count,
            minimum_interval,
            maximum_interval,
        })
    }

    fn max_retry_count(&self, annotation: &AnnotationSymbol) -> Result<u32, Diagnostic> {
        argument(annotation, "maxRetryCount", 0)
            .and_then(ArgumentValue::as_int)
            .filter(|count| *count > 0)
            .and_then(|count| u32::try_from(count).ok())
            .ok_or_else(|| self.invalid_argument("maxRetryCount", VALID_COUNT))
    }

    fn interval(
        &self,
        annotation: &AnnotationSymbol,
        name: &str,
        index: usize,
    ) -> Result<Duration, Diagnostic> {
        argument(annotation, name, index)
            .and_then(ArgumentValue::as_str)
            .and_then(parse_interval)
            .ok_or_else(|| self.invalid_argument(name, VALID_INTERVAL))
    }

    fn invalid_argument(&self, argument: &str, requirement: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidRetryArgument,
            self.location.cloned(),
            &[argument, requirement],
        )
    }
}

/// Argument by parameter name, falling back to its constructor position
fn argument<'a>(annotation: &'a AnnotationSymbol, name: &str, index: usize) -> Option<&'a ArgumentValue> {
    annotation
        .argument(name)
        .or_else(|| annotation.arguments.get(index).map(|a| &a.value))
}
