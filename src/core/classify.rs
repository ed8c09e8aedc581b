//! Single place deciding whether a failed lookup is surfaced or shown as "no data".

use crate::core::{Detail, EsgError, Provider, ProviderOutcome, Severity};

/// `>= 500` is serious, everything else is benign.
pub(crate) fn classify_status(status: u16) -> Severity {
    if status >= 500 {
        Severity::Serious
    } else {
        Severity::Benign
    }
}

pub(crate) fn classify_error(err: &EsgError) -> Severity {
    match err {
        EsgError::Status { status, .. } | EsgError::ServerError { status, .. } => {
            classify_status(*status)
        }
        EsgError::Http(e) => match e.status() {
            Some(status) => classify_status(status.as_u16()),
            None if e.is_decode() => Severity::Benign,
            None => Severity::Serious,
        },
        EsgError::NotFound { .. }
        | EsgError::RateLimited { .. }
        | EsgError::Url(_)
        | EsgError::Json(_)
        | EsgError::Data(_)
        | EsgError::InvalidParams(_)
        | EsgError::UnsupportedProvider(_) => Severity::Benign,
    }
}

/// Converts an adapter's internal lookup result into an outcome and logs it.
pub(crate) fn settle(
    provider: Provider,
    company: &str,
    result: Result<Option<Detail>, EsgError>,
) -> ProviderOutcome {
    match result {
        Ok(Some(detail)) => ProviderOutcome::Found(detail),
        Ok(None) => {
            tracing::debug!(provider = %provider, company, "no matching company");
            ProviderOutcome::NotFound
        }
        Err(e) => match classify_error(&e) {
            Severity::Serious => {
                tracing::error!(provider = %provider, company, error = %e, "provider lookup failed");
                ProviderOutcome::serious(format!("{provider} error: {e}"))
            }
            Severity::Benign => {
                tracing::warn!(provider = %provider, company, error = %e, "provider returned no usable data");
                ProviderOutcome::benign(e.to_string())
            }
        },
    }
}
