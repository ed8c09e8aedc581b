use crate::core::EsgError;

/// Read the response body as text, mapping unsuccessful statuses to `EsgError`.
/// With `debug-dumps` and `ESG_RECORD=1`, the body is also written to `ESG_FIXDIR`.
pub(crate) async fn get_text(
    resp: reqwest::Response,
    _endpoint: &str,
    _company: &str,
    _ext: &str,
) -> Result<String, EsgError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(EsgError::from_status(status.as_u16(), resp.url()));
    }
    let text = resp.text().await?;

    #[cfg(feature = "debug-dumps")]
    {
        if std::env::var("ESG_RECORD").ok().as_deref() == Some("1")
            && let Err(e) = crate::core::fixtures::record_body(_endpoint, _company, _ext, &text)
        {
            tracing::warn!(company = _company, error = %e, "failed to record response body");
        }
    }

    Ok(text)
}
