/// Logs a swallowed failure with the component that hit it.
pub(crate) fn log_warn<E: core::fmt::Display>(context: &str, error: E) {
    log::warn!("{context} - {error}");
}
