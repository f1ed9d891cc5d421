//! Logging integration for djformtags.
//!
//! Provides [`setup_logging`] for installing a [`tracing`] subscriber from
//! [`Settings`](crate::settings::Settings), and [`render_span`] for grouping
//! the events of a single template render.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`; an invalid directive falls
/// back to `info`. Debug mode uses pretty, human-readable output; otherwise
/// events are emitted as JSON. Calling this more than once is harmless: the
/// first installed subscriber wins.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for rendering the named template.
///
/// ```
/// use djformtags_core::logging::render_span;
///
/// let span = render_span("formtags/field.html");
/// let _guard = span.enter();
/// tracing::debug!("rendering");
/// ```
pub fn render_span(template_name: &str) -> tracing::Span {
    tracing::debug_span!("render", template = template_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        let settings = Settings {
            log_level: "not a [valid directive".to_string(),
            ..Settings::default()
        };
        setup_logging(&settings);
        setup_logging(&Settings::default());
    }

    #[test]
    fn test_render_span_enters() {
        let span = render_span("row.html");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
