//! ---
//! simcon_section: "03-logging"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Structured logging adapters and sinks."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
/// Emit an informational log enriched with SIMCON context.
#[macro_export]
macro_rules! scn_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            component = ctx.component.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            state = ctx.state.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::INFO,
            component = ctx.component.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            state = ctx.state.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit a debug log enriched with SIMCON context.
#[macro_export]
macro_rules! scn_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            component = ctx.component.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            state = ctx.state.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::DEBUG,
            component = ctx.component.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            state = ctx.state.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an error log enriched with SIMCON context.
#[macro_export]
macro_rules! scn_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            component = ctx.component.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            state = ctx.state.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::ERROR,
            component = ctx.component.unwrap_or(""),
            action = ctx.action.unwrap_or(""),
            state = ctx.state.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}
