/// Emit a `tracing` debug event when the runtime debug flag is on
///
/// Accepts the same arguments as `tracing::debug!` and always uses the
/// `locus` target.
macro_rules! debug_event {
    ($($arg:tt)+) => {
        if $crate::config::is_debug() {
            ::tracing::debug!(target: "locus", $($arg)+);
        }
    };
}

pub(crate) use debug_event;
