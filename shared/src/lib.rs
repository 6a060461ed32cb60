pub mod config;
pub mod telemetry;

/// Install the global tracing subscriber for the calling binary.
#[macro_export]
macro_rules! init_tracing {
    () => {
        $crate::telemetry::init(env!("CARGO_PKG_NAME"))
    };
}
