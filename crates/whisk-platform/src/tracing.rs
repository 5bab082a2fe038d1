//! # Tracing Setup
//!
//! Stores and orchestrators log with structured fields (`kind`, `key`,
//! `name`, `stage`, `error`) rather than interpolated strings, so output can
//! be filtered per resource kind:
//!
//! ```bash
//! RUST_LOG=info whisk-deploy deploy --config serverless.yml
//! RUST_LOG=whisk_platform=debug,info whisk-deploy info --config serverless.yml
//! ```

/// Initializes the global subscriber, filtered by `RUST_LOG`.
///
/// Call once, from the binary. Compact format keeps instrumented spans
/// inline (`deploy_stage{stage="rules"}: ...`).
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
