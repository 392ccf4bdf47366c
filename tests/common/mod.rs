use std::sync::Once;

use wiremock::MockServer;

static TRACING: Once = Once::new();

/// Install the env-filtered test subscriber once per test binary.
/// Run with `RUST_LOG=userlink=debug` to see token-cache activity.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Start a mock server with test logging initialized.
pub async fn start_server() -> MockServer {
    init_tracing();
    MockServer::start().await
}
