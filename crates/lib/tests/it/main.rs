/*! Integration tests for Latchkey.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - store: Tests for the multi-account state store and its durability
 * - config: Tests for the server configuration cache and its stream
 * - session: End-to-end tests for the session coordinator and its streams
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("latchkey=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod helpers;
mod session;
mod store;
