pub mod builders;
pub mod faulty;

use std::sync::Once;

use schedgraph::logging::{build_filter, LOG_ENV};
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// Route engine logs through the test harness's captured output.
///
/// Honours `SCHEDGRAPH_LOG` the same way the binary does, e.g.
/// `SCHEDGRAPH_LOG=schedgraph::coordinator=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV).ok();
        let filter = build_filter(None, env.as_deref())
            .unwrap_or_else(|e| panic!("bad {LOG_ENV} in test environment: {e}"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
