#![allow(unused_imports)]

pub use schedgraph_test_utils::builders;
pub use schedgraph_test_utils::faulty;
pub use schedgraph_test_utils::init_tracing;
