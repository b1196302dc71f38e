//! Host C toolchain discovery and invocation (spec §4.9-§4.10).

pub mod cc_invoker;
pub mod locator;

pub use locator::Toolchain;
