//! Document structure elements according to ISO 32000-1

mod outline;

pub use outline::{OutlineBuilder, OutlineFlags, OutlineItem, OutlineTree};
