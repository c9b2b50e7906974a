pub mod base;
pub mod meta;
pub mod test_functions;

pub use base::{ErasedSegment, SegmentBuilder, Tables};
