pub mod anyof;
pub mod base;
pub mod delimited;
pub mod greedy;
pub mod sequence;

pub use anyof::{AnyNumberOf, one_of};
pub use base::{Anything, Nothing, Ref};
pub use delimited::Delimited;
pub use greedy::{GreedyUntil, StartsWith};
pub use sequence::{Bracketed, Sequence};
