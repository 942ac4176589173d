// Position Sizing Boundary
// The risk engine seen by the signal builder: balance + stop geometry +
// confidence in, position size out

pub mod sizer;

pub use sizer::{FixedFractionalSizer, PositionSizer, SizerConfig};
