//! Geometry primitives: [`Point`], [`Region`], and [`RegionMask`].

mod mask;
mod region;

pub use mask::RegionMask;
pub use region::{Point, Region};
