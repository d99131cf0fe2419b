pub mod point;
pub mod schema;

pub use point::{Landmark, LandmarkSnapshot, SnapshotSlot};
pub use schema::{face, DetectorFormat, Finger, HandIndex, LandmarkSchema, Region, Side};
