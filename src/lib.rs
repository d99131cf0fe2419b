pub mod anchor;
pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod landmark;
pub mod normalize;
pub mod orientation;
pub mod osc;
pub mod recording;

pub use anchor::{AssetCalibration, AssetKind, AssetTransform, CalibrationTable};
pub use driver::{AssetToggles, FrameDriver, FrameStats, SceneGraph};
pub use error::{AnchorError, Result};
pub use landmark::{Landmark, LandmarkSnapshot, SnapshotSlot};
