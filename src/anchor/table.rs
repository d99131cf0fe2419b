use std::f32::consts::{FRAC_PI_2, PI};
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{
    AssetCalibration, AssetKind, Axis, OrientationSource, PoseCondition, PositionalBias,
    RotationAdjustment,
};
use crate::error::AnchorError;
use crate::landmark::{face, Finger, HandIndex, LandmarkSchema};

/// 組み込みテーブルの版数（定数を調整したら上げる）
pub const BUILTIN_VERSION: u32 = 3;

/// 甲側で爪・指輪のモデルを裏返すひねり
const BACK_OF_HAND_TWIST: f32 = 9.5;
/// 指を曲げたときの追加ひねり
const BENT_FINGER_TWIST: f32 = 0.15;

/// アセットごとのキャリブレーション表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    pub version: u32,
    pub assets: Vec<AssetCalibration>,
}

// --- Save / Load ---

pub fn save_table(path: &str, table: &CalibrationTable) -> Result<()> {
    let json = serde_json::to_string_pretty(table)?;
    fs::write(path, json).context("Failed to write calibration table")?;
    Ok(())
}

pub fn load_table(path: &str) -> Result<CalibrationTable> {
    let content = fs::read_to_string(path).context("Failed to read calibration table")?;
    let table: CalibrationTable =
        serde_json::from_str(&content).context("Failed to parse calibration table")?;
    log::info!("calibration table v{} loaded from {} ({} assets)", table.version, path, table.assets.len());
    Ok(table)
}

impl CalibrationTable {
    pub fn get(&self, kind: AssetKind) -> Option<&AssetCalibration> {
        self.assets.iter().find(|cal| cal.kind == kind)
    }

    /// 起動時の検証。参照インデックスがスキーマの点数に収まるか、
    /// スケール除数が正か、同じ種別が重複していないか
    pub fn validate(&self, schema: &LandmarkSchema) -> std::result::Result<(), AnchorError> {
        let mut seen = Vec::with_capacity(self.assets.len());
        for cal in &self.assets {
            let region = cal.kind.region();
            let len = schema.expected_len(region);
            let asset = || cal.kind.to_string();

            if seen.contains(&cal.kind) {
                return Err(AnchorError::DuplicateAsset { asset: asset() });
            }
            seen.push(cal.kind);

            if cal.anchor.is_empty() {
                return Err(AnchorError::EmptyAnchor { asset: asset() });
            }
            if let Some(&index) = cal.landmark_refs().iter().find(|&&i| i >= len) {
                return Err(AnchorError::InvalidCalibration {
                    asset: asset(),
                    index,
                    region,
                    len,
                });
            }
            if !(cal.scale_divisor.is_finite() && cal.scale_divisor > 0.0) {
                return Err(AnchorError::InvalidDivisor {
                    asset: asset(),
                    divisor: cal.scale_divisor,
                });
            }
        }
        log::info!("calibration table v{} validated ({} assets)", self.version, self.assets.len());
        Ok(())
    }

    /// 組み込みのキャリブレーション表
    ///
    /// 値はモデルの寸法に合わせて目視で詰めたもの
    pub fn builtin() -> Self {
        let mut assets = vec![ring(), watch()];
        assets.extend(Finger::ALL.iter().map(|&f| nail(f)));
        assets.push(hand_occluder());
        assets.extend([
            glasses(),
            hat(),
            earring(AssetKind::LeftEarring),
            earring(AssetKind::RightEarring),
            necklace(),
            neck_occluder(),
            lips(),
            contact_lens(AssetKind::LeftContactLens),
            contact_lens(AssetKind::RightContactLens),
        ]);
        Self {
            version: BUILTIN_VERSION,
            assets,
        }
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// --- 手 ---

const WRIST: usize = HandIndex::Wrist as usize;
const INDEX_MCP: usize = HandIndex::IndexMcp as usize;
const MIDDLE_MCP: usize = HandIndex::MiddleMcp as usize;
const PINKY_MCP: usize = HandIndex::PinkyMcp as usize;

fn palm_triple() -> OrientationSource {
    OrientationSource::Triple {
        origin: WRIST,
        a: INDEX_MCP,
        b: PINKY_MCP,
    }
}

fn ring() -> AssetCalibration {
    let f = Finger::Ring;
    AssetCalibration {
        kind: AssetKind::Ring,
        anchor: vec![f.mcp(), f.pip()],
        span: [MIDDLE_MCP, f.mcp()],
        orientation: OrientationSource::Finger {
            finger: f,
            tip: f.pip(),
            joint: f.mcp(),
        },
        scale_divisor: 2.2,
        bias: PositionalBias::Hand {
            right_front: [0.0, -0.004],
            right_back: [0.002, -0.006],
            left_front: [0.0, -0.004],
            left_back: [-0.002, -0.006],
        },
        z_depth: 0.0,
        rotation_adjustments: vec![
            RotationAdjustment::new(Axis::Y, BACK_OF_HAND_TWIST, PoseCondition::PalmBack),
            RotationAdjustment::new(Axis::Y, BENT_FINGER_TWIST, PoseCondition::FingerBent(f)),
        ],
    }
}

fn watch() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::Watch,
        anchor: vec![WRIST],
        span: [INDEX_MCP, PINKY_MCP],
        orientation: palm_triple(),
        scale_divisor: 1.5,
        bias: PositionalBias::Hand {
            right_front: [0.0, 0.004],
            right_back: [0.003, 0.006],
            left_front: [0.0, 0.004],
            left_back: [-0.003, 0.006],
        },
        z_depth: -0.2,
        rotation_adjustments: vec![
            RotationAdjustment::new(Axis::X, -FRAC_PI_2, PoseCondition::Always),
            RotationAdjustment::new(Axis::Y, PI, PoseCondition::PalmBack),
        ],
    }
}

fn nail(finger: Finger) -> AssetCalibration {
    let (kind, divisor, bias) = match finger {
        Finger::Thumb => (
            AssetKind::ThumbNail,
            3.2,
            PositionalBias::Hand {
                right_front: [0.003, 0.002],
                right_back: [0.004, 0.001],
                left_front: [-0.003, 0.002],
                left_back: [-0.004, 0.001],
            },
        ),
        Finger::Index => (
            AssetKind::IndexNail,
            4.0,
            PositionalBias::Hand {
                right_front: [0.001, 0.003],
                right_back: [0.0015, 0.0025],
                left_front: [-0.001, 0.003],
                left_back: [-0.0015, 0.0025],
            },
        ),
        Finger::Middle => (
            AssetKind::MiddleNail,
            4.0,
            PositionalBias::Hand {
                right_front: [0.0, 0.003],
                right_back: [0.0005, 0.0028],
                left_front: [0.0, 0.003],
                left_back: [-0.0005, 0.0028],
            },
        ),
        Finger::Ring => (
            AssetKind::RingNail,
            4.4,
            PositionalBias::Hand {
                right_front: [-0.0005, 0.0028],
                right_back: [0.0, 0.0025],
                left_front: [0.0005, 0.0028],
                left_back: [0.0, 0.0025],
            },
        ),
        Finger::Pinky => (
            AssetKind::PinkyNail,
            5.2,
            PositionalBias::Hand {
                right_front: [-0.001, 0.002],
                right_back: [-0.0005, 0.0018],
                left_front: [0.001, 0.002],
                left_back: [0.0005, 0.0018],
            },
        ),
    };

    AssetCalibration {
        kind,
        anchor: vec![finger.tip()],
        span: [finger.dip(), finger.tip()],
        orientation: OrientationSource::Finger {
            finger,
            tip: finger.tip(),
            joint: finger.dip(),
        },
        scale_divisor: divisor,
        bias,
        z_depth: 0.05,
        rotation_adjustments: vec![
            RotationAdjustment::new(Axis::Y, BACK_OF_HAND_TWIST, PoseCondition::PalmBack),
            RotationAdjustment::new(Axis::Y, BENT_FINGER_TWIST, PoseCondition::FingerBent(finger)),
        ],
    }
}

fn hand_occluder() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::HandOccluder,
        anchor: vec![WRIST, MIDDLE_MCP],
        span: [WRIST, MIDDLE_MCP],
        orientation: palm_triple(),
        scale_divisor: 1.8,
        bias: PositionalBias::Uniform([0.0, 0.0]),
        z_depth: -0.5,
        rotation_adjustments: vec![RotationAdjustment::new(Axis::X, -FRAC_PI_2, PoseCondition::Always)],
    }
}

// --- 顔 ---

fn face_triple() -> OrientationSource {
    OrientationSource::Triple {
        origin: face::NOSE_BRIDGE,
        a: face::RIGHT_EYE_OUTER,
        b: face::LEFT_EYE_OUTER,
    }
}

/// look-at の注視方向（目尻方向）を顔の正面へ向け直す
fn face_forward() -> RotationAdjustment {
    RotationAdjustment::new(Axis::Y, -FRAC_PI_2, PoseCondition::Always)
}

fn glasses() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::Glasses,
        anchor: vec![face::NOSE_BRIDGE],
        span: [face::RIGHT_EYE_OUTER, face::LEFT_EYE_OUTER],
        orientation: face_triple(),
        scale_divisor: 9.0,
        bias: PositionalBias::Uniform([0.0, -0.004]),
        z_depth: 0.1,
        rotation_adjustments: vec![face_forward()],
    }
}

fn hat() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::Hat,
        anchor: vec![face::FOREHEAD],
        span: [face::RIGHT_EAR, face::LEFT_EAR],
        orientation: face_triple(),
        scale_divisor: 7.5,
        bias: PositionalBias::Uniform([0.0, 0.06]),
        z_depth: -0.3,
        rotation_adjustments: vec![
            face_forward(),
            RotationAdjustment::new(Axis::X, -0.12, PoseCondition::Always),
        ],
    }
}

fn earring(kind: AssetKind) -> AssetCalibration {
    // 横向きのときは耳たぶが頬側へ寄って見えるので外側へ逃がす
    let (lobe, outward) = match kind {
        AssetKind::LeftEarring => (face::LEFT_EARLOBE, 1.0),
        _ => (face::RIGHT_EARLOBE, -1.0),
    };
    AssetCalibration {
        kind,
        anchor: vec![lobe],
        span: [face::RIGHT_EAR, face::LEFT_EAR],
        orientation: face_triple(),
        scale_divisor: 14.0,
        bias: PositionalBias::Face {
            frontal: [0.0, -0.012],
            turned: [0.006 * outward, -0.014],
        },
        z_depth: 0.0,
        rotation_adjustments: vec![face_forward()],
    }
}

fn necklace() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::Necklace,
        anchor: vec![face::CHIN],
        span: [face::RIGHT_JAW, face::LEFT_JAW],
        orientation: OrientationSource::Triple {
            origin: face::CHIN,
            a: face::RIGHT_JAW,
            b: face::LEFT_JAW,
        },
        scale_divisor: 3.0,
        bias: PositionalBias::Uniform([0.0, -0.12]),
        z_depth: -0.2,
        rotation_adjustments: vec![face_forward()],
    }
}

fn neck_occluder() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::NeckOccluder,
        anchor: vec![face::CHIN],
        span: [face::RIGHT_JAW, face::LEFT_JAW],
        orientation: OrientationSource::Fixed,
        scale_divisor: 2.6,
        bias: PositionalBias::Uniform([0.0, -0.08]),
        z_depth: -0.4,
        rotation_adjustments: Vec::new(),
    }
}

fn lips() -> AssetCalibration {
    AssetCalibration {
        kind: AssetKind::Lips,
        anchor: vec![face::UPPER_LIP, face::LOWER_LIP],
        span: [face::MOUTH_RIGHT, face::MOUTH_LEFT],
        orientation: face_triple(),
        scale_divisor: 1.9,
        bias: PositionalBias::Uniform([0.0, 0.0]),
        z_depth: 0.02,
        rotation_adjustments: vec![face_forward()],
    }
}

fn contact_lens(kind: AssetKind) -> AssetCalibration {
    let (iris, inner, outer) = match kind {
        AssetKind::LeftContactLens => (face::LEFT_IRIS, face::LEFT_EYE_INNER, face::LEFT_EYE_OUTER),
        _ => (face::RIGHT_IRIS, face::RIGHT_EYE_INNER, face::RIGHT_EYE_OUTER),
    };
    AssetCalibration {
        kind,
        anchor: vec![iris],
        span: [inner, outer],
        orientation: OrientationSource::Fixed,
        scale_divisor: 11.0,
        bias: PositionalBias::Uniform([0.0, 0.0]),
        z_depth: 0.01,
        rotation_adjustments: Vec::new(),
    }
}
