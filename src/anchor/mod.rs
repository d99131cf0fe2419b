pub mod kind;
pub mod table;

pub use kind::AssetKind;
pub use table::CalibrationTable;

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::classify::PoseFacts;
use crate::error::{AnchorError, Result};
use crate::landmark::{Finger, Landmark};
use crate::normalize::PlaneSize;
use crate::orientation::{finger_orientation, quaternion_to_array, solve_orientation};

/// スケール基準距離がこれ未満なら幾何が潰れている
const MIN_SPAN: f32 = 1e-4;

/// アセットの最終姿勢（レンダラのノードへそのまま書き込む）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetTransform {
    /// 位置 (x, y, z)
    pub position: [f32; 3],
    /// スケール (x, y, z)
    pub scale: [f32; 3],
    /// 回転 (クォータニオン: x, y, z, w)
    pub rotation: [f32; 4],
    pub visible: bool,
}

impl AssetTransform {
    pub fn new(position: [f32; 3], scale: [f32; 3], rotation: [f32; 4], visible: bool) -> Self {
        Self {
            position,
            scale,
            rotation,
            visible,
        }
    }

    /// 原点、等倍、回転なし、非表示
    pub fn identity() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            visible: false,
        }
    }

    /// 姿勢はそのまま、非表示にしたもの
    pub fn hidden(self) -> Self {
        Self {
            visible: false,
            ..self
        }
    }
}

/// 回転軸（アセットのローカル座標）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// バイアス・回転補正を切り替える姿勢条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseCondition {
    Always,
    PalmBack,
    PalmFront,
    FingerBent(Finger),
    FaceFrontal,
    FaceTurned,
}

impl PoseCondition {
    pub fn holds(&self, facts: &PoseFacts) -> bool {
        match *self {
            PoseCondition::Always => true,
            PoseCondition::PalmBack => facts.palm_facing_back,
            PoseCondition::PalmFront => !facts.palm_facing_back,
            PoseCondition::FingerBent(finger) => facts.is_finger_bent(finger),
            PoseCondition::FaceFrontal => facts.face_frontal,
            PoseCondition::FaceTurned => !facts.face_frontal,
        }
    }
}

fn always() -> PoseCondition {
    PoseCondition::Always
}

/// 姿勢条件つきの固定角回転（ラジアン）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationAdjustment {
    pub axis: Axis,
    pub angle: f32,
    #[serde(default = "always")]
    pub when: PoseCondition,
}

impl RotationAdjustment {
    pub fn new(axis: Axis, angle: f32, when: PoseCondition) -> Self {
        Self { axis, angle, when }
    }
}

/// 平面サイズ比の位置バイアス (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalBias {
    Uniform([f32; 2]),
    /// 左右 × 手のひら/甲 の 4 通り
    Hand {
        right_front: [f32; 2],
        right_back: [f32; 2],
        left_front: [f32; 2],
        left_back: [f32; 2],
    },
    /// 顔の正面/横向きで切り替え
    Face {
        frontal: [f32; 2],
        turned: [f32; 2],
    },
}

impl PositionalBias {
    pub fn select(&self, facts: &PoseFacts) -> [f32; 2] {
        match *self {
            PositionalBias::Uniform(bias) => bias,
            PositionalBias::Hand {
                right_front,
                right_back,
                left_front,
                left_back,
            } => match (facts.is_left_hand, facts.palm_facing_back) {
                (false, false) => right_front,
                (false, true) => right_back,
                (true, false) => left_front,
                (true, true) => left_back,
            },
            PositionalBias::Face { frontal, turned } => {
                if facts.face_frontal {
                    frontal
                } else {
                    turned
                }
            }
        }
    }
}

/// 回転の求め方
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSource {
    /// 回転なし（補正のみ）
    Fixed,
    /// 3 点の look-at
    Triple { origin: usize, a: usize, b: usize },
    /// 指の列ベクトル基底
    Finger {
        finger: Finger,
        tip: usize,
        joint: usize,
    },
}

/// アセット種別ごとの静的キャリブレーション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCalibration {
    pub kind: AssetKind,
    /// 位置の基準（平均をとる）
    pub anchor: Vec<usize>,
    /// スケール基準にする解剖学的距離の 2 点
    pub span: [usize; 2],
    pub orientation: OrientationSource,
    pub scale_divisor: f32,
    pub bias: PositionalBias,
    #[serde(default)]
    pub z_depth: f32,
    #[serde(default)]
    pub rotation_adjustments: Vec<RotationAdjustment>,
}

impl AssetCalibration {
    /// 参照する全ランドマークインデックス
    pub fn landmark_refs(&self) -> Vec<usize> {
        let mut refs = self.anchor.clone();
        refs.extend_from_slice(&self.span);
        match self.orientation {
            OrientationSource::Fixed => {}
            OrientationSource::Triple { origin, a, b } => refs.extend([origin, a, b]),
            OrientationSource::Finger { finger, tip, joint } => {
                let (side_from, side_to) = finger.side_refs();
                refs.extend([tip, joint, side_from, side_to]);
            }
        }
        refs.sort_unstable();
        refs.dedup();
        refs
    }

    fn point<'a>(&self, landmarks: &'a [Landmark], index: usize) -> Result<&'a Landmark> {
        landmarks.get(index).ok_or_else(|| AnchorError::InvalidCalibration {
            asset: self.kind.to_string(),
            index,
            region: self.kind.region(),
            len: landmarks.len(),
        })
    }

    fn base_rotation(&self, landmarks: &[Landmark]) -> Result<UnitQuaternion<f32>> {
        match self.orientation {
            OrientationSource::Fixed => Ok(UnitQuaternion::identity()),
            OrientationSource::Triple { origin, a, b } => solve_orientation(
                self.point(landmarks, origin)?,
                self.point(landmarks, a)?,
                self.point(landmarks, b)?,
            ),
            OrientationSource::Finger { finger, tip, joint } => {
                finger_orientation(landmarks, finger, tip, joint).map(|f| f.rotation)
            }
        }
    }
}

/// キャリブレーションと現フレームの幾何から最終姿勢を求める
///
/// `landmarks` はシーン空間（正規化後）、`facts` は同フレームの判定結果
pub fn compute_transform(
    calibration: &AssetCalibration,
    landmarks: &[Landmark],
    facts: &PoseFacts,
    plane: &PlaneSize,
) -> Result<AssetTransform> {
    if landmarks.is_empty() {
        return Err(AnchorError::MissingLandmarks {
            region: calibration.kind.region(),
        });
    }

    let mut center = Vector3::zeros();
    for &index in &calibration.anchor {
        center += calibration.point(landmarks, index)?.to_vector();
    }
    center /= calibration.anchor.len().max(1) as f32;

    let [span_a, span_b] = calibration.span;
    let span = calibration
        .point(landmarks, span_a)?
        .distance(calibration.point(landmarks, span_b)?);
    if !span.is_finite() || span < MIN_SPAN {
        return Err(AnchorError::DegenerateGeometry("zero-length scale span"));
    }
    let s = span / calibration.scale_divisor;

    let [bias_x, bias_y] = calibration.bias.select(facts);
    let position = [
        center.x + bias_x * plane.width,
        center.y + bias_y * plane.height,
        center.z + calibration.z_depth,
    ];

    let mut rotation = calibration.base_rotation(landmarks)?;
    for adjustment in &calibration.rotation_adjustments {
        if adjustment.when.holds(facts) {
            rotation *= UnitQuaternion::from_axis_angle(&adjustment.axis.unit(), adjustment.angle);
        }
    }

    Ok(AssetTransform::new(
        position,
        [s, s, s],
        quaternion_to_array(&rotation),
        calibration.kind.is_visible(facts),
    ))
}
