use std::sync::{Arc, Mutex};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::schema::Region;

/// 単一ランドマーク
///
/// 検出器空間では x, y は 0.0〜1.0 に正規化、z は相対深度（負ほどカメラに近い）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vector(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.to_vector() - other.to_vector()).norm()
    }
}

/// 1 フレーム分の検出結果。検出器が毎フレーム生成し、以後は読み取り専用
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    #[serde(default)]
    pub face: Vec<Landmark>,
    #[serde(default)]
    pub hand: Vec<Landmark>,
    /// 検出器の存在信頼度（出力しない検出器もある）
    #[serde(default)]
    pub face_presence: Option<f32>,
    #[serde(default)]
    pub hand_presence: Option<f32>,
}

impl LandmarkSnapshot {
    pub fn new(face: Vec<Landmark>, hand: Vec<Landmark>) -> Self {
        Self {
            face,
            hand,
            face_presence: None,
            hand_presence: None,
        }
    }

    pub fn region(&self, region: Region) -> &[Landmark] {
        match region {
            Region::Hand => &self.hand,
            Region::Face => &self.face,
        }
    }

    pub fn presence(&self, region: Region) -> Option<f32> {
        match region {
            Region::Hand => self.hand_presence,
            Region::Face => self.face_presence,
        }
    }

    /// 存在信頼度が閾値以上か（未出力なら検出ありとみなす）
    pub fn is_present(&self, region: Region, min_presence: f32) -> bool {
        !self.region(region).is_empty()
            && self.presence(region).map_or(true, |p| p >= min_presence)
    }
}

/// 検出スレッドと描画スレッドの受け渡し口
///
/// スナップショットは差し替えのみで、配列をその場で書き換えない。
/// 読み手は Arc を複製して保持するので、更新途中の配列を読むことはない
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    current: Mutex<Arc<LandmarkSnapshot>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 検出器側: 新しいスナップショットを公開
    pub fn publish(&self, snapshot: LandmarkSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }

    /// 描画側: 最新スナップショットを取得（新着がなければ前回のまま）
    pub fn latest(&self) -> Arc<LandmarkSnapshot> {
        let guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }
}
