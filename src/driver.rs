use std::collections::{BTreeSet, HashMap};

use crate::anchor::{compute_transform, AssetKind, AssetTransform, CalibrationTable};
use crate::classify::PoseFacts;
use crate::error::{AnchorError, Result};
use crate::landmark::{DetectorFormat, Landmark, LandmarkSchema, LandmarkSnapshot, Region, SnapshotSlot};
use crate::normalize::{normalize_into, Viewport};

/// レンダラ側のノード。姿勢と表示フラグを書き込むだけで、生成・破棄はしない
pub trait SceneGraph {
    fn apply(&mut self, kind: AssetKind, transform: &AssetTransform);
}

/// フレームごとに渡す有効アセットの集合
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetToggles {
    enabled: BTreeSet<AssetKind>,
}

impl AssetToggles {
    pub fn all() -> Self {
        Self::from_kinds(AssetKind::ALL)
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_kinds<I: IntoIterator<Item = AssetKind>>(kinds: I) -> Self {
        Self {
            enabled: kinds.into_iter().collect(),
        }
    }

    pub fn is_enabled(&self, kind: AssetKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn with(mut self, kind: AssetKind) -> Self {
        self.enabled.insert(kind);
        self
    }

    pub fn without(mut self, kind: AssetKind) -> Self {
        self.enabled.remove(&kind);
        self
    }
}

/// 1 フレームの集計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub shown: usize,
    pub hidden: usize,
    pub disabled: usize,
    /// 幾何が潰れて非表示にした数（hidden に含む）
    pub degenerate: usize,
}

/// 毎フレーム、全アセットの姿勢を計算してシーンへ書き込む
///
/// フレームをまたいで持つ状態は、ランドマークが途切れたときに使う直前の姿勢だけ
pub struct FrameDriver {
    table: CalibrationTable,
    schema: LandmarkSchema,
    detector: DetectorFormat,
    min_presence: f32,
    last: HashMap<AssetKind, AssetTransform>,
    hand_scene: Vec<Landmark>,
    face_scene: Vec<Landmark>,
}

impl FrameDriver {
    /// キャリブレーション表と検出器の宣言をここで一度だけ検証する
    pub fn new(
        table: CalibrationTable,
        schema: LandmarkSchema,
        detector: &DetectorFormat,
    ) -> Result<Self> {
        schema.check_detector(detector)?;
        table.validate(&schema)?;
        Ok(Self {
            hand_scene: Vec::with_capacity(schema.hand_len),
            face_scene: Vec::with_capacity(schema.face_len),
            table,
            schema,
            detector: *detector,
            min_presence: 0.0,
            last: HashMap::new(),
        })
    }

    pub fn with_min_presence(mut self, min_presence: f32) -> Self {
        self.min_presence = min_presence;
        self
    }

    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// 直前に計算できた姿勢
    pub fn last_transform(&self, kind: AssetKind) -> Option<&AssetTransform> {
        self.last.get(&kind)
    }

    /// 受け渡し口の最新スナップショットで 1 フレーム回す
    pub fn run_latest<S: SceneGraph + ?Sized>(
        &mut self,
        slot: &SnapshotSlot,
        viewport: &Viewport,
        toggles: &AssetToggles,
        scene: &mut S,
    ) -> FrameStats {
        let snapshot = slot.latest();
        self.run_frame(&snapshot, viewport, toggles, scene)
    }

    /// 使えないリージョンは空スライスにする（部分配列・低信頼度）
    ///
    /// 長さは検出器の宣言と照合し、返すのはスキーマが参照する先頭部分だけ
    fn accept<'a>(&self, snapshot: &'a LandmarkSnapshot, region: Region) -> &'a [Landmark] {
        let points = snapshot.region(region);
        if let Err(e) = self.detector.check_len(region, points.len()) {
            log::warn!("{}", e);
            return &[];
        }
        if !snapshot.is_present(region, self.min_presence) {
            return &[];
        }
        &points[..self.schema.expected_len(region)]
    }

    pub fn run_frame<S: SceneGraph + ?Sized>(
        &mut self,
        snapshot: &LandmarkSnapshot,
        viewport: &Viewport,
        toggles: &AssetToggles,
        scene: &mut S,
    ) -> FrameStats {
        let hand = self.accept(snapshot, Region::Hand);
        let face = self.accept(snapshot, Region::Face);

        normalize_into(hand, viewport, &mut self.hand_scene);
        normalize_into(face, viewport, &mut self.face_scene);

        let facts = PoseFacts::from_landmarks(hand, face);
        let plane = viewport.plane();
        let mut stats = FrameStats::default();

        for cal in &self.table.assets {
            let kind = cal.kind;

            if !toggles.is_enabled(kind) {
                scene.apply(kind, &hidden_fallback(&self.last, kind));
                stats.disabled += 1;
                continue;
            }

            let landmarks = match kind.region() {
                Region::Hand => &self.hand_scene,
                Region::Face => &self.face_scene,
            };

            match compute_transform(cal, landmarks, &facts, &plane) {
                Ok(transform) => {
                    scene.apply(kind, &transform);
                    if transform.visible {
                        stats.shown += 1;
                    } else {
                        stats.hidden += 1;
                    }
                    self.last.insert(kind, transform);
                }
                Err(e) => {
                    match &e {
                        AnchorError::DegenerateGeometry(reason) => {
                            log::debug!("{}: hidden this frame ({})", kind, reason);
                            stats.degenerate += 1;
                        }
                        _ if e.is_frame_local() => {}
                        _ => log::warn!("{}: {}", kind, e),
                    }
                    scene.apply(kind, &hidden_fallback(&self.last, kind));
                    stats.hidden += 1;
                }
            }
        }

        stats
    }
}

/// 直前の姿勢を非表示で返す（一度も計算していなければ単位姿勢）
fn hidden_fallback(last: &HashMap<AssetKind, AssetTransform>, kind: AssetKind) -> AssetTransform {
    last.get(&kind)
        .copied()
        .unwrap_or_else(AssetTransform::identity)
        .hidden()
}
