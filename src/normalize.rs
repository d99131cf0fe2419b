use serde::{Deserialize, Serialize};

use crate::landmark::Landmark;

/// 奥行きの圧縮係数（平面の広がりに対して z を潰す）
pub const DEPTH_SCALE: f32 = 0.001;

/// 入力映像のピクセルサイズ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaSize {
    pub width: u32,
    pub height: u32,
}

impl MediaSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn aspect(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// 映像を描画するシーン空間上の矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRect {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
}

impl DrawRect {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// シーン空間の平面サイズ（アセットのバイアス換算に使う）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSize {
    pub width: f32,
    pub height: f32,
}

/// リサイズ時に差し替える描画ジオメトリ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub media: MediaSize,
    pub rect: DrawRect,
}

impl Viewport {
    pub fn new(media: MediaSize, rect: DrawRect) -> Self {
        Self { media, rect }
    }

    pub fn plane(&self) -> PlaneSize {
        PlaneSize {
            width: self.rect.width,
            height: self.rect.height,
        }
    }

    /// 現在の映像サイズと矩形からレターボックスを求める。
    /// 結果はキャッシュしない（リサイズのたびに変わるため）
    pub fn letterbox(&self) -> Letterbox {
        Letterbox::fit(self.media, &self.rect)
    }
}

/// 矩形内に映像をアスペクト比維持で収めたときの実表示域と余白
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub content_width: f32,
    pub content_height: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn fit(media: MediaSize, rect: &DrawRect) -> Self {
        let full = Self {
            content_width: rect.width,
            content_height: rect.height,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        let (media_aspect, rect_aspect) = match media.aspect() {
            Some(a) if rect.height > 0.0 => (a, rect.width / rect.height),
            _ => return full,
        };

        if media_aspect > rect_aspect {
            // 横長: 上下に余白
            let content_height = rect.width / media_aspect;
            Self {
                content_height,
                pad_y: (rect.height - content_height) / 2.0,
                ..full
            }
        } else if media_aspect < rect_aspect {
            // 縦長: 左右に余白
            let content_width = rect.height * media_aspect;
            Self {
                content_width,
                pad_x: (rect.width - content_width) / 2.0,
                ..full
            }
        } else {
            full
        }
    }
}

/// フロントカメラのミラー表示に合わせた X 反転
pub fn mirror_x(x: f32) -> f32 {
    1.0 - x
}

/// 検出器空間の 1 点をシーン空間へ
fn to_scene(lm: &Landmark, rect: &DrawRect, letterbox: &Letterbox) -> Landmark {
    let x = rect.offset_x + letterbox.pad_x + mirror_x(lm.x) * letterbox.content_width
        - rect.width / 2.0;
    // シーンは Y 上向き
    let y = rect.offset_y + rect.height / 2.0 - letterbox.pad_y - lm.y * letterbox.content_height;
    Landmark::new(x, y, lm.z * DEPTH_SCALE)
}

/// 検出器空間のランドマーク列をシーン空間へ変換して `out` に書き込む。
/// 空入力は空出力（未検出）
pub fn normalize_into(raw: &[Landmark], viewport: &Viewport, out: &mut Vec<Landmark>) {
    out.clear();
    if raw.is_empty() {
        return;
    }
    let letterbox = viewport.letterbox();
    out.extend(raw.iter().map(|lm| to_scene(lm, &viewport.rect, &letterbox)));
}

pub fn normalize(raw: &[Landmark], viewport: &Viewport) -> Vec<Landmark> {
    let mut out = Vec::with_capacity(raw.len());
    normalize_into(raw, viewport, &mut out);
    out
}
