//! ランドマークの幾何から姿勢を判定する
//!
//! すべて現フレームだけを見る純関数。平滑化もヒステリシスもないので、
//! ノイズの多い 1 フレームで判定が反転しうる

use crate::landmark::{face, Finger, HandIndex, Landmark, Side};
use crate::normalize::mirror_x;

/// PIP-DIP 間が MCP-PIP 間のこの割合未満なら曲がっている
pub const FINGER_BENT_RATIO: f32 = 0.8;
/// EAR がこれを超えたら開眼（境界値ちょうどは閉眼）
pub const EYE_OPEN_EAR: f32 = 0.2;
/// 左右の耳の深度差がこれ未満なら正面向き
pub const FACE_FRONTAL_Z_DIFF: f32 = 0.08;

/// 1 フレーム分の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseFacts {
    pub palm_facing_back: bool,
    pub is_left_hand: bool,
    /// Finger::index() 順
    pub finger_bent: [bool; 5],
    /// Side::index() 順 (左, 右)
    pub eye_aspect_ratio: [f32; 2],
    pub face_frontal: bool,
}

impl PoseFacts {
    /// 検出器空間のランドマークから判定する。空配列の領域は既定値のまま
    pub fn from_landmarks(hand: &[Landmark], face: &[Landmark]) -> Self {
        let mut facts = Self::default();

        if hand.len() >= HandIndex::COUNT {
            facts.palm_facing_back = palm_facing_back(hand);
            facts.is_left_hand = is_left_hand(hand);
            for finger in Finger::ALL {
                facts.finger_bent[finger.index()] = finger_bent(hand, finger);
            }
        }

        if face.len() >= face::COUNT {
            for side in [Side::Left, Side::Right] {
                facts.eye_aspect_ratio[side.index()] = eye_aspect_ratio(face, side);
            }
            facts.face_frontal = face_frontal(face);
        }

        facts
    }

    pub fn is_finger_bent(&self, finger: Finger) -> bool {
        self.finger_bent[finger.index()]
    }

    pub fn is_eye_open(&self, side: Side) -> bool {
        is_eye_open_ratio(self.eye_aspect_ratio[side.index()])
    }
}

/// 手の甲がカメラを向いているか（親指付け根と小指付け根の深度比較のみ）
pub fn palm_facing_back(hand: &[Landmark]) -> bool {
    hand[HandIndex::THUMB_BASE].z > hand[HandIndex::PINKY_BASE].z
}

/// 左手か（ミラー後の X で比較）
pub fn is_left_hand(hand: &[Landmark]) -> bool {
    mirror_x(hand[HandIndex::THUMB_BASE].x) > mirror_x(hand[HandIndex::PINKY_BASE].x)
}

pub fn finger_bent(hand: &[Landmark], finger: Finger) -> bool {
    let mcp = &hand[finger.mcp()];
    let pip = &hand[finger.pip()];
    let dip = &hand[finger.dip()];
    pip.distance(dip) < mcp.distance(pip) * FINGER_BENT_RATIO
}

/// EAR = 上下瞼の距離 / 目頭-目尻の距離
pub fn eye_aspect_ratio(face: &[Landmark], side: Side) -> f32 {
    let [upper, lower, inner, outer] = side.eye_refs();
    let width = face[inner].distance(&face[outer]);
    if width <= f32::EPSILON {
        return 0.0;
    }
    face[upper].distance(&face[lower]) / width
}

pub fn is_eye_open_ratio(ear: f32) -> bool {
    ear > EYE_OPEN_EAR
}

pub fn face_frontal(face: &[Landmark]) -> bool {
    (face[face::LEFT_EAR].z - face[face::RIGHT_EAR].z).abs() < FACE_FRONTAL_Z_DIFF
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_hand() -> Vec<Landmark> {
        let mut hand = vec![Landmark::default(); HandIndex::COUNT];
        hand[0] = Landmark::new(0.5, 0.8, 0.0);
        for finger in Finger::ALL {
            let x = 0.4 + 0.05 * finger.index() as f32;
            for (j, &idx) in finger.chain().iter().enumerate() {
                hand[idx] = Landmark::new(x, 0.6 - 0.04 * j as f32, 0.0);
            }
        }
        hand
    }

    fn open_face() -> Vec<Landmark> {
        let mut face = vec![Landmark::new(0.5, 0.5, 0.0); face::COUNT];
        for side in [Side::Left, Side::Right] {
            let [upper, lower, inner, outer] = side.eye_refs();
            face[upper] = Landmark::new(0.4, 0.40, 0.0);
            face[lower] = Landmark::new(0.4, 0.43, 0.0);
            face[inner] = Landmark::new(0.35, 0.415, 0.0);
            face[outer] = Landmark::new(0.45, 0.415, 0.0);
        }
        face
    }

    #[test]
    fn test_palm_facing_back_depth_order() {
        let mut hand = straight_hand();
        hand[HandIndex::THUMB_BASE].z = 0.01;
        hand[HandIndex::PINKY_BASE].z = 0.0;
        assert!(palm_facing_back(&hand));

        hand[HandIndex::THUMB_BASE].z = 0.0;
        // 同じ深度は手のひら側
        assert!(!palm_facing_back(&hand));
    }

    #[test]
    fn test_handedness_after_mirror() {
        let mut hand = straight_hand();
        hand[HandIndex::THUMB_BASE].x = 0.3;
        hand[HandIndex::PINKY_BASE].x = 0.6;
        // ミラー後: thumb 0.7 > pinky 0.4
        assert!(is_left_hand(&hand));

        hand[HandIndex::THUMB_BASE].x = 0.7;
        assert!(!is_left_hand(&hand));
    }

    #[test]
    fn test_finger_bent_threshold() {
        let mut hand = straight_hand();
        let f = Finger::Index;
        hand[f.mcp()] = Landmark::new(0.5, 0.50, 0.0);
        hand[f.pip()] = Landmark::new(0.5, 0.47, 0.0);
        hand[f.dip()] = Landmark::new(0.5, 0.45, 0.0);
        // 0.02 < 0.03 * 0.8
        assert!(finger_bent(&hand, f));

        hand[f.dip()] = Landmark::new(0.5, 0.445, 0.0);
        // 0.025 > 0.024
        assert!(!finger_bent(&hand, f));
    }

    #[test]
    fn test_straight_fingers_not_bent() {
        let hand = straight_hand();
        let facts = PoseFacts::from_landmarks(&hand, &[]);
        for finger in Finger::ALL {
            assert!(!facts.is_finger_bent(finger));
        }
    }

    #[test]
    fn test_ear_boundary() {
        assert!(!is_eye_open_ratio(0.2));
        assert!(is_eye_open_ratio(0.2001));
        assert!(!is_eye_open_ratio(0.0));
    }

    #[test]
    fn test_eye_aspect_ratio_geometry() {
        let mut face = open_face();
        assert!((eye_aspect_ratio(&face, Side::Left) - 0.3).abs() < 1e-3);

        // 右目だけ閉じる
        let [upper, lower, _, _] = Side::Right.eye_refs();
        face[upper] = Landmark::new(0.4, 0.414, 0.0);
        face[lower] = Landmark::new(0.4, 0.416, 0.0);
        let facts = PoseFacts::from_landmarks(&[], &face);
        assert!(facts.is_eye_open(Side::Left));
        assert!(!facts.is_eye_open(Side::Right));
    }

    #[test]
    fn test_ear_zero_width_is_closed() {
        let face = vec![Landmark::new(0.5, 0.5, 0.0); face::COUNT];
        assert_eq!(eye_aspect_ratio(&face, Side::Left), 0.0);
    }

    #[test]
    fn test_face_frontal() {
        let mut face = open_face();
        face[face::LEFT_EAR].z = 0.05;
        face[face::RIGHT_EAR].z = 0.0;
        assert!(face_frontal(&face));

        face[face::LEFT_EAR].z = 0.1;
        assert!(!face_frontal(&face));
    }

    #[test]
    fn test_empty_regions_give_defaults() {
        let facts = PoseFacts::from_landmarks(&[], &[]);
        assert_eq!(facts, PoseFacts::default());
    }

    #[test]
    fn test_deterministic() {
        let hand = straight_hand();
        let face = open_face();
        let a = PoseFacts::from_landmarks(&hand, &face);
        let b = PoseFacts::from_landmarks(&hand, &face);
        assert_eq!(a, b);
    }
}
