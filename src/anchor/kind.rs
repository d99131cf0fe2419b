use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::PoseFacts;
use crate::landmark::{Finger, Region, Side};

/// 仮想アセットの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Ring,
    Watch,
    ThumbNail,
    IndexNail,
    MiddleNail,
    RingNail,
    PinkyNail,
    HandOccluder,
    Glasses,
    Hat,
    LeftEarring,
    RightEarring,
    Necklace,
    NeckOccluder,
    Lips,
    LeftContactLens,
    RightContactLens,
}

impl AssetKind {
    pub const ALL: [AssetKind; 17] = [
        AssetKind::Ring,
        AssetKind::Watch,
        AssetKind::ThumbNail,
        AssetKind::IndexNail,
        AssetKind::MiddleNail,
        AssetKind::RingNail,
        AssetKind::PinkyNail,
        AssetKind::HandOccluder,
        AssetKind::Glasses,
        AssetKind::Hat,
        AssetKind::LeftEarring,
        AssetKind::RightEarring,
        AssetKind::Necklace,
        AssetKind::NeckOccluder,
        AssetKind::Lips,
        AssetKind::LeftContactLens,
        AssetKind::RightContactLens,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Ring => "ring",
            AssetKind::Watch => "watch",
            AssetKind::ThumbNail => "thumb_nail",
            AssetKind::IndexNail => "index_nail",
            AssetKind::MiddleNail => "middle_nail",
            AssetKind::RingNail => "ring_nail",
            AssetKind::PinkyNail => "pinky_nail",
            AssetKind::HandOccluder => "hand_occluder",
            AssetKind::Glasses => "glasses",
            AssetKind::Hat => "hat",
            AssetKind::LeftEarring => "left_earring",
            AssetKind::RightEarring => "right_earring",
            AssetKind::Necklace => "necklace",
            AssetKind::NeckOccluder => "neck_occluder",
            AssetKind::Lips => "lips",
            AssetKind::LeftContactLens => "left_contact_lens",
            AssetKind::RightContactLens => "right_contact_lens",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn region(self) -> Region {
        match self {
            AssetKind::Ring
            | AssetKind::Watch
            | AssetKind::ThumbNail
            | AssetKind::IndexNail
            | AssetKind::MiddleNail
            | AssetKind::RingNail
            | AssetKind::PinkyNail
            | AssetKind::HandOccluder => Region::Hand,
            _ => Region::Face,
        }
    }

    /// 付け爪の指
    pub fn nail_finger(self) -> Option<Finger> {
        match self {
            AssetKind::ThumbNail => Some(Finger::Thumb),
            AssetKind::IndexNail => Some(Finger::Index),
            AssetKind::MiddleNail => Some(Finger::Middle),
            AssetKind::RingNail => Some(Finger::Ring),
            AssetKind::PinkyNail => Some(Finger::Pinky),
            _ => None,
        }
    }

    /// ランドマークが揃っている前提での表示判定。アセットごとに固有
    pub fn is_visible(self, facts: &PoseFacts) -> bool {
        if let Some(finger) = self.nail_finger() {
            // 爪は甲側か、指を曲げて爪が見えているときだけ
            return facts.palm_facing_back || facts.is_finger_bent(finger);
        }
        match self {
            AssetKind::LeftContactLens => facts.is_eye_open(Side::Left),
            AssetKind::RightContactLens => facts.is_eye_open(Side::Right),
            _ => true,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AssetKind::from_name("tiara"), None);
    }

    #[test]
    fn test_serde_name_matches() {
        for kind in AssetKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn test_regions() {
        assert_eq!(AssetKind::Ring.region(), Region::Hand);
        assert_eq!(AssetKind::PinkyNail.region(), Region::Hand);
        assert_eq!(AssetKind::Glasses.region(), Region::Face);
        assert_eq!(AssetKind::RightContactLens.region(), Region::Face);
    }

    #[test]
    fn test_nail_visibility() {
        let mut facts = PoseFacts::default();
        assert!(!AssetKind::IndexNail.is_visible(&facts));

        facts.finger_bent[Finger::Index.index()] = true;
        assert!(AssetKind::IndexNail.is_visible(&facts));
        assert!(!AssetKind::MiddleNail.is_visible(&facts));

        facts.palm_facing_back = true;
        assert!(AssetKind::MiddleNail.is_visible(&facts));
    }

    #[test]
    fn test_contact_lens_per_eye() {
        let mut facts = PoseFacts::default();
        facts.eye_aspect_ratio = [0.3, 0.1];
        assert!(AssetKind::LeftContactLens.is_visible(&facts));
        assert!(!AssetKind::RightContactLens.is_visible(&facts));
    }

    #[test]
    fn test_unconditional_assets() {
        let facts = PoseFacts::default();
        assert!(AssetKind::Watch.is_visible(&facts));
        assert!(AssetKind::Ring.is_visible(&facts));
        assert!(AssetKind::Hat.is_visible(&facts));
    }
}
