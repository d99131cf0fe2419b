use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnchorError, Result};

/// 検出器が出力するランドマーク領域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Hand,
    Face,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Hand => write!(f, "hand"),
            Region::Face => write!(f, "face"),
        }
    }
}

/// ハンドランドマーク 21 点のインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandIndex {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandIndex {
    pub const COUNT: usize = 21;

    pub fn from_index(index: usize) -> Option<Self> {
        use HandIndex::*;
        const ALL: [HandIndex; HandIndex::COUNT] = [
            Wrist, ThumbCmc, ThumbMcp, ThumbIp, ThumbTip,
            IndexMcp, IndexPip, IndexDip, IndexTip,
            MiddleMcp, MiddlePip, MiddleDip, MiddleTip,
            RingMcp, RingPip, RingDip, RingTip,
            PinkyMcp, PinkyPip, PinkyDip, PinkyTip,
        ];
        ALL.get(index).copied()
    }

    /// 親指の付け根（掌の向き・左右判定に使う）
    pub const THUMB_BASE: usize = HandIndex::ThumbCmc as usize;
    /// 小指の付け根
    pub const PINKY_BASE: usize = HandIndex::PinkyMcp as usize;
}

/// フェイスメッシュ（虹彩込み 478 点）の名前付きインデックス
pub mod face {
    pub const COUNT: usize = 478;

    pub const FOREHEAD: usize = 10;
    pub const NOSE_TIP: usize = 1;
    pub const NOSE_BRIDGE: usize = 168;
    pub const CHIN: usize = 152;

    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;
    pub const MOUTH_RIGHT: usize = 61;
    pub const MOUTH_LEFT: usize = 291;

    pub const RIGHT_EAR: usize = 234;
    pub const LEFT_EAR: usize = 454;
    pub const RIGHT_EARLOBE: usize = 177;
    pub const LEFT_EARLOBE: usize = 401;

    pub const RIGHT_JAW: usize = 172;
    pub const LEFT_JAW: usize = 397;

    pub const LEFT_EYE_UPPER: usize = 386;
    pub const LEFT_EYE_LOWER: usize = 374;
    pub const LEFT_EYE_INNER: usize = 362;
    pub const LEFT_EYE_OUTER: usize = 263;

    pub const RIGHT_EYE_UPPER: usize = 159;
    pub const RIGHT_EYE_LOWER: usize = 145;
    pub const RIGHT_EYE_INNER: usize = 133;
    pub const RIGHT_EYE_OUTER: usize = 33;

    pub const LEFT_IRIS: usize = 468;
    pub const RIGHT_IRIS: usize = 473;
}

/// 左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// EAR 計算用の (上瞼, 下瞼, 内眼角, 外眼角)
    pub fn eye_refs(self) -> [usize; 4] {
        match self {
            Side::Left => [
                face::LEFT_EYE_UPPER,
                face::LEFT_EYE_LOWER,
                face::LEFT_EYE_INNER,
                face::LEFT_EYE_OUTER,
            ],
            Side::Right => [
                face::RIGHT_EYE_UPPER,
                face::RIGHT_EYE_LOWER,
                face::RIGHT_EYE_INNER,
                face::RIGHT_EYE_OUTER,
            ],
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// 指の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// 付け根から指先までの 4 関節 [MCP, PIP, DIP, TIP]
    /// 親指は [CMC, MCP, IP, TIP] を同じ並びで扱う
    pub fn chain(self) -> [usize; 4] {
        let base = 1 + 4 * self.index();
        [base, base + 1, base + 2, base + 3]
    }

    pub fn mcp(self) -> usize {
        self.chain()[0]
    }

    pub fn pip(self) -> usize {
        self.chain()[1]
    }

    pub fn dip(self) -> usize {
        self.chain()[2]
    }

    pub fn tip(self) -> usize {
        self.chain()[3]
    }

    /// 指の側方ベクトルに使う隣接 MCP の組 (from, to)
    pub fn side_refs(self) -> (usize, usize) {
        use HandIndex::*;
        match self {
            Finger::Thumb => (ThumbMcp as usize, IndexMcp as usize),
            Finger::Index => (IndexMcp as usize, MiddleMcp as usize),
            Finger::Middle => (IndexMcp as usize, RingMcp as usize),
            Finger::Ring => (MiddleMcp as usize, PinkyMcp as usize),
            Finger::Pinky => (RingMcp as usize, PinkyMcp as usize),
        }
    }

    /// 右ベクトルまわりの二次回転（度）。指ごとに手調整した値
    pub fn tilt_deg(self) -> f32 {
        match self {
            Finger::Thumb => 22.0,
            Finger::Index => 9.0,
            Finger::Middle => 12.0,
            Finger::Ring => 15.5,
            Finger::Pinky => 18.0,
        }
    }
}

/// 検出器が宣言する出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorFormat {
    pub face_points: usize,
    pub hand_points: usize,
}

impl DetectorFormat {
    /// 宣言された点数
    pub fn points(&self, region: Region) -> usize {
        match region {
            Region::Hand => self.hand_points,
            Region::Face => self.face_points,
        }
    }

    /// 配列長の検証: 空（未検出）か宣言どおりの長さのみ許可
    pub fn check_len(&self, region: Region, len: usize) -> Result<()> {
        let expected = self.points(region);
        if len == 0 || len == expected {
            Ok(())
        } else {
            Err(AnchorError::MalformedSnapshot {
                region,
                expected,
                got: len,
            })
        }
    }
}

impl Default for DetectorFormat {
    fn default() -> Self {
        Self {
            face_points: face::COUNT,
            hand_points: HandIndex::COUNT,
        }
    }
}

/// リージョン → 点数 の期待スキーマ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkSchema {
    pub face_len: usize,
    pub hand_len: usize,
}

impl LandmarkSchema {
    pub const MEDIAPIPE: LandmarkSchema = LandmarkSchema {
        face_len: face::COUNT,
        hand_len: HandIndex::COUNT,
    };

    pub fn expected_len(&self, region: Region) -> usize {
        match region {
            Region::Hand => self.hand_len,
            Region::Face => self.face_len,
        }
    }

    /// 検出器の宣言がスキーマを満たすか起動時に確認する
    pub fn check_detector(&self, format: &DetectorFormat) -> Result<()> {
        for region in [Region::Hand, Region::Face] {
            let declared = format.points(region);
            let required = self.expected_len(region);
            if declared < required {
                return Err(AnchorError::UnsupportedDetector {
                    region,
                    declared,
                    required,
                });
            }
        }
        Ok(())
    }
}

impl Default for LandmarkSchema {
    fn default() -> Self {
        Self::MEDIAPIPE
    }
}
