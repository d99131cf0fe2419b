use thiserror::Error;

use crate::landmark::Region;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    /// 対象リージョンが今フレームで検出されていない
    #[error("no {region} landmarks in this frame")]
    MissingLandmarks { region: Region },

    /// 空でも規定長でもないランドマーク配列
    #[error("malformed {region} snapshot: expected {expected} points, got {got}")]
    MalformedSnapshot {
        region: Region,
        expected: usize,
        got: usize,
    },

    /// 共線・ゼロ長ベクトルなどで姿勢基底を作れない
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    #[error("invalid calibration for {asset}: landmark {index} out of range for {region} ({len} points)")]
    InvalidCalibration {
        asset: String,
        index: usize,
        region: Region,
        len: usize,
    },

    #[error("duplicate calibration entry for {asset}")]
    DuplicateAsset { asset: String },

    #[error("calibration for {asset} has no anchor landmarks")]
    EmptyAnchor { asset: String },

    /// スケール除数は正の有限値のみ
    #[error("calibration for {asset} has invalid scale divisor {divisor}")]
    InvalidDivisor { asset: String, divisor: f32 },

    #[error("detector declares {declared} {region} points, schema requires {required}")]
    UnsupportedDetector {
        region: Region,
        declared: usize,
        required: usize,
    },
}

impl AnchorError {
    /// フレーム単位で「非表示」に落とすだけのエラーか
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::MissingLandmarks { .. } | Self::MalformedSnapshot { .. } | Self::DegenerateGeometry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnchorError>;
