use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::anchor::AssetKind;
use crate::driver::AssetToggles;
use crate::landmark::DetectorFormat;
use crate::normalize::{DrawRect, MediaSize, Viewport};
use crate::osc::OSC_DEFAULT_ADDR;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewportConfig {
    /// 入力映像の幅（ピクセル）
    #[serde(default = "default_media_width")]
    pub media_width: u32,
    /// 入力映像の高さ（ピクセル）
    #[serde(default = "default_media_height")]
    pub media_height: u32,
    /// 描画平面の幅（シーン単位）
    #[serde(default = "default_plane_size")]
    pub plane_width: f32,
    /// 描画平面の高さ（シーン単位）
    #[serde(default = "default_plane_size")]
    pub plane_height: f32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
}

fn default_media_width() -> u32 { 1280 }
fn default_media_height() -> u32 { 720 }
fn default_plane_size() -> f32 { 1000.0 }

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            media_width: default_media_width(),
            media_height: default_media_height(),
            plane_width: default_plane_size(),
            plane_height: default_plane_size(),
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewportConfig {
    pub fn to_viewport(&self) -> Viewport {
        Viewport::new(
            MediaSize::new(self.media_width, self.media_height),
            DrawRect {
                width: self.plane_width,
                height: self.plane_height,
                offset_x: self.offset_x,
                offset_y: self.offset_y,
            },
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// 検出器が出力する顔ランドマーク数（虹彩込み）
    #[serde(default = "default_face_points")]
    pub face_points: usize,
    #[serde(default = "default_hand_points")]
    pub hand_points: usize,
    /// これ未満の存在信頼度は未検出扱い
    #[serde(default = "default_min_presence")]
    pub min_presence: f32,
}

fn default_face_points() -> usize { DetectorFormat::default().face_points }
fn default_hand_points() -> usize { DetectorFormat::default().hand_points }
fn default_min_presence() -> f32 { 0.5 }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            face_points: default_face_points(),
            hand_points: default_hand_points(),
            min_presence: default_min_presence(),
        }
    }
}

impl DetectorConfig {
    pub fn format(&self) -> DetectorFormat {
        DetectorFormat {
            face_points: self.face_points,
            hand_points: self.hand_points,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// 有効にするアセット名
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
}

fn default_enabled() -> Vec<String> {
    AssetKind::ALL.iter().map(|k| k.name().to_string()).collect()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl AssetsConfig {
    pub fn toggles(&self) -> Result<AssetToggles> {
        let kinds = self
            .enabled
            .iter()
            .map(|name| {
                AssetKind::from_name(name).with_context(|| format!("Unknown asset: {}", name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AssetToggles::from_kinds(kinds))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CalibrationConfig {
    /// 組み込み表を置き換える JSON（未指定なら組み込み表）
    #[serde(default)]
    pub table_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_osc_addr")]
    pub osc_addr: String,
    #[serde(default)]
    pub osc_enabled: bool,
}

fn default_osc_addr() -> String { OSC_DEFAULT_ADDR.to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            osc_addr: default_osc_addr(),
            osc_enabled: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読めなければ既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("using default config ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }
}
