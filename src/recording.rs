use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::landmark::LandmarkSnapshot;

/// 記録済みランドマーク列（1 行 1 フレームの JSON）を読み込む
///
/// 空行は読み飛ばす
pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Vec<LandmarkSnapshot>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let frames = parse_recording(BufReader::new(file))?;
    log::info!("Loaded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

pub fn parse_recording<R: BufRead>(reader: R) -> Result<Vec<LandmarkSnapshot>> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let snapshot: LandmarkSnapshot = serde_json::from_str(line)
            .with_context(|| format!("Invalid snapshot on line {}", i + 1))?;
        frames.push(snapshot);
    }
    Ok(frames)
}

pub fn save_recording<P: AsRef<Path>>(path: P, frames: &[LandmarkSnapshot]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for frame in frames {
        serde_json::to_writer(&mut writer, frame)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
