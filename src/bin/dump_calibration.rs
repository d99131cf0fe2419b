use anyhow::Result;
use tryon_anchor::anchor::table::save_table;
use tryon_anchor::landmark::LandmarkSchema;
use tryon_anchor::CalibrationTable;

const DEFAULT_OUTPUT: &str = "calibration.json";

/// 組み込みキャリブレーション表を JSON に書き出す（調整の叩き台）
fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let table = CalibrationTable::builtin();
    table.validate(&LandmarkSchema::MEDIAPIPE)?;
    save_table(&path, &table)?;

    println!("Wrote calibration table v{} ({} assets) to {}", table.version, table.assets.len(), path);
    Ok(())
}
