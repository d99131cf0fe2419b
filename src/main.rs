use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tryon_anchor::anchor::table::load_table;
use tryon_anchor::config::Config;
use tryon_anchor::landmark::LandmarkSchema;
use tryon_anchor::osc::OscSceneSink;
use tryon_anchor::recording::load_recording;
use tryon_anchor::{AssetKind, AssetTransform, CalibrationTable, FrameDriver, FrameStats, SceneGraph, SnapshotSlot};

const CONFIG_PATH: &str = "config.toml";
const STATS_INTERVAL: usize = 30;

/// OSC を使わないときの出力先。最後のフレームだけ表示する
#[derive(Default)]
struct ConsoleScene {
    frame: Vec<(AssetKind, AssetTransform)>,
}

impl SceneGraph for ConsoleScene {
    fn apply(&mut self, kind: AssetKind, transform: &AssetTransform) {
        self.frame.push((kind, *transform));
    }
}

impl ConsoleScene {
    fn print(&self) {
        for (kind, t) in &self.frame {
            if !t.visible {
                continue;
            }
            println!(
                "  {:<16} pos=({:.1}, {:.1}, {:.3}) scale={:.2} rot=[{:.3}, {:.3}, {:.3}, {:.3}]",
                kind.name(),
                t.position[0], t.position[1], t.position[2],
                t.scale[0],
                t.rotation[0], t.rotation[1], t.rotation[2], t.rotation[3]
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let recording_path = std::env::args()
        .nth(1)
        .context("usage: tryon-anchor <recording.jsonl> [fps]")?;
    let fps: f32 = match std::env::args().nth(2) {
        Some(s) => s.parse().context("fps must be a number")?,
        None => 30.0,
    };

    let config = Config::load_or_default(CONFIG_PATH);

    println!("Try-on Anchor Replay ({})", env!("TRYON_BUILD_VERSION"));
    println!("Recording: {}", recording_path);
    println!(
        "Viewport: {}x{} -> {}x{}",
        config.viewport.media_width, config.viewport.media_height,
        config.viewport.plane_width, config.viewport.plane_height
    );

    let table = match &config.calibration.table_path {
        Some(path) => load_table(path)?,
        None => CalibrationTable::builtin(),
    };
    println!("Calibration table: v{} ({} assets)", table.version, table.assets.len());

    let toggles = config.assets.toggles()?;
    let viewport = config.viewport.to_viewport();
    let mut driver = FrameDriver::new(table, LandmarkSchema::MEDIAPIPE, &config.detector.format())?
        .with_min_presence(config.detector.min_presence);

    let frames = load_recording(&recording_path)?;

    let mut osc = if config.output.osc_enabled {
        println!("OSC target: {}", config.output.osc_addr);
        Some(OscSceneSink::new(&config.output.osc_addr)?)
    } else {
        None
    };
    let mut console = ConsoleScene::default();

    let slot = SnapshotSlot::new();
    let frame_interval = Duration::from_secs_f32(1.0 / fps.max(1.0));
    let mut total = FrameStats::default();
    let start = Instant::now();

    for (i, frame) in frames.into_iter().enumerate() {
        let tick = Instant::now();
        slot.publish(frame);

        console.frame.clear();
        let stats = match osc.as_mut() {
            Some(sink) => driver.run_latest(&slot, &viewport, &toggles, sink),
            None => driver.run_latest(&slot, &viewport, &toggles, &mut console),
        };
        total.shown += stats.shown;
        total.hidden += stats.hidden;
        total.degenerate += stats.degenerate;

        if (i + 1) % STATS_INTERVAL == 0 {
            println!(
                "frame {}: shown {} hidden {} disabled {} degenerate {}",
                i + 1, stats.shown, stats.hidden, stats.disabled, stats.degenerate
            );
        }

        if let Some(rest) = frame_interval.checked_sub(tick.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    if osc.is_none() {
        println!("Last frame:");
        console.print();
    }
    if let Some(sink) = &osc {
        if sink.send_errors() > 0 {
            log::warn!("{} OSC sends failed", sink.send_errors());
        }
    }

    println!(
        "Done in {:.1}s: shown {} hidden {} degenerate {}",
        start.elapsed().as_secs_f32(),
        total.shown, total.hidden, total.degenerate
    );
    Ok(())
}
