use std::path::{Path, PathBuf};
use std::time::Duration;

use minimap::{image_fingerprint, write_png, ExportError, MinimapSession};
use tracing::info;

pub(crate) const HEADLESS_TPS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadlessSummary {
    pub(crate) ticks: u32,
    pub(crate) frames: Vec<PathBuf>,
    pub(crate) final_fingerprint: Option<String>,
}

/// Steps the session `ticks` times at [`HEADLESS_TPS`] and writes the
/// display to `out_dir/frame_NNNN.png` after every refresh.
pub(crate) fn run_headless(
    session: &mut MinimapSession,
    ticks: u32,
    out_dir: &Path,
) -> Result<HeadlessSummary, ExportError> {
    let fixed_dt = Duration::from_secs_f64(1.0 / f64::from(HEADLESS_TPS));
    let mut frames = Vec::new();
    info!(ticks, out_dir = %out_dir.display(), "headless_run_started");

    for tick in 0..ticks {
        let reports = session.step(fixed_dt);
        if reports.is_empty() {
            continue;
        }
        let Some(instance) = session.current() else {
            continue;
        };
        let path = out_dir.join(format!("frame_{:04}.png", frames.len()));
        write_png(&path, instance, session.palette())?;
        info!(
            tick,
            frame = frames.len(),
            overlaid = reports.iter().map(|report| report.overlaid).sum::<usize>(),
            pruned = reports.iter().map(|report| report.pruned).sum::<usize>(),
            fingerprint = %image_fingerprint(instance.image()),
            "headless_frame_written"
        );
        frames.push(path);
    }

    session.shutdown();
    let final_fingerprint = session
        .current()
        .map(|instance| image_fingerprint(instance.image()));
    info!(
        ticks,
        frames = frames.len(),
        fingerprint = final_fingerprint.as_deref().unwrap_or("none"),
        "headless_run_finished"
    );
    Ok(HeadlessSummary {
        ticks,
        frames,
        final_fingerprint,
    })
}
