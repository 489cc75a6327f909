//! Window that presents one minimap display of a [`MinimapSession`].

mod input;
mod metrics;
mod present;

use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::session::MinimapSession;

use input::InputCollector;
use metrics::MetricsAccumulator;

pub use metrics::{MetricsHandle, ViewerMetricsSnapshot};

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_title: "Minimap".to_string(),
            window_width: 768,
            window_height: 768,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create viewer window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize pixel surface: {0}")]
    CreateRenderer(#[source] pixels::Error),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_viewer(config: ViewerConfig, session: MinimapSession) -> Result<(), ViewerError> {
    run_viewer_with_metrics(config, session, MetricsHandle::default())
}

pub fn run_viewer_with_metrics(
    config: ViewerConfig,
    session: MinimapSession,
    metrics_handle: MetricsHandle,
) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new().map_err(ViewerError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(ViewerError::CreateWindow)?,
    );
    let size = window.inner_size();
    let mut surface = Surface {
        pixels: build_pixels(Arc::clone(&window), size.width, size.height)
            .map_err(ViewerError::CreateRenderer)?,
        size: (size.width, size.height),
    };

    event_loop.set_control_flow(ControlFlow::Poll);
    let mut state = ViewerState::new(&config, session, metrics_handle);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) if new_size.width > 0 && new_size.height > 0 => {
                    if let Err(error) = surface.rebuild(&window, new_size.width, new_size.height) {
                        warn!(error = %error, "viewer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    state.input.handle_keyboard_input(&event);
                    if state.input.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => state.input.handle_mouse_wheel(delta),
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    if let Some(title) = state.frame(now, &mut surface) {
                        window.set_title(&title);
                    }
                    if let Err(error) = surface.pixels.render() {
                        warn!(error = %error, "viewer_draw_failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                state.session.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(ViewerError::EventLoopRun)
}

struct Surface {
    pixels: Pixels<'static>,
    size: (u32, u32),
}

impl Surface {
    fn rebuild(&mut self, window: &Arc<Window>, width: u32, height: u32) -> Result<(), pixels::Error> {
        self.pixels = build_pixels(Arc::clone(window), width, height)?;
        self.size = (width, height);
        Ok(())
    }
}

/// Everything the redraw handler mutates, kept apart from winit so the
/// per-frame bookkeeping reads top to bottom.
struct ViewerState {
    session: MinimapSession,
    input: InputCollector,
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    backlog: Duration,
    last_frame: Instant,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
    window_title: String,
    metrics_in_title: bool,
}

impl ViewerState {
    fn new(config: &ViewerConfig, session: MinimapSession, metrics_handle: MetricsHandle) -> Self {
        let target_tps = config.target_tps.max(1);
        let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
        info!(
            target_tps,
            max_ticks_per_frame,
            display = session.display().0,
            "viewer_config"
        );
        Self {
            session,
            input: InputCollector::default(),
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(target_tps)),
            max_frame_delta: non_zero_or(config.max_frame_delta, Duration::from_millis(250)),
            max_ticks_per_frame,
            backlog: Duration::ZERO,
            last_frame: Instant::now(),
            metrics: MetricsAccumulator::new(non_zero_or(
                config.metrics_log_interval,
                Duration::from_secs(1),
            )),
            metrics_handle,
            window_title: config.window_title.clone(),
            metrics_in_title: false,
        }
    }

    /// Applies pending input, runs due steps and draws the current minimap.
    /// Returns a new window title when it should change.
    fn frame(&mut self, now: Instant, surface: &mut Surface) -> Option<String> {
        let mut title = None;
        if self.input.take_title_toggle_pressed() {
            self.metrics_in_title = !self.metrics_in_title;
            info!(metrics_title = self.metrics_in_title, "metrics_title_toggled");
            if !self.metrics_in_title {
                title = Some(self.window_title.clone());
            }
        }
        let zoom_steps = self.input.take_zoom_steps();
        if zoom_steps != 0 {
            if let Err(error) = self.session.zoom(zoom_steps) {
                warn!(error = %error, "viewer_zoom_failed");
            }
        }

        let frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.run_due_steps(frame_dt);

        if let Some((width, height, rgba)) = self.session.current_rgba() {
            present::present_centered(surface.pixels.frame_mut(), surface.size, &rgba, (width, height));
        }
        self.metrics.record_frame(frame_dt);

        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            self.metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                frame_time_ms = snapshot.frame_time_ms,
                refreshes_per_second = snapshot.refreshes_per_second,
                overlaid_per_refresh = snapshot.overlaid_per_refresh,
                pruned = snapshot.pruned,
                sprites = self.session.world().sprites().len(),
                tracked = self.session.tracker().tracked(self.session.display()).len(),
                "viewer_metrics"
            );
            if self.metrics_in_title {
                title = Some(format!(
                    "{} | {:.0} fps | {:.1} refresh/s | scale {}",
                    self.window_title,
                    snapshot.fps,
                    snapshot.refreshes_per_second,
                    self.session
                        .current()
                        .map_or_else(|| "-".to_string(), |instance| instance.scale().to_string())
                ));
            }
        }
        title
    }

    /// Fixed-step accumulator: the frame delta is clamped, at most
    /// `max_ticks_per_frame` steps run, and leftover backlog is dropped.
    fn run_due_steps(&mut self, frame_dt: Duration) -> u32 {
        self.backlog = self.backlog.saturating_add(frame_dt.min(self.max_frame_delta));
        let mut steps = 0u32;
        while self.backlog >= self.fixed_dt && steps < self.max_ticks_per_frame {
            self.backlog -= self.fixed_dt;
            steps += 1;
            let reports = self.session.step(self.fixed_dt);
            self.metrics.record_refreshes(&reports);
        }
        if self.backlog >= self.fixed_dt {
            warn!(
                dropped_backlog_ms = self.backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "viewer_step_clamp_triggered"
            );
            self.backlog = Duration::ZERO;
        }
        steps
    }
}

fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, pixels::Error> {
    let surface = SurfaceTexture::new(width, height, window);
    Pixels::new(width, height, surface)
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
