//! Render worker state machine.
//!
//! A [`Worker`] is the engine side of a distributed render node. A leader
//! first runs a setup that hands it a scene, then requests rectangular tiles
//! which are streamed back one scanline at a time, and finally ends the
//! render to free the node for the next job. The transport carrying these
//! calls lives outside this crate; every operation here is synchronous and
//! reports through plain channels and return values. A worker is shared by
//! reference between the threads serving its calls.
//!
//! ```text
//! FREE --render_setup--> BUSY_RENDER_SETUP --ok--> ALLOCATED
//!                                          \-err--> FREE
//! ALLOCATED --render_tile--> BUSY_RENDERING --last tile done--> ALLOCATED
//! any --render_end--> FREE
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use strata_core::RenderConfig;
use strata_math::StrataRng;

use crate::canvas::to_pixel;
use crate::error::{RenderError, RenderResult, SceneResult};
use crate::integrator::{sampler_for, Sampler};
use crate::renderer::render_pixel;
use crate::scene::Scene;

/// What a worker is doing, as reported to discovery queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Free,
    Allocated,
    BusyRenderSetup,
    BusyRendering,
}

/// Answer to a worker status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStatusReport {
    pub node_name: String,
    pub cores: usize,
    pub total_memory: u64,
    pub status: WorkerStatus,
}

/// Final message of a render setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStatus {
    Ready,
    Failed(String),
}

/// A rectangle of pixels to render, half-open: `[x0, x1) x [y0, y1)`.
///
/// Row 0 is the top of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRequest {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRequest {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    fn validate(&self, width: u32, height: u32) -> RenderResult<()> {
        if self.x0 >= self.x1 || self.y0 >= self.y1 || self.x1 > width || self.y1 > height {
            return Err(RenderError::TileOutOfBounds {
                x0: self.x0,
                y0: self.y0,
                x1: self.x1,
                y1: self.y1,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// One streamed scanline of a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileChunk {
    pub width: u32,
    /// Always 1: tiles stream per scanline
    pub height: u32,
    pub pos_x: u32,
    pub pos_y: u32,
    /// Interleaved RGBA, `width * 4` values
    pub pixels: Vec<f32>,
}

/// How a tile stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    Completed,
    /// The cancel flag was raised; rows already sent are valid, the rest of
    /// the tile was never delivered.
    Cancelled,
}

/// Statistics returned when a render ends.
///
/// `render_time` sums the time spent in each tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub rays_traced: u64,
    pub render_time: Duration,
}

/// State held between setup and the end of a render.
///
/// Tiles in flight hold their own reference, so a render can end while
/// they finish.
struct Session {
    scene: Scene,
    config: RenderConfig,
    sampler: Box<dyn Sampler>,
    /// Summed over tiles, so concurrent tiles count separately
    render_nanos: AtomicU64,
}

impl Session {
    fn render_time(&self) -> Duration {
        Duration::from_nanos(self.render_nanos.load(Ordering::Relaxed))
    }
}

struct WorkerState {
    status: WorkerStatus,
    session: Option<Arc<Session>>,
    active_tiles: usize,
}

/// A render node driven by a remote leader.
///
/// Every operation takes `&self`: status queries answer while tiles
/// stream, and up to `cores` tiles render concurrently.
pub struct Worker {
    node_name: String,
    cores: usize,
    total_memory: u64,
    state: Mutex<WorkerState>,
}

impl Worker {
    pub fn new(node_name: impl Into<String>, cores: usize, total_memory: u64) -> Self {
        Self {
            node_name: node_name.into(),
            cores: cores.max(1),
            total_memory,
            state: Mutex::new(WorkerState {
                status: WorkerStatus::Free,
                session: None,
                active_tiles: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkerState> {
        // The state is left consistent at every unlock, so a panicked
        // holder does not invalidate it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> WorkerStatus {
        self.state().status
    }

    pub fn query_status(&self) -> WorkerStatusReport {
        log::debug!("Status query on worker {}", self.node_name);
        WorkerStatusReport {
            node_name: self.node_name.clone(),
            cores: self.cores,
            total_memory: self.total_memory,
            status: self.status(),
        }
    }

    /// Prepare the worker for a render.
    ///
    /// `load_scene` stands in for fetching and decoding the scene assets and
    /// runs without holding the state lock, so queries meanwhile report
    /// BUSY_RENDER_SETUP. Any previous session is discarded. On failure the
    /// worker goes back to FREE and the message is reported in
    /// [`SetupStatus::Failed`].
    pub fn render_setup<F>(&self, config: RenderConfig, load_scene: F) -> SetupStatus
    where
        F: FnOnce() -> SceneResult<Scene>,
    {
        {
            let mut state = self.state();
            state.session = None;
            state.active_tiles = 0;
            state.status = WorkerStatus::BusyRenderSetup;
        }
        log::info!(
            "Render setup on worker {}: {}x{}, {} samples",
            self.node_name,
            config.width,
            config.height,
            config.samples
        );

        let loaded = config
            .validate()
            .map_err(RenderError::from)
            .and_then(|()| load_scene().map_err(RenderError::from));

        let mut state = self.state();
        match loaded {
            Ok(scene) => {
                let sampler = sampler_for(&config);
                state.session = Some(Arc::new(Session {
                    scene,
                    config,
                    sampler,
                    render_nanos: AtomicU64::new(0),
                }));
                state.status = WorkerStatus::Allocated;
                log::info!("Worker {} is ready", self.node_name);
                SetupStatus::Ready
            }
            Err(err) => {
                state.status = WorkerStatus::Free;
                log::error!("Render setup failed on worker {}: {}", self.node_name, err);
                SetupStatus::Failed(err.to_string())
            }
        }
    }

    /// Render a tile, sending one [`TileChunk`] per scanline on `chunks`.
    ///
    /// `cancel` is polled before every scanline. The random stream depends
    /// only on the render seed and the tile origin, so re-requesting a tile
    /// reproduces it exactly, whichever tiles run alongside it.
    pub fn render_tile(
        &self,
        request: TileRequest,
        cancel: &AtomicBool,
        chunks: &Sender<TileChunk>,
    ) -> RenderResult<TileOutcome> {
        let session = self.begin_tile(&request)?;
        log::debug!(
            "Worker {} rendering tile [{},{}]-[{},{})",
            self.node_name,
            request.x0,
            request.y0,
            request.x1,
            request.y1
        );

        let start = Instant::now();
        let result = stream_tile(&session, request, cancel, chunks);
        session
            .render_nanos
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        self.finish_tile(&session);

        match &result {
            Ok(TileOutcome::Cancelled) => log::warn!(
                "Tile [{},{}] cancelled on worker {}",
                request.x0,
                request.y0,
                self.node_name
            ),
            Err(err) => log::error!(
                "Tile [{},{}] failed on worker {}: {}",
                request.x0,
                request.y0,
                self.node_name,
                err
            ),
            Ok(TileOutcome::Completed) => {}
        }
        result
    }

    fn begin_tile(&self, request: &TileRequest) -> RenderResult<Arc<Session>> {
        let mut state = self.state();
        let status = state.status;
        let session = match &state.session {
            Some(session)
                if matches!(status, WorkerStatus::Allocated | WorkerStatus::BusyRendering) =>
            {
                session.clone()
            }
            _ => return Err(RenderError::NotReady(status)),
        };
        request.validate(session.config.width, session.config.height)?;
        if state.active_tiles >= self.cores {
            return Err(RenderError::AllCoresBusy(self.cores));
        }

        state.active_tiles += 1;
        state.status = WorkerStatus::BusyRendering;
        Ok(session)
    }

    fn finish_tile(&self, session: &Arc<Session>) {
        let mut state = self.state();
        // A tile from an ended or replaced session no longer counts
        let current = state
            .session
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, session));
        if !current {
            return;
        }
        state.active_tiles = state.active_tiles.saturating_sub(1);
        if state.active_tiles == 0 {
            state.status = WorkerStatus::Allocated;
        }
    }

    /// Release the scene and return to FREE.
    pub fn render_end(&self) -> RenderStats {
        let session = {
            let mut state = self.state();
            state.status = WorkerStatus::Free;
            state.active_tiles = 0;
            state.session.take()
        };
        let stats = session
            .map(|session| RenderStats {
                rays_traced: session.sampler.rays_traced(),
                render_time: session.render_time(),
            })
            .unwrap_or_default();
        log::info!(
            "Render ended on worker {}: {} rays in {:?}",
            self.node_name,
            stats.rays_traced,
            stats.render_time
        );
        stats
    }
}

fn tile_seed(seed: u64, request: &TileRequest) -> u64 {
    seed ^ ((request.y0 as u64) << 32 | request.x0 as u64)
}

fn stream_tile(
    session: &Session,
    request: TileRequest,
    cancel: &AtomicBool,
    chunks: &Sender<TileChunk>,
) -> RenderResult<TileOutcome> {
    let mut rng = StrataRng::seed_from_u64(tile_seed(session.config.seed, &request));
    let sampler: &dyn Sampler = session.sampler.as_ref();

    for y in request.y0..request.y1 {
        if cancel.load(Ordering::Relaxed) {
            return Ok(TileOutcome::Cancelled);
        }

        let mut pixels = Vec::with_capacity(request.width() as usize * 4);
        for x in request.x0..request.x1 {
            let color = render_pixel(&session.scene, sampler, &session.config, x, y, &mut rng);
            pixels.extend_from_slice(&to_pixel(color).to_array());
        }

        let chunk = TileChunk {
            width: request.width(),
            height: 1,
            pos_x: request.x0,
            pos_y: y,
            pixels,
        };
        chunks.send(chunk).map_err(|_| RenderError::StreamClosed)?;
    }

    Ok(TileOutcome::Completed)
}
