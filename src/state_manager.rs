// State Manager - Thread-safe engine handling for real-time hosts
// Shares one engine behind a lock and steps it at a fixed control rate

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{ConfigError, EngineConfig};
use crate::physics_engine::{Body, Gravity};

// =============================================================================
// HOST STATE
// =============================================================================

pub struct SimulationHost {
    pub engine: Arc<RwLock<Gravity>>,
    pub is_running: Arc<RwLock<bool>>,
    pub is_paused: Arc<RwLock<bool>>,
    tick: Duration,
    worker: Option<JoinHandle<()>>,
}

impl SimulationHost {
    pub fn new(engine: Gravity, tick: Duration) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            is_running: Arc::new(RwLock::new(false)),
            is_paused: Arc::new(RwLock::new(false)),
            tick,
            worker: None,
        }
    }

    /// Builds the engine and tick period from `config`, rejecting an invalid tick rate
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let tick = config.tick_interval()?;
        Ok(Self::new(Gravity::from_config(config), tick))
    }

    /// Starts the background stepping thread; a no-op if it is already running
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        *self.is_running.write() = true;
        self.worker = Some(start_simulation_loop(
            self.engine.clone(),
            self.is_running.clone(),
            self.is_paused.clone(),
            self.tick,
        ));
    }

    /// Signals the stepping thread to exit and waits for it
    pub fn stop(&mut self) {
        *self.is_running.write() = false;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("simulation loop panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some() && *self.is_running.read()
    }

    pub fn set_paused(&self, paused: bool) {
        *self.is_paused.write() = paused;
    }

    /// Advances one step immediately, regardless of pause state
    pub fn step(&self) {
        self.engine.write().simulate();
    }

    pub fn load_preset(&self, index: i32) {
        self.engine.write().load_preset(index);
    }

    pub fn reset(&self) {
        self.engine.write().reset();
    }

    pub fn nudge(&self) {
        self.engine.write().nudge();
    }

    pub fn frame(&self) -> FrameState {
        self.engine.read().to_frame()
    }
}

impl Drop for SimulationHost {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// SIMULATION LOOP (runs in background thread)
// =============================================================================

pub fn start_simulation_loop(
    engine: Arc<RwLock<Gravity>>,
    is_running: Arc<RwLock<bool>>,
    is_paused: Arc<RwLock<bool>>,
    tick: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::info!(tick_ms = tick.as_secs_f64() * 1000.0, "simulation loop started");

        loop {
            let start = Instant::now();

            if !*is_running.read() {
                break;
            }

            if !*is_paused.read() {
                engine.write().simulate();
            }

            // Sleep to hold the control rate
            let elapsed = start.elapsed();
            if elapsed < tick {
                thread::sleep(tick - elapsed);
            }
        }

        tracing::info!("simulation loop stopped");
    })
}

// =============================================================================
// FRAME VIEW FOR DOWNSTREAM CONSUMERS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FrameBody {
    pub index: usize,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub acceleration: [f64; 2],
    pub speed: f64,
    pub mass: f64,
}

impl FrameBody {
    fn from_body(index: usize, b: &Body) -> Self {
        Self {
            index,
            position: [b.x, b.y],
            velocity: [b.vx, b.vy],
            acceleration: [b.ax, b.ay],
            speed: b.speed(),
            mass: b.mass,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameState {
    pub step: u64,
    pub body_count: usize,
    pub bodies: Vec<FrameBody>,
    pub black_hole: Option<[f64; 3]>,
    pub nudging: bool,
}

impl Gravity {
    pub fn to_frame(&self) -> FrameState {
        let bodies = self
            .active_bodies()
            .iter()
            .enumerate()
            .map(|(i, b)| FrameBody::from_body(i, b))
            .collect();

        let black_hole = self.has_black_hole().then(|| {
            let bh = self.black_hole();
            [bh.x, bh.y, bh.mass]
        });

        FrameState {
            step: self.steps(),
            body_count: self.body_count(),
            bodies,
            black_hole,
            nudging: self.is_nudging(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
