// Presets - Hand-authored starting configurations
// Each preset sets its own parameters and body count before placing bodies

use std::f64::consts::PI;

use super::{Gravity, MAX_BODIES};
use crate::diagnostics::ValidationError;

pub const PRESET_COUNT: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Ring,
    Cluster,
    Spiral,
    Cross,
    CircularOrbit,
    RandomCluster,
    BinaryPairs,
    FigureEight,
    Line,
    RadialBurst,
    Chaos,
    ChaosDrift,
    ChaosExtreme,
    ChaosTriangle,
}

impl Preset {
    pub const ALL: [Preset; PRESET_COUNT] = [
        Preset::Ring,
        Preset::Cluster,
        Preset::Spiral,
        Preset::Cross,
        Preset::CircularOrbit,
        Preset::RandomCluster,
        Preset::BinaryPairs,
        Preset::FigureEight,
        Preset::Line,
        Preset::RadialBurst,
        Preset::Chaos,
        Preset::ChaosDrift,
        Preset::ChaosExtreme,
        Preset::ChaosTriangle,
    ];

    /// Maps a 1-based index onto the table, clamping anything outside `[1, 14]`
    pub fn from_index(index: i32) -> Self {
        let p = index.clamp(1, PRESET_COUNT as i32) as usize;
        Self::ALL[p - 1]
    }

    /// 1-based index of this preset
    pub fn index(self) -> i32 {
        self as i32 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Ring => "ring",
            Preset::Cluster => "cluster",
            Preset::Spiral => "spiral",
            Preset::Cross => "cross",
            Preset::CircularOrbit => "circular orbit",
            Preset::RandomCluster => "random cluster",
            Preset::BinaryPairs => "binary pairs",
            Preset::FigureEight => "figure eight",
            Preset::Line => "line",
            Preset::RadialBurst => "radial burst",
            Preset::Chaos => "chaos",
            Preset::ChaosDrift => "chaos drift",
            Preset::ChaosExtreme => "chaos extreme",
            Preset::ChaosTriangle => "chaos triangle",
        }
    }
}

/// Integration parameters shared by every preset
struct Tuning {
    g: f64,
    dt: f64,
    softening: f64,
    pos_damping: f64,
    vel_damping: f64,
    body_count: usize,
}

impl Gravity {
    /// Clears all bodies and applies the preset at `index` (clamped into `[1, 14]`)
    pub fn load_preset(&mut self, index: i32) {
        let preset = Preset::from_index(index);

        self.reset_bodies();

        if let Err(err) = self.apply_preset(preset) {
            tracing::error!(preset = preset.name(), error = %err, "preset rejected");
            return;
        }
        tracing::debug!(
            preset = preset.name(),
            index = preset.index(),
            bodies = self.body_count,
            "preset loaded"
        );
    }

    fn tune(&mut self, t: Tuning) -> Result<(), ValidationError> {
        self.set_g(t.g)?;
        self.set_dt(t.dt)?;
        self.set_softening(t.softening)?;
        self.set_pos_damping(t.pos_damping)?;
        self.set_vel_damping(t.vel_damping)?;
        self.set_body_count(t.body_count)
    }

    fn place(&mut self, bodies: &[(f64, f64, f64, f64, f64)]) -> Result<(), ValidationError> {
        for (i, &(x, y, vx, vy, mass)) in bodies.iter().enumerate() {
            self.set_body(i, x, y, vx, vy, mass)?;
        }
        Ok(())
    }

    fn apply_preset(&mut self, preset: Preset) -> Result<(), ValidationError> {
        match preset {
            Preset::Ring => {
                // rotating ring around a heavier center
                self.tune(Tuning {
                    g: 0.1,
                    dt: 0.01,
                    softening: 0.0,
                    pos_damping: 0.02,
                    vel_damping: 0.005,
                    body_count: 10,
                })?;
                self.place(&[
                    (50.0, 0.0, 0.0, 0.4, 1.0),
                    (40.0, 40.0, -0.3, 0.3, 1.0),
                    (0.0, 50.0, -0.4, 0.0, 1.0),
                    (-40.0, 40.0, -0.3, -0.3, 1.0),
                    (-50.0, 0.0, 0.0, -0.4, 1.0),
                    (-40.0, -40.0, 0.3, -0.3, 1.0),
                    (0.0, -50.0, 0.4, 0.0, 1.0),
                    (40.0, -8.0, 0.3, 0.3, 1.0),
                    (0.0, 0.0, 0.0, 0.0, 3.0),
                    (0.0, 30.0, 0.0, 0.0, 0.5),
                ])
            }
            Preset::Cluster => {
                // asymmetric, slow drift
                self.tune(Tuning {
                    g: 0.1,
                    dt: 0.01,
                    softening: 0.0,
                    pos_damping: 0.02,
                    vel_damping: 0.01,
                    body_count: 10,
                })?;
                self.place(&[
                    (50.0, 20.0, 0.1, 0.05, 1.0),
                    (-40.0, -10.0, -0.1, 0.1, 1.0),
                    (-60.0, 70.0, 0.1, -0.05, 1.0),
                    (30.0, -60.0, -0.1, -0.1, 1.0),
                    (10.0, 10.0, 0.0, 0.0, 2.0),
                    (-10.0, -40.0, 0.05, 0.0, 0.8),
                    (0.0, -70.0, 0.0, 0.1, 0.8),
                    (-80.0, 20.0, 0.1, 0.0, 0.8),
                    (70.0, -20.0, -0.05, 0.1, 0.8),
                    (0.0, 0.0, 0.0, 0.0, 3.0),
                ])
            }
            Preset::Spiral => {
                self.tune(Tuning {
                    g: 0.1,
                    dt: 0.01,
                    softening: 0.0,
                    pos_damping: 0.02,
                    vel_damping: 0.01,
                    body_count: 10,
                })?;
                for i in 0..MAX_BODIES {
                    let angle = i as f64 * 0.6;
                    let radius = 20.0 * i as f64;
                    self.set_body(
                        i,
                        angle.cos() * radius,
                        angle.sin() * radius,
                        -angle.sin() * 0.2,
                        angle.cos() * 0.2,
                        1.0,
                    )?;
                }
                Ok(())
            }
            Preset::Cross => {
                self.tune(Tuning {
                    g: 0.3,
                    dt: 0.008,
                    softening: 0.0,
                    pos_damping: 0.02,
                    vel_damping: 0.01,
                    body_count: 10,
                })?;
                for i in 0..5 {
                    let offset = i as f64 * 50.0 - 100.0;
                    self.set_body(i, 0.0, offset, 0.2, 0.0, 1.0)?;
                    self.set_body(i + 5, offset, 0.0, 0.0, -0.2, 1.0)?;
                }
                Ok(())
            }
            Preset::CircularOrbit => {
                self.tune(Tuning {
                    g: 0.1,
                    dt: 0.02,
                    softening: 0.5,
                    pos_damping: 0.02,
                    vel_damping: 0.002,
                    body_count: 10,
                })?;
                for i in 0..MAX_BODIES {
                    let angle = 2.0 * PI * i as f64 / 9.0;
                    self.set_body(
                        i,
                        100.0 * angle.cos(),
                        100.0 * angle.sin(),
                        -angle.sin() * 0.5,
                        angle.cos() * 0.5,
                        1.0,
                    )?;
                }
                // slot 9 becomes the central mass
                self.set_body(9, 0.0, 0.0, 0.0, 0.0, 5.0)
            }
            Preset::RandomCluster => {
                self.tune(Tuning {
                    g: 0.5,
                    dt: 0.01,
                    softening: 0.4,
                    pos_damping: 0.02,
                    vel_damping: 0.01,
                    body_count: MAX_BODIES,
                })?;
                for i in 0..MAX_BODIES {
                    let x = f64::from(self.math.random_int(0, 200) - 100);
                    let y = f64::from(self.math.random_int(0, 200) - 100);
                    let vx = f64::from(self.math.random_int(0, 200) - 100) * 0.005;
                    let vy = f64::from(self.math.random_int(0, 200) - 100) * 0.005;
                    let mass = 0.5 + f64::from(self.math.random_int(0, 100)) * 0.01;
                    self.set_body(i, x, y, vx, vy, mass)?;
                }
                Ok(())
            }
            Preset::BinaryPairs => {
                // two binaries plus orbiters
                self.tune(Tuning {
                    g: 0.2,
                    dt: 0.01,
                    softening: 0.0,
                    pos_damping: 0.02,
                    vel_damping: 0.005,
                    body_count: 10,
                })?;
                self.place(&[
                    (-50.0, 0.0, 0.0, 0.3, 1.0),
                    (-30.0, 0.0, 0.0, -0.3, 1.0),
                    (50.0, 0.0, 0.0, -0.3, 1.0),
                    (30.0, 0.0, 0.0, 0.3, 1.0),
                    (0.0, 80.0, -0.3, 0.0, 1.0),
                    (0.0, 60.0, 0.3, 0.0, 1.0),
                    (0.0, -60.0, 0.3, 0.0, 1.0),
                    (0.0, -80.0, -0.3, 0.0, 1.0),
                    (0.0, 0.0, 0.0, 0.0, 2.0),
                    (0.0, 20.0, 0.0, 0.0, 0.5),
                ])
            }
            Preset::FigureEight => {
                // three-body choreography
                self.tune(Tuning {
                    g: 1.0,
                    dt: 0.005,
                    softening: 0.01,
                    pos_damping: 0.0,
                    vel_damping: 0.0,
                    body_count: 3,
                })?;
                self.place(&[
                    (0.0, 0.0, 0.347111, 0.532728, 1.0),
                    (0.970004, -0.243087, -0.347111, 0.532728, 1.0),
                    (-0.970004, 0.243087, 0.0, -1.065456, 1.0),
                ])?;
                for i in 3..MAX_BODIES {
                    self.set_body(i, 0.0, 0.0, 0.0, 0.0, 0.0)?;
                }
                Ok(())
            }
            Preset::Line => {
                // increasing mass and spacing
                self.tune(Tuning {
                    g: 0.15,
                    dt: 0.01,
                    softening: 0.2,
                    pos_damping: 0.02,
                    vel_damping: 0.005,
                    body_count: MAX_BODIES,
                })?;
                for i in 0..MAX_BODIES {
                    let k = i as f64;
                    self.set_body(i, k * 50.0, 0.0, 0.0, (k - 5.0) * 0.1, 0.5 + 0.5 * k)?;
                }
                Ok(())
            }
            Preset::RadialBurst => {
                self.tune(Tuning {
                    g: 0.2,
                    dt: 0.008,
                    softening: 0.0,
                    pos_damping: 0.02,
                    vel_damping: 0.01,
                    body_count: MAX_BODIES,
                })?;
                for i in 0..MAX_BODIES {
                    let angle = 2.0 * PI * i as f64 / 10.0;
                    self.set_body(i, 0.0, 0.0, angle.cos() * 0.3, angle.sin() * 0.3, 1.0)?;
                }
                Ok(())
            }
            Preset::Chaos => {
                // asymmetric, high speed
                self.tune(Tuning {
                    g: 0.15,
                    dt: 0.01,
                    softening: 0.05,
                    pos_damping: 0.02,
                    vel_damping: 0.0005,
                    body_count: 5,
                })?;
                self.place(&[
                    (-120.0, 80.0, 0.9, -0.4, 1.5),
                    (100.0, 60.0, -0.5, 0.6, 2.0),
                    (0.0, -100.0, 0.4, 0.8, 1.2),
                    (50.0, 50.0, -0.9, -0.2, 0.8),
                    (-70.0, -80.0, 0.6, 0.3, 1.0),
                ])
            }
            Preset::ChaosDrift => {
                self.tune(Tuning {
                    g: 0.2,
                    dt: 0.008,
                    softening: 0.05,
                    pos_damping: 0.02,
                    vel_damping: 0.001,
                    body_count: 6,
                })?;
                self.place(&[
                    (-40.0, 20.0, 0.5, 0.4, 1.0),
                    (30.0, -10.0, -0.6, 0.3, 1.8),
                    (0.0, 0.0, 0.1, -0.5, 0.6),
                    (-30.0, -30.0, 0.3, 0.6, 1.2),
                    (60.0, 10.0, -0.4, -0.3, 1.5),
                    (-50.0, 40.0, 0.7, -0.1, 0.9),
                ])
            }
            Preset::ChaosExtreme => {
                self.tune(Tuning {
                    g: 0.25,
                    dt: 0.007,
                    softening: 0.07,
                    pos_damping: 0.02,
                    vel_damping: 0.0002,
                    body_count: 7,
                })?;
                self.place(&[
                    (-200.0, 100.0, 1.0, -0.3, 1.2),
                    (180.0, 80.0, -0.8, 0.6, 2.1),
                    (0.0, -90.0, 0.5, 0.9, 0.7),
                    (60.0, 200.0, -1.1, -0.2, 1.4),
                    (-160.0, -150.0, 0.9, 0.4, 1.0),
                    (30.0, -70.0, -0.3, -0.8, 0.8),
                    (90.0, 0.0, -0.5, 0.5, 1.6),
                ])
            }
            Preset::ChaosTriangle => {
                // scattered triangle with tangential velocity
                self.tune(Tuning {
                    g: 0.15,
                    dt: 0.009,
                    softening: 0.05,
                    pos_damping: 0.02,
                    vel_damping: 0.0005,
                    body_count: 3,
                })?;
                self.place(&[
                    (-100.0, -50.0, 0.65, 0.3, 1.2),
                    (100.0, -50.0, -0.6, 0.35, 1.8),
                    (0.0, 120.0, -0.05, -0.7, 2.0),
                ])
            }
        }
    }
}
