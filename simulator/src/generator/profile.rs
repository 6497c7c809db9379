use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayedit::kernels::motion::aircraft_velocity_along_beam;
use rayedit::prelude::MISSING_FL32;
use rayedit::volume::{Field, MemoryVolume, PrimaryAxis, RangeGeometry, Ray, SensorPose};
use serde::{Deserialize, Serialize};

use crate::generator::template::{fold_velocity, radial_wind, reflectivity};

/// Configuration for generating a synthetic volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sweeps: usize,
    pub rays_per_sweep: usize,
    pub gates: usize,
    pub start_range_km: f32,
    pub gate_spacing_km: f32,
    pub elevation_deg: f32,
    pub elevation_step_deg: f32,
    pub nyquist_mps: f32,
    pub wind_speed_mps: f32,
    /// Direction the wind blows toward, degrees clockwise from north.
    pub wind_direction_deg: f32,
    pub noise: f32,
    /// Chance that a gate drops out, leaving gaps and speckles behind.
    pub speckle_fraction: f32,
    /// Trailing gates with no echo.
    pub missing_tail_gates: usize,
    /// Tail-radar geometry with a georeference on every ray.
    pub airborne: bool,
    pub aircraft_speed_mps: f32,
    pub track_deg: f32,
    pub tilt_deg: f32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sweeps: 2,
            rays_per_sweep: 360,
            gates: 400,
            start_range_km: 0.15,
            gate_spacing_km: 0.15,
            elevation_deg: 0.5,
            elevation_step_deg: 1.0,
            nyquist_mps: 16.0,
            wind_speed_mps: 25.0,
            wind_direction_deg: 240.0,
            noise: 0.8,
            speckle_fraction: 0.05,
            missing_tail_gates: 40,
            airborne: false,
            aircraft_speed_mps: 120.0,
            track_deg: 0.0,
            tilt_deg: 18.0,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    fn pose_for(&self, rotation_deg: f32) -> SensorPose {
        let track = self.track_deg.to_radians();
        let wind_heading = self.wind_direction_deg.to_radians();
        SensorPose {
            tilt: self.tilt_deg,
            rotation: rotation_deg,
            heading: self.track_deg,
            track: self.track_deg,
            ew_velocity: self.aircraft_speed_mps * track.sin(),
            ns_velocity: self.aircraft_speed_mps * track.cos(),
            ew_wind: self.wind_speed_mps * wind_heading.sin(),
            ns_wind: self.wind_speed_mps * wind_heading.cos(),
            ..SensorPose::default()
        }
    }
}

fn jitter(rng: &mut StdRng, noise: f32) -> f32 {
    if noise > 0.0 {
        rng.gen_range(-noise..noise)
    } else {
        0.0
    }
}

fn build_ray(
    config: &GeneratorConfig,
    rng: &mut StdRng,
    index: usize,
    sweep: usize,
    azimuth: f32,
) -> anyhow::Result<Ray> {
    let range = RangeGeometry::new(config.start_range_km, config.gate_spacing_km);
    let mut ray = Ray::new(index, sweep, config.gates, range);
    ray.azimuth_deg = azimuth;
    ray.elevation_deg = config.elevation_deg + sweep as f32 * config.elevation_step_deg;
    ray.nyquist_mps = Some(config.nyquist_mps);

    let mut platform = 0.0;
    if config.airborne {
        let pose = config.pose_for(azimuth);
        platform = aircraft_velocity_along_beam(&pose, ray.elevation_deg as f64);
        ray.georeference = Some(pose);
    }
    let wind = radial_wind(
        config.wind_speed_mps,
        config.wind_direction_deg,
        azimuth,
        ray.elevation_deg,
    );

    let echo_end = config.gates.saturating_sub(config.missing_tail_gates);
    let mut velocity = Vec::with_capacity(config.gates);
    let mut power = Vec::with_capacity(config.gates);
    for gate in 0..config.gates {
        let dropped = gate >= echo_end || rng.gen::<f32>() < config.speckle_fraction;
        if dropped {
            velocity.push(MISSING_FL32);
            power.push(MISSING_FL32);
            continue;
        }
        let measured = wind + platform + jitter(rng, config.noise);
        velocity.push(fold_velocity(measured, config.nyquist_mps));
        power.push(reflectivity(range.gate_range_km(gate) as f32) + jitter(rng, config.noise));
    }

    ray.put_field(Field::values("VEL", "m/s", MISSING_FL32, velocity))
        .with_context(|| format!("adding VEL to ray {}", index))?;
    ray.put_field(Field::values("DBZ", "dBZ", MISSING_FL32, power))
        .with_context(|| format!("adding DBZ to ray {}", index))?;
    Ok(ray)
}

pub fn build_volume(config: &GeneratorConfig) -> anyhow::Result<MemoryVolume> {
    let rays_per_sweep = config.rays_per_sweep.max(1);
    config
        .sweeps
        .checked_mul(rays_per_sweep)
        .context("overflow computing ray count for generator")?;

    let axis = if config.airborne {
        PrimaryAxis::YPrime
    } else {
        PrimaryAxis::Z
    };
    let mut volume = MemoryVolume::new(axis);
    let mut rng = StdRng::seed_from_u64(config.seed);
    for sweep in 0..config.sweeps {
        for step in 0..rays_per_sweep {
            let azimuth = step as f32 * 360.0 / rays_per_sweep as f32;
            let index = volume.rays().len();
            volume.push_ray(build_ray(config, &mut rng, index, sweep, azimuth)?);
        }
    }
    log::info!(
        "generated {} rays of {} gates ({:?} axis)",
        volume.rays().len(),
        config.gates,
        axis
    );
    Ok(volume)
}
