use crate::error::{Error, Result};
use crate::geometry::Cylinder;
use crate::histogram::Histogram;
use crate::particle::{Particle, ParticleKind};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Source energy distribution.
#[derive(Debug, Clone)]
pub enum EnergySpectrum {
    /// Histogram whose bin contents are cumulative probabilities; a draw
    /// selects the center of the first bin whose content exceeds it.
    CdfHistogram(Histogram),
    /// Energies at cumulative probabilities 0, 1/(N-1), ..., 1, linearly
    /// interpolated. A single entry is a line source.
    EqualProbable(Vec<f64>),
}

impl EnergySpectrum {
    pub fn mono(energy: f64) -> Self {
        EnergySpectrum::EqualProbable(vec![energy])
    }

    pub fn equal_probable(inv_cdf: Vec<f64>) -> Result<Self> {
        if inv_cdf.is_empty() {
            return Err(Error::EmptyTable("source inverse cdf".to_string()));
        }
        if inv_cdf.iter().any(|e| !e.is_finite()) || inv_cdf.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::invalid("source inverse cdf must be finite and non-decreasing"));
        }
        Ok(EnergySpectrum::EqualProbable(inv_cdf))
    }

    pub fn cdf_histogram(cdf: Histogram) -> Result<Self> {
        if cdf.contents().windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::invalid("source cdf histogram must be non-decreasing"));
        }
        Ok(EnergySpectrum::CdfHistogram(cdf))
    }

    pub fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            EnergySpectrum::CdfHistogram(cdf) => {
                let u: f64 = rng.gen();
                let idx = cdf
                    .contents()
                    .iter()
                    .position(|c| *c > u)
                    .unwrap_or(cdf.nbins() - 1);
                cdf.bin_center(idx)
            }
            EnergySpectrum::EqualProbable(inv_cdf) => {
                if inv_cdf.len() == 1 {
                    return inv_cdf[0];
                }
                let segments = inv_cdf.len() - 1;
                let pos = rng.gen::<f64>() * segments as f64;
                let idx = (pos.floor() as usize).min(segments - 1);
                let frac = pos - idx as f64;
                inv_cdf[idx] + frac * (inv_cdf[idx + 1] - inv_cdf[idx])
            }
        }
    }
}

/// Volumetric isotropic source filling a cylinder.
#[derive(Debug, Clone)]
pub struct Source {
    pub kind: ParticleKind,
    pub volume: Cylinder,
    pub spectrum: EnergySpectrum,
}

impl Source {
    /// Fails unless the cylinder has a finite positive radius and height.
    pub fn new(kind: ParticleKind, volume: Cylinder, spectrum: EnergySpectrum) -> Result<Self> {
        if !(volume.radius > 0.0 && volume.radius.is_finite()) {
            return Err(Error::invalid(format!("source radius must be positive, got {}", volume.radius)));
        }
        if !(volume.height > 0.0 && volume.height.is_finite()) {
            return Err(Error::invalid(format!("source height must be positive, got {}", volume.height)));
        }
        Ok(Self {
            kind,
            volume,
            spectrum,
        })
    }

    /// Uniform point strictly inside the cylinder, by rejection from its
    /// bounding box. Points on the disk rim or either cap are redrawn.
    pub fn sample_position<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        let Cylinder {
            base_center,
            height,
            radius,
        } = self.volume;
        loop {
            let x = radius * (2.0 * rng.gen::<f64>() - 1.0);
            let y = radius * (2.0 * rng.gen::<f64>() - 1.0);
            let z = height * rng.gen::<f64>();
            let point = base_center + Vector3::new(x, y, z);
            if self.volume.contains(&point) {
                return point;
            }
        }
    }

    pub fn sample_direction<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        let cos_theta = 1.0 - 2.0 * rng.gen::<f64>();
        let phi = 2.0 * PI * rng.gen::<f64>();
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
    }

    pub fn create_particle<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        let position = self.sample_position(rng);
        let direction = self.sample_direction(rng);
        let energy = self.spectrum.sample(rng);
        Particle::new(self.kind, position, direction, energy)
    }
}
