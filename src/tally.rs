// Point-like spherical detector scoring an energy spectrum.
use crate::error::Result;
use crate::geometry::Sphere;
use crate::histogram::{BinScale, Histogram};
use crate::particle::Particle;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One bin of a normalized spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub energy: f64,
    pub value: f64,
}

/// Spherical detector with an energy histogram of detection probability.
#[derive(Debug, Clone)]
pub struct Tally {
    detector: Sphere,
    histogram: Histogram,
    histories: u64,
}

impl Tally {
    /// With `lethargy`, bins are equally wide in log10 of energy and `lower` must be positive.
    pub fn new(detector: Sphere, nbins: usize, lower: f64, upper: f64, lethargy: bool) -> Result<Self> {
        let scale = if lethargy {
            BinScale::Lethargy
        } else {
            BinScale::Linear
        };
        Ok(Self {
            detector,
            histogram: Histogram::with_scale(nbins, lower, upper, scale)?,
            histories: 0,
        })
    }

    /// Scores `particle` as detected with `probability`; NaN probabilities are ignored.
    pub fn fill(&mut self, particle: &Particle, probability: f64) {
        self.fill_energy(particle.energy, particle.weight, probability);
    }

    pub fn fill_energy(&mut self, energy: f64, weight: f64, probability: f64) {
        if probability.is_nan() {
            return;
        }
        self.histogram.fill(energy, weight * probability);
    }

    pub fn in_range(&self, energy: f64) -> bool {
        self.histogram.contains(energy)
    }

    pub fn detector(&self) -> &Sphere {
        &self.detector
    }

    pub fn center(&self) -> Vector3<f64> {
        self.detector.center
    }

    pub fn radius(&self) -> f64 {
        self.detector.radius
    }

    /// Moves the detector. Accumulated contents are kept.
    pub fn set_center(&mut self, center: Vector3<f64>) {
        self.detector.center = center;
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.detector.radius = radius;
    }

    pub fn volume(&self) -> f64 {
        self.detector.volume()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn add_histories(&mut self, n: u64) {
        self.histories += n;
    }

    pub fn histories(&self) -> u64 {
        self.histories
    }

    /// Clears contents and the history count.
    pub fn reset(&mut self) {
        self.histogram.clear();
        self.histories = 0;
    }

    pub fn scale(&mut self, factor: f64) {
        self.histogram.scale(factor);
    }

    /// Bin centers in energy units.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.histogram.bin_centers()
    }

    /// Bin widths in energy units.
    pub fn bin_widths(&self) -> Vec<f64> {
        (0..self.histogram.nbins())
            .map(|i| self.histogram.linear_bin_width(i))
            .collect()
    }

    pub fn contents(&self) -> &[f64] {
        self.histogram.contents()
    }

    /// `(bin center, content per history)` in energy order. Contents are
    /// returned unnormalized until a history has been recorded.
    pub fn results(&self) -> Vec<(f64, f64)> {
        let norm = if self.histories > 0 {
            1.0 / self.histories as f64
        } else {
            1.0
        };
        self.bin_centers()
            .into_iter()
            .zip(self.contents())
            .map(|(center, content)| (center, content * norm))
            .collect()
    }

    pub fn spectrum(&self) -> Vec<SpectrumPoint> {
        self.results()
            .into_iter()
            .map(|(energy, value)| SpectrumPoint { energy, value })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.spectrum())?)
    }
}

/// Tab-separated `center value` lines, one per bin.
impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (center, value) in self.results() {
            writeln!(f, "{center}\t{value}")?;
        }
        Ok(())
    }
}
