use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Directions closer than this to the z-axis use the polar-axis rotation branch.
const POLAR_TOLERANCE: f64 = 1e-8;

/// Particle species. Photon energies are in MeV, neutron energies in eV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    Photon,
    Neutron,
}

impl ParticleKind {
    pub fn energy_unit(&self) -> &'static str {
        match self {
            ParticleKind::Photon => "MeV",
            ParticleKind::Neutron => "eV",
        }
    }
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleKind::Photon => write!(f, "photon"),
            ParticleKind::Neutron => write!(f, "neutron"),
        }
    }
}

/// Transport state of one history.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    pub position: Vector3<f64>,
    /// Unit vector.
    pub direction: Vector3<f64>,
    pub energy: f64,
    pub weight: f64,
    pub scatter_count: u32,
    /// Set once the particle has left the region of interest.
    pub escaped: bool,
}

impl Particle {
    pub fn new(kind: ParticleKind, position: Vector3<f64>, direction: Vector3<f64>, energy: f64) -> Self {
        Self {
            kind,
            position,
            direction: direction.normalize(),
            energy,
            weight: 1.0,
            scatter_count: 0,
            escaped: false,
        }
    }

    pub fn advance(&mut self, distance: f64) {
        self.position += self.direction * distance;
    }

    /// Deflects the direction by polar cosine `cos_theta` with a uniformly sampled azimuth.
    pub fn scatter<R: rand::Rng + ?Sized>(&mut self, cos_theta: f64, rng: &mut R) {
        let azimuth = 2.0 * PI * rng.gen::<f64>();
        self.deflect(cos_theta, azimuth);
    }

    /// Rotates the direction about its current axis by polar cosine
    /// `cos_theta` and azimuth `azimuth`.
    pub fn deflect(&mut self, cos_theta: f64, azimuth: f64) {
        let cos_theta = cos_theta.clamp(-1.0, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let (sin_phi, cos_phi) = azimuth.sin_cos();
        let u = self.direction;

        let new_dir = if (u.z.abs() - 1.0).abs() > POLAR_TOLERANCE {
            let eta = 1.0 / (1.0 - u.z * u.z).sqrt();
            Vector3::new(
                cos_theta * u.x + sin_theta * (cos_phi * u.z * u.x - sin_phi * u.y) * eta,
                cos_theta * u.y + sin_theta * (cos_phi * u.z * u.y + sin_phi * u.x) * eta,
                cos_theta * u.z - sin_theta * cos_phi / eta,
            )
        } else {
            Vector3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta * u.z)
        };
        self.direction = new_dir.normalize();
    }
}
