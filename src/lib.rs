// Monte Carlo photon and neutron transport with delta tracking and correlated
// forced detection into a small spherical detector.

pub mod cell;
pub mod cfd;
pub mod config;
pub mod cross_section;
pub mod error;
pub mod fast_rng;
pub mod geometry;
pub mod histogram;
pub mod material;
pub mod model;
pub mod nuclide;
pub mod particle;
pub mod physics;
pub mod settings;
pub mod source;
pub mod tally;
pub mod tracking;
pub mod utilities;

pub use cell::Cell;
pub use config::{Config, NuclideEntry};
pub use cross_section::{NeutronCrossSection, PhotonCrossSection};
pub use error::{Error, Result};
pub use fast_rng::FastRng;
pub use geometry::{Cylinder, Ray, Shape, Sphere};
pub use histogram::{BinScale, Histogram};
pub use material::Material;
pub use model::{HistoryOutcome, Model, RunSummary};
pub use nuclide::Nuclide;
pub use particle::{Particle, ParticleKind};
pub use settings::Settings;
pub use source::{EnergySpectrum, Source};
pub use tally::{SpectrumPoint, Tally};
pub use utilities::EnergyTable;
