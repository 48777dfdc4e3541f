// A single target nuclide: identity, mass and the tables it scatters with.
use crate::cross_section::{NeutronCrossSection, PhotonCrossSection};
use crate::error::{Error, Result};
use crate::physics;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Nuclide {
    name: String,
    atomic_number: u32,
    /// Mass in neutron mass units, used directly in elastic kinematics.
    atomic_weight: f64,
    neutron: NeutronCrossSection,
    /// Photon data is a property of the material, shared by every nuclide in it.
    photon: Arc<PhotonCrossSection>,
}

impl Nuclide {
    pub fn new(
        name: impl Into<String>,
        atomic_number: u32,
        atomic_weight: f64,
        neutron: NeutronCrossSection,
        photon: Arc<PhotonCrossSection>,
    ) -> Result<Self> {
        let name = name.into();
        if !(atomic_weight.is_finite() && atomic_weight > 0.0) {
            return Err(Error::invalid(format!(
                "nuclide {name} has non-positive atomic weight {atomic_weight}"
            )));
        }
        Ok(Self {
            name,
            atomic_number,
            atomic_weight,
            neutron,
            photon,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn atomic_weight(&self) -> f64 {
        self.atomic_weight
    }

    pub fn neutron(&self) -> &NeutronCrossSection {
        &self.neutron
    }

    pub fn photon(&self) -> &Arc<PhotonCrossSection> {
        &self.photon
    }

    /// True when elastic scattering should use the closed-form hydrogen relations.
    pub fn is_hydrogen_like(&self) -> bool {
        physics::is_hydrogen_like(self.atomic_weight)
    }

    /// Probability that a collision at `energy` is elastic.
    pub fn elastic_fraction(&self, energy: f64) -> f64 {
        let total = self.neutron.total(energy);
        if total > 0.0 {
            self.neutron.elastic(energy) / total
        } else {
            0.0
        }
    }
}
