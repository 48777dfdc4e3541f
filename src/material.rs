// Homogeneous mixture of nuclides with precomputed neutron totals and
// interaction-partner CDFs on a common energy grid.
use crate::cross_section::PhotonCrossSection;
use crate::error::{Error, Result};
use crate::nuclide::Nuclide;
use crate::utilities::EnergyTable;
use std::sync::Arc;

/// Avogadro's number times 1e-24 cm^2/barn.
pub const AVOGADRO_BARN: f64 = 0.602214;

#[derive(Debug, Clone)]
struct GridPoint {
    /// Fraction-weighted total microscopic cross section, barns.
    total_micro: f64,
    /// Cumulative probability of each composition entry being the collision partner.
    target_cdf: Vec<f64>,
}

/// A material built from `(mole fraction, nuclide)` pairs.
///
/// Fractions are used as given and need not sum to one: macroscopic cross
/// sections are the fraction-weighted sum of the nuclide values scaled by
/// `density / molecular_mass * N_A`. The neutron energy grid is taken from
/// the constituent with the most total cross-section points, and photon data
/// is taken from the first composition entry.
#[derive(Debug, Clone)]
pub struct Material {
    density: f64,
    molecular_mass: f64,
    micro_to_macro: f64,
    composition: Vec<(f64, Arc<Nuclide>)>,
    grid: EnergyTable<GridPoint>,
    photon: Arc<PhotonCrossSection>,
}

impl Material {
    /// `density` in g/cm^3, `molecular_mass` in g/mol.
    pub fn new(
        density: f64,
        molecular_mass: f64,
        composition: Vec<(f64, Arc<Nuclide>)>,
    ) -> Result<Self> {
        if composition.is_empty() {
            return Err(Error::invalid("material has no nuclides"));
        }
        if !(density.is_finite() && density > 0.0) {
            return Err(Error::invalid(format!("material density must be positive, got {density}")));
        }
        if !(molecular_mass.is_finite() && molecular_mass > 0.0) {
            return Err(Error::invalid(format!(
                "molecular mass must be positive, got {molecular_mass}"
            )));
        }
        if let Some((frac, nuclide)) = composition
            .iter()
            .find(|(frac, _)| !(frac.is_finite() && *frac >= 0.0))
        {
            return Err(Error::invalid(format!(
                "fraction {frac} of {} is not a non-negative number",
                nuclide.name()
            )));
        }
        if composition.iter().map(|(frac, _)| frac).sum::<f64>() <= 0.0 {
            return Err(Error::invalid("material fractions sum to zero"));
        }

        let grid = build_grid(&composition)?;
        let photon = Arc::clone(composition[0].1.photon());
        log::debug!(
            "material with {} nuclides on a {}-point neutron grid",
            composition.len(),
            grid.len()
        );

        Ok(Self {
            density,
            molecular_mass,
            micro_to_macro: density / molecular_mass * AVOGADRO_BARN,
            composition,
            grid,
            photon,
        })
    }

    /// Uses the fraction-weighted sum of atomic weights as the molecular mass.
    pub fn with_derived_mass(density: f64, composition: Vec<(f64, Arc<Nuclide>)>) -> Result<Self> {
        let mass = composition
            .iter()
            .map(|(frac, n)| frac * n.atomic_weight())
            .sum();
        Self::new(density, mass, composition)
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn molecular_mass(&self) -> f64 {
        self.molecular_mass
    }

    pub fn micro_to_macro(&self) -> f64 {
        self.micro_to_macro
    }

    pub fn composition(&self) -> &[(f64, Arc<Nuclide>)] {
        &self.composition
    }

    pub fn energy_grid(&self) -> &[f64] {
        self.grid.keys()
    }

    pub fn photon_table(&self) -> &Arc<PhotonCrossSection> {
        &self.photon
    }

    pub fn neutron_total_micro(&self, energy: f64) -> f64 {
        self.grid.nearest(energy).total_micro
    }

    /// Macroscopic total neutron cross section, 1/cm.
    pub fn neutron_total_atten(&self, energy: f64) -> f64 {
        self.micro_to_macro * self.neutron_total_micro(energy)
    }

    /// Linear photon attenuation coefficient, 1/cm.
    pub fn photon_total_atten(&self, energy: f64) -> f64 {
        self.density * self.photon.mass_attenuation(energy)
    }

    /// Picks the nuclide a neutron at `energy` collides with, for a uniform draw in [0, 1).
    pub fn select_interaction_target(&self, energy: f64, draw: f64) -> Result<&Nuclide> {
        let cdf = &self.grid.nearest(energy).target_cdf;
        if (0.0..1.0).contains(&draw) {
            if let Some(idx) = cdf.iter().position(|c| *c > draw) {
                return Ok(&self.composition[idx].1);
            }
        }
        Err(Error::TargetSelection { energy, draw })
    }

    /// For each nuclide, the probability that a collision at `energy` is an
    /// elastic scatter off that nuclide.
    pub fn scattering_partners(&self, energy: f64) -> Vec<(&Nuclide, f64)> {
        let total = self.neutron_total_micro(energy);
        self.composition
            .iter()
            .map(|(frac, nuclide)| {
                let weight = if total > 0.0 {
                    frac * nuclide.neutron().elastic(energy) / total
                } else {
                    0.0
                };
                (nuclide.as_ref(), weight)
            })
            .collect()
    }
}

fn build_grid(composition: &[(f64, Arc<Nuclide>)]) -> Result<EnergyTable<GridPoint>> {
    let densest = composition
        .iter()
        .max_by_key(|(_, n)| n.neutron().total_table().len())
        .map(|(_, n)| n)
        .ok_or_else(|| Error::invalid("material has no nuclides"))?;
    let fraction_sum: f64 = composition.iter().map(|(frac, _)| frac).sum();

    let points = densest
        .neutron()
        .total_table()
        .keys()
        .iter()
        .map(|&energy| {
            let shares: Vec<f64> = composition
                .iter()
                .map(|(frac, n)| frac * n.neutron().total(energy))
                .collect();
            let total_micro: f64 = shares.iter().sum();
            // a grid point where every total is zero falls back to the mole fractions
            let (shares, norm) = if total_micro > 0.0 {
                (shares, total_micro)
            } else {
                (composition.iter().map(|(frac, _)| *frac).collect(), fraction_sum)
            };
            let mut running = 0.0;
            let mut target_cdf: Vec<f64> = shares
                .iter()
                .map(|s| {
                    running += s / norm;
                    running
                })
                .collect();
            // the final entry must resolve every draw below 1
            let last = shares
                .iter()
                .rposition(|s| *s > 0.0)
                .unwrap_or(target_cdf.len() - 1);
            target_cdf[last..].iter_mut().for_each(|c| *c = 1.0);
            (
                energy,
                GridPoint {
                    total_micro,
                    target_cdf,
                },
            )
        })
        .collect();
    EnergyTable::from_pairs(points, "material energy grid")
}
