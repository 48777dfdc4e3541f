// Woodcock (delta) tracking against the model majorant, and the collision
// handlers that follow an accepted flight.

use crate::error::{Error, Result};
use crate::material::Material;
use crate::model::Model;
use crate::particle::{Particle, ParticleKind};
use crate::physics::{self, MAX_REJECTION_ITERATIONS};
use rand::Rng;

/// Flies the particle to its next real collision.
///
/// Returns `Ok(true)` when a collision is accepted inside the region of
/// interest and `Ok(false)` once the particle has escaped. Photons lose the
/// non-Compton share of their weight on acceptance.
pub fn delta_tracking<R: Rng + ?Sized>(particle: &mut Particle, model: &Model, rng: &mut R) -> Result<bool> {
    if particle.escaped {
        return Ok(false);
    }
    let mu_max = model.majorant(particle.kind, particle.energy);
    if !(mu_max > 0.0) {
        // nothing to collide with anywhere
        particle.escaped = true;
        return Ok(false);
    }

    for _ in 0..MAX_REJECTION_ITERATIONS {
        let distance = -(1.0 - rng.gen::<f64>()).ln() / mu_max;
        particle.advance(distance);
        if !model.roi.contains(&particle.position) {
            particle.escaped = true;
            return Ok(false);
        }

        let mu_true = model.coefficient(particle.kind, particle.energy, &particle.position);
        if rng.gen::<f64>() * mu_max < mu_true {
            if particle.kind == ParticleKind::Photon {
                let material = model.material_at(&particle.position);
                particle.weight *= material.photon_table().compton_over_total(particle.energy);
            }
            return Ok(true);
        }
    }
    Err(Error::SamplingExhausted {
        routine: "delta tracking",
        iterations: MAX_REJECTION_ITERATIONS,
    })
}

/// Applies the collision physics for the particle's kind at its current position.
pub fn collide<R: Rng + ?Sized>(particle: &mut Particle, model: &Model, rng: &mut R) -> Result<()> {
    match particle.kind {
        ParticleKind::Photon => compton_collision(particle, rng),
        ParticleKind::Neutron => {
            let material = model.material_at(&particle.position);
            neutron_elastic_collision(particle, material, model.settings.temperature_kt, rng)
        }
    }
}

pub fn compton_collision<R: Rng + ?Sized>(particle: &mut Particle, rng: &mut R) -> Result<()> {
    let outcome = physics::sample_compton(particle.energy, rng)?;
    particle.energy *= outcome.energy_ratio;
    particle.scatter(outcome.cos_theta, rng);
    Ok(())
}

/// Picks a partner nuclide, keeps the elastic share of the weight and scatters.
pub fn neutron_elastic_collision<R: Rng + ?Sized>(
    particle: &mut Particle,
    material: &Material,
    temperature_kt: f64,
    rng: &mut R,
) -> Result<()> {
    let energy = particle.energy;
    let nuclide = material.select_interaction_target(energy, rng.gen::<f64>())?;
    particle.weight *= nuclide.elastic_fraction(energy);

    let outcome = physics::sample_elastic(
        nuclide.atomic_weight(),
        energy,
        temperature_kt,
        |p| nuclide.neutron().angular_inv_cdf(energy, p),
        rng,
    )?;
    particle.energy *= outcome.energy_ratio;
    particle.scatter(outcome.cos_theta, rng);
    Ok(())
}
