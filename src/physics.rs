// Collision kinematics and sampling: Compton scattering for photons and
// elastic scattering (fast and free-gas thermal) for neutrons.

use crate::error::{Error, Result};
use crate::utilities::erf;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Electron rest energy, MeV.
pub const ELECTRON_REST_MASS: f64 = 0.511;

/// Neutrons at or below this energy (eV) scatter with the free-gas model.
pub const THERMAL_CUTOFF: f64 = 1.0;

/// Attempts allowed in any rejection loop before sampling is reported as exhausted.
pub const MAX_REJECTION_ITERATIONS: usize = 1_000_000;

/// Mass numbers within this distance of 1 use the hydrogen kinematics.
pub const HYDROGEN_MASS_TOLERANCE: f64 = 0.1;

const COSINE_CLAMP: f64 = 1.0 - 1e-11;

pub fn is_hydrogen_like(atomic_weight: f64) -> bool {
    (atomic_weight - 1.0).abs() < HYDROGEN_MASS_TOLERANCE
}

/// Outgoing state of a collision, relative to the incident particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterOutcome {
    /// Outgoing energy divided by incident energy.
    pub energy_ratio: f64,
    /// Cosine between incident and outgoing directions.
    pub cos_theta: f64,
}

/// Ratio of scattered to incident photon energy, `alpha` in electron rest-mass units.
pub fn compton_energy_ratio(alpha: f64, cos_theta: f64) -> f64 {
    1.0 / (1.0 + alpha * (1.0 - cos_theta))
}

/// Klein-Nishina angular shape for energy ratio `beta` (no r_e^2/2 prefactor).
pub fn klein_nishina_shape(beta: f64, cos_theta: f64) -> f64 {
    beta * beta * (beta + 1.0 / beta + cos_theta * cos_theta - 1.0)
}

/// `2 * integral_{-1}^{1}` of the Klein-Nishina shape over the scattering cosine.
pub fn klein_nishina_integral(alpha: f64) -> f64 {
    let k = alpha;
    if k < 1e-3 {
        return 16.0 / 3.0 * (1.0 - 2.0 * k + 5.2 * k * k);
    }
    let l = (1.0 + 2.0 * k).ln();
    let bracket = (1.0 + k) / (k * k) * (2.0 * (1.0 + k) / (1.0 + 2.0 * k) - l / k) + l / (2.0 * k)
        - (1.0 + 3.0 * k) / ((1.0 + 2.0 * k) * (1.0 + 2.0 * k));
    4.0 * bracket
}

/// Samples a Compton scatter of a photon with `energy` MeV using Kahn's rejection method.
pub fn sample_compton<R: Rng + ?Sized>(energy: f64, rng: &mut R) -> Result<ScatterOutcome> {
    let alpha = energy / ELECTRON_REST_MASS;
    if !(alpha > 0.0 && alpha.is_finite()) {
        return Err(Error::invalid(format!("cannot Compton scatter a photon of {energy} MeV")));
    }
    for _ in 0..MAX_REJECTION_ITERATIONS {
        let r1: f64 = rng.gen();
        let r2: f64 = rng.gen();
        let r3: f64 = rng.gen();
        if (2.0 * alpha + 9.0) * r1 <= 2.0 * alpha + 1.0 {
            let eta = 1.0 + 2.0 * alpha * r2;
            if r3 * eta * eta <= 4.0 * (eta - 1.0) {
                return Ok(ScatterOutcome {
                    energy_ratio: 1.0 / eta,
                    cos_theta: 1.0 - 2.0 * r2,
                });
            }
        } else {
            let eta = (2.0 * alpha + 1.0) / (2.0 * r2 * alpha + 1.0);
            let cos_theta = 1.0 - (eta - 1.0) / alpha;
            if r3 <= 0.5 * (cos_theta * cos_theta + 1.0 / eta) {
                return Ok(ScatterOutcome {
                    energy_ratio: 1.0 / eta,
                    cos_theta,
                });
            }
        }
    }
    Err(Error::SamplingExhausted {
        routine: "compton",
        iterations: MAX_REJECTION_ITERATIONS,
    })
}

/// Lab-frame result of a target-at-rest elastic scatter with centre-of-mass cosine `mu_cm`.
pub fn elastic_lab_from_cm(atomic_weight: f64, mu_cm: f64) -> ScatterOutcome {
    let a = atomic_weight;
    let mu_cm = mu_cm.clamp(-1.0, 1.0);
    let d = a * a + 2.0 * a * mu_cm + 1.0;
    let energy_ratio = d / ((1.0 + a) * (1.0 + a));
    let cos_theta = if d > 0.0 {
        ((1.0 + a * mu_cm) / d.sqrt()).clamp(-1.0, 1.0)
    } else {
        // head-on collision with an equal mass leaves the neutron at rest
        0.0
    };
    ScatterOutcome {
        energy_ratio,
        cos_theta,
    }
}

/// Centre-of-mass quantities for a lab-frame elastic scatter into cosine `mu_lab`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabToCm {
    pub energy_ratio: f64,
    pub mu_cm: f64,
    /// d(mu_cm)/d(mu_lab).
    pub jacobian: f64,
}

/// Inverts the elastic kinematics for a target at rest. Returns `None` for
/// lab angles the collision cannot reach (backward angles off hydrogen).
pub fn elastic_cm_from_lab(atomic_weight: f64, mu_lab: f64) -> Option<LabToCm> {
    let t = mu_lab.clamp(-1.0, 1.0);
    if is_hydrogen_like(atomic_weight) {
        if t <= 0.0 {
            return None;
        }
        return Some(LabToCm {
            energy_ratio: t * t,
            mu_cm: 2.0 * t * t - 1.0,
            jacobian: 4.0 * t,
        });
    }
    let a = atomic_weight;
    let disc = a * a - 1.0 + t * t;
    if disc < 0.0 {
        return None;
    }
    let root = (t + disc.sqrt()) / (a + 1.0);
    let energy_ratio = root * root;
    let mu_cm = (((a + 1.0) * (a + 1.0) * energy_ratio - a * a - 1.0) / (2.0 * a)).clamp(-1.0, 1.0);
    let d = a * a + 2.0 * a * mu_cm + 1.0;
    let jacobian = d.powf(1.5) / (a * a * (a + mu_cm));
    if !(jacobian.is_finite() && jacobian > 0.0) {
        return None;
    }
    Some(LabToCm {
        energy_ratio,
        mu_cm,
        jacobian,
    })
}

/// Samples the outgoing state of an elastic scatter off a nuclide of mass `atomic_weight`.
///
/// Above [`THERMAL_CUTOFF`] the target is at rest: hydrogen scatters
/// isotropically in the centre-of-mass frame, heavier nuclides draw their
/// centre-of-mass cosine from `inv_cdf`. Below it the free-gas model is used.
pub fn sample_elastic<R, F>(
    atomic_weight: f64,
    energy: f64,
    temperature_kt: f64,
    inv_cdf: F,
    rng: &mut R,
) -> Result<ScatterOutcome>
where
    R: Rng + ?Sized,
    F: Fn(f64) -> f64,
{
    if energy <= THERMAL_CUTOFF {
        return sample_thermal_free_gas(atomic_weight, energy, temperature_kt, rng);
    }
    if is_hydrogen_like(atomic_weight) {
        let mu_cm = 2.0 * rng.gen::<f64>() - 1.0;
        let energy_ratio = (1.0 + mu_cm) / 2.0;
        return Ok(ScatterOutcome {
            energy_ratio,
            cos_theta: energy_ratio.sqrt(),
        });
    }
    let mu_cm = inv_cdf(rng.gen::<f64>());
    Ok(elastic_lab_from_cm(atomic_weight, mu_cm))
}

/// Free-gas elastic scatter of a neutron with `energy` eV off a target of
/// mass `atomic_weight` in thermal equilibrium at `temperature_kt` eV.
///
/// Follows the two-method scheme of Lux and Koblinger (Monte Carlo Particle
/// Transport Methods, p. 72): a weighted coin chooses between the Q1/P1 and
/// Q2/P2 samplers for the reduced relative speed `q` and momentum transfer `p`.
pub fn sample_thermal_free_gas<R: Rng + ?Sized>(
    atomic_weight: f64,
    energy: f64,
    temperature_kt: f64,
    rng: &mut R,
) -> Result<ScatterOutcome> {
    if !(energy > 0.0 && atomic_weight > 0.0 && temperature_kt > 0.0) {
        return Err(Error::invalid(format!(
            "free-gas scatter needs positive energy, mass and temperature (E={energy}, A={atomic_weight}, kT={temperature_kt})"
        )));
    }
    let lambda = 1.0 / atomic_weight;
    let a = (energy / (lambda * temperature_kt)).sqrt();
    let g = PI.sqrt() / 2.0 * (2.0 * a * a + 1.0) * erf(a);
    let h = a * (-a * a).exp();
    let normal = Normal::new(0.0, FRAC_1_SQRT_2).map_err(|e| Error::invalid(e.to_string()))?;

    for _ in 0..MAX_REJECTION_ITERATIONS {
        let (p, q) = if rng.gen::<f64>() * (g + h) > g - h {
            // Q1 / P1
            let q = (a * a - (1.0 - rng.gen::<f64>()).ln()).sqrt();
            let z = if rng.gen::<f64>() < a / q {
                rng.gen::<f64>().max(rng.gen::<f64>())
            } else {
                rng.gen::<f64>()
            };
            (2.0 * (2.0 * z + q / a - 1.0) / (lambda + 1.0), q)
        } else {
            // Q2 / P2
            let q = sample_q2(a, &normal, rng)?;
            let z = rng.gen::<f64>().max(rng.gen::<f64>());
            (2.0 * z * (q + a) / (a * (lambda + 1.0)), q)
        };

        let energy_ratio = 2.0 * p * q / a - lambda * p * p + 1.0;
        if !(energy_ratio > 0.0 && energy_ratio.is_finite()) {
            continue;
        }
        let mut cos_theta = (1.0 + energy_ratio - p * p) / (2.0 * energy_ratio.sqrt());
        if cos_theta.abs() > 1.0 {
            log::debug!("clamping free-gas cosine {cos_theta}");
            cos_theta = COSINE_CLAMP.copysign(cos_theta);
        }
        return Ok(ScatterOutcome {
            energy_ratio,
            cos_theta,
        });
    }
    Err(Error::SamplingExhausted {
        routine: "free-gas",
        iterations: MAX_REJECTION_ITERATIONS,
    })
}

fn sample_q2<R: Rng + ?Sized>(a: f64, normal: &Normal<f64>, rng: &mut R) -> Result<f64> {
    if a < 0.71 {
        let x = rng.gen::<f64>().max(rng.gen::<f64>()).max(rng.gen::<f64>());
        let q = a * (2.0 * x - 1.0);
        if rng.gen::<f64>() < (-q * q).exp() {
            return Ok(q);
        }
    }
    for _ in 0..MAX_REJECTION_ITERATIONS {
        let r = normal.sample(rng);
        let ratio = (r + a) / (2.0 * a);
        if r.abs() < a && rng.gen::<f64>() <= ratio * ratio {
            return Ok(r);
        }
    }
    Err(Error::SamplingExhausted {
        routine: "free-gas Q2",
        iterations: MAX_REJECTION_ITERATIONS,
    })
}

/// Ratio of the free-gas scattering cross section to the free-atom value
/// for `a = sqrt(A E / kT)`.
pub fn free_gas_cross_section_factor(a: f64) -> f64 {
    (1.0 + 1.0 / (2.0 * a * a)) * erf(a) + (-a * a).exp() / (a * PI.sqrt())
}

/// Free-gas double-differential scattering probability per eV per steradian
/// for a neutron going from `e_in` to `e_out` through lab cosine `mu`.
///
/// Normalized so that integrating over all outgoing energies and solid
/// angle gives one.
pub fn free_gas_kernel(atomic_weight: f64, temperature_kt: f64, e_in: f64, e_out: f64, mu: f64) -> f64 {
    if !(e_in > 0.0 && e_out > 0.0) {
        return 0.0;
    }
    let awr = atomic_weight;
    let kt = temperature_kt;
    let alpha = ((e_out + e_in - 2.0 * mu * (e_in * e_out).sqrt()) / (awr * kt)).max(1e-12);
    let beta = (e_out - e_in) / kt;
    let s = (-(alpha + beta) * (alpha + beta) / (4.0 * alpha)).exp() / (4.0 * PI * alpha).sqrt();
    let a = (awr * e_in / kt).sqrt();
    let bound = ((awr + 1.0) / awr).powi(2);
    bound * (e_out / e_in).sqrt() * s / (4.0 * PI * kt * free_gas_cross_section_factor(a))
}
