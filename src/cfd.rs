// Correlated forced detection: every emission and collision point scores the
// probability of reaching the detector sphere on an uncollided straight path.

use crate::error::Result;
use crate::geometry::Ray;
use crate::material::Material;
use crate::model::Model;
use crate::particle::{Particle, ParticleKind};
use crate::physics::{self, ELECTRON_REST_MASS, THERMAL_CUTOFF};
use crate::tally::Tally;
use nalgebra::Vector3;
use once_cell::sync::Lazy;
use rand::Rng;
use std::f64::consts::PI;

const THERMAL_BIN_COUNT: usize = 50;
const THERMAL_MIN_ENERGY: f64 = 1e-5;

/// `(center, width)` of the outgoing-energy bins used for thermal scores, eV.
/// Log-spaced over [1e-5, 1] eV; the center is the geometric mean of the edges.
static THERMAL_BINS: Lazy<Vec<(f64, f64)>> = Lazy::new(|| {
    let lo = THERMAL_MIN_ENERGY.log10();
    let hi = THERMAL_CUTOFF.log10();
    let step = (hi - lo) / THERMAL_BIN_COUNT as f64;
    (0..THERMAL_BIN_COUNT)
        .map(|i| {
            let a = 10f64.powf(lo + step * i as f64);
            let b = 10f64.powf(lo + step * (i + 1) as f64);
            ((a * b).sqrt(), b - a)
        })
        .collect()
});

pub fn thermal_bins() -> &'static [(f64, f64)] {
    &THERMAL_BINS
}

/// Line of sight from a collision point to the detector.
#[derive(Debug, Clone, Copy)]
struct DetectorView {
    ray: Ray,
    solid_angle: f64,
    /// Mean chord through the detector divided by its volume.
    track_per_volume: f64,
}

impl DetectorView {
    /// `None` when the point lies inside the detector sphere.
    fn new(position: &Vector3<f64>, tally: &Tally) -> Option<Self> {
        let delta = tally.center() - position;
        let distance = delta.norm();
        let radius = tally.radius();
        if distance <= radius {
            return None;
        }
        let ratio = radius / distance;
        Some(Self {
            ray: Ray::new(*position, delta),
            solid_angle: 2.0 * PI * (1.0 - (1.0 - ratio * ratio).sqrt()),
            track_per_volume: 4.0 * radius / 3.0 / tally.volume(),
        })
    }

    fn cos_theta(&self, direction: &Vector3<f64>) -> f64 {
        self.ray.direction().dot(direction).clamp(-1.0, 1.0)
    }
}

/// Scores the particle's current state: the primary kernel before the first
/// collision, the scattered kernel afterwards.
pub fn force_detection<R: Rng + ?Sized>(
    particle: &Particle,
    model: &Model,
    tally: &mut Tally,
    rng: &mut R,
) -> Result<()> {
    if particle.scatter_count == 0 {
        primary_contribution(particle, model, tally);
        return Ok(());
    }
    match particle.kind {
        ParticleKind::Photon => photon_scatter_contribution(particle, model, tally),
        ParticleKind::Neutron => neutron_scatter_contribution(particle, model, tally, rng),
    }
    Ok(())
}

/// Uncollided flight along the current direction: chord through the detector
/// per unit detector volume, attenuated to the detector.
pub fn primary_contribution(particle: &Particle, model: &Model, tally: &mut Tally) {
    let flight = Ray::new(particle.position, particle.direction);
    let chord = tally.detector().intersection_length(&flight);
    if chord <= 0.0 {
        return;
    }
    let toward = Ray::new(particle.position, tally.center() - particle.position);
    let mu = model.coefficient(particle.kind, particle.energy, &particle.position);
    let attenuation = (-mu * model.roi.distance_to_exit(&toward)).exp();
    tally.fill(particle, chord / tally.volume() * attenuation);
}

/// Klein-Nishina scatter toward the detector.
pub fn photon_scatter_contribution(particle: &Particle, model: &Model, tally: &mut Tally) {
    let Some(view) = DetectorView::new(&particle.position, tally) else {
        return;
    };
    let material = model.material_at(&particle.position);
    let cos_theta = view.cos_theta(&particle.direction);
    let beta = physics::compton_energy_ratio(particle.energy / ELECTRON_REST_MASS, cos_theta);
    let energy = beta * particle.energy;
    if !tally.in_range(energy) {
        return;
    }
    let integral = material.photon_table().compton_integral(particle.energy);
    if integral <= 0.0 {
        return;
    }
    let p_omega = physics::klein_nishina_shape(beta, cos_theta) / (PI * integral);
    let attenuation = (-material.photon_total_atten(energy) * model.roi.distance_to_exit(&view.ray)).exp();
    tally.fill_energy(
        energy,
        particle.weight,
        p_omega * view.solid_angle * view.track_per_volume * attenuation,
    );
}

/// Elastic scatter toward the detector, summed over the nuclides of the
/// material at the collision point.
pub fn neutron_scatter_contribution<R: Rng + ?Sized>(
    particle: &Particle,
    model: &Model,
    tally: &mut Tally,
    rng: &mut R,
) {
    let Some(view) = DetectorView::new(&particle.position, tally) else {
        return;
    };
    let material = model.material_at(&particle.position);
    let path = model.roi.distance_to_exit(&view.ray);
    if particle.energy > THERMAL_CUTOFF {
        fast_neutron_scores(particle, material, &view, path, tally);
    } else {
        let fraction = model.settings.thermal_fraction;
        if fraction < 1.0 && rng.gen::<f64>() >= fraction {
            return;
        }
        thermal_neutron_scores(particle, material, model.settings.temperature_kt, &view, path, 1.0 / fraction, tally);
    }
}

fn fast_neutron_scores(particle: &Particle, material: &Material, view: &DetectorView, path: f64, tally: &mut Tally) {
    let cos_theta = view.cos_theta(&particle.direction);
    let energy_in = particle.energy;
    for (nuclide, share) in material.scattering_partners(energy_in) {
        if share <= 0.0 {
            continue;
        }
        let Some(cm) = physics::elastic_cm_from_lab(nuclide.atomic_weight(), cos_theta) else {
            continue;
        };
        let energy = energy_in * cm.energy_ratio;
        if !tally.in_range(energy) {
            continue;
        }
        // hydrogen scatters isotropically in the centre-of-mass frame
        let pdf_cm = if nuclide.is_hydrogen_like() {
            0.5
        } else {
            nuclide.neutron().angular_pdf(energy_in, cm.mu_cm)
        };
        let p_omega = pdf_cm * cm.jacobian / (2.0 * PI);
        let attenuation = (-material.neutron_total_atten(energy) * path).exp();
        tally.fill_energy(
            energy,
            particle.weight,
            share * p_omega * view.solid_angle * view.track_per_volume * attenuation,
        );
    }
}

fn thermal_neutron_scores(
    particle: &Particle,
    material: &Material,
    temperature_kt: f64,
    view: &DetectorView,
    path: f64,
    scale: f64,
    tally: &mut Tally,
) {
    let cos_theta = view.cos_theta(&particle.direction);
    let energy_in = particle.energy;
    let geometry = view.solid_angle * view.track_per_volume * scale;
    for (nuclide, share) in material.scattering_partners(energy_in) {
        if share <= 0.0 {
            continue;
        }
        for &(energy, width) in thermal_bins() {
            if !tally.in_range(energy) {
                continue;
            }
            let kernel = physics::free_gas_kernel(nuclide.atomic_weight(), temperature_kt, energy_in, energy, cos_theta);
            let attenuation = (-material.neutron_total_atten(energy) * path).exp();
            tally.fill_energy(energy, particle.weight, share * kernel * width * geometry * attenuation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::cross_section::{NeutronCrossSection, PhotonCrossSection};
    use crate::geometry::{Cylinder, Sphere};
    use crate::nuclide::Nuclide;
    use crate::settings::Settings;
    use crate::source::{EnergySpectrum, Source};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn model(kind: ParticleKind, density: f64, settings: Settings) -> Model {
        let photon = Arc::new(
            PhotonCrossSection::new(
                vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7],
                vec![0.1; 7],
                (1..=7).map(|i| physics::klein_nishina_integral(0.1 * i as f64 / ELECTRON_REST_MASS)).collect(),
                vec![1.0; 7],
            )
            .unwrap(),
        );
        let xs = NeutronCrossSection::new(vec![(1e-5, 1.0), (1e7, 1.0)], vec![(1e-5, 1.0), (1e7, 1.0)]).unwrap();
        let h1 = Arc::new(Nuclide::new("H1", 1, 1.0, xs, photon).unwrap());
        let material = Arc::new(Material::new(density, 1.0, vec![(1.0, h1)]).unwrap());
        let roi = Sphere::new(Vector3::zeros(), 5.0);
        Model::new(
            roi,
            vec![Cell::new(material, roi)],
            Source::new(kind, Cylinder::new(Vector3::new(0.0, 0.0, -0.5), 1.0, 0.5), EnergySpectrum::mono(1.0)).unwrap(),
            settings,
        )
        .unwrap()
    }

    fn tally(nbins: usize, lower: f64, upper: f64, lethargy: bool) -> Tally {
        Tally::new(Sphere::new(Vector3::new(50.0, 0.0, 0.0), 1.0), nbins, lower, upper, lethargy).unwrap()
    }

    #[test]
    fn test_thermal_bins_cover_sub_ev_range() {
        let bins = thermal_bins();
        assert_eq!(bins.len(), 50);
        let total: f64 = bins.iter().map(|(_, w)| w).sum();
        assert_abs_diff_eq!(total, 1.0 - 1e-5, epsilon = 1e-9);
        assert!(bins.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_primary_requires_line_of_flight() {
        let model = model(ParticleKind::Photon, 1e-9, Settings::default());
        let mut t = tally(10, 0.0, 1.0, false);
        let away = Particle::new(ParticleKind::Photon, Vector3::zeros(), -Vector3::x(), 0.5);
        primary_contribution(&away, &model, &mut t);
        assert_eq!(t.histogram().total(), 0.0);

        let toward = Particle::new(ParticleKind::Photon, Vector3::zeros(), Vector3::x(), 0.5);
        primary_contribution(&toward, &model, &mut t);
        // diameter chord through a unit sphere, negligible attenuation
        assert_relative_eq!(t.histogram().total(), 2.0 / t.volume(), max_relative = 1e-6);
    }

    #[test]
    fn test_primary_attenuates_to_boundary() {
        let model = model(ParticleKind::Photon, 1.0, Settings::default());
        let mut t = tally(10, 0.0, 1.0, false);
        let p = Particle::new(ParticleKind::Photon, Vector3::zeros(), Vector3::x(), 0.5);
        primary_contribution(&p, &model, &mut t);
        // mu = 0.1 over the 5 cm to the region boundary
        assert_relative_eq!(t.histogram().total(), 2.0 / t.volume() * (-0.5f64).exp(), max_relative = 1e-9);
    }

    #[test]
    fn test_photon_forward_scatter_keeps_energy() {
        let model = model(ParticleKind::Photon, 1e-9, Settings::default());
        let mut t = tally(100, 0.0, 1.0, false);
        let mut p = Particle::new(ParticleKind::Photon, Vector3::zeros(), Vector3::x(), 0.5);
        p.scatter_count = 1;
        photon_scatter_contribution(&p, &model, &mut t);
        let idx = t.histogram().bin_index(0.5).unwrap();
        assert!(t.contents()[idx] > 0.0);
        assert_abs_diff_eq!(t.histogram().total(), t.contents()[idx], epsilon = 1e-15);

        // back scatter lands at the Compton edge
        let mut t = tally(100, 0.0, 1.0, false);
        p.direction = -Vector3::x();
        photon_scatter_contribution(&p, &model, &mut t);
        let edge = 0.5 / (1.0 + 2.0 * 0.5 / ELECTRON_REST_MASS);
        assert!(t.contents()[t.histogram().bin_index(edge).unwrap()] > 0.0);
    }

    #[test]
    fn test_photon_scatter_density_integrates_to_one() {
        // average the score over isotropic directions; the angular density must
        // integrate to one so the mean equals the solid-angle factor
        let model = model(ParticleKind::Photon, 1e-9, Settings::default());
        let mut rng = StdRng::seed_from_u64(17);
        let mut t = tally(10, 0.0, 1.0, false);
        let n = 40000;
        for _ in 0..n {
            let mut p = model.source.create_particle(&mut rng);
            p.position = Vector3::zeros();
            p.energy = 0.4;
            p.scatter_count = 1;
            photon_scatter_contribution(&p, &model, &mut t);
        }
        let view = DetectorView::new(&Vector3::zeros(), &t).unwrap();
        let expected = view.solid_angle / (4.0 * PI) * view.track_per_volume;
        assert_relative_eq!(t.histogram().total() / n as f64, expected, max_relative = 0.03);
    }

    #[test]
    fn test_hydrogen_never_scores_backward() {
        let model = model(ParticleKind::Neutron, 1e-9, Settings::default());
        let mut rng = StdRng::seed_from_u64(2);
        let mut t = tally(110, 1e-3, 1e8, true);
        let mut p = Particle::new(ParticleKind::Neutron, Vector3::zeros(), -Vector3::x(), 1e6);
        p.scatter_count = 1;
        neutron_scatter_contribution(&p, &model, &mut t, &mut rng);
        assert_eq!(t.histogram().total(), 0.0);

        p.direction = Vector3::new(1.0, 1.0, 0.0).normalize();
        neutron_scatter_contribution(&p, &model, &mut t, &mut rng);
        // t = cos 45deg, so E' = E/2
        let idx = t.histogram().bin_index(5e5).unwrap();
        assert!(t.contents()[idx] > 0.0);
    }

    #[test]
    fn test_thermal_scores_only_sub_ev_bins() {
        let model = model(ParticleKind::Neutron, 1e-9, Settings::default());
        let mut rng = StdRng::seed_from_u64(4);
        let mut t = tally(110, 1e-3, 1e8, true);
        let mut p = Particle::new(ParticleKind::Neutron, Vector3::zeros(), Vector3::x(), 0.0253);
        p.scatter_count = 3;
        neutron_scatter_contribution(&p, &model, &mut t, &mut rng);
        assert!(t.histogram().total() > 0.0);
        let above: f64 = t
            .bin_centers()
            .iter()
            .zip(t.contents())
            .filter(|(c, _)| **c > 1.5)
            .map(|(_, v)| v)
            .sum();
        assert_eq!(above, 0.0);
    }

    #[test]
    fn test_thermal_down_sampling_is_unbiased() {
        let full = model(ParticleKind::Neutron, 1e-9, Settings::default());
        let sampled = model(
            ParticleKind::Neutron,
            1e-9,
            Settings {
                thermal_fraction: 0.25,
                ..Settings::default()
            },
        );
        let mut p = Particle::new(ParticleKind::Neutron, Vector3::zeros(), Vector3::x(), 0.1);
        p.scatter_count = 1;
        let mut rng = StdRng::seed_from_u64(8);

        let mut reference = tally(110, 1e-3, 1e8, true);
        neutron_scatter_contribution(&p, &full, &mut reference, &mut rng);

        let mut t = tally(110, 1e-3, 1e8, true);
        let n = 4000;
        for _ in 0..n {
            neutron_scatter_contribution(&p, &sampled, &mut t, &mut rng);
        }
        assert_relative_eq!(
            t.histogram().total() / n as f64,
            reference.histogram().total(),
            max_relative = 0.1
        );
    }

    #[test]
    fn test_collision_inside_detector_is_skipped() {
        let model = model(ParticleKind::Photon, 1e-9, Settings::default());
        let mut t = tally(10, 0.0, 1.0, false);
        let mut p = Particle::new(ParticleKind::Photon, Vector3::new(50.2, 0.0, 0.0), Vector3::x(), 0.5);
        p.scatter_count = 1;
        let mut rng = StdRng::seed_from_u64(1);
        force_detection(&p, &model, &mut t, &mut rng).unwrap();
        assert_eq!(t.histogram().total(), 0.0);
    }
}
