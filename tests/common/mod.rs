// Synthetic water data shared by the integration tests. The shapes are
// physically plausible but the numbers are not evaluated nuclear data.
#![allow(dead_code)]

use cfd_transport::physics::{klein_nishina_integral, ELECTRON_REST_MASS};
use cfd_transport::{
    Cell, Cylinder, EnergySpectrum, Material, NeutronCrossSection, Nuclide, ParticleKind, PhotonCrossSection,
    Settings, Source, Sphere, Tally,
};
use nalgebra::Vector3;
use std::sync::Arc;

pub const H1_TOTAL_1KEV: f64 = 20.33080;
pub const O16_TOTAL_1KEV: f64 = 3.79339;

/// Cs-137 line, MeV.
pub const CS137_LINE: f64 = 0.6617;

/// Equal-probability quantiles of a Cf-252 fission spectrum, eV.
pub const CF252_INV_CDF: [f64; 21] = [
    1.0e4, 3.0e5, 5.0e5, 6.5e5, 8.0e5, 9.5e5, 1.1e6, 1.25e6, 1.4e6, 1.6e6, 1.8e6, 2.0e6, 2.2e6, 2.5e6, 2.8e6,
    3.1e6, 3.5e6, 4.0e6, 4.7e6, 6.0e6, 1.0e7,
];

pub fn photon_water() -> Arc<PhotonCrossSection> {
    let energies: Vec<f64> = (1..=200).map(|i| 0.005 * i as f64).collect();
    let mass_attenuation = energies.iter().map(|e| 0.0857 * (e / CS137_LINE).powf(-0.45)).collect();
    let compton_integral = energies
        .iter()
        .map(|e| klein_nishina_integral(e / ELECTRON_REST_MASS))
        .collect();
    let compton_over_total = energies.iter().map(|e| (1.0 - 0.002 / e).max(0.5)).collect();
    Arc::new(PhotonCrossSection::new(energies, mass_attenuation, compton_integral, compton_over_total).unwrap())
}

/// Log-spaced energy grid from 1e-5 eV to 2e7 eV with 1 keV included exactly.
fn neutron_grid() -> Vec<f64> {
    let mut grid: Vec<f64> = (0..=124).map(|i| 1e-5 * 10f64.powf(i as f64 * 0.1)).collect();
    grid.push(1000.0);
    grid.push(2e7);
    grid
}

fn h1_total(e: f64) -> f64 {
    if e == 1000.0 {
        H1_TOTAL_1KEV
    } else if e < 1e4 {
        H1_TOTAL_1KEV * (1.0 + 0.3 * (-e / 0.1).exp())
    } else {
        H1_TOTAL_1KEV * (1e4 / e).powf(0.35)
    }
}

fn o16_total(e: f64) -> f64 {
    if e < 1e6 {
        O16_TOTAL_1KEV
    } else {
        O16_TOTAL_1KEV * (1e6 / e).powf(0.3)
    }
}

/// Forward-peaked centre-of-mass distribution `0.5 * (1 + b mu)`.
fn anisotropy(e: f64) -> f64 {
    (0.6 * e / 2e7).min(0.6)
}

fn o16_angular() -> (Vec<(f64, Vec<f64>)>, Vec<(f64, Vec<f64>)>) {
    let energies = [1e-5, 1e5, 1e6, 5e6, 2e7];
    let pdf = energies
        .iter()
        .map(|&e| {
            let b = anisotropy(e);
            (e, (0..=20).map(|i| 0.5 * (1.0 + b * (-1.0 + 0.1 * i as f64))).collect())
        })
        .collect();
    let inv_cdf = energies
        .iter()
        .map(|&e| {
            let b = anisotropy(e);
            let row = (0..=20)
                .map(|i| {
                    let p = 0.05 * i as f64;
                    if b < 1e-9 {
                        2.0 * p - 1.0
                    } else {
                        let c = 0.5 - b / 4.0 - p;
                        ((-0.5 + (0.25 - b * c).sqrt()) / (b / 2.0)).clamp(-1.0, 1.0)
                    }
                })
                .collect();
            (e, row)
        })
        .collect();
    (pdf, inv_cdf)
}

pub fn h1(photon: Arc<PhotonCrossSection>) -> Arc<Nuclide> {
    let grid = neutron_grid();
    let total: Vec<(f64, f64)> = grid.iter().map(|&e| (e, h1_total(e))).collect();
    let elastic = grid
        .iter()
        .map(|&e| (e, (h1_total(e) - 0.332 * (0.0253 / e).sqrt()).max(0.0)))
        .collect();
    let xs = NeutronCrossSection::new(total, elastic).unwrap();
    Arc::new(Nuclide::new("H1", 1, 1.0, xs, photon).unwrap())
}

pub fn o16(photon: Arc<PhotonCrossSection>) -> Arc<Nuclide> {
    let grid = [1e-5, 1.0, 1000.0, 1e5, 1e6, 5e6, 2e7];
    let total: Vec<(f64, f64)> = grid.iter().map(|&e| (e, o16_total(e))).collect();
    let (pdf, inv_cdf) = o16_angular();
    let xs = NeutronCrossSection::new(total.clone(), total)
        .unwrap()
        .with_angular(Some(pdf), Some(inv_cdf))
        .unwrap();
    Arc::new(Nuclide::new("O16", 8, 16.0, xs, photon).unwrap())
}

pub fn water() -> Arc<Material> {
    let photon = photon_water();
    Arc::new(Material::new(0.99, 18.0, vec![(2.0, h1(photon.clone())), (1.0, o16(photon))]).unwrap())
}

/// Cylinder centred on `center` with the given length along z.
pub fn centred_cylinder(center: Vector3<f64>, length: f64, radius: f64) -> Cylinder {
    Cylinder::new(center - Vector3::new(0.0, 0.0, length / 2.0), length, radius)
}

pub fn cs137_source() -> Source {
    Source::new(
        ParticleKind::Photon,
        centred_cylinder(Vector3::new(25.0, 25.0, 8.4478), 5.63372, 1.4097),
        EnergySpectrum::mono(CS137_LINE),
    )
    .unwrap()
}

pub fn photon_model(settings: Settings) -> cfd_transport::Model {
    let roi = Cylinder::new(Vector3::new(25.0, 25.0, 0.0), 52.0, 21.5);
    cfd_transport::Model::new(roi, vec![Cell::new(water(), roi).with_name("tank")], cs137_source(), settings)
        .unwrap()
}

pub fn photon_tally() -> Tally {
    Tally::new(Sphere::new(Vector3::new(100.0, 100.0, 10.0), 2.54), 100, 0.0, 1.0, false).unwrap()
}

pub fn cf252_source() -> Source {
    Source::new(
        ParticleKind::Neutron,
        centred_cylinder(Vector3::new(25.0, 25.0, 10.0), 1.0, 0.5),
        EnergySpectrum::equal_probable(CF252_INV_CDF.to_vec()).unwrap(),
    )
    .unwrap()
}

pub fn neutron_model(settings: Settings) -> cfd_transport::Model {
    let roi = Sphere::new(Vector3::new(25.0, 25.0, 10.0), 5.0);
    cfd_transport::Model::new(roi, vec![Cell::new(water(), roi)], cf252_source(), settings).unwrap()
}

pub fn neutron_tally() -> Tally {
    Tally::new(Sphere::new(Vector3::new(75.0, 75.0, 10.0), 2.54), 110, 1e-3, 1e8, true).unwrap()
}
