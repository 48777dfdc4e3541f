use crate::cell::Cell;
use crate::cfd;
use crate::error::{Error, Result};
use crate::fast_rng::FastRng;
use crate::geometry::Shape;
use crate::material::Material;
use crate::particle::{Particle, ParticleKind};
use crate::settings::Settings;
use crate::source::Source;
use crate::tally::Tally;
use crate::tracking;
use nalgebra::Vector3;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Piecewise-constant bound on a set of nearest-key step functions.
///
/// `keys` is the sorted union of every table's keys. The value over
/// `[keys[j], keys[j + 1])` is the larger bound at either end. A monotone
/// nearest lookup between two of its own neighbouring keys resolves to the
/// same entry as one of those ends, so the bound holds at every energy.
#[derive(Debug, Clone)]
struct Majorant {
    keys: Vec<f64>,
    values: Vec<f64>,
}

impl Majorant {
    fn build(mut keys: Vec<f64>, bound_at: impl Fn(f64) -> f64) -> Self {
        keys.retain(|k| k.is_finite());
        keys.sort_by(f64::total_cmp);
        keys.dedup();
        let at_keys: Vec<f64> = keys.iter().map(|&k| bound_at(k)).collect();
        let values = at_keys
            .iter()
            .enumerate()
            .map(|(j, &v)| at_keys.get(j + 1).map_or(v, |&next| v.max(next)))
            .collect();
        Self { keys, values }
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn value(&self, energy: f64) -> f64 {
        let j = self.keys.partition_point(|k| *k <= energy).saturating_sub(1);
        self.values.get(j).copied().unwrap_or(0.0)
    }
}

/// Final state of one history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryOutcome {
    pub scatter_count: u32,
    pub escaped: bool,
    pub energy: f64,
    pub weight: f64,
}

/// Totals over a run or batch of histories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub histories: u64,
    pub collisions: u64,
    pub escaped: u64,
    /// Histories abandoned on a sampling error. Included in `histories`.
    pub failed: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &HistoryOutcome) {
        self.histories += 1;
        self.collisions += u64::from(outcome.scatter_count);
        if outcome.escaped {
            self.escaped += 1;
        }
    }
}

/// Everything needed to run histories: region of interest, cells, source and
/// stopping thresholds, plus the majorants used by delta tracking.
#[derive(Debug, Clone)]
pub struct Model {
    pub roi: Shape,
    pub cells: Vec<Cell>,
    pub source: Source,
    pub settings: Settings,
    shared_material: Option<Arc<Material>>,
    photon_majorant: Majorant,
    neutron_majorant: Majorant,
}

impl Model {
    pub fn new(roi: impl Into<Shape>, cells: Vec<Cell>, source: Source, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let first = cells
            .first()
            .ok_or_else(|| Error::invalid("model needs at least one cell"))?;

        let shared_material = cells
            .iter()
            .all(|c| Arc::ptr_eq(&c.material, &first.material))
            .then(|| first.material.clone());

        let photon_keys = cells
            .iter()
            .flat_map(|c| {
                let table = c.material.photon_table();
                let (first_center, width) = (table.min_energy(), table.bin_width());
                (0..table.len()).map(move |k| first_center + k as f64 * width)
            })
            .collect();
        let photon_majorant = Majorant::build(photon_keys, |e| max_over_cells(&cells, |m| m.photon_total_atten(e)));

        let neutron_keys = cells
            .iter()
            .flat_map(|c| c.material.energy_grid().iter().copied())
            .collect();
        let neutron_majorant =
            Majorant::build(neutron_keys, |e| max_over_cells(&cells, |m| m.neutron_total_atten(e)));
        if neutron_majorant.keys.is_empty() {
            return Err(Error::EmptyTable("neutron majorant".into()));
        }

        let roi = roi.into();
        let source_center = source.volume.base_center + Vector3::new(0.0, 0.0, 0.5 * source.volume.height);
        if !roi.contains(&source_center) {
            log::warn!("source centre {source_center:?} lies outside the region of interest");
        }
        log::info!(
            "model with {} cells ({}), {} source, photon majorant {} keys, neutron majorant {} keys",
            cells.len(),
            if shared_material.is_some() { "one material" } else { "mixed materials" },
            source.kind,
            photon_majorant.len(),
            neutron_majorant.len()
        );

        Ok(Self {
            roi,
            cells,
            source,
            settings,
            shared_material,
            photon_majorant,
            neutron_majorant,
        })
    }

    /// Upper bound on the interaction coefficient (1/cm) anywhere in the model.
    ///
    /// When every cell holds the same material this is that material's own
    /// coefficient, so every flight is accepted.
    pub fn majorant(&self, kind: ParticleKind, energy: f64) -> f64 {
        match (&self.shared_material, kind) {
            (Some(m), ParticleKind::Photon) => m.photon_total_atten(energy),
            (Some(m), ParticleKind::Neutron) => m.neutron_total_atten(energy),
            (None, ParticleKind::Photon) => self.photon_majorant.value(energy),
            (None, ParticleKind::Neutron) => self.neutron_majorant.value(energy),
        }
    }

    /// First cell containing `position`, or the first cell if none does.
    pub fn cell_at(&self, position: &Vector3<f64>) -> &Cell {
        self.cells
            .iter()
            .find(|c| c.contains(position))
            .unwrap_or(&self.cells[0])
    }

    pub fn material_at(&self, position: &Vector3<f64>) -> &Material {
        &self.cell_at(position).material
    }

    /// Interaction coefficient the particle would see at `position`.
    pub fn coefficient(&self, kind: ParticleKind, energy: f64, position: &Vector3<f64>) -> f64 {
        let material = self.material_at(position);
        match kind {
            ParticleKind::Photon => material.photon_total_atten(energy),
            ParticleKind::Neutron => material.neutron_total_atten(energy),
        }
    }

    pub fn keep_going(&self, particle: &Particle) -> bool {
        !particle.escaped
            && particle.scatter_count < self.settings.max_scatter
            && particle.energy > self.settings.min_energy
            && particle.weight > self.settings.min_weight
    }

    /// Follows one source particle to termination, scoring every emission and
    /// collision point into `tally`.
    pub fn transport<R: Rng + ?Sized>(&self, tally: &mut Tally, rng: &mut R) -> Result<HistoryOutcome> {
        let mut particle = self.source.create_particle(rng);
        cfd::force_detection(&particle, self, tally, rng)?;
        while self.keep_going(&particle) && tracking::delta_tracking(&mut particle, self, rng)? {
            particle.scatter_count += 1;
            cfd::force_detection(&particle, self, tally, rng)?;
            tracking::collide(&mut particle, self, rng)?;
        }
        Ok(HistoryOutcome {
            scatter_count: particle.scatter_count,
            escaped: particle.escaped,
            energy: particle.energy,
            weight: particle.weight,
        })
    }

    /// Runs history `index` on its own random stream. Does not touch the
    /// tally's history count.
    pub fn run_history(&self, index: u64, tally: &mut Tally) -> Result<HistoryOutcome> {
        let mut rng = FastRng::for_history(self.settings.seed, index);
        self.transport(tally, &mut rng)
    }

    /// Runs histories `start..start + count` and records them on the tally.
    ///
    /// A history that fails is logged, counted in `failed` and skipped; the
    /// batch carries on with the next index.
    pub fn run_batch(&self, start: u64, count: u64, tally: &mut Tally) -> Result<RunSummary> {
        Ok(run_histories(start, count, tally, |index, tally| self.run_history(index, tally)))
    }

    pub fn run(&self, tally: &mut Tally) -> Result<RunSummary> {
        log::info!(
            "running {} {} histories (seed {})",
            self.settings.particles,
            self.source.kind,
            self.settings.seed
        );
        let summary = self.run_batch(0, self.settings.particles, tally)?;
        log::info!(
            "finished {} histories: {} collisions, {} escaped, {} failed",
            summary.histories,
            summary.collisions,
            summary.escaped,
            summary.failed
        );
        Ok(summary)
    }
}

/// Histories that fail still count toward the tally's history total, since any
/// score they made before failing stays in the tally.
fn run_histories<F>(start: u64, count: u64, tally: &mut Tally, mut history: F) -> RunSummary
where
    F: FnMut(u64, &mut Tally) -> Result<HistoryOutcome>,
{
    let mut summary = RunSummary::default();
    for index in start..start + count {
        match history(index, tally) {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                log::warn!("history {index} abandoned: {e}");
                summary.histories += 1;
                summary.failed += 1;
            }
        }
    }
    tally.add_histories(summary.histories);
    log::debug!(
        "histories {start}..{}: {} collisions, {} escaped, {} failed",
        start + count,
        summary.collisions,
        summary.escaped,
        summary.failed
    );
    summary
}

fn max_over_cells(cells: &[Cell], f: impl Fn(&Material) -> f64) -> f64 {
    cells
        .iter()
        .map(|c| f(&c.material))
        .fold(0.0, f64::max)
}
