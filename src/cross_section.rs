// Neutron and photon cross-section tables and their text-file loaders.

use crate::error::{Error, Result};
use crate::utilities::{interpolate_uniform, nearest_uniform_bin, EnergyTable};
use std::fs;
use std::path::Path;

/// Relative spread of photon bin spacings tolerated before a warning is logged.
const GRID_SPACING_TOLERANCE: f64 = 1e-6;

/// Microscopic neutron data for one nuclide, energies in eV and cross sections in barns.
///
/// The optional angular tables describe the centre-of-mass elastic
/// scattering cosine. A PDF row with N+1 values covers mu = -1..1 in steps of
/// 2/N and an inverse-CDF row covers cumulative probability 0..1 in steps of
/// 1/N. Without them scattering is isotropic in the centre-of-mass frame.
#[derive(Debug, Clone)]
pub struct NeutronCrossSection {
    total: EnergyTable<f64>,
    elastic: EnergyTable<f64>,
    pdf: Option<EnergyTable<Vec<f64>>>,
    inv_cdf: Option<EnergyTable<Vec<f64>>>,
}

impl NeutronCrossSection {
    pub fn new(total: Vec<(f64, f64)>, elastic: Vec<(f64, f64)>) -> Result<Self> {
        Ok(Self {
            total: EnergyTable::from_pairs(total, "total cross section")?,
            elastic: EnergyTable::from_pairs(elastic, "elastic cross section")?,
            pdf: None,
            inv_cdf: None,
        })
    }

    /// Attaches centre-of-mass angular tables. Either may be omitted.
    pub fn with_angular(
        mut self,
        pdf: Option<Vec<(f64, Vec<f64>)>>,
        inv_cdf: Option<Vec<(f64, Vec<f64>)>>,
    ) -> Result<Self> {
        self.pdf = pdf.map(|rows| angular_table(rows, "angular pdf")).transpose()?;
        self.inv_cdf = inv_cdf
            .map(|rows| angular_table(rows, "angular inverse cdf"))
            .transpose()?;
        Ok(self)
    }

    /// Reads the scalar tables and, when given, the angular tables.
    pub fn from_files(
        total: &Path,
        elastic: &Path,
        pdf: Option<&Path>,
        inv_cdf: Option<&Path>,
    ) -> Result<Self> {
        let xs = Self::new(read_scalar_table(total)?, read_scalar_table(elastic)?)?;
        xs.with_angular(
            pdf.map(read_angular_table).transpose()?,
            inv_cdf.map(read_angular_table).transpose()?,
        )
    }

    pub fn total(&self, energy: f64) -> f64 {
        *self.total.nearest(energy)
    }

    pub fn elastic(&self, energy: f64) -> f64 {
        *self.elastic.nearest(energy)
    }

    pub fn total_table(&self) -> &EnergyTable<f64> {
        &self.total
    }

    pub fn has_angular_pdf(&self) -> bool {
        self.pdf.is_some()
    }

    pub fn has_angular_inv_cdf(&self) -> bool {
        self.inv_cdf.is_some()
    }

    /// Centre-of-mass scattering cosine density at `mu`.
    pub fn angular_pdf(&self, energy: f64, mu: f64) -> f64 {
        match &self.pdf {
            Some(table) => {
                let row = table.nearest(energy);
                let step = 2.0 / (row.len() - 1) as f64;
                interpolate_uniform(row, -1.0, step, mu)
            }
            None => 0.5,
        }
    }

    /// Centre-of-mass scattering cosine at cumulative probability `probability`.
    pub fn angular_inv_cdf(&self, energy: f64, probability: f64) -> f64 {
        match &self.inv_cdf {
            Some(table) => {
                let row = table.nearest(energy);
                let step = 1.0 / (row.len() - 1) as f64;
                interpolate_uniform(row, 0.0, step, probability)
            }
            None => 2.0 * probability.clamp(0.0, 1.0) - 1.0,
        }
    }
}

fn angular_table(rows: Vec<(f64, Vec<f64>)>, what: &str) -> Result<EnergyTable<Vec<f64>>> {
    if let Some((energy, row)) = rows.iter().find(|(_, row)| row.len() < 2) {
        return Err(Error::EmptyTable(format!(
            "{what} row at {energy} eV has {} points, need at least 2",
            row.len()
        )));
    }
    EnergyTable::from_pairs(rows, what)
}

/// Photon interaction data on equal-width energy bins, energies in MeV.
///
/// `compton_integral` is the Klein-Nishina shape integrated over all angles
/// in the normalization `2 * integral_{-1}^{1} f(mu) dmu`, so that the
/// integral over solid angle equals pi times the tabulated value.
#[derive(Debug, Clone)]
pub struct PhotonCrossSection {
    energies: Vec<f64>,
    mass_attenuation: Vec<f64>,
    compton_integral: Vec<f64>,
    compton_over_total: Vec<f64>,
    bin_width: f64,
}

impl PhotonCrossSection {
    pub fn new(
        energies: Vec<f64>,
        mass_attenuation: Vec<f64>,
        compton_integral: Vec<f64>,
        compton_over_total: Vec<f64>,
    ) -> Result<Self> {
        let n = energies.len();
        if n == 0 {
            return Err(Error::EmptyTable("photon cross section".to_string()));
        }
        if mass_attenuation.len() != n || compton_integral.len() != n || compton_over_total.len() != n
        {
            return Err(Error::invalid(format!(
                "photon columns differ in length: {n} energies, {} attenuation, {} compton integral, {} compton fraction",
                mass_attenuation.len(),
                compton_integral.len(),
                compton_over_total.len()
            )));
        }
        if energies.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(Error::invalid("photon energies must be strictly increasing"));
        }

        let bin_width = if n > 1 { energies[1] - energies[0] } else { 0.0 };
        if n > 2 {
            let worst = energies
                .windows(2)
                .map(|w| ((w[1] - w[0]) - bin_width).abs())
                .fold(0.0, f64::max);
            if worst > GRID_SPACING_TOLERANCE * bin_width.max(1.0) {
                log::warn!(
                    "photon energy grid is not uniform (spacing deviates by {worst:e} MeV); nearest-bin lookups assume width {bin_width}"
                );
            }
        }

        Ok(Self {
            energies,
            mass_attenuation,
            compton_integral,
            compton_over_total,
            bin_width,
        })
    }

    /// Reads rows of `energy, mass_attenuation, compton_integral, compton_over_total`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut columns: [Vec<f64>; 4] = Default::default();
        for (line_no, fields) in numeric_rows(&text, path, true, Some(4))? {
            if fields.len() < 4 {
                return Err(Error::parse(
                    path,
                    line_no,
                    format!("expected 4 columns, found {}", fields.len()),
                ));
            }
            for (column, value) in columns.iter_mut().zip(fields) {
                column.push(value);
            }
        }
        let [e, mu, kn, ratio] = columns;
        log::debug!("loaded {} photon bins from {}", e.len(), path.display());
        Self::new(e, mu, kn, ratio)
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Center of the first bin.
    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    /// Center of the last bin.
    pub fn max_energy(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn bin_center(&self, idx: usize) -> f64 {
        self.energies[idx]
    }

    /// Nearest bin, rounded and clamped to the table.
    pub fn bin_index(&self, energy: f64) -> usize {
        nearest_uniform_bin(energy, self.energies[0], self.bin_width, self.energies.len())
    }

    /// Mass attenuation coefficient, cm^2/g.
    pub fn mass_attenuation(&self, energy: f64) -> f64 {
        self.mass_attenuation[self.bin_index(energy)]
    }

    pub fn compton_integral(&self, energy: f64) -> f64 {
        self.compton_integral[self.bin_index(energy)]
    }

    pub fn compton_over_total(&self, energy: f64) -> f64 {
        self.compton_over_total[self.bin_index(energy)]
    }
}

/// Reads `energy value [ignored...]` rows.
pub fn read_scalar_table(path: &Path) -> Result<Vec<(f64, f64)>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let rows = parse_scalar_table(&text, path)?;
    log::debug!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Reads `energy v0 v1 ... vN` rows.
pub fn read_angular_table(path: &Path) -> Result<Vec<(f64, Vec<f64>)>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let rows = parse_angular_table(&text, path)?;
    log::debug!("loaded {} angular rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub(crate) fn parse_scalar_table(text: &str, path: &Path) -> Result<Vec<(f64, f64)>> {
    numeric_rows(text, path, false, Some(2))?
        .into_iter()
        .map(|(line_no, fields)| match fields.as_slice() {
            [energy, value, ..] => Ok((*energy, *value)),
            _ => Err(Error::parse(path, line_no, "expected an energy and a value")),
        })
        .collect()
}

pub(crate) fn parse_angular_table(text: &str, path: &Path) -> Result<Vec<(f64, Vec<f64>)>> {
    numeric_rows(text, path, false, None)?
        .into_iter()
        .map(|(line_no, mut fields)| {
            if fields.len() < 3 {
                return Err(Error::parse(
                    path,
                    line_no,
                    "expected an energy followed by at least 2 values",
                ));
            }
            let energy = fields.remove(0);
            Ok((energy, fields))
        })
        .collect()
}

/// Splits `text` into rows of numbers separated by whitespace or commas.
///
/// Blank lines and `#` comments are skipped. With `allow_header`, a line
/// whose first field is not a number is skipped as a column header. Fields
/// past `columns` are not parsed.
fn numeric_rows(
    text: &str,
    path: &Path,
    allow_header: bool,
    columns: Option<usize>,
) -> Result<Vec<(usize, Vec<f64>)>> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if allow_header && tokens.first().map_or(false, |t| t.parse::<f64>().is_err()) {
            continue;
        }
        let fields = tokens
            .iter()
            .take(columns.unwrap_or(usize::MAX))
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| Error::parse(path, line_no, format!("'{t}' is not a number")))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push((line_no, fields));
    }
    Ok(rows)
}
