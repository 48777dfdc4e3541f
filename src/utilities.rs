// Lookup and interpolation helpers shared by the cross-section tables.

use crate::error::{Error, Result};

/// Sorted energy-keyed table queried by nearest key.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTable<T> {
    keys: Vec<f64>,
    values: Vec<T>,
}

impl<T> EnergyTable<T> {
    /// Sorts the pairs by key. When a key repeats, the later pair wins.
    pub fn from_pairs(mut pairs: Vec<(f64, T)>, what: &str) -> Result<Self> {
        pairs.retain(|(k, _)| k.is_finite());
        if pairs.is_empty() {
            return Err(Error::EmptyTable(what.to_string()));
        }
        // stable sort keeps file order among equal keys
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut keys: Vec<f64> = Vec::with_capacity(pairs.len());
        let mut values: Vec<T> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            if keys.last() == Some(&k) {
                if let Some(last) = values.last_mut() {
                    *last = v;
                }
            } else {
                keys.push(k);
                values.push(v);
            }
        }
        Ok(Self { keys, values })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Index of the key closest to `key`.
    ///
    /// Keys past either end resolve to the first or last entry. An exact tie
    /// between two neighbours resolves to the lower key.
    pub fn nearest_index(&self, key: f64) -> usize {
        let upper = self.keys.partition_point(|k| *k < key);
        if upper == self.keys.len() {
            return self.keys.len() - 1;
        }
        if upper == 0 {
            return 0;
        }
        let lower = upper - 1;
        if key - self.keys[lower] <= self.keys[upper] - key {
            lower
        } else {
            upper
        }
    }

    pub fn nearest(&self, key: f64) -> &T {
        &self.values[self.nearest_index(key)]
    }
}

/// Linear interpolation of `values` sampled on the uniform grid
/// `start, start + step, ...`, clamped to the first and last sample.
pub fn interpolate_uniform(values: &[f64], start: f64, step: f64, x: f64) -> f64 {
    match values.len() {
        0 => return f64::NAN,
        1 => return values[0],
        _ => {}
    }
    let last = values.len() - 1;
    let pos = (x - start) / step;
    if !(pos > 0.0) {
        return values[0];
    }
    if pos >= last as f64 {
        return values[last];
    }
    let idx = (pos.floor() as usize).min(last - 1);
    let frac = pos - idx as f64;
    values[idx] + frac * (values[idx + 1] - values[idx])
}

/// Nearest bin on a uniform grid of `n` centers starting at `first_center`.
pub fn nearest_uniform_bin(x: f64, first_center: f64, width: f64, n: usize) -> usize {
    if n <= 1 || !(width > 0.0) {
        return 0;
    }
    let pos = ((x - first_center) / width + 0.5).floor();
    if !(pos > 0.0) {
        return 0;
    }
    (pos as usize).min(n - 1)
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}
