use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Axis along which bins are equally wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BinScale {
    #[default]
    Linear,
    /// Bins are equally wide in log10 of the value.
    Lethargy,
}

/// Equal-width histogram over `[lower, upper)`.
///
/// In lethargy mode the edges are stored as log10 values while every public
/// edge and center is reported back on the linear axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    scale: BinScale,
    lower: f64,
    upper: f64,
    width: f64,
    contents: Vec<f64>,
    total: f64,
}

impl Histogram {
    pub fn new(nbins: usize, lower: f64, upper: f64) -> Result<Self> {
        Self::with_scale(nbins, lower, upper, BinScale::Linear)
    }

    pub fn lethargy(nbins: usize, lower: f64, upper: f64) -> Result<Self> {
        Self::with_scale(nbins, lower, upper, BinScale::Lethargy)
    }

    /// `lower` and `upper` are always given on the linear axis.
    pub fn with_scale(nbins: usize, lower: f64, upper: f64, scale: BinScale) -> Result<Self> {
        let (lo, hi) = Self::axis_limits(nbins, lower, upper, scale)?;
        Ok(Self {
            scale,
            lower: lo,
            upper: hi,
            width: (hi - lo) / nbins as f64,
            contents: vec![0.0; nbins],
            total: 0.0,
        })
    }

    fn axis_limits(nbins: usize, lower: f64, upper: f64, scale: BinScale) -> Result<(f64, f64)> {
        if nbins == 0 {
            return Err(Error::invalid("histogram needs at least one bin"));
        }
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(Error::invalid(format!(
                "histogram range [{lower}, {upper}) is empty or not finite"
            )));
        }
        match scale {
            BinScale::Linear => Ok((lower, upper)),
            BinScale::Lethargy => {
                if lower <= 0.0 {
                    return Err(Error::invalid(format!(
                        "lethargy histogram needs a positive lower edge, got {lower}"
                    )));
                }
                Ok((lower.log10(), upper.log10()))
            }
        }
    }

    fn to_axis(&self, value: f64) -> f64 {
        match self.scale {
            BinScale::Linear => value,
            BinScale::Lethargy => value.log10(),
        }
    }

    fn from_axis(&self, x: f64) -> f64 {
        match self.scale {
            BinScale::Linear => x,
            BinScale::Lethargy => 10f64.powf(x),
        }
    }

    pub fn scale_kind(&self) -> BinScale {
        self.scale
    }

    pub fn nbins(&self) -> usize {
        self.contents.len()
    }

    /// Bin width on the binning axis (log10 units in lethargy mode).
    pub fn bin_width(&self) -> f64 {
        self.width
    }

    pub fn lower_edge(&self) -> f64 {
        self.from_axis(self.lower)
    }

    pub fn upper_edge(&self) -> f64 {
        self.from_axis(self.upper)
    }

    /// Index of the bin holding `value`, if it lies in range.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        let x = self.to_axis(value);
        // NaN fails both comparisons
        if !(x >= self.lower && x < self.upper) {
            return None;
        }
        let idx = ((x - self.lower) / self.width) as usize;
        Some(idx.min(self.contents.len() - 1))
    }

    pub fn contains(&self, value: f64) -> bool {
        self.bin_index(value).is_some()
    }

    /// Adds `weight` to the bin holding `value`. Returns false, leaving the
    /// histogram untouched, when the value is out of range.
    pub fn fill(&mut self, value: f64, weight: f64) -> bool {
        match self.bin_index(value) {
            Some(idx) => {
                self.contents[idx] += weight;
                self.total += weight;
                true
            }
            None => false,
        }
    }

    pub fn bin_center(&self, idx: usize) -> f64 {
        self.from_axis(self.lower + (idx as f64 + 0.5) * self.width)
    }

    pub fn bin_centers(&self) -> Vec<f64> {
        (0..self.nbins()).map(|i| self.bin_center(i)).collect()
    }

    /// The `nbins + 1` edges on the linear axis.
    pub fn bin_edges(&self) -> Vec<f64> {
        (0..=self.nbins())
            .map(|i| self.from_axis(self.lower + i as f64 * self.width))
            .collect()
    }

    /// Width of bin `idx` on the linear axis.
    pub fn linear_bin_width(&self, idx: usize) -> f64 {
        let left = self.lower + idx as f64 * self.width;
        self.from_axis(left + self.width) - self.from_axis(left)
    }

    pub fn bin_content(&self, idx: usize) -> f64 {
        self.contents[idx]
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Sum of all in-range weights filled since the last clear.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn set_bin_contents(&mut self, contents: Vec<f64>) -> Result<()> {
        if contents.len() != self.contents.len() {
            return Err(Error::invalid(format!(
                "expected {} bin contents, got {}",
                self.contents.len(),
                contents.len()
            )));
        }
        self.total = contents.iter().sum();
        self.contents = contents;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.contents.iter_mut().for_each(|c| *c = 0.0);
        self.total = 0.0;
    }

    /// Replaces the binning and discards all contents. The scale is kept.
    pub fn rebin(&mut self, nbins: usize, lower: f64, upper: f64) -> Result<()> {
        *self = Self::with_scale(nbins, lower, upper, self.scale)?;
        Ok(())
    }

    pub fn scale(&mut self, factor: f64) {
        self.contents.iter_mut().for_each(|c| *c *= factor);
        self.total *= factor;
    }
}
