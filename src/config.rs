// Data library description: where the cross-section tables for each nuclide live.
use crate::cross_section::{NeutronCrossSection, PhotonCrossSection};
use crate::error::{Error, Result};
use crate::nuclide::Nuclide;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Table files for one nuclide. Angular tables are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuclideEntry {
    pub atomic_number: u32,
    pub atomic_weight: f64,
    pub total: PathBuf,
    pub elastic: PathBuf,
    #[serde(default)]
    pub pdf: Option<PathBuf>,
    #[serde(default)]
    pub inv_cdf: Option<PathBuf>,
}

/// Mapping from nuclide names (e.g. "O16") to their table files, plus the
/// photon table of the medium.
///
/// Relative paths are resolved against `base_dir`, which
/// [`Config::from_json_file`] sets to the directory of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub photon: Option<PathBuf>,
    #[serde(default)]
    pub nuclides: HashMap<String, NuclideEntry>,
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_photon_table(&mut self, path: impl Into<PathBuf>) {
        self.photon = Some(path.into());
    }

    pub fn set_nuclide(&mut self, name: &str, entry: NuclideEntry) {
        self.nuclides.insert(name.to_string(), entry);
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::from_json_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn load_photon_table(&self) -> Result<Arc<PhotonCrossSection>> {
        let path = self
            .photon
            .as_ref()
            .ok_or_else(|| Error::invalid("no photon table configured"))?;
        Ok(Arc::new(PhotonCrossSection::from_file(&self.resolve(path))?))
    }

    pub fn load_nuclide(&self, name: &str, photon: Arc<PhotonCrossSection>) -> Result<Arc<Nuclide>> {
        let entry = self
            .nuclides
            .get(name)
            .ok_or_else(|| Error::invalid(format!("no data configured for nuclide {name}")))?;
        let pdf = entry.pdf.as_deref().map(|p| self.resolve(p));
        let inv_cdf = entry.inv_cdf.as_deref().map(|p| self.resolve(p));
        let neutron = NeutronCrossSection::from_files(
            &self.resolve(&entry.total),
            &self.resolve(&entry.elastic),
            pdf.as_deref(),
            inv_cdf.as_deref(),
        )?;
        log::info!("loaded nuclide {name} (Z={}, A={})", entry.atomic_number, entry.atomic_weight);
        Ok(Arc::new(Nuclide::new(
            name,
            entry.atomic_number,
            entry.atomic_weight,
            neutron,
            photon,
        )?))
    }
}
