use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Run controls and stopping thresholds.
///
/// Energies follow the particle kind of the run: MeV for photons, eV for neutrons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of source histories.
    pub particles: u64,
    /// Collisions followed per history.
    pub max_scatter: u32,
    /// Histories stop once the weight drops to this value.
    pub min_weight: f64,
    /// Histories stop once the energy drops to this value.
    pub min_energy: f64,
    pub seed: u64,
    /// Fraction of sub-1 eV collisions that evaluate the thermal detector kernel.
    pub thermal_fraction: f64,
    /// Free-gas temperature, eV.
    pub temperature_kt: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: 10_000,
            max_scatter: 100,
            min_weight: 0.01,
            min_energy: 0.0,
            seed: 1,
            thermal_fraction: 1.0,
            temperature_kt: 0.0253,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_weight.is_finite() && self.min_weight >= 0.0) {
            return Err(Error::invalid(format!("min_weight must be >= 0, got {}", self.min_weight)));
        }
        if !(self.min_energy.is_finite() && self.min_energy >= 0.0) {
            return Err(Error::invalid(format!("min_energy must be >= 0, got {}", self.min_energy)));
        }
        if !(self.thermal_fraction > 0.0 && self.thermal_fraction <= 1.0) {
            return Err(Error::invalid(format!(
                "thermal_fraction must be in (0, 1], got {}",
                self.thermal_fraction
            )));
        }
        if !(self.temperature_kt.is_finite() && self.temperature_kt > 0.0) {
            return Err(Error::invalid(format!(
                "temperature_kt must be positive, got {}",
                self.temperature_kt
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.particles, 10_000);
        assert_eq!(s.max_scatter, 100);
        assert_eq!(s.thermal_fraction, 1.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json_str(r#"{"particles": 100, "max_scatter": 5, "min_energy": 0.1}"#)
            .unwrap();
        assert_eq!(s.particles, 100);
        assert_eq!(s.max_scatter, 5);
        assert_eq!(s.min_energy, 0.1);
        assert_eq!(s.min_weight, 0.01);
        assert_eq!(s.seed, 1);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Settings::from_json_str(r#"{"thermal_fraction": 0.0}"#).is_err());
        assert!(Settings::from_json_str(r#"{"min_weight": -1.0}"#).is_err());
        assert!(Settings::from_json_str(r#"{"temperature_kt": 0.0}"#).is_err());
        assert!(matches!(Settings::from_json_str("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_round_trip_through_json() {
        let s = Settings {
            particles: 7,
            seed: 99,
            ..Settings::default()
        };
        let text = serde_json::to_string(&s).unwrap();
        assert_eq!(Settings::from_json_str(&text).unwrap(), s);
    }

    #[test]
    fn test_from_json_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"particles": 3}}"#).unwrap();
        assert_eq!(Settings::from_json_file(file.path()).unwrap().particles, 3);
    }
}
