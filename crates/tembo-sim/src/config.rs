use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Every configured year must lie within `-YEAR_BOUND..=YEAR_BOUND`.
pub const YEAR_BOUND: i32 = 1_000_000;
/// Largest accepted `generation_gap`.
pub const MAX_GENERATION_GAP: i32 = 200;

/// Bounding box events and jittered water sources are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for Region {
    /// Northern Botswana, longitude as x and latitude as y.
    fn default() -> Self {
        Self {
            min_x: 22.0,
            max_x: 25.5,
            min_y: -20.5,
            max_y: -17.5,
        }
    }
}

impl Region {
    #[must_use]
    pub fn area(&self) -> f64 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }
}

/// Knobs for one generator run. Same config and seed, same archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// First year events and availability records use.
    pub start_year: i32,
    /// Last year events use.
    pub end_year: i32,
    /// Founders are born somewhere in this inclusive range.
    pub founder_years: (i32, i32),
    /// Years between a parent's and its children's birth.
    pub generation_gap: i32,
    pub region: Region,
    /// Chance that a source is dry in an ordinary year.
    pub drought_probability: f64,
    /// Years with a raised drought chance.
    pub drought_years: Vec<i32>,
    pub drought_year_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0x7E_B0,
            start_year: 2000,
            end_year: 2025,
            founder_years: (1940, 1980),
            generation_gap: 15,
            region: Region::default(),
            drought_probability: 0.2,
            drought_years: vec![2005, 2012, 2019],
            drought_year_probability: 0.6,
        }
    }
}

impl GeneratorConfig {
    /// Default config with a different seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Drought chance for `year`.
    #[must_use]
    pub fn drought_chance(&self, year: i32) -> f64 {
        if self.drought_years.contains(&year) {
            self.drought_year_probability
        } else {
            self.drought_probability
        }
    }

    /// Validate configuration before generating.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        for (name, year) in [
            ("start_year", self.start_year),
            ("end_year", self.end_year),
            ("founder_years.0", self.founder_years.0),
            ("founder_years.1", self.founder_years.1),
        ] {
            if !(-YEAR_BOUND..=YEAR_BOUND).contains(&year) {
                bail!("{name} must be within -{YEAR_BOUND}..={YEAR_BOUND}, got {year}");
            }
        }
        if self.start_year > self.end_year {
            bail!(
                "start_year ({}) must not be after end_year ({})",
                self.start_year,
                self.end_year
            );
        }
        if self.founder_years.0 > self.founder_years.1 {
            bail!("founder_years must be an ascending range");
        }
        if !(1..=MAX_GENERATION_GAP).contains(&self.generation_gap) {
            bail!("generation_gap must be within 1..={MAX_GENERATION_GAP}");
        }
        let r = &self.region;
        let finite = [r.min_x, r.max_x, r.min_y, r.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || r.min_x >= r.max_x || r.min_y >= r.max_y {
            bail!("region must be a finite, non-empty box");
        }
        for (name, p) in [
            ("drought_probability", self.drought_probability),
            ("drought_year_probability", self.drought_year_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                bail!("{name} must be within 0.0..=1.0, got {p}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_reversed_years() {
        let config = GeneratorConfig {
            start_year: 2030,
            ..GeneratorConfig::default()
        };
        let err = config.validate().err().map(|e| e.to_string());
        assert!(err.is_some_and(|msg| msg.contains("start_year")));
    }

    #[test]
    fn rejects_years_and_gaps_that_could_overflow() {
        let far_future = GeneratorConfig {
            start_year: i32::MAX - 5,
            end_year: i32::MAX,
            ..GeneratorConfig::default()
        };
        let err = far_future.validate().err().map(|e| e.to_string());
        assert!(err.is_some_and(|msg| msg.contains("start_year")));

        let huge_gap = GeneratorConfig {
            generation_gap: i32::MAX / 2,
            ..GeneratorConfig::default()
        };
        let err = huge_gap.validate().err().map(|e| e.to_string());
        assert!(err.is_some_and(|msg| msg.contains("generation_gap")));
    }

    #[test]
    fn rejects_bad_probability() {
        let config = GeneratorConfig {
            drought_year_probability: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn drought_years_raise_the_chance() {
        let config = GeneratorConfig::default();
        assert!((config.drought_chance(2012) - 0.6).abs() < f64::EPSILON);
        assert!((config.drought_chance(2013) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GeneratorConfig = toml::from_str("seed = 9\nend_year = 2030\n")
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.seed, 9);
        assert_eq!(config.end_year, 2030);
        assert_eq!(config.drought_years, vec![2005, 2012, 2019]);
    }
}
