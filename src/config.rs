use std::str::FromStr;

use crate::error::{Result, RnnError};

/// Training hyper-parameters. Defaults fit a 2000-word vocabulary and 5 genres.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub input_dimensions: usize,
    pub hidden_dimensions: usize,
    pub output_dimensions: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    /// `0` back-propagates through the whole sequence.
    pub truncate_steps: usize,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            input_dimensions: 2000,
            hidden_dimensions: 100,
            output_dimensions: 5,
            learning_rate: 0.001,
            epochs: 20,
            truncate_steps: 0,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Defaults overridden by `ELMAN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = TrainingConfig::default();
        override_from(&lookup, "ELMAN_INPUT_DIMENSIONS", &mut config.input_dimensions)?;
        override_from(&lookup, "ELMAN_HIDDEN_DIMENSIONS", &mut config.hidden_dimensions)?;
        override_from(&lookup, "ELMAN_OUTPUT_DIMENSIONS", &mut config.output_dimensions)?;
        override_from(&lookup, "ELMAN_LEARNING_RATE", &mut config.learning_rate)?;
        override_from(&lookup, "ELMAN_EPOCHS", &mut config.epochs)?;
        override_from(&lookup, "ELMAN_TRUNCATE_STEPS", &mut config.truncate_steps)?;
        if let Some(seed) = parse_var::<u64, _>(&lookup, "ELMAN_SEED")? {
            config.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("input_dimensions", self.input_dimensions),
            ("hidden_dimensions", self.hidden_dimensions),
            ("output_dimensions", self.output_dimensions),
        ] {
            if value == 0 {
                return Err(RnnError::invalid(name, "must be greater than zero"));
            }
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(RnnError::invalid(
                "learning_rate",
                format!("must be finite and positive, got {}", self.learning_rate),
            ));
        }
        Ok(())
    }
}

fn override_from<T, F>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = parse_var(lookup, key)? {
        *slot = value;
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RnnError::invalid(key, format!("cannot parse `{raw}`: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.hidden_dimensions, 100);
        assert_eq!(config.truncate_steps, 0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_env_overrides() {
        let config = TrainingConfig::from_lookup(lookup(&[
            ("ELMAN_HIDDEN_DIMENSIONS", "16"),
            ("ELMAN_LEARNING_RATE", "0.05"),
            ("ELMAN_TRUNCATE_STEPS", " 4 "),
            ("ELMAN_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.hidden_dimensions, 16);
        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.truncate_steps, 4);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.epochs, 20);
    }

    #[test]
    fn test_bad_value_names_variable() {
        let err = TrainingConfig::from_lookup(lookup(&[("ELMAN_EPOCHS", "many")])).unwrap_err();
        assert!(err.to_string().contains("ELMAN_EPOCHS"));
    }

    #[test]
    fn test_validate() {
        let err = TrainingConfig::from_lookup(lookup(&[("ELMAN_OUTPUT_DIMENSIONS", "0")])).unwrap_err();
        assert!(matches!(err, RnnError::InvalidParameter { .. }));

        let config = TrainingConfig {
            learning_rate: -1.0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
