//! Equal-weighted component combination.

use hsi_traits::{HsiError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::combiner::{Combiner, ComponentScore};

/// Configuration for equal-weighted combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualWeightConfig {
    /// Minimum number of available components for a date to get a value.
    /// Dates below this count are NaN.
    pub min_components: usize,
}

impl Default for EqualWeightConfig {
    fn default() -> Self {
        Self { min_components: 1 }
    }
}

/// Averages the components available at each date.
///
/// Missing component values are excluded from that date's mean rather than
/// counted as zero.
///
/// # Examples
///
/// ```rust,no_run
/// use hsi_combine::{Combiner, ComponentScore, EqualWeightCombiner};
/// use ndarray::Array1;
///
/// let combiner = EqualWeightCombiner::default();
/// let components = vec![
///     ComponentScore {
///         name: "util_ip_admissions_per_1000".to_string(),
///         scores: Array1::from_vec(vec![0.5, f64::NAN, 1.0]),
///     },
///     ComponentScore {
///         name: "emp_healthcare_jobs".to_string(),
///         scores: Array1::from_vec(vec![-0.3, 0.8, 0.1]),
///     },
/// ];
///
/// let hsi = combiner.combine(&components).unwrap();
/// assert_eq!(hsi[1], 0.8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EqualWeightCombiner {
    config: EqualWeightConfig,
}

impl EqualWeightCombiner {
    /// Create a new equal-weight combiner with the given configuration.
    pub const fn new(config: EqualWeightConfig) -> Self {
        Self { config }
    }
}

impl Combiner for EqualWeightCombiner {
    fn combine(&self, components: &[ComponentScore]) -> Result<Array1<f64>> {
        let Some(first) = components.first() else {
            return Err(HsiError::InvalidData(
                "cannot combine zero components".to_string(),
            ));
        };
        let n_dates = first.scores.len();

        for component in components {
            if component.scores.len() != n_dates {
                return Err(HsiError::InvalidData(format!(
                    "component '{}' has {} dates, expected {}",
                    component.name,
                    component.scores.len(),
                    n_dates
                )));
            }
        }

        let min_components = self.config.min_components.max(1);
        let composite = (0..n_dates)
            .map(|t| {
                let (sum, count) = components
                    .iter()
                    .map(|c| c.scores[t])
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                if count >= min_components {
                    sum / count as f64
                } else {
                    f64::NAN
                }
            })
            .collect();

        Ok(composite)
    }

    fn name(&self) -> &str {
        "equal_weight"
    }
}
