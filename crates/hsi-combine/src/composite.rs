//! Composite stress index construction.
//!
//! Each configured panel column is turned into a z-score, negated when higher
//! raw values mean *less* stress, and the signed z-scores are averaged per
//! date into the `HSI` series.
//!
//! # Look-ahead
//!
//! With [`Normalization::FullSample`] (the default) each z-score uses the mean
//! and standard deviation of the whole sample, so the value at any date
//! depends on later observations. The resulting index is descriptive and not
//! causal; use [`Normalization::Expanding`] for a series that only uses data
//! available at each date.

use hsi_traits::stats::{expanding_zscore, zscore};
use hsi_traits::{DatedSeries, HsiError, Result};
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::combiner::{Combiner, ComponentScore};
use crate::equal_weight::EqualWeightCombiner;
use crate::panel::Panel;

/// Name of the composite index series.
pub const HSI_COLUMN: &str = "HSI";

/// Panel columns feeding the index, split by stress direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressComponents {
    /// Columns where a higher value means more stress.
    pub increasing: Vec<String>,
    /// Columns where a higher value means less stress; their z-scores are
    /// negated.
    pub decreasing: Vec<String>,
}

impl Default for StressComponents {
    fn default() -> Self {
        Self {
            increasing: vec![
                "util_ip_admissions_per_1000".to_string(),
                "util_ed_visits_per_1000".to_string(),
                "mlr_mlr".to_string(),
            ],
            decreasing: vec!["emp_healthcare_jobs".to_string()],
        }
    }
}

impl StressComponents {
    /// Creates a component set.
    ///
    /// # Errors
    ///
    /// [`HsiError::InvalidData`] when both lists are empty or share a column.
    pub fn new(increasing: Vec<String>, decreasing: Vec<String>) -> Result<Self> {
        let components = Self {
            increasing,
            decreasing,
        };
        components.check_disjoint()?;
        Ok(components)
    }

    fn check_disjoint(&self) -> Result<()> {
        if self.increasing.is_empty() && self.decreasing.is_empty() {
            return Err(HsiError::InvalidData(
                "stress index needs at least one component".to_string(),
            ));
        }
        if let Some(shared) = self.increasing.iter().find(|c| self.decreasing.contains(c)) {
            return Err(HsiError::InvalidData(format!(
                "column '{shared}' listed as both stress-increasing and stress-decreasing"
            )));
        }
        Ok(())
    }

    /// Every component paired with its sign (+1 increasing, -1 decreasing).
    pub fn signed(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.increasing
            .iter()
            .map(|c| (c.as_str(), 1.0))
            .chain(self.decreasing.iter().map(|c| (c.as_str(), -1.0)))
    }

    /// Checks the component lists against the panel's columns.
    ///
    /// # Errors
    ///
    /// [`HsiError::InvalidData`] for overlapping lists,
    /// [`HsiError::MissingFeature`] naming the first absent column.
    pub fn validate(&self, panel: &Panel) -> Result<()> {
        self.check_disjoint()?;
        let names: Vec<&str> = self.signed().map(|(name, _)| name).collect();
        panel.require(&names)
    }
}

/// How z-scores are standardized over time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Normalization {
    /// Mean and population standard deviation of the full sample.
    #[default]
    FullSample,
    /// Mean and population standard deviation of observations up to and
    /// including each date.
    Expanding {
        /// Observations required before a z-score is emitted.
        min_periods: usize,
    },
}

/// The index together with the signed component z-scores it averages.
#[derive(Debug, Clone)]
pub struct HsiBreakdown {
    /// Signed z-score of each component, aligned with the panel dates.
    pub components: Vec<ComponentScore>,
    /// The composite index.
    pub hsi: DatedSeries,
}

/// Builds the composite stress index from a [`Panel`].
#[derive(Debug, Clone)]
pub struct CompositeIndexBuilder<C = EqualWeightCombiner> {
    components: StressComponents,
    normalization: Normalization,
    combiner: C,
}

impl CompositeIndexBuilder<EqualWeightCombiner> {
    /// Builder with full-sample normalization and equal weights.
    pub fn new(components: StressComponents) -> Self {
        Self {
            components,
            normalization: Normalization::default(),
            combiner: EqualWeightCombiner::default(),
        }
    }
}

impl<C: Combiner> CompositeIndexBuilder<C> {
    /// Replaces the normalization mode.
    pub const fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Replaces the combiner.
    pub fn with_combiner<D: Combiner>(self, combiner: D) -> CompositeIndexBuilder<D> {
        CompositeIndexBuilder {
            components: self.components,
            normalization: self.normalization,
            combiner,
        }
    }

    /// Configured components.
    pub const fn components(&self) -> &StressComponents {
        &self.components
    }

    /// Signed z-scores of every component.
    ///
    /// # Errors
    ///
    /// Same as [`StressComponents::validate`].
    pub fn component_scores(&self, panel: &Panel) -> Result<Vec<ComponentScore>> {
        self.components.validate(panel)?;

        self.components
            .signed()
            .map(|(name, sign)| {
                let values = panel
                    .column(name)
                    .ok_or_else(|| HsiError::MissingFeature(name.to_string()))?;
                let z = match self.normalization {
                    Normalization::FullSample => {
                        let (z, stats) = zscore(values);
                        debug!(
                            "{name}: mean {:.4}, std {:.4}, n {}",
                            stats.mean, stats.std, stats.n
                        );
                        z
                    }
                    Normalization::Expanding { min_periods } => {
                        expanding_zscore(values, min_periods)
                    }
                };
                Ok(ComponentScore {
                    name: name.to_string(),
                    scores: z.into_iter().map(|v| sign * v).collect::<Array1<f64>>(),
                })
            })
            .collect()
    }

    /// Index plus the component scores it was built from.
    pub fn breakdown(&self, panel: &Panel) -> Result<HsiBreakdown> {
        let components = self.component_scores(panel)?;
        let combined = self.combiner.combine(&components)?;
        let hsi = DatedSeries::new(HSI_COLUMN, panel.dates().to_vec(), combined.to_vec())?;

        debug!(
            "built {} over {} dates from {} components ({})",
            HSI_COLUMN,
            hsi.len(),
            components.len(),
            self.combiner.name()
        );
        Ok(HsiBreakdown { components, hsi })
    }

    /// The composite index series, named `HSI`.
    pub fn build(&self, panel: &Panel) -> Result<DatedSeries> {
        self.breakdown(panel).map(|b| b.hsi)
    }
}

/// Builds the `HSI` series with full-sample z-scores and equal weights.
pub fn build_hsi(panel: &Panel, components: &StressComponents) -> Result<DatedSeries> {
    CompositeIndexBuilder::new(components.clone()).build(panel)
}
