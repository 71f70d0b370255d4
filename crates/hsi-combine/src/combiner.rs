//! Core trait definition for component combiners.

use hsi_traits::Result;
use ndarray::Array1;

/// Per-date scores of one index component.
///
/// Scores are signed z-scores aligned with the panel's date index; NaN marks
/// a date where the component is unavailable.
#[derive(Debug, Clone)]
pub struct ComponentScore {
    /// Component name (the panel column it was derived from).
    pub name: String,

    /// Signed z-scores, one per panel date.
    pub scores: Array1<f64>,
}

/// Combines component scores into a composite index.
///
/// Implementations must treat NaN as "unavailable at this date" and never
/// as zero.
///
/// # Examples
///
/// ```rust,no_run
/// use hsi_combine::{Combiner, ComponentScore};
/// use ndarray::Array1;
///
/// struct FirstComponent;
///
/// impl Combiner for FirstComponent {
///     fn combine(&self, components: &[ComponentScore]) -> hsi_traits::Result<Array1<f64>> {
///         Ok(components[0].scores.clone())
///     }
///
///     fn name(&self) -> &str {
///         "first_component"
///     }
/// }
/// ```
pub trait Combiner: Send + Sync {
    /// Combine component scores into one value per date.
    ///
    /// # Errors
    ///
    /// Returns an error if no components are given or their lengths differ.
    fn combine(&self, components: &[ComponentScore]) -> Result<Array1<f64>>;

    /// Name of this combination strategy.
    fn name(&self) -> &str;
}
