//! Feature panel assembly and composite stress index construction.
//!
//! This crate joins the canonical source tables into a single namespaced
//! [`Panel`] and reduces a configured subset of its columns to the `HSI`
//! series: full-sample (or expanding) z-scores, sign-adjusted by stress
//! direction, averaged per date by a [`Combiner`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use hsi_combine::{PanelBuilder, StressComponents, build_hsi};
//! use hsi_traits::{DatedTable, Date};
//!
//! # fn run(start: Date, util: DatedTable, mlr: DatedTable, emp: DatedTable) -> hsi_traits::Result<()> {
//! let panel = PanelBuilder::new(start)
//!     .with_table("util", util)
//!     .with_table("mlr", mlr)
//!     .with_table("emp", emp)
//!     .build()?;
//!
//! let hsi = build_hsi(&panel, &StressComponents::default())?;
//! # Ok(())
//! # }
//! ```

mod combiner;
mod composite;
mod equal_weight;
mod panel;

// Re-export main types
pub use combiner::{Combiner, ComponentScore};
pub use composite::{
    CompositeIndexBuilder, HSI_COLUMN, HsiBreakdown, Normalization, StressComponents, build_hsi,
};
pub use equal_weight::{EqualWeightCombiner, EqualWeightConfig};
pub use panel::{Panel, PanelBuilder};
