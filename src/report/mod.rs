//! Reporting: performance summary with uncertainty bands, the performance
//! and importance tables, and ternary composition sweeps.
//!
//! # Example
//!
//! ```
//! use alloy_ensemble::primitives::Vector;
//! use alloy_ensemble::report::{PerformanceSummary, PerformanceTable, UncertaintyBands};
//!
//! let y_train = Vector::from_slice(&[10.0, 20.0, 30.0, 40.0]);
//! let oof = Vector::from_slice(&[12.0, 18.0, 31.0, 39.0]);
//! let y_test = Vector::from_slice(&[15.0, 35.0]);
//! let test = Vector::from_slice(&[16.0, 33.0]);
//!
//! let summary = PerformanceSummary::from_predictions(&oof, &y_train, &test, &y_test)
//!     .expect("matching lengths");
//! let bands = UncertaintyBands::new(&summary, &y_train, &y_test).expect("non-empty");
//! let table = PerformanceTable::new(&oof, &y_train, &test, &y_test, &bands);
//! assert_eq!(table.n_rows(), 100);
//! ```

mod importance;
mod performance;
mod sweep;

pub use importance::{save_importances, write_importances};
pub use performance::{
    PerformanceSummary, PerformanceTable, UncertaintyBands, DECISION_LINE_POINTS,
    PERFORMANCE_COLUMNS,
};
pub use sweep::{
    ternary_compositions, CompositionSweep, SweepPoint, TernaryComposition,
    DEFAULT_SWEEP_ELEMENTS,
};
