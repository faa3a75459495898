//! vitalsdb - validated patient records with derived body-mass metrics
//!
//! Records are built through an explicit pipeline (shape, field rules,
//! cross-field rules, derivation) and kept in a keyed store. Partial
//! updates are merged onto the stored raw fields and rebuilt, so derived
//! values always follow the latest raw values.

pub mod api;
pub mod cli;
pub mod merge;
pub mod observability;
pub mod record;
pub mod store;
