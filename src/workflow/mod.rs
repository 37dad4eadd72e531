pub mod fill_flow;

pub use fill_flow::{FillFlow, FillMode, FillReport, FilledField, NO_MATCH_MESSAGE};
