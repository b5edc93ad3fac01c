//! Dataset reading, validation, and JSON result writing for warpseek.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ClassLabel, ExperimentName, LabeledDataset, Split};
pub use error::IoError;
pub use reader::UcrReader;
pub use writer::ResultWriter;
