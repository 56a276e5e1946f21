//! Memory palace rendering
//!
//! A complete palace image is generated once per mission. Each render cuts
//! it into horizontal layers, one per sub-task, and reveals the layers of
//! completed sub-tasks over a grey background.

mod composite;
mod error;
mod generator;
mod mask;
mod prompt;

pub use composite::{apply_mask, composite_png, encode_png};
pub use error::PalaceError;
pub use generator::{PalaceGenerator, PalaceOutcome};
pub use mask::{REVEALED, band_rows, build_layer_mask};
pub use prompt::palace_context;
