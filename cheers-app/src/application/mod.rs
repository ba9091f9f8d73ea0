mod rotation;
mod seed;

pub use rotation::{Phase, RotationEngine, RotationSnapshot, Selection};
pub use seed::{seed_sample_toasts, SAMPLE_TOASTS};
