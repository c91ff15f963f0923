/// Canvas dimensions, colors and the re-exported affine type.
pub mod core;
/// Error taxonomy shared by every stage.
pub mod error;
pub(crate) mod math;
