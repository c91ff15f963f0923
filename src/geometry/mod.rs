/// Crop boxes, aspect-ratio tokens and output sizing.
pub mod crop;
