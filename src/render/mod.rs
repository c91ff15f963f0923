//! CPU rasterization of single timeline instants.

pub(crate) mod blend;
pub(crate) mod blur;
/// Frame compositor: fitted crops, crossfades and the text layer.
pub mod compositor;
pub(crate) mod surface;
/// Text overlay layout and rasterization.
pub mod text;
