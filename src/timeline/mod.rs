/// Timeline planning and parallel instant rendering.
pub mod expand;
