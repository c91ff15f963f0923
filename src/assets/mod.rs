/// Image decoding and font loading.
pub mod decode;
