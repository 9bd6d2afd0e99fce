//! Image acquisition and preprocessing.

mod fetch;
mod preprocess;

pub use fetch::{ImageSource, fetch_image, load_image_bytes};
pub use preprocess::{ImageTensor, preprocess_image};
