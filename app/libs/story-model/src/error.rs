use error_types::{Classify, ErrorClass};
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Rejections raised while building a pending story.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("description is required")]
    EmptyDescription,

    #[error("photo is required")]
    MissingPhoto,

    #[error("unsupported photo type {0}; use JPG, PNG or WebP")]
    UnsupportedPhotoType(String),

    #[error("photo is {size} bytes, the limit is {limit} bytes")]
    PhotoTooLarge { size: usize, limit: usize },

    #[error("coordinates out of range: lat {lat}, lon {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl Classify for ModelError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}
