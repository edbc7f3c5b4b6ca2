//! Error type shared by the path codec, the curve cache, and the engine.

use thiserror::Error;

use crate::basics::Pt;
use crate::cache::CurveId;
use crate::engine::TextureId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An unknown segment tag or a record cut short by the end of the data.
    #[error("malformed path: segment tag {tag} at offset {offset}")]
    MalformedPath { offset: usize, tag: Pt },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// The curve's pixel box cannot fit in one atlas column.
    #[error("curve of {width}x{height} px exceeds the {max_width}x{max_height} px cache column")]
    CurveTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    /// Eviction could not free room for the requested curve.
    #[error("curve cache is full ({entries} items)")]
    CacheExhausted { entries: usize },

    #[error("unknown curve {0:?}")]
    UnknownCurve(CurveId),

    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),

    #[error("texture has no pixels")]
    EmptyTexture,
}

pub type Result<T> = std::result::Result<T, Error>;
