use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid magic: expected '{expected}', found '{found}'")]
    InvalidMagic { expected: String, found: String },

    #[error("unsupported container version: {version:#x}")]
    UnsupportedVersion { version: u32 },

    #[error("unknown curve format: property {property:#x}, format {format:#x}")]
    UnknownFormat { property: u32, format: u32 },

    #[error("read of {len} byte(s) at offset {offset} is out of bounds (size {size})")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("bone '{bone}' not found in the target skeleton")]
    MissingBone { bone: String },

    #[error("incompatible curve types for addition: {left} and {right}")]
    IncompatibleCurveTypes { left: String, right: String },

    #[error("no animation data to export")]
    NoAnimationData,

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}
