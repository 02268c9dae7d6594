use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Region too small: {required} bytes required, {actual} supplied")]
    RegionTooSmall { required: u64, actual: u64 },

    #[error("Invalid sector count: {0}")]
    InvalidSectorCount(u32),

    #[error("Invalid sector size: {0}")]
    InvalidSectorSize(u32),

    #[error("Invalid magic number in pool header")]
    InvalidMagic,

    #[error("Unsupported format version: {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("Geometry error: {0}")]
    Geometry(String),
}

pub type Result<T> = std::result::Result<T, PoolError>;
