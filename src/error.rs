use crate::browser::BrowserError;

/// Crate-wide error taxonomy.
///
/// Structural and input-validation errors abort the current pipeline level
/// and surface to the caller. Per-page failures are reported through progress
/// events instead, and archive failures degrade to zero-valued stats.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not find the chapter list for '{0}'")]
    StructureNotFound(String),

    #[error("could not find the pagination control on {0}")]
    PaginationNotFound(String),

    #[error("volume {volume} of '{series}' was not found")]
    VolumeNotFound { series: String, volume: u32 },

    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidRange { start: f64, end: f64 },

    #[error("navigation to {url} failed after {attempts} attempts")]
    NavigationFailed {
        url: String,
        attempts: usize,
        #[source]
        source: BrowserError,
    },

    #[error("archive creation failed: {0}")]
    Archive(String),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
