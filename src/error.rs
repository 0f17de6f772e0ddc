use std::path::PathBuf;

/// Errors produced by the registration pipeline.
///
/// Any per-page failure aborts the whole run: registration output feeds
/// per-field extraction downstream, so a silently mis-aligned page is worse
/// than no output at all.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to rasterize {path}: {reason}")]
    Rasterization { path: PathBuf, reason: String },

    #[error("found {found} alignment markers, expected 3")]
    InsufficientMarkers { found: usize },

    #[error("found {found} alignment markers, expected 3; page may contain stray marks resembling the marker glyph")]
    AmbiguousMarkers { found: usize },

    #[error("detected markers are collinear; cannot compute an alignment transform")]
    Registration,

    #[error("failed to encode output document: {0}")]
    Encoding(String),

    #[error("page {page}: {source}")]
    Page {
        /// 1-based page index, matching user-facing page numbering.
        page: usize,
        #[source]
        source: Box<AlignError>,
    },
}

impl AlignError {
    /// Annotate an error with the 1-based index of the page it occurred on.
    pub fn on_page(self, page: usize) -> Self {
        AlignError::Page {
            page,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlignError>;
