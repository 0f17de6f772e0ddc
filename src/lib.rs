pub mod cli;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod warp;

pub use cli::Cli;
pub use detection::find_markers;
pub use error::{AlignError, Result};
pub use geometry::{orient_markers, AffineTransform};
pub use pipeline::{register_page, register_pages, run, TemplateFrame};
pub use warp::warp_to_template;
