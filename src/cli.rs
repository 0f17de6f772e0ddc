use clap::Parser;
use std::path::PathBuf;

use crate::error::AlignError;

#[derive(Parser, Debug)]
#[command(name = "scan-align")]
#[command(version, about = "Aligns scanned PDFs to a reference template using printed fiducial markers")]
pub struct Cli {
    /// Path to the template PDF
    #[arg(required = true)]
    pub template: PathBuf,

    /// Path to the scanned PDF
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output path [default: <input>-aligned.pdf]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the marker glyph PDF
    #[arg(short, long, default_value = "marker.pdf")]
    pub marker: PathBuf,

    /// Rasterization resolution in DPI
    #[arg(long, default_value = "300")]
    pub dpi: u32,

    /// Marker size in inches
    #[arg(long, default_value = "0.35")]
    pub marker_size: f64,

    /// Template match threshold (0..1]
    #[arg(short, long, default_value = "0.8")]
    pub threshold: f32,

    /// JPEG quality of the output pages (1-100)
    #[arg(short, long, default_value = "50")]
    pub quality: u8,

    /// Show per-stage detection details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let mut name = self.input.as_os_str().to_owned();
            name.push("-aligned.pdf");
            PathBuf::from(name)
        })
    }

    /// Reject option values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.dpi == 0 {
            return Err(AlignError::Configuration("dpi must be positive".into()));
        }
        if self.marker_size <= 0.0 {
            return Err(AlignError::Configuration(
                "marker size must be positive".into(),
            ));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(AlignError::Configuration(format!(
                "match threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(AlignError::Configuration(format!(
                "JPEG quality must be in 1..=100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_output_path() {
        let cli = parse(&["scan-align", "template.pdf", "scans/batch1.pdf"]);
        assert_eq!(
            cli.output_path(),
            PathBuf::from("scans/batch1.pdf-aligned.pdf")
        );
    }

    #[test]
    fn test_explicit_output_path() {
        let cli = parse(&[
            "scan-align",
            "template.pdf",
            "scan.pdf",
            "--output",
            "out.pdf",
        ]);
        assert_eq!(cli.output_path(), PathBuf::from("out.pdf"));
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["scan-align", "template.pdf", "scan.pdf"]);
        assert_eq!(cli.dpi, 300);
        assert_eq!(cli.quality, 50);
        assert!((cli.marker_size - 0.35).abs() < 1e-12);
        assert!((cli.threshold - 0.8).abs() < 1e-6);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut cli = parse(&["scan-align", "template.pdf", "scan.pdf"]);
        cli.threshold = 1.5;
        assert!(matches!(cli.validate(), Err(AlignError::Configuration(_))));
    }
}
