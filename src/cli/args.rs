use crate::optimize::OptimizeOptions;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "longan")]
#[command(author, version, about = "Shrink .docx files by removing unused parts and recompressing images")]
pub struct Args {
    /// Input .docx files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Keep embedded fonts
    #[arg(long)]
    pub no_fonts: bool,

    /// Keep unreferenced media
    #[arg(long)]
    pub no_media: bool,

    /// Do not recompress images
    #[arg(long)]
    pub no_images: bool,

    /// Keep unused styles
    #[arg(long)]
    pub no_styles: bool,

    /// JPEG quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Write back to the input files instead of `<name><suffix>.docx`
    #[arg(long)]
    pub overwrite: bool,

    /// Do not ask before overwriting
    #[arg(short, long)]
    pub force: bool,

    /// Suffix for output file names
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// YAML file with default options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Apply the command-line flags on top of `base`.
    ///
    /// Flags only ever disable stages or turn switches on, so values from a config
    /// file survive unless a flag says otherwise.
    pub fn apply(&self, base: OptimizeOptions) -> OptimizeOptions {
        let mut options = base;
        options.remove_embedded_fonts &= !self.no_fonts;
        options.remove_unused_media &= !self.no_media;
        options.recompress_images &= !self.no_images;
        options.prune_unused_styles &= !self.no_styles;
        options.overwrite |= self.overwrite;
        options.force |= self.force;
        if let Some(quality) = self.quality {
            options.image_quality = quality;
        }
        if let Some(suffix) = &self.suffix {
            options.output_suffix = suffix.clone();
        }
        options
    }
}
