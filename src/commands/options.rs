//! Flags shared by the commands that change conversion settings.

use std::path::PathBuf;
use clap::Args;
use crate::core::{
    DestinationSettings, DestinationType, ImageProcessingOptions, OutputFormat, ResizeOptions, ResizeType,
};

/// Overrides layered on top of a base set of options
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// Output format: jpeg, png, webp, avif or same-as-source
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Encoder quality (1-100)
    #[arg(short, long)]
    pub quality: Option<u32>,

    /// Resize mode: fixed_width, fixed_height, max_width, max_height,
    /// long_edge, short_edge or percentage
    #[arg(long)]
    pub resize: Option<ResizeType>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Edge length for long_edge / short_edge
    #[arg(long)]
    pub length: Option<u32>,

    /// Scale for the percentage mode (1-100)
    #[arg(long)]
    pub percentage: Option<u32>,

    /// Keep the original dimensions
    #[arg(long, conflicts_with = "resize")]
    pub no_resize: bool,

    /// Reduce PNG output to a 256-color palette
    #[arg(long)]
    pub quantize: bool,

    #[arg(long, conflicts_with = "quantize")]
    pub no_quantize: bool,

    /// Keep the original bytes when the output would be larger
    #[arg(long)]
    pub keep_original_if_larger: bool,

    #[arg(long, conflicts_with = "keep_original_if_larger")]
    pub allow_larger: bool,
}

impl OptionArgs {
    /// Returns `base` with every given flag applied
    pub fn apply_to(&self, mut base: ImageProcessingOptions) -> ImageProcessingOptions {
        if let Some(format) = self.format {
            base.format = format;
        }
        if let Some(quality) = self.quality {
            base.quality = quality;
        }

        if self.no_resize {
            base.resize = None;
        } else if let Some(resize_type) = self.resize {
            base.resize = Some(self.fill_dimensions(ResizeOptions::new(resize_type)));
        } else if let Some(resize) = base.resize.take() {
            base.resize = Some(self.fill_dimensions(resize));
        }

        if self.quantize {
            base.quantize = Some(true);
        } else if self.no_quantize {
            base.quantize = Some(false);
        }

        if self.keep_original_if_larger {
            base.keep_original_if_larger = true;
        } else if self.allow_larger {
            base.keep_original_if_larger = false;
        }
        base
    }

    fn fill_dimensions(&self, mut resize: ResizeOptions) -> ResizeOptions {
        resize.width = self.width.or(resize.width);
        resize.height = self.height.or(resize.height);
        resize.length = self.length.or(resize.length);
        resize.percentage = self.percentage.or(resize.percentage);
        resize
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DestinationArgs {
    /// Where to write outputs: same, downloads or custom
    #[arg(short, long)]
    pub destination: Option<DestinationType>,

    /// Output folder; implies `--destination custom`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DestinationArgs {
    pub fn apply_to(&self, mut base: DestinationSettings) -> DestinationSettings {
        if let Some(output) = &self.output {
            base.destination_type = DestinationType::Custom;
            base.custom_destination_path = output.to_string_lossy().to_string();
        }
        if let Some(destination_type) = self.destination {
            base.destination_type = destination_type;
        }
        base
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_none() && self.output.is_none()
    }
}
