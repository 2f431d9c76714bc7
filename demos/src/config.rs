//! Command-line model arguments shared by the demos.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use unet_burn::{BlockSetup, UnetConfig};

/// Block factory preset selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SetupPreset {
    Fat,
    Thin,
}

/// Arguments describing the network to build.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// JSON `UnetConfig` file; the remaining model flags are ignored when set
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output channels of each encoder stage, shallow to deep
    #[arg(long, value_delimiter = ',', default_values_t = vec![16, 32, 64])]
    pub down: Vec<usize>,

    /// Output channels of each decoder stage, deep to shallow
    #[arg(long, value_delimiter = ',', default_values_t = vec![32, 16])]
    pub up: Vec<usize>,

    /// Channels of the network input
    #[arg(long, default_value = "1")]
    pub in_features: usize,

    /// Convolution kernel size
    #[arg(long, default_value = "5")]
    pub size: usize,

    /// Block implementation preset
    #[arg(long, value_enum, default_value = "fat")]
    pub setup: SetupPreset,

    /// Pad convolutions so they preserve spatial size
    #[arg(long)]
    pub padding: bool,

    /// Recompute block activations during the backward pass
    #[arg(long)]
    pub checkpointed: bool,
}

impl ModelArgs {
    /// Resolves the network configuration from a file or from the flags.
    pub fn to_config(&self) -> Result<UnetConfig> {
        if let Some(path) = &self.config {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            return serde_json::from_str::<UnetConfig>(&text)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        let setup = match self.setup {
            SetupPreset::Fat => BlockSetup::fat(),
            SetupPreset::Thin => BlockSetup::thin(),
        }
        .with_padding(self.padding)
        .with_checkpointed(self.checkpointed);

        Ok(UnetConfig::new(self.down.clone(), self.up.clone())
            .with_in_features(self.in_features)
            .with_size(self.size)
            .with_setup(setup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use unet_burn::BlockKind;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        model: ModelArgs,
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::parse_from([
            "demo",
            "--down",
            "8,16",
            "--up",
            "8",
            "--setup",
            "thin",
            "--padding",
            "--size",
            "3",
        ]);
        let config = cli.model.to_config().unwrap();

        assert_eq!(config.down, vec![8, 16]);
        assert_eq!(config.up, vec![8]);
        assert_eq!(config.size, 3);
        assert_eq!(config.setup.down_block, BlockKind::Thin);
        assert!(config.setup.padding);
        assert!(!config.setup.checkpointed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_are_consistent() {
        let cli = Cli::parse_from(["demo"]);
        let config = cli.model.to_config().unwrap();

        assert_eq!(config.setup, BlockSetup::fat());
        assert!(config.validate().is_ok());
    }
}
