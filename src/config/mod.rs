pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::settings::SettingsOverrides;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "scan-compare")]
#[command(about = "Gamma comparison of reference and measured beam profiles")]
pub struct CliConfig {
    /// Reference (baseline) ASCII profile export
    #[arg(long)]
    pub reference: Option<String>,

    /// Measurement ASCII profile export to validate
    #[arg(long)]
    pub measurement: Option<String>,

    /// TOML file with comparison thresholds and defaults
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory the report archive is written to [default: ./output]
    #[arg(long)]
    pub output_path: Option<String>,

    /// Report archive file name [default: scan_compare_report.zip]
    #[arg(long)]
    pub report_name: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            reference: self.reference.clone(),
            measurement: self.measurement.clone(),
            output_path: self.output_path.clone(),
            report_name: self.report_name.clone(),
        }
    }
}
