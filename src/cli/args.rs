use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use s2water::core::validate::RawSearchInputs;
use s2water::{OutputLayers, ProductLevel};

#[derive(Parser)]
#[command(
    name = "s2water",
    version,
    about = "Sentinel-2 search, download and C2RCC water-quality processing"
)]
pub struct CliArgs {
    /// JSON configuration file (endpoints, processing defaults, gpt location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable logging
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search the catalog and list matching products
    Search(SearchArgs),
    /// Search the catalog and download every matching product
    Download(SearchArgs),
    /// Run resample, subset and C2RCC over a folder of .SAFE products
    Process(ProcessArgs),
}

#[derive(Args)]
pub struct Credentials {
    /// Copernicus Data Space account name
    #[arg(short, long, env = "S2WATER_USERNAME")]
    pub username: String,

    #[arg(short, long, env = "S2WATER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub credentials: Credentials,

    /// Product level
    #[arg(long, value_enum, default_value = "level-2a")]
    pub level: ProductLevel,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: String,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub date_to: String,

    /// Maximum cloud cover in percent; `,` is accepted as decimal separator
    #[arg(long, default_value = "20")]
    pub cloud_cover: String,

    /// Vector file with the area of interest (any OGR format, any CRS)
    #[arg(long)]
    pub aoi: PathBuf,

    /// Existing folder that receives downloaded archives
    #[arg(short, long)]
    pub output_dir: PathBuf,
}

impl SearchArgs {
    pub fn raw_inputs(&self) -> RawSearchInputs {
        RawSearchInputs {
            level: self.level,
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            cloud_cover: self.cloud_cover.clone(),
            aoi_path: self.aoi.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Folder containing *.SAFE product folders
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Folder for the processed products (created if missing)
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Optional vector file to subset each product to
    #[arg(long)]
    pub aoi: Option<PathBuf>,

    /// Keep going after a product fails
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    #[arg(long, default_value_t = false)]
    pub no_rrs: bool,

    #[arg(long, default_value_t = false)]
    pub no_ac_reflectance: bool,

    #[arg(long, default_value_t = false)]
    pub no_iop: bool,

    #[arg(long, default_value_t = false)]
    pub no_iop_bio: bool,

    #[arg(long, default_value_t = false)]
    pub no_kd: bool,

    /// Also write uncertainty layers
    #[arg(long, default_value_t = false)]
    pub uncertainties: bool,

    #[arg(long, default_value_t = false)]
    pub no_total_conc: bool,
}

impl ProcessArgs {
    pub fn layers(&self) -> OutputLayers {
        OutputLayers {
            rrs: !self.no_rrs,
            ac_reflectance: !self.no_ac_reflectance,
            iop: !self.no_iop,
            iop_bio: !self.no_iop_bio,
            kd: !self.no_kd,
            uncertainties: self.uncertainties,
            total_concentrations: !self.no_total_conc,
        }
    }
}
