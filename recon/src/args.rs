use std::path::PathBuf;
use simplelog::LevelFilter;

#[derive(clap::Parser,Debug)]
#[command(version, about = "reconstruct saved k-space offline")]
pub struct ReconArgs {
    /// log level for output (error, warn, info, debug, trace)
    #[arg(global = true, long, default_value = "info")]
    pub loglevel:LevelFilter,
    #[command(subcommand)]
    pub action: ReconAction,
}

#[derive(clap::Subcommand,Debug)]
pub enum ReconAction {
    /// reconstruct a k-space cfl written by an acquisition
    Reconstruct(ReconstructArgs),
    /// write default reconstruction settings to modify
    NewSettings(TemplateArgs),
    /// average the FIDs of a cfl into a spectrum and report line width and snr
    Spectrum(SpectrumArgs),
}

#[derive(clap::Args,Debug)]
pub struct ReconstructArgs {
    /// cfl base path of the k-space (no extension)
    pub kspace:PathBuf,
    /// session file the k-space was acquired with
    pub session:PathBuf,
    /// base path for the images
    pub output:PathBuf,
    /// reconstruction settings file
    #[arg(short, long)]
    pub settings:Option<PathBuf>,
}

#[derive(clap::Args,Debug)]
pub struct SpectrumArgs {
    /// cfl base path of the FIDs, one per row of the first plane
    pub fid:PathBuf,
    /// base path for the spectrum text file
    pub output:PathBuf,
    /// console frequency in MHz
    #[arg(short, long, default_value_t = 11.3)]
    pub frequency:f64,
    /// reconstruction settings file
    #[arg(short, long)]
    pub settings:Option<PathBuf>,
}

#[derive(clap::Args,Debug)]
pub struct TemplateArgs {
    pub path:PathBuf,
}
