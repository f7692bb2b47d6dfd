use std::process::ExitCode;
use clap::Parser;
use log::{error, info};
use ndarray::Axis;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use mr_data::cfl;
use recon::args::*;
use recon::error::{ReconError, RunError};
use recon::export::{reconstruct_saved, write_spectrum};
use recon::recon_config::{Config, ReconSettings};
use recon::spectrum;
use utils::ConfigFile;

fn main() -> ExitCode {
    let args = ReconArgs::parse();
    if TermLogger::init(args.loglevel, simplelog::Config::default(), TerminalMode::Mixed, ColorChoice::Auto).is_err() {
        eprintln!("logger already initialised");
    }
    let result = match args.action {
        ReconAction::NewSettings(a) => {
            let s:ReconSettings = Config::default();
            s.to_file(&a.path).map_err(RunError::from)
        }
        ReconAction::Reconstruct(a) => reconstruct_saved(&a.kspace,&a.session,a.settings.as_deref(),&a.output).map(|_| ()),
        ReconAction::Spectrum(a) => spectrum(a),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}",e);
            ExitCode::FAILURE
        }
    }
}

fn spectrum(a:SpectrumArgs) -> Result<(),RunError> {
    let settings = match &a.settings {
        Some(p) => ReconSettings::from_file(p)?,
        None => Config::default(),
    };
    let fids = cfl::read_cfl_vol(&a.fid)?;
    let fids = fids.index_axis(Axis(0),0);
    let s = spectrum::spectrum_process(&fids)?;
    let freq = spectrum::frequency_axis(s.len(),settings.frequency_range_hz);
    write_spectrum(&a.output,&freq,&s)?;
    let values = s.as_slice().ok_or(ReconError::EmptyData("spectrum"))?;
    let stats = spectrum::spectrum_analytics(values,a.frequency,settings.frequency_range_hz)?;
    info!("peak {} at {:.6} MHz",stats.peak,stats.center_frequency_mhz);
    info!("fwhm {} Hz ({} ppm)",stats.fwhm_hz,stats.inhomogeneity_ppm);
    info!("snr {}",stats.snr);
    Ok(())
}
