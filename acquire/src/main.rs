use std::io::ErrorKind;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use clap::Parser;
use log::{error, info};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use acquire::args::*;
use acquire::config::ScannerSettings;
use acquire::error::ScanError;
use acquire::receive::receive;
use acquire::scanner::Scanner;
use acquire::sequence::{PrecompiledSequence, SequenceCompiler};
use mr_data::session::AcquisitionSession;
use recon::engine::ReconstructionEngine;
use recon::export::write_outputs;
use recon::recon_config::ReconSettings;
use scan_control::link::ControlLink;
use utils::{Config, ConfigFile};

fn main() -> ExitCode {
    let args = AcquireArgs::parse();
    if TermLogger::init(args.loglevel, simplelog::Config::default(), TerminalMode::Mixed, ColorChoice::Auto).is_err() {
        eprintln!("logger already initialised");
    }
    let settings = match &args.settings {
        Some(p) => match ScannerSettings::from_file(p) {
            Ok(s) => s,
            Err(e) => {
                error!("{}",e);
                return ExitCode::FAILURE
            }
        },
        None => Config::default(),
    };
    let result = match args.action {
        Action::Run(run_args) => run(&settings,&run_args),
        Action::NewSession(a) => new_session(&a),
        Action::NewSettings(a) => new_settings(&a.path),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}",e);
            ExitCode::FAILURE
        }
    }
}

fn new_session(args:&NewSessionArgs) -> Result<(),ScanError> {
    let session = AcquisitionSession::new(args.kind.template(),args.matrix);
    session.validate()?;
    session.to_file(&args.path)?;
    info!("session template written to {:?}",args.path.with_extension(AcquisitionSession::file_ext()));
    Ok(())
}

fn new_settings(path:&Path) -> Result<(),ScanError> {
    let scanner:ScannerSettings = Config::default();
    scanner.to_file(path)?;
    let recon:ReconSettings = Config::default();
    recon.to_file(path)?;
    Ok(())
}

fn find_session(path:&Path) -> Result<PathBuf,ScanError> {
    if !path.is_dir() {
        return Ok(path.to_owned())
    }
    let pattern = format!("*.{}",AcquisitionSession::file_ext());
    utils::get_first_match(path,&pattern)
        .ok_or_else(|| ScanError::Io(std::io::Error::new(ErrorKind::NotFound,format!("no session file in {:?}",path))))
}

fn run(settings:&ScannerSettings,args:&RunArgs) -> Result<(),ScanError> {
    let session = AcquisitionSession::from_file(&find_session(&args.session)?)?;
    let recon_settings = match &args.recon_settings {
        Some(p) => ReconSettings::from_file(p)?,
        None => Config::default(),
    };
    let base_dir = args.sequence.parent().map(|p| p.to_owned()).unwrap_or_default();
    let name = args.sequence.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    let payload = PrecompiledSequence::new(base_dir).assemble(&name)?;

    info!("connecting to {}",settings.address);
    let stream = TcpStream::connect(&settings.address)?;
    stream.set_nonblocking(true)?;
    let link = ControlLink::with_timeout(stream.try_clone()?,Duration::from_millis(settings.write_timeout_ms));
    let mut scanner = Scanner::new(link,ReconstructionEngine::new(recon_settings),settings.app_id);

    scanner.configure(session)?;
    scanner.start()?;
    let result = acquire_and_export(&mut scanner,stream,&payload,settings,&args.output);
    if let Err(e) = scanner.stop() {
        error!("could not stop the console: {}",e);
    }
    result
}

fn acquire_and_export(scanner:&mut Scanner<TcpStream>,mut reader:TcpStream,payload:&[u8],settings:&ScannerSettings,output:&Path) -> Result<(),ScanError> {
    scanner.upload_sequence(payload)?;
    scanner.acquire()?;
    receive(scanner,&mut reader,settings)?;
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let image = scanner.image().ok_or(ScanError::NotReady{operation:"export",state:scanner.state()})?;
    let stats = image.analytics()?;
    info!("image signal {} noise {} snr {}",stats.signal,stats.noise,stats.snr);
    write_outputs(output,scanner.kspace(),image,&scanner.engine().settings().export)?;
    Ok(())
}
