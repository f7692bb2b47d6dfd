use std::net::TcpStream;
use std::process::ExitCode;
use std::time::Duration;
use clap::Parser;
use log::{error, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use scan_control::args::*;
use scan_control::command::*;
use scan_control::error::LinkError;
use scan_control::link::ControlLink;

fn main() -> ExitCode {
    let args = ScanControlArgs::parse();
    if TermLogger::init(args.loglevel, Config::default(), TerminalMode::Mixed, ColorChoice::Auto).is_err() {
        eprintln!("logger already initialised");
    }

    let command = match args.action {
        Action::Decode(decode_args) => {
            return decode_words(&decode_args.words)
        }
        Action::Stop => ControlCommand::Stop,
        Action::Start(a) => ControlCommand::Start(a.id),
        Action::Frequency(a) => ControlCommand::SetFrequency(a.mhz),
        Action::Gradient(a) => ControlCommand::SetGradientChannel{axis:a.axis,value:a.value},
        Action::Shim(a) => ControlCommand::SetShim{channel:a.channel,value:a.value},
        Action::Upload(a) => {
            match std::fs::read(&a.path) {
                Ok(bytes) => ControlCommand::UploadSequenceBytes(bytes),
                Err(e) => {
                    error!("cannot read {:?}: {}",a.path,e);
                    return ExitCode::FAILURE
                }
            }
        }
    };

    match send(&args.address,Duration::from_secs_f32(args.timeout),&command) {
        Ok(n) => {
            info!("{} bytes sent to {}",n,args.address);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}",e);
            ExitCode::FAILURE
        }
    }
}

fn send(address:&str,timeout:Duration,command:&ControlCommand) -> Result<usize,LinkError> {
    let stream = TcpStream::connect(address)?;
    stream.set_nonblocking(true)?;
    let mut link = ControlLink::with_timeout(stream,timeout);
    match command {
        ControlCommand::UploadSequenceBytes(payload) => link.upload_sequence(payload)?,
        cmd => link.send(cmd)?
    }
    Ok(link.bytes_sent())
}

fn decode_words(words:&[String]) -> ExitCode {
    let mut code = ExitCode::SUCCESS;
    for w in words {
        let parsed = match w.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex,16),
            None => w.parse::<u32>()
        };
        match parsed {
            Ok(word) => match ControlCommand::decode(word) {
                Ok(cmd) => println!("{:#010x} {:?}",word,cmd),
                Err(e) => {
                    println!("{:#010x} {}",word,e);
                    code = ExitCode::FAILURE;
                }
            },
            Err(_) => {
                error!("{} is not a 32 bit word",w);
                code = ExitCode::FAILURE;
            }
        }
    }
    code
}
