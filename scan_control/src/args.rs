use std::path::PathBuf;
use simplelog::LevelFilter;
use crate::command::GradientAxis;

#[derive(clap::Parser,Debug)]
#[command(version, about = "send individual control words to the console")]
pub struct ScanControlArgs {
    /// console address as host:port
    #[arg(global = true, long, default_value = "127.0.0.1:1001")]
    pub address:String,
    /// seconds a stalled write may wait before giving up
    #[arg(global = true, long, default_value = "5")]
    pub timeout:f32,
    /// log level for output (error, warn, info, debug, trace)
    #[arg(global = true, long, default_value = "info")]
    pub loglevel:LevelFilter,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(clap::Subcommand,Debug)]
pub enum Action {
    /// stop whatever the console is running
    Stop,
    /// start the console application with the given id
    Start(StartArgs),
    /// set the Larmor frequency in MHz
    Frequency(FrequencyArgs),
    /// set a gradient offset (sign-magnitude units)
    Gradient(GradientArgs),
    /// set a shim channel offset
    Shim(ShimArgs),
    /// upload a compiled sequence file
    Upload(PathArgs),
    /// decode control words and print the commands they carry, without connecting
    Decode(DecodeArgs),
}

#[derive(clap::Args,Debug)]
pub struct StartArgs {
    pub id:u32,
}

#[derive(clap::Args,Debug)]
pub struct FrequencyArgs {
    pub mhz:f64,
}

#[derive(clap::Args,Debug)]
pub struct GradientArgs {
    #[arg(value_enum)]
    pub axis:GradientAxis,
    #[arg(allow_hyphen_values = true)]
    pub value:i32,
}

#[derive(clap::Args,Debug)]
pub struct ShimArgs {
    pub channel:u8,
    #[arg(allow_hyphen_values = true)]
    pub value:i32,
}

#[derive(clap::Args,Debug)]
pub struct PathArgs {
    pub path:PathBuf,
}

#[derive(clap::Args,Debug)]
pub struct DecodeArgs {
    /// words as hex (0x2010012c) or decimal
    pub words:Vec<String>,
}
