use std::path::PathBuf;
use simplelog::LevelFilter;
use mr_data::session::{SlabInner, Trajectory};

#[derive(clap::Parser,Debug)]
#[command(version, about = "run acquisitions on the benchtop console")]
pub struct AcquireArgs {
    /// log level for output (error, warn, info, debug, trace)
    #[arg(global = true, long, default_value = "info")]
    pub loglevel:LevelFilter,
    /// scanner settings file (defaults are used when omitted)
    #[arg(global = true, long)]
    pub settings:Option<PathBuf>,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(clap::Subcommand,Debug)]
pub enum Action {
    /// run one acquisition and write k-space and images
    Run(RunArgs),
    /// write a session template for a trajectory
    NewSession(NewSessionArgs),
    /// write default scanner and reconstruction settings
    NewSettings(PathArgs),
}

#[derive(clap::Args,Debug)]
pub struct RunArgs {
    /// session file, or a directory holding one
    pub session:PathBuf,
    /// compiled sequence to upload
    pub sequence:PathBuf,
    /// base path for the outputs
    pub output:PathBuf,
    #[arg(short, long)]
    pub recon_settings:Option<PathBuf>,
}

#[derive(clap::Args,Debug)]
pub struct NewSessionArgs {
    #[arg(value_enum)]
    pub kind:TrajectoryKind,
    pub path:PathBuf,
    #[arg(short, long, default_value = "64")]
    pub matrix:usize,
}

#[derive(clap::Args,Debug)]
pub struct PathArgs {
    pub path:PathBuf,
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,clap::ValueEnum)]
pub enum TrajectoryKind {
    CartesianFull,
    CartesianHalf,
    RadialFull,
    RadialHalf,
    Epi,
    Tse,
    Slab,
    Diffusion,
    Stitch,
}

impl TrajectoryKind {
    /// trajectory with the console's usual parameters
    pub fn template(&self) -> Trajectory {
        use TrajectoryKind::*;
        match self {
            CartesianFull => Trajectory::CartesianFull,
            CartesianHalf => Trajectory::CartesianHalf,
            RadialFull => Trajectory::RadialFull{angle_step_deg:1.8},
            RadialHalf => Trajectory::RadialHalf{angle_step_deg:1.8},
            Epi => Trajectory::Epi{echo_train_length:4},
            Tse => Trajectory::TurboSpinEcho{echo_train_length:4},
            Slab => Trajectory::Slab3d{phase_steps:8,inner:SlabInner::Cartesian},
            Diffusion => Trajectory::DiffusionPair,
            Stitch => Trajectory::MultiPositionStitch{positions:3},
        }
    }
}
