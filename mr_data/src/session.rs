//! Acquisition session: everything needed to turn a stream of sample blocks
//! into k-space for one acquisition.
use std::path::Path;
use serde::{Deserialize, Serialize};
use utils::{Config, ConfigError, ConfigFile};
use crate::error::SessionError;

/// Samples per block sent by the console for every repetition.
pub const DEFAULT_BLOCK_SAMPLES:usize = 50_000;
/// Bytes per complex sample (f32 re, f32 im)
pub const SAMPLE_BYTES:usize = 8;
/// receiver filter delay: 0.35 ms at 250 samples/ms
pub const DEFAULT_SAMPLE_DELAY:usize = 87;
pub const DEFAULT_CENTER_FRACTION:f32 = 0.99;

#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trajectory {
    CartesianFull,
    /// in-out ordering: blocks alternate between the two halves of k-space
    CartesianHalf,
    RadialFull{angle_step_deg:f32},
    RadialHalf{angle_step_deg:f32},
    Epi{echo_train_length:usize},
    TurboSpinEcho{echo_train_length:usize},
    Slab3d{phase_steps:usize,inner:SlabInner},
    DiffusionPair,
    MultiPositionStitch{positions:usize},
}

/// In-plane ordering of each slab phase step.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlabInner {
    Cartesian,
    TurboSpinEcho{echo_train_length:usize},
}

impl Trajectory {
    /// nibble sent in the acquire word
    pub fn code(&self) -> u8 {
        use Trajectory::*;
        match self {
            CartesianFull => 0,
            CartesianHalf => 1,
            RadialFull{..} => 2,
            RadialHalf{..} => 3,
            Epi{..} => 4,
            TurboSpinEcho{..} => 5,
            Slab3d{..} => 6,
            DiffusionPair => 7,
            MultiPositionStitch{..} => 8,
        }
    }

    pub fn is_radial(&self) -> bool {
        matches!(self,Trajectory::RadialFull{..} | Trajectory::RadialHalf{..})
    }

    /// readout segments contained in one block
    pub fn segments_per_block(&self) -> usize {
        match self {
            Trajectory::Epi{echo_train_length} |
            Trajectory::TurboSpinEcho{echo_train_length} |
            Trajectory::Slab3d{inner:SlabInner::TurboSpinEcho{echo_train_length},..} => *echo_train_length,
            _=> 1
        }
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragingMode {
    /// complex k-space passes are summed before the transform
    Coherent,
    /// each pass is reconstructed and the magnitudes are averaged
    Magnitude,
}

/// What the stream assembler does with bytes that run past a block boundary.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurplusPolicy {
    /// drop them and keep going
    Discard,
    /// keep them as the start of the next block
    Carry,
    /// fail the repetition
    Reject,
}

/// Where the image window sits inside the oversampled readout.
#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct CropCalibration {
    pub center_fraction:f32,
}

impl CropCalibration {
    pub fn for_trajectory(trajectory:&Trajectory) -> Self {
        match trajectory.is_radial() {
            true => CropCalibration{center_fraction:1.0},
            false => CropCalibration{center_fraction:DEFAULT_CENTER_FRACTION},
        }
    }

    /// Start of a window of `width` samples inside `extent` samples. The window
    /// spans `center-(width/2-1) .. center+(width/2+1)` and is held inside the extent.
    pub fn window_start(&self,extent:usize,width:usize) -> Option<usize> {
        if width > extent || !self.center_fraction.is_finite() {
            return None
        }
        let center = (extent as f32*self.center_fraction.max(0.0)/2.0).floor() as usize;
        Some((center + 1).saturating_sub(width/2).min(extent - width))
    }
}

#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct AcquisitionSession {
    pub session_id:u32,
    /// larmor frequency sent before the sequence runs
    pub frequency_mhz:Option<f64>,
    /// samples kept from each readout segment
    pub readout_points:usize,
    /// image width along the readout after cropping
    pub matrix_size:usize,
    pub phase_encodes:usize,
    pub orientation:Orientation,
    pub averages:usize,
    pub averaging:AveragingMode,
    pub block_samples:usize,
    pub sample_delay:usize,
    /// samples between consecutive echoes of a segmented readout
    pub echo_spacing:usize,
    pub rx_scaling:f32,
    pub surplus:SurplusPolicy,
    pub trajectory:Trajectory,
    pub calibration:CropCalibration,
}

impl AcquisitionSession {
    /// A square cartesian session with console defaults.
    pub fn new(trajectory:Trajectory,matrix_size:usize) -> Self {
        let calibration = CropCalibration::for_trajectory(&trajectory);
        Self {
            session_id:5,
            frequency_mhz:None,
            readout_points:matrix_size,
            matrix_size,
            phase_encodes:matrix_size,
            orientation:Orientation::Axial,
            averages:1,
            averaging:AveragingMode::Coherent,
            block_samples:DEFAULT_BLOCK_SAMPLES,
            sample_delay:DEFAULT_SAMPLE_DELAY,
            echo_spacing:matrix_size,
            rx_scaling:1.0,
            surplus:SurplusPolicy::Discard,
            trajectory,
            calibration,
        }
    }

    pub fn block_bytes(&self) -> usize {
        self.block_samples*SAMPLE_BYTES
    }

    /// blocks needed to fill k-space once
    pub fn repetitions(&self) -> usize {
        use Trajectory::*;
        let rows = self.phase_encodes;
        match &self.trajectory {
            CartesianFull | CartesianHalf => rows,
            RadialFull{angle_step_deg} => angle_count(180.0,*angle_step_deg),
            RadialHalf{angle_step_deg} => angle_count(360.0,*angle_step_deg),
            Epi{echo_train_length} | TurboSpinEcho{echo_train_length} => rows/(*echo_train_length).max(1),
            Slab3d{phase_steps,inner} => phase_steps*self.slab_inner_repetitions(inner),
            DiffusionPair => 2*rows,
            MultiPositionStitch{positions} => positions*rows,
        }
    }

    pub(crate) fn slab_inner_repetitions(&self,inner:&SlabInner) -> usize {
        match inner {
            SlabInner::Cartesian => self.phase_encodes,
            SlabInner::TurboSpinEcho{echo_train_length} => self.phase_encodes/(*echo_train_length).max(1),
        }
    }

    /// blocks for the whole acquisition including averages
    pub fn total_blocks(&self) -> usize {
        self.repetitions()*self.averages
    }

    /// (planes, rows, cols) of the k-space container
    pub fn kspace_shape(&self) -> (usize,usize,usize) {
        use Trajectory::*;
        let n = self.readout_points;
        let rows = self.phase_encodes;
        match &self.trajectory {
            RadialFull{..} => (1,n,n),
            RadialHalf{..} => (1,2*n,2*n),
            Slab3d{phase_steps,..} => (*phase_steps,rows,n),
            DiffusionPair => (1,2*rows,n),
            MultiPositionStitch{positions} => (*positions,rows,n),
            _=> (1,rows,n)
        }
    }

    /// sample offset of readout segment `k` within a block
    pub fn segment_offset(&self,k:usize) -> usize {
        self.sample_delay + k*self.echo_spacing
    }

    /// Reject sessions the mapper could not fill consistently.
    pub fn validate(&self) -> Result<(),SessionError> {
        use Trajectory::*;
        let mismatch = |msg:String| Err(SessionError::TrajectoryMismatch(msg));
        if self.readout_points == 0 || self.phase_encodes == 0 || self.matrix_size == 0 {
            return mismatch(String::from("matrix dimensions must be non-zero"))
        }
        if self.averages == 0 {
            return mismatch(String::from("at least one average is required"))
        }
        if !self.rx_scaling.is_finite() {
            return mismatch(String::from("rx scaling must be finite"))
        }
        match &self.trajectory {
            CartesianHalf => {
                if self.phase_encodes % 2 != 0 {
                    return mismatch(format!("half fourier needs an even phase count, got {}",self.phase_encodes))
                }
            }
            RadialFull{angle_step_deg} | RadialHalf{angle_step_deg} => {
                if !(angle_step_deg.is_finite() && *angle_step_deg > 0.0) {
                    return mismatch(format!("angle step must be positive, got {}",angle_step_deg))
                }
            }
            Epi{echo_train_length} => check_echo_train(self.phase_encodes,*echo_train_length,false)?,
            TurboSpinEcho{echo_train_length} => check_echo_train(self.phase_encodes,*echo_train_length,true)?,
            Slab3d{phase_steps,inner} => {
                if *phase_steps == 0 {
                    return mismatch(String::from("slab needs at least one phase step"))
                }
                if let SlabInner::TurboSpinEcho{echo_train_length} = inner {
                    check_echo_train(self.phase_encodes,*echo_train_length,true)?
                }
            }
            MultiPositionStitch{positions} => {
                if *positions == 0 {
                    return mismatch(String::from("stitching needs at least one position"))
                }
            }
            CartesianFull | DiffusionPair => {}
        }
        let segments = self.trajectory.segments_per_block();
        let needed = self.segment_offset(segments-1) + self.readout_points;
        if needed > self.block_samples {
            return mismatch(format!("readouts need {} samples but a block holds {}",needed,self.block_samples))
        }
        let (_,rows,cols) = self.kspace_shape();
        let crop_extent = match self.trajectory.is_radial() {
            true => rows.min(cols),
            false => cols
        };
        if self.calibration.window_start(crop_extent,self.matrix_size).is_none() {
            return mismatch(format!(
                "a {} sample crop window centered at fraction {} does not fit in {} samples",
                self.matrix_size,self.calibration.center_fraction,crop_extent
            ))
        }
        Ok(())
    }
}

fn check_echo_train(rows:usize,etl:usize,symmetric:bool) -> Result<(),SessionError> {
    if etl == 0 || rows % etl != 0 {
        return Err(SessionError::TrajectoryMismatch(format!("{} phase encodes are not divisible by echo train length {}",rows,etl)))
    }
    if symmetric && etl > 1 && (rows/etl) % 2 != 0 {
        return Err(SessionError::TrajectoryMismatch(format!("centric ordering needs an even number of shots, got {}",rows/etl)))
    }
    Ok(())
}

/// number of angles in [0, range) at `step` degree spacing
pub fn angle_count(range:f32,step:f32) -> usize {
    if !(step.is_finite() && step > 0.0) {
        return 0
    }
    ((range as f64/step as f64) - 1E-4).ceil().max(0.0) as usize
}

impl ConfigFile for AcquisitionSession {
    fn to_file(&self,filename:&Path) -> Result<(),ConfigError> {
        utils::json_to_file(self,filename,&Self::file_ext())
    }
    fn from_file(filename:&Path) -> Result<Self,ConfigError> {
        utils::json_from_file(filename,&Self::file_ext())
    }
    fn file_ext() -> String {
        String::from("session")
    }
}

impl Config for AcquisitionSession {
    fn default() -> Self {
        AcquisitionSession::new(Trajectory::CartesianFull,64)
    }
}
