//! k-space to magnitude and phase images.
use log::debug;
use ndarray::{concatenate, s, Array3, Axis, Slice, Zip};
use num_complex::Complex32;
use mr_data::cfl;
use mr_data::kspace::KSpace;
use mr_data::session::{AcquisitionSession, AveragingMode, CropCalibration, Trajectory};
use crate::error::ReconError;
use crate::fft;
use crate::filter;
use crate::recon_config::ReconSettings;
use crate::spectrum::{self, ImageAnalytics};

/// Images shaped (planes, rows, cols).
#[derive(Clone,Debug)]
pub struct ReconstructedImage {
    pub magnitude:Array3<f32>,
    pub phase:Array3<f32>,
    pub complex:Array3<Complex32>,
}

impl ReconstructedImage {
    pub fn from_complex(complex:Array3<Complex32>) -> Self {
        Self {
            magnitude:cfl::complex_vol_to_magnitude(&complex),
            phase:complex.mapv(|c| c.arg()),
            complex,
        }
    }

    pub fn dim(&self) -> (usize,usize,usize) {
        self.magnitude.dim()
    }

    /// largest magnitude and where it is
    pub fn peak(&self) -> ((usize,usize,usize),f32) {
        self.magnitude.indexed_iter()
            .fold(((0,0,0),f32::MIN),|best,(idx,v)| if *v > best.1 {(idx,*v)} else {best})
    }

    /// signal to noise of the middle plane
    pub fn analytics(&self) -> Result<ImageAnalytics,ReconError> {
        let planes = self.magnitude.len_of(Axis(0));
        if planes == 0 {
            return Err(ReconError::EmptyData("image"))
        }
        spectrum::image_analytics(&self.magnitude.index_axis(Axis(0),planes/2))
    }
}

pub struct ReconstructionEngine {
    settings:ReconSettings,
}

impl ReconstructionEngine {
    pub fn new(settings:ReconSettings) -> Self {
        Self{settings}
    }

    pub fn settings(&self) -> &ReconSettings {
        &self.settings
    }

    /// Masks and apodization configured for this engine, applied to a copy of k-space.
    pub fn prepare(&self,kspace:&Array3<Complex32>) -> Array3<Complex32> {
        let mut k = kspace.to_owned();
        if let Some(period) = self.settings.undersample_readout {
            filter::undersample(&mut k,2,period);
        }
        if let Some(period) = self.settings.undersample_phase {
            filter::undersample(&mut k,1,period);
        }
        if let Some(c) = self.settings.cut {
            filter::cut(&mut k,c.shape,c.center_percent,c.outside_percent);
        }
        if let Some(f) = self.settings.fermi {
            filter::fermi_filter(&mut k,f.w1,f.w2);
        }
        k
    }

    pub fn reconstruct(&self,session:&AcquisitionSession,kspace:&KSpace) -> Result<ReconstructedImage,ReconError> {
        let expected = session.kspace_shape();
        if kspace.dim() != expected {
            return Err(ReconError::ShapeMismatch{expected,found:kspace.dim()})
        }
        let k = self.prepare(kspace.data());
        debug!("reconstructing {:?} k-space of shape {:?}",session.trajectory,k.dim());
        match &session.trajectory {
            Trajectory::DiffusionPair => self.diffusion(session,&k),
            Trajectory::MultiPositionStitch{..} => {
                let img = self.crop(session,fft::inverse(&k,&[1,2]))?;
                Ok(ReconstructedImage::from_complex(stitch(&img)))
            }
            Trajectory::Slab3d{..} => {
                let img = fft::inverse(&k,&[0,1,2]);
                Ok(ReconstructedImage::from_complex(self.crop(session,img)?))
            }
            _=> {
                let img = fft::inverse(&k,&[1,2]);
                Ok(ReconstructedImage::from_complex(self.crop(session,img)?))
            }
        }
    }

    /// b0 and diffusion weighted halves reconstructed separately, then their magnitude difference.
    fn diffusion(&self,session:&AcquisitionSession,k:&Array3<Complex32>) -> Result<ReconstructedImage,ReconError> {
        let rows = session.phase_encodes;
        let b0 = self.crop(session,fft::inverse(&k.slice(s![..,..rows,..]).to_owned(),&[1,2]))?;
        let dw = self.crop(session,fft::inverse(&k.slice(s![..,rows..,..]).to_owned(),&[1,2]))?;
        let diff = Zip::from(&b0).and(&dw).map_collect(|a,b| Complex32::new(a.norm() - b.norm(),0.0));
        let stacked = concatenate(Axis(0),&[b0.view(),dw.view(),diff.view()])
            .map_err(|_| ReconError::ShapeMismatch{expected:session.kspace_shape(),found:k.dim()})?;
        let mut img = ReconstructedImage::from_complex(stacked);
        img.magnitude.slice_mut(s![2,..,..]).assign(&diff.slice(s![0,..,..]).mapv(|c| c.re));
        img.phase.slice_mut(s![2,..,..]).fill(0.0);
        Ok(img)
    }

    /// Keep `matrix_size` samples around the calibrated center of the readout
    /// (and of the phase axis for projection data).
    pub fn crop(&self,session:&AcquisitionSession,img:Array3<Complex32>) -> Result<Array3<Complex32>,ReconError> {
        let calibration = match self.settings.center_fraction {
            Some(center_fraction) => CropCalibration{center_fraction},
            None => session.calibration,
        };
        let axes:&[usize] = match session.trajectory.is_radial() {
            true => &[1,2],
            false => &[2],
        };
        let width = session.matrix_size;
        let mut img = img;
        for axis in axes {
            let extent = img.len_of(Axis(*axis));
            let start = calibration.window_start(extent,width)
                .ok_or(ReconError::CropOutOfRange{extent,width,fraction:calibration.center_fraction})?;
            img = img.slice_axis(Axis(*axis),Slice::from(start..start+width)).to_owned();
        }
        Ok(img)
    }
}

/// planes laid end to end along the phase axis
fn stitch(img:&Array3<Complex32>) -> Array3<Complex32> {
    let (planes,rows,cols) = img.dim();
    let mut out = Array3::<Complex32>::zeros((1,planes*rows,cols));
    img.outer_iter().enumerate().for_each(|(p,plane)|{
        out.slice_mut(s![0,p*rows..(p+1)*rows,..]).assign(&plane);
    });
    out
}

/// Accumulates k-space passes and produces one averaged image.
pub struct Averager {
    mode:AveragingMode,
    kspace_sum:Option<Array3<Complex32>>,
    magnitude_sum:Option<Array3<f32>>,
    complex_sum:Option<Array3<Complex32>>,
    passes:usize,
}

impl Averager {
    pub fn new(mode:AveragingMode) -> Self {
        Self{mode,kspace_sum:None,magnitude_sum:None,complex_sum:None,passes:0}
    }

    pub fn add_pass(&mut self,engine:&ReconstructionEngine,session:&AcquisitionSession,kspace:&KSpace) -> Result<(),ReconError> {
        match self.mode {
            AveragingMode::Coherent => {
                let expected = session.kspace_shape();
                if kspace.dim() != expected {
                    return Err(ReconError::ShapeMismatch{expected,found:kspace.dim()})
                }
                match self.kspace_sum.as_mut() {
                    Some(sum) => *sum += kspace.data(),
                    None => self.kspace_sum = Some(kspace.data().to_owned()),
                }
            }
            AveragingMode::Magnitude => {
                let img = engine.reconstruct(session,kspace)?;
                match (self.magnitude_sum.as_mut(),self.complex_sum.as_mut()) {
                    (Some(m),Some(c)) => {
                        *m += &img.magnitude;
                        *c += &img.complex;
                    }
                    _=> {
                        self.magnitude_sum = Some(img.magnitude);
                        self.complex_sum = Some(img.complex);
                    }
                }
            }
        }
        self.passes += 1;
        Ok(())
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn finish(&self,engine:&ReconstructionEngine,session:&AcquisitionSession) -> Result<ReconstructedImage,ReconError> {
        if self.passes == 0 {
            return Err(ReconError::NoPasses)
        }
        let n = self.passes as f32;
        match self.mode {
            AveragingMode::Coherent => {
                let sum = self.kspace_sum.as_ref().ok_or(ReconError::NoPasses)?;
                let mean = KSpace::from_array(sum.mapv(|c| c/n));
                engine.reconstruct(session,&mean)
            }
            AveragingMode::Magnitude => {
                let m = self.magnitude_sum.as_ref().ok_or(ReconError::NoPasses)?;
                let c = self.complex_sum.as_ref().ok_or(ReconError::NoPasses)?;
                let complex = c.mapv(|v| v/n);
                Ok(ReconstructedImage {
                    magnitude:m.mapv(|v| v/n),
                    phase:complex.mapv(|v| v.arg()),
                    complex,
                })
            }
        }
    }

    pub fn reset(&mut self) {
        self.kspace_sum = None;
        self.magnitude_sum = None;
        self.complex_sum = None;
        self.passes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::Config;
    use mr_data::session::SlabInner;

    fn engine() -> ReconstructionEngine {
        ReconstructionEngine::new(Config::default())
    }

    fn point_image(shape:(usize,usize,usize),at:(usize,usize,usize)) -> Array3<Complex32> {
        let mut img = Array3::<Complex32>::zeros(shape);
        img[[at.0,at.1,at.2]] = Complex32::new(1.0,0.0);
        img
    }

    #[test]
    fn synthetic_image_round_trips() {
        let session = AcquisitionSession::new(Trajectory::CartesianFull,16);
        let img = Array3::from_shape_fn((1,16,16),|(_,r,c)| Complex32::new((r*16+c) as f32,0.0));
        let k = KSpace::from_array(fft::forward(&img,&[1,2]));
        let out = engine().reconstruct(&session,&k).unwrap();
        out.magnitude.iter().zip(img.iter()).for_each(|(m,i)| assert!((m-i.norm()).abs() < 1E-2));
    }

    #[test]
    fn oversampled_readout_is_cropped() {
        let mut session = AcquisitionSession::new(Trajectory::CartesianFull,8);
        session.readout_points = 32;
        session.calibration = CropCalibration{center_fraction:1.0};
        let img = point_image((1,8,32),(0,4,17));
        let k = KSpace::from_array(fft::forward(&img,&[1,2]));
        let out = engine().reconstruct(&session,&k).unwrap();
        assert_eq!(out.dim(),(1,8,8));
        // window starts at 16 + 1 - 4 = 13
        assert_eq!(out.peak().0,(0,4,4));
    }

    #[test]
    fn center_fraction_override_moves_window() {
        let mut settings:ReconSettings = Config::default();
        settings.center_fraction = Some(0.5);
        let mut session = AcquisitionSession::new(Trajectory::CartesianFull,8);
        session.readout_points = 32;
        let engine = ReconstructionEngine::new(settings);
        let img = engine.crop(&session,point_image((1,8,32),(0,0,5))).unwrap();
        // window [5, 13)
        assert_eq!(img[[0,0,0]].re,1.0);
    }

    #[test]
    fn radial_crops_both_axes() {
        let mut session = AcquisitionSession::new(Trajectory::RadialFull{angle_step_deg:10.0},8);
        session.readout_points = 16;
        let k = KSpace::new(session.kspace_shape());
        assert_eq!(engine().reconstruct(&session,&k).unwrap().dim(),(1,8,8));
    }

    #[test]
    fn wrong_kspace_shape_is_rejected() {
        let session = AcquisitionSession::new(Trajectory::CartesianFull,8);
        let k = KSpace::new((1,4,8));
        assert!(matches!(engine().reconstruct(&session,&k),Err(ReconError::ShapeMismatch{..})));
    }

    #[test]
    fn slab_transforms_through_planes() {
        let session = AcquisitionSession::new(Trajectory::Slab3d{phase_steps:4,inner:SlabInner::Cartesian},8);
        let img = point_image((4,8,8),(1,2,3));
        let k = KSpace::from_array(fft::forward(&img,&[0,1,2]));
        let out = engine().reconstruct(&session,&k).unwrap();
        assert_eq!(out.peak().0,(1,2,3));
    }

    #[test]
    fn diffusion_yields_difference_plane() {
        let session = AcquisitionSession::new(Trajectory::DiffusionPair,8);
        let b0 = Array3::from_elem((1,8,8),Complex32::new(3.0,0.0));
        let dw = Array3::from_elem((1,8,8),Complex32::new(1.0,0.0));
        let k = concatenate(Axis(1),&[fft::forward(&b0,&[1,2]).view(),fft::forward(&dw,&[1,2]).view()]).unwrap();
        let out = engine().reconstruct(&session,&KSpace::from_array(k)).unwrap();
        assert_eq!(out.dim(),(3,8,8));
        assert!((out.magnitude[[2,3,3]] - 2.0).abs() < 1E-3);
        assert_eq!(out.phase[[2,3,3]],0.0);
    }

    #[test]
    fn stitched_positions_stack_along_phase() {
        let session = AcquisitionSession::new(Trajectory::MultiPositionStitch{positions:3},8);
        let img = point_image((3,8,8),(2,1,4));
        let k = KSpace::from_array(fft::forward(&img,&[1,2]));
        let out = engine().reconstruct(&session,&k).unwrap();
        assert_eq!(out.dim(),(1,24,8));
        assert_eq!(out.peak().0,(0,17,4));
    }

    #[test]
    fn coherent_and_magnitude_averaging_agree_on_identical_passes() {
        let session = AcquisitionSession::new(Trajectory::CartesianFull,8);
        let k = KSpace::from_array(fft::forward(&point_image((1,8,8),(0,3,3)),&[1,2]));
        let e = engine();
        let mut coherent = Averager::new(AveragingMode::Coherent);
        let mut magnitude = Averager::new(AveragingMode::Magnitude);
        for _ in 0..3 {
            coherent.add_pass(&e,&session,&k).unwrap();
            magnitude.add_pass(&e,&session,&k).unwrap();
        }
        let a = coherent.finish(&e,&session).unwrap();
        let b = magnitude.finish(&e,&session).unwrap();
        a.magnitude.iter().zip(b.magnitude.iter()).for_each(|(x,y)| assert!((x-y).abs() < 1E-4));
        assert!((a.magnitude[[0,3,3]] - 1.0).abs() < 1E-4);
    }

    #[test]
    fn finishing_without_passes_fails() {
        let session = AcquisitionSession::new(Trajectory::CartesianFull,8);
        assert_eq!(Averager::new(AveragingMode::Coherent).finish(&engine(),&session).unwrap_err(),ReconError::NoPasses);
    }

    #[test]
    fn analytics_read_the_middle_plane() {
        let mut complex = Array3::from_elem((3,4,4),Complex32::new(1.0,0.0));
        complex[[1,2,2]] = Complex32::new(0.0,8.0);
        let img = ReconstructedImage::from_complex(complex);
        let a = img.analytics().unwrap();
        assert_eq!(a.signal,8.0);
        assert_eq!(a.noise,1.0);
        assert_eq!(a.snr,8.0);
        let empty = ReconstructedImage::from_complex(Array3::zeros((0,4,4)));
        assert_eq!(empty.analytics().unwrap_err(),ReconError::EmptyData("image"));
    }
}
