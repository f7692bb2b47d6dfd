//! Placement of completed sample blocks into k-space.
//!
//! The free functions are pure: given a block's position in the pass and its
//! samples they say where each readout lands. `TrajectoryMapper` applies them
//! to a `KSpace` in arrival order.
use log::{debug, trace};
use num_complex::Complex32;
use crate::error::{KSpaceError, SessionError};
use crate::kspace::KSpace;
use crate::sample_block::RawSampleBlock;
use crate::session::{AcquisitionSession, SlabInner, Trajectory};

#[derive(Clone,Debug,PartialEq)]
pub enum Placement {
    Row{plane:usize,row:usize,samples:Vec<Complex32>},
    Cells{plane:usize,cells:Vec<(usize,usize,Complex32)>},
}

/// `len` samples starting at `offset`, scaled by the receiver gain
pub fn readout(samples:&[Complex32],offset:usize,len:usize,scaling:f32) -> Result<Vec<Complex32>,KSpaceError> {
    match samples.get(offset..offset+len) {
        Some(seg) => Ok(seg.iter().map(|s| *s*scaling).collect()),
        None => Err(KSpaceError::ShortBlock{needed:offset+len,available:samples.len()})
    }
}

/// In-out ordering: even blocks walk the lower half outward from the center,
/// odd blocks walk the upper half.
pub fn cartesian_half_row(index:usize,rows:usize) -> usize {
    let half = rows/2;
    match index % 2 {
        0 => half - 1 - index/2,
        _=> half + index/2
    }
}

/// Centric turbo spin echo ordering. Echo 0 fills the central `shots` rows;
/// echo k splits its shots between the k-th band below and above the center.
pub fn tse_row(shot:usize,echo:usize,etl:usize,shots:usize) -> usize {
    let half = shots/2;
    let center_start = (etl-1)*half;
    if echo == 0 {
        center_start + shot
    }else if shot < half {
        (etl-1-echo)*half + shot
    }else {
        center_start + shots + (echo-1)*half + (shot-half)
    }
}

/// Angles in degrees for each projection of a radial pass.
pub fn radial_angles(range:f32,step:f32) -> Vec<f32> {
    let n = crate::session::angle_count(range,step);
    (0..n).map(|i| i as f32*step).collect()
}

/// Nearest grid cell for sample `index` of an `n` sample projection at `angle_deg`.
/// Full projections pass through the center of an n x n grid; half projections
/// start at the center of a 2n x 2n grid.
pub fn radial_cell(angle_deg:f32,index:usize,n:usize,half:bool) -> Option<(usize,usize)> {
    let theta = angle_deg.to_radians();
    let (center,radius) = match half {
        true => (n as isize,index as f32),
        false => ((n/2) as isize,index as f32 - (n/2) as f32),
    };
    let extent = match half {
        true => 2*n,
        false => n
    } as isize;
    let row = center + (theta.sin()*radius).round() as isize;
    let col = center + (theta.cos()*radius).round() as isize;
    match (0..extent).contains(&row) && (0..extent).contains(&col) {
        true => Some((row as usize,col as usize)),
        false => None
    }
}

fn radial(session:&AcquisitionSession,index:usize,samples:&[Complex32],range:f32,step:f32,half:bool) -> Result<Vec<Placement>,KSpaceError> {
    let n = session.readout_points;
    let line = readout(samples,session.segment_offset(0),n,session.rx_scaling)?;
    let angle = index as f32*step;
    if angle >= range {
        return Err(KSpaceError::OutOfBounds{plane:0,row:index,col:0})
    }
    let cells = line.iter().enumerate()
        .filter_map(|(i,v)| radial_cell(angle,i,n,half).map(|(r,c)| (r,c,*v)))
        .collect();
    Ok(vec![Placement::Cells{plane:0,cells}])
}

fn tse(session:&AcquisitionSession,plane:usize,shot:usize,etl:usize,samples:&[Complex32]) -> Result<Vec<Placement>,KSpaceError> {
    let shots = session.phase_encodes/etl;
    (0..etl).map(|k|{
        let mut seg = readout(samples,session.segment_offset(k),session.readout_points,session.rx_scaling)?;
        if k % 2 == 1 {
            seg.iter_mut().for_each(|s| *s = -*s);
        }
        Ok(Placement::Row{plane,row:tse_row(shot,k,etl,shots),samples:seg})
    }).collect()
}

fn single_row(session:&AcquisitionSession,plane:usize,row:usize,samples:&[Complex32]) -> Result<Vec<Placement>,KSpaceError> {
    let seg = readout(samples,session.segment_offset(0),session.readout_points,session.rx_scaling)?;
    Ok(vec![Placement::Row{plane,row,samples:seg}])
}

/// Where the readouts of the `index`-th block of a pass belong.
pub fn place(session:&AcquisitionSession,index:usize,samples:&[Complex32]) -> Result<Vec<Placement>,KSpaceError> {
    use Trajectory::*;
    let rows = session.phase_encodes;
    match &session.trajectory {
        CartesianFull | DiffusionPair => single_row(session,0,index,samples),
        CartesianHalf => {
            if index >= rows {
                return Err(KSpaceError::OutOfBounds{plane:0,row:index,col:0})
            }
            single_row(session,0,cartesian_half_row(index,rows),samples)
        }
        RadialFull{angle_step_deg} => radial(session,index,samples,180.0,*angle_step_deg,false),
        RadialHalf{angle_step_deg} => radial(session,index,samples,360.0,*angle_step_deg,true),
        Epi{echo_train_length} => {
            let etl = *echo_train_length;
            (0..etl).map(|k|{
                let mut seg = readout(samples,session.segment_offset(k),session.readout_points,session.rx_scaling)?;
                if k % 2 == 1 {
                    seg.reverse();
                }
                Ok(Placement::Row{plane:0,row:index*etl + k,samples:seg})
            }).collect()
        }
        TurboSpinEcho{echo_train_length} => tse(session,0,index,*echo_train_length,samples),
        Slab3d{inner,..} => {
            let per_plane = session.slab_inner_repetitions(inner);
            let plane = index/per_plane;
            match inner {
                SlabInner::Cartesian => single_row(session,plane,index % per_plane,samples),
                SlabInner::TurboSpinEcho{echo_train_length} => tse(session,plane,index % per_plane,*echo_train_length,samples),
            }
        }
        MultiPositionStitch{..} => single_row(session,index/rows,index % rows,samples),
    }
}

/// Fills k-space one block at a time and hands back each completed pass.
pub struct TrajectoryMapper {
    session:AcquisitionSession,
    kspace:KSpace,
    index:usize,
    passes:usize,
}

impl TrajectoryMapper {
    pub fn new(session:AcquisitionSession) -> Result<Self,SessionError> {
        session.validate()?;
        let kspace = KSpace::new(session.kspace_shape());
        Ok(Self{session,kspace,index:0,passes:0})
    }

    /// Place one block. Returns the finished k-space when this block completes a pass.
    pub fn place_block(&mut self,block:&RawSampleBlock) -> Result<Option<KSpace>,KSpaceError> {
        let samples = block.samples();
        for placement in place(&self.session,self.index,&samples)? {
            match placement {
                Placement::Row{plane,row,samples} => {
                    trace!("block {} -> plane {} row {}",block.sequence(),plane,row);
                    self.kspace.put_row(plane,row,&samples)?
                }
                Placement::Cells{plane,cells} => {
                    for (r,c,v) in cells {
                        self.kspace.put_cell(plane,r,c,v)?
                    }
                }
            }
        }
        self.index += 1;
        if self.index < self.session.repetitions() {
            return Ok(None)
        }
        self.index = 0;
        self.passes += 1;
        debug!("k-space pass {} of {} complete",self.passes,self.session.averages);
        let fresh = KSpace::new(self.session.kspace_shape());
        Ok(Some(std::mem::replace(&mut self.kspace,fresh)))
    }

    /// position of the next block within the current pass
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn passes_completed(&self) -> usize {
        self.passes
    }

    pub fn repetitions(&self) -> usize {
        self.session.repetitions()
    }

    pub fn session(&self) -> &AcquisitionSession {
        &self.session
    }

    pub fn kspace(&self) -> &KSpace {
        &self.kspace
    }

    pub fn reset(&mut self) {
        self.kspace.clear();
        self.index = 0;
        self.passes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn session(trajectory:Trajectory,m:usize) -> AcquisitionSession {
        let mut s = AcquisitionSession::new(trajectory,m);
        s.sample_delay = 2;
        s.echo_spacing = m + 3;
        s.block_samples = 2 + 4*(m+3) + m;
        s
    }

    /// block whose every sample encodes (block, position)
    fn block(s:&AcquisitionSession,index:usize) -> RawSampleBlock {
        let samples:Vec<Complex32> = (0..s.block_samples).map(|i| Complex32::new(index as f32,i as f32)).collect();
        RawSampleBlock::from_samples(&samples,index)
    }

    #[test]
    fn cartesian_full_is_a_bijection() {
        let s = session(Trajectory::CartesianFull,8);
        let rows:HashSet<usize> = (0..8).map(|n|{
            match &place(&s,n,&block(&s,n).samples()).unwrap()[0] {
                Placement::Row{row,..} => *row,
                _=> panic!("cartesian places rows")
            }
        }).collect();
        assert_eq!(rows,(0..8).collect());
    }

    #[test]
    fn half_fourier_reads_outward() {
        let rows:Vec<usize> = (0..8).map(|n| cartesian_half_row(n,8)).collect();
        assert_eq!(rows,vec![3,4,2,5,1,6,0,7]);
    }

    #[test]
    fn readout_starts_after_delay_and_is_scaled() {
        let mut s = session(Trajectory::CartesianFull,4);
        s.rx_scaling = 2.0;
        let p = place(&s,1,&block(&s,1).samples()).unwrap();
        assert_eq!(p[0],Placement::Row{plane:0,row:1,samples:(2..6).map(|i| Complex32::new(2.0,2.0*i as f32)).collect()});
    }

    #[test]
    fn epi_reverses_odd_segments() {
        let s = session(Trajectory::Epi{echo_train_length:4},8);
        let samples = block(&s,1).samples();
        let p = place(&s,1,&samples).unwrap();
        for (k,placement) in p.iter().enumerate() {
            let start = s.segment_offset(k);
            let mut expected = samples[start..start+8].to_vec();
            if k % 2 == 1 {
                expected.reverse();
            }
            assert_eq!(placement,&Placement::Row{plane:0,row:4+k,samples:expected});
        }
    }

    #[test]
    fn tse_ordering_is_centric_permutation() {
        // etl 4, 16 rows: 4 shots
        let mut seen = vec![];
        for shot in 0..4 {
            for echo in 0..4 {
                seen.push(tse_row(shot,echo,4,4));
            }
        }
        let unique:HashSet<usize> = seen.iter().copied().collect();
        assert_eq!(unique.len(),16);
        assert_eq!(tse_row(0,0,4,4),6);
        assert_eq!(tse_row(0,3,4,4),0);
        assert_eq!(tse_row(3,3,4,4),15);
        assert_eq!(tse_row(1,1,4,4),5);
    }

    #[test]
    fn tse_negates_odd_echoes() {
        let s = session(Trajectory::TurboSpinEcho{echo_train_length:2},8);
        let samples = block(&s,0).samples();
        let p = place(&s,0,&samples).unwrap();
        match (&p[0],&p[1]) {
            (Placement::Row{samples:e0,..},Placement::Row{samples:e1,..}) => {
                assert_eq!(e0[0],samples[s.segment_offset(0)]);
                assert_eq!(e1[0],-samples[s.segment_offset(1)]);
            }
            _=> panic!("tse places rows")
        }
    }

    #[test]
    fn radial_full_is_point_symmetric() {
        let n = 32;
        for step in 0..10 {
            let angle = step as f32*18.0;
            for i in 1..n {
                let (r,c) = radial_cell(angle,i,n,false).unwrap();
                let (r2,c2) = radial_cell(angle,n-i,n,false).unwrap();
                let center = (n/2) as isize;
                assert!(((r as isize - center) + (r2 as isize - center)).abs() <= 1);
                assert!(((c as isize - center) + (c2 as isize - center)).abs() <= 1);
            }
        }
    }

    #[test]
    fn radial_half_rays_start_at_center() {
        assert_eq!(radial_cell(90.0,0,16,true),Some((16,16)));
        assert_eq!(radial_cell(90.0,5,16,true),Some((21,16)));
        assert_eq!(radial_angles(360.0,90.0),vec![0.0,90.0,180.0,270.0]);
    }

    #[test]
    fn mapper_hands_back_each_pass() {
        let mut s = session(Trajectory::CartesianFull,4);
        s.averages = 2;
        let mut mapper = TrajectoryMapper::new(s.clone()).unwrap();
        let mut passes = 0;
        for n in 0..8 {
            if let Some(k) = mapper.place_block(&block(&s,n)).unwrap() {
                assert!(k.is_complete());
                passes += 1;
            }
        }
        assert_eq!(passes,2);
        assert_eq!(mapper.passes_completed(),2);
        assert_eq!(mapper.position(),0);
    }

    #[test]
    fn slab_steps_fill_planes() {
        let s = session(Trajectory::Slab3d{phase_steps:3,inner:SlabInner::Cartesian},4);
        let mut mapper = TrajectoryMapper::new(s.clone()).unwrap();
        let mut done = None;
        for n in 0..12 {
            done = mapper.place_block(&block(&s,n)).unwrap();
        }
        let k = done.unwrap();
        assert_eq!(k.dim(),(3,4,4));
        assert_eq!(k.data()[[2,1,0]].re,9.0);
    }

    #[test]
    fn short_block_is_reported() {
        let s = session(Trajectory::CartesianFull,4);
        let tiny = RawSampleBlock::from_samples(&[Complex32::new(0.0,0.0);3],0);
        let mut mapper = TrajectoryMapper::new(s).unwrap();
        assert!(matches!(mapper.place_block(&tiny),Err(KSpaceError::ShortBlock{..})));
    }
}
