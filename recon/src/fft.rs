//! Centered, orthonormal FFTs along the axes of a volume.
use ndarray::{Array, Array3, Axis};
use num_complex::Complex32;
use rustfft::{FftDirection, FftPlanner};

/// Transform every lane of `vol` along `axis`. The zero frequency sits at
/// index n/2 on both sides of the transform and each lane is scaled by 1/sqrt(n).
pub fn centered_fft_axis(vol:&mut Array3<Complex32>,axis:usize,direction:FftDirection,planner:&mut FftPlanner<f32>) {
    let n = vol.len_of(Axis(axis));
    if n < 2 {
        return
    }
    let fft = planner.plan_fft(n,direction);
    let scale = 1.0/(n as f32).sqrt();
    vol.lanes_mut(Axis(axis)).into_iter().for_each(|mut line|{
        let mut temp = line.to_vec();
        temp.rotate_left(n/2);
        fft.process(&mut temp);
        temp.iter_mut().for_each(|e| *e *= scale);
        temp.rotate_right(n/2);
        line.assign(&Array::from_vec(temp));
    });
}

pub fn centered_fft(vol:&Array3<Complex32>,axes:&[usize],direction:FftDirection) -> Array3<Complex32> {
    let mut vol = vol.to_owned();
    let mut planner = FftPlanner::<f32>::new();
    axes.iter().for_each(|axis| centered_fft_axis(&mut vol,*axis,direction,&mut planner));
    vol
}

/// image space to k-space
pub fn forward(vol:&Array3<Complex32>,axes:&[usize]) -> Array3<Complex32> {
    centered_fft(vol,axes,FftDirection::Forward)
}

/// k-space to image space
pub fn inverse(vol:&Array3<Complex32>,axes:&[usize]) -> Array3<Complex32> {
    centered_fft(vol,axes,FftDirection::Inverse)
}
