//! Spectroscopy and quality figures: FID rows to a magnitude spectrum, and
//! signal to noise estimates for spectra and magnitude images.
use ndarray::{Array1, ArrayView2, Axis};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use crate::error::ReconError;
use crate::fft;

/// reported when noise cannot be estimated
pub const UNDEFINED_SNR:f32 = 0.001;

/// half-widths on either side of the peak excluded from the noise estimate
const NOISE_GUARD:usize = 5;

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct SpectrumAnalytics {
    pub peak:f32,
    pub peak_index:usize,
    pub fwhm_hz:f64,
    pub noise:f32,
    pub snr:f32,
    pub center_frequency_mhz:f64,
    pub inhomogeneity_ppm:f64,
}

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct ImageAnalytics {
    pub signal:f32,
    pub noise:f32,
    pub snr:f32,
}

/// Mean magnitude spectrum of FIDs laid out one per row.
pub fn spectrum_process(fids:&ArrayView2<Complex32>) -> Result<Array1<f32>,ReconError> {
    if fids.is_empty() {
        return Err(ReconError::EmptyData("fid"))
    }
    let spectra = fft::forward(&fids.to_owned().insert_axis(Axis(0)),&[2]);
    spectra.index_axis(Axis(0),0)
        .mapv(|c| c.norm())
        .mean_axis(Axis(0))
        .ok_or(ReconError::EmptyData("fid"))
}

/// offsets in Hz of each spectrum bin, zero at n/2
pub fn frequency_axis(n:usize,range_hz:f64) -> Array1<f64> {
    Array1::linspace(-range_hz/2.0,range_hz/2.0,n)
}

pub fn spectrum_analytics(spectrum:&[f32],frequency_mhz:f64,range_hz:f64) -> Result<SpectrumAnalytics,ReconError> {
    let n = spectrum.len();
    if n == 0 {
        return Err(ReconError::EmptyData("spectrum"))
    }
    let (peak_index,peak) = spectrum.iter().enumerate()
        .fold((0,f32::MIN),|best,(i,v)| if *v > best.1 {(i,*v)} else {best});
    let half = peak/2.0;
    let nearest_half = |bins:std::ops::Range<usize>| {
        bins.min_by(|a,b| (spectrum[*a]-half).abs().total_cmp(&(spectrum[*b]-half).abs()))
    };
    let lower = nearest_half(1..peak_index).unwrap_or(peak_index);
    let upper = nearest_half(peak_index+1..n).unwrap_or(peak_index);

    let hz_per_bin = range_hz/n as f64;
    let fwhm_hz = ((upper - lower) as f64*hz_per_bin).round();

    let noise_below = peak_index.saturating_sub((peak_index - lower)*NOISE_GUARD);
    let noise_above = (peak_index + (upper - peak_index)*NOISE_GUARD).min(n);
    let noise = mean(spectrum[..noise_below].iter().chain(spectrum[noise_above..].iter()));

    let center_frequency_mhz = frequency_mhz + (peak_index as f64 - n as f64/2.0)*hz_per_bin/1E6;
    Ok(SpectrumAnalytics {
        peak,
        peak_index,
        fwhm_hz,
        noise,
        snr:ratio(peak,noise),
        center_frequency_mhz,
        inhomogeneity_ppm:(fwhm_hz/center_frequency_mhz).round(),
    })
}

/// Pixels at or above half the maximum are taken as phantom, the rest as noise.
pub fn image_analytics(magnitude:&ArrayView2<f32>) -> Result<ImageAnalytics,ReconError> {
    if magnitude.is_empty() {
        return Err(ReconError::EmptyData("image"))
    }
    let threshold = magnitude.fold(f32::MIN,|m,v| m.max(*v))/2.0;
    let signal = mean(magnitude.iter().filter(|v| **v >= threshold));
    let noise = mean(magnitude.iter().filter(|v| **v < threshold));
    Ok(ImageAnalytics{signal,noise,snr:ratio(signal,noise)})
}

fn mean<'a>(values:impl Iterator<Item = &'a f32>) -> f32 {
    let (sum,count) = values.fold((0.0f32,0usize),|(s,c),v| (s + v,c + 1));
    match count {
        0 => f32::NAN,
        _=> sum/count as f32,
    }
}

fn ratio(signal:f32,noise:f32) -> f32 {
    match signal/noise {
        r if r.is_nan() => UNDEFINED_SNR,
        r => r,
    }
}
