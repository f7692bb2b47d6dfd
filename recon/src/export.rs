//! Writes reconstructed images, k-space and spectra to disk according to the export settings.
use std::path::{Path, PathBuf};
use log::info;
use ndarray::{Array1, Array2, Axis};
use mr_data::cfl;
use mr_data::error::ExportError;
use mr_data::kspace::KSpace;
use mr_data::session::AcquisitionSession;
use utils::ConfigFile;
use crate::engine::{ReconstructedImage, ReconstructionEngine};
use crate::error::RunError;
use crate::recon_config::{Config, ReconSettings, ExportSettings};

fn named(base:&Path,suffix:&str) -> PathBuf {
    let stem = base.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    base.with_file_name(format!("{}_{}",stem,suffix))
}

/// Files are named `<base>_kspace`, `<base>_image`, `<base>_mag`, and per plane
/// `<base>_mag_<m>.txt` and `<base>_kmag_<m>.txt`.
pub fn write_outputs(base:&Path,kspace:Option<&KSpace>,image:&ReconstructedImage,settings:&ExportSettings) -> Result<Vec<PathBuf>,ExportError> {
    let mut written = vec![];
    if settings.cfl {
        if let Some(k) = kspace {
            let p = named(base,"kspace");
            cfl::write_cfl_vol(k.data(),&p)?;
            written.push(p.with_extension("cfl"));
        }
        let p = named(base,"image");
        cfl::write_cfl_vol(&image.complex,&p)?;
        written.push(p.with_extension("cfl"));
    }
    if settings.nifti {
        let p = named(base,"mag");
        cfl::to_nifti(&image.magnitude,&p)?;
        written.push(p.with_extension("nii"));
    }
    if settings.text {
        let m_numbers = utils::m_number_formatter(image.magnitude.len_of(Axis(0)));
        for (plane,m) in image.magnitude.outer_iter().zip(&m_numbers) {
            let p = named(base,&format!("mag_{}",m)).with_extension("txt");
            cfl::write_text_plane(&plane,&p)?;
            written.push(p);
        }
        if let Some(k) = kspace {
            let planes = k.dim().0;
            for (i,m) in utils::m_number_formatter(planes).iter().enumerate() {
                let p = named(base,&format!("kmag_{}",m)).with_extension("txt");
                cfl::write_text_plane(&cfl::complex_slice_to_magnitude(&k.plane(i)).view(),&p)?;
                written.push(p);
            }
        }
    }
    written.iter().for_each(|p| info!("wrote {:?}",p));
    Ok(written)
}

/// Two columns per line: frequency offset in Hz and magnitude.
pub fn write_spectrum(base:&Path,frequency_hz:&Array1<f64>,spectrum:&Array1<f32>) -> Result<PathBuf,ExportError> {
    if frequency_hz.len() != spectrum.len() {
        return Err(ExportError::Shape(vec![frequency_hz.len(),spectrum.len()]))
    }
    let table = Array2::from_shape_fn((spectrum.len(),2),|(i,col)| match col {
        0 => frequency_hz[i] as f32,
        _=> spectrum[i],
    });
    let p = named(base,"spectrum").with_extension("txt");
    cfl::write_text_plane(&table.view(),&p)?;
    info!("wrote {:?}",p);
    Ok(p)
}

/// Reconstruct a k-space cfl saved by an earlier acquisition and write its outputs.
pub fn reconstruct_saved(kspace:&Path,session:&Path,settings:Option<&Path>,output:&Path) -> Result<Vec<PathBuf>,RunError> {
    let session = AcquisitionSession::from_file(session)?;
    let settings = match settings {
        Some(p) => ReconSettings::from_file(p)?,
        None => Config::default(),
    };
    let kspace = KSpace::from_array(cfl::read_cfl_vol(kspace)?);
    info!("loaded k-space {:?}",kspace.dim());
    let engine = ReconstructionEngine::new(settings);
    let img = engine.reconstruct(&session,&kspace)?;
    Ok(write_outputs(output,None,&img,&engine.settings().export)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use num_complex::Complex32;
    use mr_data::session::Trajectory;
    use utils::ConfigError;

    fn scratch(name:&str) -> PathBuf {
        let dir = std::env::temp_dir().join("recon_export_tests").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn text_export_writes_one_file_per_plane() {
        let dir = scratch("planes");
        let img = ReconstructedImage::from_complex(Array3::from_elem((3,2,2),Complex32::new(0.0,1.0)));
        let settings = ExportSettings{cfl:true,nifti:false,text:true};
        let written = write_outputs(&dir.join("scan"),None,&img,&settings).unwrap();
        assert_eq!(written.len(),4);
        assert!(dir.join("scan_image.hdr").exists());
        assert_eq!(std::fs::read_to_string(dir.join("scan_mag_m2.txt")).unwrap(),"1 1\n1 1\n");
    }

    #[test]
    fn kspace_magnitude_planes_are_written_with_text() {
        let dir = scratch("kspace_text");
        let img = ReconstructedImage::from_complex(Array3::zeros((1,2,2)));
        let k = KSpace::from_array(Array3::from_elem((1,2,2),Complex32::new(3.0,4.0)));
        let settings = ExportSettings{cfl:false,nifti:false,text:true};
        let written = write_outputs(&dir.join("scan"),Some(&k),&img,&settings).unwrap();
        assert_eq!(written.len(),2);
        assert_eq!(std::fs::read_to_string(dir.join("scan_kmag_m0.txt")).unwrap(),"5 5\n5 5\n");
    }

    #[test]
    fn spectrum_is_written_as_two_columns() {
        let dir = scratch("spectrum");
        let p = write_spectrum(&dir.join("fid"),&Array1::from(vec![-1.0,0.0,1.0]),&Array1::from(vec![0.5,2.0,0.5])).unwrap();
        assert_eq!(std::fs::read_to_string(p).unwrap(),"-1 0.5\n0 2\n1 0.5\n");
        assert!(write_spectrum(&dir.join("bad"),&Array1::zeros(2),&Array1::zeros(3)).is_err());
    }

    #[test]
    fn saved_kspace_reconstructs_offline() {
        let dir = scratch("offline");
        let session = AcquisitionSession::new(Trajectory::CartesianFull,8);
        session.to_file(&dir.join("scan")).unwrap();
        let k = Array3::from_elem((1,8,8),Complex32::new(1.0,0.0));
        cfl::write_cfl_vol(&k,&dir.join("scan_kspace")).unwrap();
        let written = reconstruct_saved(&dir.join("scan_kspace"),&dir.join("scan"),None,&dir.join("out")).unwrap();
        assert!(written.contains(&dir.join("out_image.cfl")));
    }

    #[test]
    fn missing_session_is_a_typed_error() {
        let dir = scratch("missing");
        let r = reconstruct_saved(&dir.join("none_kspace"),&dir.join("none"),None,&dir.join("out"));
        assert!(matches!(r,Err(RunError::Config(ConfigError::Io{..}))));
    }
}
