//! Export of k-space and images: BART cfl/hdr pairs, NIfTI magnitude volumes
//! and delimited text planes.
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array2, Array3, ArrayView2};
use nifti::writer::WriterOptions;
use num_complex::Complex32;
use crate::error::ExportError;

fn io_err(path:&Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io{path:path.to_owned(),source}
}

fn cfl_base_decode(cfl_base:&Path) -> (PathBuf,PathBuf) {
    (cfl_base.with_extension("hdr"),cfl_base.with_extension("cfl"))
}

/// dims are written fastest-first, as bart expects
pub fn write_cfl_header(shape:&[usize],cfl_base:&Path) -> Result<(),ExportError> {
    let (hdr,_) = cfl_base_decode(cfl_base);
    let dims:Vec<usize> = shape.iter().rev().copied().collect();
    let hdr_str = format!("# Dimensions\n{} 1 1\n",utils::vec_to_string(&dims));
    File::create(&hdr).and_then(|mut f| f.write_all(hdr_str.as_bytes())).map_err(io_err(&hdr))
}

pub fn write_cfl_vol(vol:&Array3<Complex32>,cfl_base:&Path) -> Result<(),ExportError> {
    let (_,cfl) = cfl_base_decode(cfl_base);
    let flat = complex_vol_to_vec(vol);
    let mut byte_buff:Vec<u8> = vec![0;flat.len()*4];
    LittleEndian::write_f32_into(&flat,&mut byte_buff);
    File::create(&cfl).and_then(|mut f| f.write_all(&byte_buff)).map_err(io_err(&cfl))?;
    write_cfl_header(vol.shape(),cfl_base)
}

pub fn read_cfl_vol(cfl_base:&Path) -> Result<Array3<Complex32>,ExportError> {
    let (hdr,cfl) = cfl_base_decode(cfl_base);
    let mut s = String::new();
    File::open(&hdr).and_then(|mut f| f.read_to_string(&mut s)).map_err(io_err(&hdr))?;
    let dims:Vec<usize> = s.lines()
        .skip_while(|line| !line.starts_with("# Dimensions"))
        .nth(1)
        .map(|line| line.split_whitespace().flat_map(|d| d.parse()).collect())
        .unwrap_or_default();
    if dims.len() < 3 {
        return Err(ExportError::Shape(dims))
    }
    let mut bytes = vec![];
    File::open(&cfl).and_then(|mut f| f.read_to_end(&mut bytes)).map_err(io_err(&cfl))?;
    let mut flat = vec![0f32;bytes.len()/4];
    LittleEndian::read_f32_into(&bytes[0..flat.len()*4],&mut flat);
    let samples:Vec<Complex32> = flat.chunks_exact(2).map(|p| Complex32::new(p[0],p[1])).collect();
    Array3::from_shape_vec((dims[2],dims[1],dims[0]),samples).map_err(|_| ExportError::Shape(dims))
}

fn complex_vol_to_vec(vol:&Array3<Complex32>) -> Vec<f32> {
    let mut cfl_flat:Vec<f32> = Vec::with_capacity(vol.len()*2);
    vol.iter().for_each(|c_val|{
        cfl_flat.push(c_val.re);
        cfl_flat.push(c_val.im);
    });
    cfl_flat
}

pub fn complex_vol_to_magnitude(vol:&Array3<Complex32>) -> Array3<f32> {
    vol.mapv(|complex_number| complex_number.norm())
}

pub fn complex_slice_to_magnitude(slice:&ArrayView2<Complex32>) -> Array2<f32> {
    slice.mapv(|complex_number| complex_number.norm())
}

/// magnitude volume as NIfTI
pub fn to_nifti(mag_vol:&Array3<f32>,nifti_base:&Path) -> Result<(),ExportError> {
    let nii = WriterOptions::new(nifti_base.with_extension("nii"));
    nii.write_nifti(mag_vol)?;
    Ok(())
}

/// One value written per cell of a delimited text plane.
pub trait TextCell {
    fn to_cell(&self) -> String;
}

impl TextCell for f32 {
    fn to_cell(&self) -> String {
        format!("{}",self)
    }
}

impl TextCell for Complex32 {
    fn to_cell(&self) -> String {
        match self.im.is_sign_negative() {
            true => format!("{}{}j",self.re,self.im),
            false => format!("{}+{}j",self.re,self.im),
        }
    }
}

/// one row per line, space delimited
pub fn write_text_plane<T:TextCell>(plane:&ArrayView2<T>,path:&Path) -> Result<(),ExportError> {
    let lines:Vec<String> = plane.rows().into_iter().map(|row|{
        let cells:Vec<String> = row.iter().map(|v| v.to_cell()).collect();
        utils::vec_to_string(&cells)
    }).collect();
    let mut text = lines.join("\n");
    text.push('\n');
    File::create(path).and_then(|mut f| f.write_all(text.as_bytes())).map_err(io_err(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn scratch(name:&str) -> PathBuf {
        let d = std::env::temp_dir().join("mr_data_cfl_tests");
        std::fs::create_dir_all(&d).unwrap();
        d.join(name)
    }

    #[test]
    fn cfl_header_is_fastest_first() {
        let vol = Array3::<Complex32>::zeros((2,3,4));
        let base = scratch("hdr_order");
        write_cfl_vol(&vol,&base).unwrap();
        let hdr = std::fs::read_to_string(base.with_extension("hdr")).unwrap();
        assert_eq!(hdr,"# Dimensions\n4 3 2 1 1\n");
        assert_eq!(std::fs::metadata(base.with_extension("cfl")).unwrap().len(),2*3*4*8);
    }

    #[test]
    fn cfl_reads_back() {
        let vol = Array3::from_shape_fn((2,3,4),|(p,r,c)| Complex32::new(p as f32,(r*4+c) as f32));
        let base = scratch("read_back");
        write_cfl_vol(&vol,&base).unwrap();
        assert_eq!(read_cfl_vol(&base).unwrap(),vol);
    }

    #[test]
    fn text_plane_rows_are_lines() {
        let plane = Array2::from_shape_fn((2,2),|(r,c)| Complex32::new(r as f32,0.0 - c as f32));
        let p = scratch("plane.txt");
        write_text_plane(&plane.view(),&p).unwrap();
        let text = std::fs::read_to_string(&p).unwrap();
        assert_eq!(text,"0+0j 0-1j\n1+0j 1-1j\n");
    }

    #[test]
    fn magnitude_of_slice() {
        let vol = Array3::from_elem((1,2,2),Complex32::new(3.0,4.0));
        let mag = complex_slice_to_magnitude(&vol.slice(s![0,..,..]));
        assert!(mag.iter().all(|m| (*m-5.0).abs() < 1E-6));
    }
}
