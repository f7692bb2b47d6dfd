//! k-space masks applied before the transform.
use ndarray::{s, Array3, Axis};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutShape {
    Circle,
    Rectangle,
}

/// Zero the first half of every `period` lanes along `axis`, as if those
/// lines had never been acquired.
pub fn undersample(vol:&mut Array3<Complex32>,axis:usize,period:usize) {
    if period < 2 {
        return
    }
    vol.axis_iter_mut(Axis(axis)).enumerate()
        .filter(|(i,_)| i % period < period/2)
        .for_each(|(_,mut lane)| lane.fill(Complex32::new(0.0,0.0)));
}

/// Zero the in-plane center, the periphery, or both. `center` is the radius
/// (or half width) of the central cut and `outside` the depth of the edge cut,
/// each in percent of half the readout width.
pub fn cut(vol:&mut Array3<Complex32>,shape:CutShape,center:Option<f32>,outside:Option<f32>) {
    let (_,rows,cols) = vol.dim();
    if rows == 0 || cols == 0 {
        return
    }
    let zero = Complex32::new(0.0,0.0);
    match shape {
        CutShape::Circle => {
            let half = cols as f32/2.0;
            let inner = center.map(|p| half*p/100.0);
            let outer = outside.map(|p| half*(1.0 - p/100.0));
            vol.indexed_iter_mut().for_each(|((_,r,c),sample)|{
                // rows are stretched onto the readout scale
                let dr = r as f32*cols as f32/rows as f32 - half;
                let dc = c as f32 - half;
                let radius = (dr*dr + dc*dc).sqrt();
                let in_center = inner.map_or(false,|cut| radius <= cut);
                let in_edge = outer.map_or(false,|cut| radius >= cut);
                if in_center || in_edge {
                    *sample = zero;
                }
            });
        }
        CutShape::Rectangle => {
            let extent = |n:usize,p:f32| (n as f32/2.0*p/100.0) as usize;
            if let Some(p) = center {
                let (cr,cc) = (extent(rows,p),extent(cols,p));
                vol.slice_mut(s![..,(rows/2).saturating_sub(cr)..(rows/2+cr).min(rows),(cols/2).saturating_sub(cc)..(cols/2+cc).min(cols)])
                    .fill(zero);
            }
            if let Some(p) = outside {
                let (er,ec) = (extent(rows,p).min(rows),extent(cols,p).min(cols));
                vol.slice_mut(s![..,..er,..]).fill(zero);
                vol.slice_mut(s![..,rows-er..,..]).fill(zero);
                vol.slice_mut(s![..,..,..ec]).fill(zero);
                vol.slice_mut(s![..,..,cols-ec..]).fill(zero);
            }
        }
    }
}

/// Fermi apodization centered on the middle of the volume. `w1` sets the roll-off
/// width and `w2` the radius, both as fractions of the largest dimension.
pub fn fermi_filter(vol:&mut Array3<Complex32>,w1:f32,w2:f32) {
    let (dx,dy,dz) = vol.dim();
    let max_dim = dx.max(dy).max(dz) as f32;
    let fermi_t = max_dim*w1/2.0;
    let fermi_u = max_dim*w2/2.0;
    // keeps the coefficients at or below 1
    let norm_factor = 1.0+(-fermi_u/fermi_t).exp();

    let x_n = (dx as f32/max_dim).powi(2);
    let y_n = (dy as f32/max_dim).powi(2);
    let z_n = (dz as f32/max_dim).powi(2);

    vol.indexed_iter_mut().for_each(|((x_i,y_i,z_i),sample)|{
        let x_c_sq = ((x_i as f32) - (dx/2) as f32).powi(2);
        let y_c_sq = ((y_i as f32) - (dy/2) as f32).powi(2);
        let z_c_sq = ((z_i as f32) - (dz/2) as f32).powi(2);
        let k_radius = (x_c_sq/x_n + y_c_sq/y_n + z_c_sq/z_n).sqrt();
        let filt_param = (k_radius - fermi_u)/fermi_t;
        let coeff = 1.0/(1.0 + filt_param.exp());
        *sample *= coeff*norm_factor;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(shape:(usize,usize,usize)) -> Array3<Complex32> {
        Array3::from_elem(shape,Complex32::new(1.0,0.0))
    }

    #[test]
    fn undersampling_zeroes_first_half_of_each_period() {
        let mut k = ones((1,4,8));
        undersample(&mut k,2,4);
        let row:Vec<f32> = k.iter().take(8).map(|c| c.re).collect();
        assert_eq!(row,vec![0.0,0.0,1.0,1.0,0.0,0.0,1.0,1.0]);
    }

    fn zeros(k:&Array3<Complex32>) -> usize {
        k.iter().filter(|c| c.re == 0.0).count()
    }

    #[test]
    fn circular_cuts_follow_radius() {
        let mut center = ones((1,16,16));
        cut(&mut center,CutShape::Circle,Some(25.0),None);
        // radius 2 around (8,8)
        assert_eq!(center[[0,8,8]].re,0.0);
        assert_eq!(center[[0,8,10]].re,0.0);
        assert_eq!(center[[0,8,11]].re,1.0);
        assert_eq!(center[[0,0,0]].re,1.0);

        let mut edge = ones((1,16,16));
        cut(&mut edge,CutShape::Circle,None,Some(25.0));
        // everything from radius 6 outward
        assert_eq!(edge[[0,8,8]].re,1.0);
        assert_eq!(edge[[0,8,13]].re,1.0);
        assert_eq!(edge[[0,8,14]].re,0.0);
        assert_eq!(edge[[0,0,0]].re,0.0);
    }

    #[test]
    fn center_and_edge_cuts_combine() {
        let mut k = ones((1,16,16));
        cut(&mut k,CutShape::Circle,Some(25.0),Some(25.0));
        assert_eq!(k[[0,8,8]].re,0.0);
        assert_eq!(k[[0,8,12]].re,1.0);
        assert_eq!(k[[0,8,15]].re,0.0);

        let mut rect = ones((2,16,16));
        cut(&mut rect,CutShape::Rectangle,Some(25.0),Some(25.0));
        // 4x4 center block plus a two sample border, in each plane
        assert_eq!(zeros(&rect),2*(16 + 256 - 144));
        assert_eq!(rect[[1,7,7]].re,0.0);
        assert_eq!(rect[[1,5,8]].re,1.0);
        assert_eq!(rect[[1,1,8]].re,0.0);
        assert_eq!(rect[[1,2,2]].re,1.0);
    }

    #[test]
    fn no_cut_percentages_leave_kspace_alone() {
        let mut k = ones((1,8,8));
        cut(&mut k,CutShape::Rectangle,None,None);
        cut(&mut k,CutShape::Circle,None,None);
        assert_eq!(zeros(&k),0);
    }

    #[test]
    fn fermi_filter_passes_center_and_damps_edges() {
        let mut k = ones((1,64,64));
        fermi_filter(&mut k,0.15,0.75);
        assert!((k[[0,32,32]].re - 1.0).abs() < 1E-3);
        assert!(k[[0,0,0]].re < 0.05);
        assert!(k.iter().all(|c| c.re <= 1.0 + 1E-6));
    }
}
