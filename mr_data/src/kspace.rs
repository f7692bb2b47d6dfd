use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2};
use num_complex::Complex32;
use crate::error::KSpaceError;

/// Complex k-space samples shaped (planes, rows, cols). Rows run along the phase
/// encode, cols along the readout. Tracks which rows have been written in the
/// current pass so a row is never silently filled twice.
#[derive(Clone,Debug)]
pub struct KSpace {
    data:Array3<Complex32>,
    filled:Array2<bool>,
    cell_writes:usize,
}

impl KSpace {
    pub fn new(shape:(usize,usize,usize)) -> Self {
        Self {
            data:Array3::zeros(shape),
            filled:Array2::from_elem((shape.0,shape.1),false),
            cell_writes:0,
        }
    }

    pub fn from_array(data:Array3<Complex32>) -> Self {
        let shape = data.dim();
        Self {
            data,
            filled:Array2::from_elem((shape.0,shape.1),true),
            cell_writes:0,
        }
    }

    pub fn dim(&self) -> (usize,usize,usize) {
        self.data.dim()
    }

    pub fn put_row(&mut self,plane:usize,row:usize,samples:&[Complex32]) -> Result<(),KSpaceError> {
        let (planes,rows,cols) = self.dim();
        if plane >= planes || row >= rows {
            return Err(KSpaceError::OutOfBounds{plane,row,col:0})
        }
        if samples.len() != cols {
            return Err(KSpaceError::RowLength{expected:cols,found:samples.len()})
        }
        if self.filled[[plane,row]] {
            return Err(KSpaceError::RowOverwrite{plane,row})
        }
        self.data.slice_mut(s![plane,row,..]).iter_mut().zip(samples).for_each(|(cell,v)| *cell = *v);
        self.filled[[plane,row]] = true;
        Ok(())
    }

    /// Single-cell write for projection trajectories; a later write replaces an earlier one.
    pub fn put_cell(&mut self,plane:usize,row:usize,col:usize,value:Complex32) -> Result<(),KSpaceError> {
        match self.data.get_mut([plane,row,col]) {
            Some(cell) => {
                *cell = value;
                self.cell_writes += 1;
                Ok(())
            }
            None => Err(KSpaceError::OutOfBounds{plane,row,col})
        }
    }

    pub fn is_row_filled(&self,plane:usize,row:usize) -> bool {
        self.filled.get([plane,row]).copied().unwrap_or(false)
    }

    pub fn rows_filled(&self) -> usize {
        self.filled.iter().filter(|f| **f).count()
    }

    /// every row written exactly once
    pub fn is_complete(&self) -> bool {
        self.filled.iter().all(|f| *f)
    }

    pub fn cell_writes(&self) -> usize {
        self.cell_writes
    }

    pub fn row(&self,plane:usize,row:usize) -> ArrayView1<Complex32> {
        self.data.slice(s![plane,row,..])
    }

    pub fn plane(&self,plane:usize) -> ArrayView2<Complex32> {
        self.data.slice(s![plane,..,..])
    }

    pub fn data(&self) -> &Array3<Complex32> {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(Complex32::new(0.0,0.0));
        self.filled.fill(false);
        self.cell_writes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_fill_once() {
        let mut k = KSpace::new((1,2,3));
        let row = [Complex32::new(1.0,0.0);3];
        k.put_row(0,1,&row).unwrap();
        assert!(k.is_row_filled(0,1));
        assert!(!k.is_complete());
        assert_eq!(k.put_row(0,1,&row),Err(KSpaceError::RowOverwrite{plane:0,row:1}));
        k.put_row(0,0,&row).unwrap();
        assert!(k.is_complete());
    }

    #[test]
    fn row_length_and_bounds_are_checked() {
        let mut k = KSpace::new((1,2,3));
        assert!(matches!(k.put_row(0,0,&[Complex32::new(0.0,0.0);2]),Err(KSpaceError::RowLength{..})));
        assert!(matches!(k.put_row(1,0,&[Complex32::new(0.0,0.0);3]),Err(KSpaceError::OutOfBounds{..})));
        assert!(k.put_cell(0,2,0,Complex32::new(1.0,0.0)).is_err());
    }

    #[test]
    fn cells_take_last_write() {
        let mut k = KSpace::new((1,4,4));
        k.put_cell(0,2,2,Complex32::new(1.0,0.0)).unwrap();
        k.put_cell(0,2,2,Complex32::new(2.0,0.0)).unwrap();
        assert_eq!(k.data()[[0,2,2]],Complex32::new(2.0,0.0));
        assert_eq!(k.cell_writes(),2);
        k.clear();
        assert_eq!(k.data()[[0,2,2]],Complex32::new(0.0,0.0));
    }
}
