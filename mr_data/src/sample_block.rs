use byteorder::{ByteOrder, LittleEndian};
use num_complex::Complex32;
use crate::error::KSpaceError;
use crate::session::SAMPLE_BYTES;

/// One repetition worth of receiver samples as it came off the wire:
/// interleaved little-endian f32 (re, im) pairs.
#[derive(Clone,Debug,PartialEq)]
pub struct RawSampleBlock {
    bytes:Vec<u8>,
    sequence:usize,
}

impl RawSampleBlock {
    pub fn from_bytes(bytes:Vec<u8>,sequence:usize) -> Result<Self,KSpaceError> {
        if bytes.len() % SAMPLE_BYTES != 0 {
            return Err(KSpaceError::RaggedBlock(bytes.len()))
        }
        Ok(Self{bytes,sequence})
    }

    pub(crate) fn from_raw(bytes:Vec<u8>,sequence:usize) -> Self {
        Self{bytes,sequence}
    }

    pub fn from_samples(samples:&[Complex32],sequence:usize) -> Self {
        let mut flat = Vec::<f32>::with_capacity(samples.len()*2);
        samples.iter().for_each(|s| {
            flat.push(s.re);
            flat.push(s.im);
        });
        let mut bytes = vec![0;flat.len()*4];
        LittleEndian::write_f32_into(&flat,&mut bytes);
        Self{bytes,sequence}
    }

    /// arrival order of this block since the assembler was last reset
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn n_samples(&self) -> usize {
        self.bytes.len()/SAMPLE_BYTES
    }

    pub fn samples(&self) -> Vec<Complex32> {
        let mut flat = vec![0f32;self.bytes.len()/4];
        LittleEndian::read_f32_into(&self.bytes,&mut flat);
        flat.chunks_exact(2).map(|pair| Complex32::new(pair[0],pair[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_little_endian_pairs() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.0f32).to_le_bytes());
        bytes.extend_from_slice(&0.25f32.to_le_bytes());
        bytes.extend_from_slice(&4.0f32.to_le_bytes());
        let b = RawSampleBlock::from_bytes(bytes,0).unwrap();
        assert_eq!(b.samples(),vec![Complex32::new(1.5,-2.0),Complex32::new(0.25,4.0)]);
        assert_eq!(RawSampleBlock::from_samples(&b.samples(),0).as_bytes(),b.as_bytes());
    }

    #[test]
    fn ragged_blocks_are_refused() {
        assert_eq!(RawSampleBlock::from_bytes(vec![0;12],0),Err(KSpaceError::RaggedBlock(12)));
    }
}
