//! Reassembly of fixed-size sample blocks from a chunked byte stream.
use log::{trace, warn};
use crate::error::StreamDesync;
use crate::sample_block::RawSampleBlock;
use crate::session::{AcquisitionSession, SurplusPolicy, SAMPLE_BYTES};

pub struct SampleStreamAssembler {
    buffer:Vec<u8>,
    offset:usize,
    policy:SurplusPolicy,
    blocks_emitted:usize,
    bytes_discarded:usize,
}

impl SampleStreamAssembler {
    pub fn new(block_samples:usize,policy:SurplusPolicy) -> Self {
        Self {
            buffer:vec![0;block_samples.max(1)*SAMPLE_BYTES],
            offset:0,
            policy,
            blocks_emitted:0,
            bytes_discarded:0,
        }
    }

    pub fn for_session(session:&AcquisitionSession) -> Self {
        Self::new(session.block_samples,session.surplus)
    }

    /// Take the next chunk off the wire. Returns the blocks it completed, in order.
    /// Never blocks; a partial block stays buffered until more bytes arrive.
    pub fn on_bytes_available(&mut self,chunk:&[u8]) -> Result<Vec<RawSampleBlock>,StreamDesync> {
        let mut completed = vec![];
        let mut rest = chunk;
        loop {
            let space = self.buffer.len() - self.offset;
            if rest.len() < space {
                self.buffer[self.offset..self.offset+rest.len()].copy_from_slice(rest);
                self.offset += rest.len();
                trace!("block {} at {} of {} bytes",self.blocks_emitted,self.offset,self.buffer.len());
                return Ok(completed)
            }
            self.buffer[self.offset..].copy_from_slice(&rest[..space]);
            self.offset = 0;
            completed.push(self.emit());
            rest = &rest[space..];
            if rest.is_empty() {
                return Ok(completed)
            }
            match self.policy {
                SurplusPolicy::Carry => continue,
                SurplusPolicy::Discard => {
                    warn!("discarding {} bytes received past the end of block {}",rest.len(),self.blocks_emitted-1);
                    self.bytes_discarded += rest.len();
                    return Ok(completed)
                }
                SurplusPolicy::Reject => {
                    warn!("{} bytes received past the end of block {}",rest.len(),self.blocks_emitted-1);
                    return Err(StreamDesync{surplus:rest.len(),block_bytes:self.buffer.len(),completed})
                }
            }
        }
    }

    fn emit(&mut self) -> RawSampleBlock {
        let block = RawSampleBlock::from_raw(self.buffer.clone(),self.blocks_emitted);
        self.blocks_emitted += 1;
        block
    }

    /// Abandon any partial block.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.blocks_emitted = 0;
        self.bytes_discarded = 0;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn block_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn blocks_emitted(&self) -> usize {
        self.blocks_emitted
    }

    pub fn bytes_discarded(&self) -> usize {
        self.bytes_discarded
    }
}
