//! Outbound half of the console connection.
//!
//! The console socket is polled in non-blocking mode, so a write may report
//! `WouldBlock` while the hardware drains its receive buffer. The link keeps
//! retrying with a short sleep until the whole buffer is accepted or the
//! configured timeout passes.
use std::io::{ErrorKind, Write};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, trace, warn};
use crate::command::{encode_sequence_upload, ControlCommand};
use crate::error::{LinkError, Result};

/// How long a write may stall before the link gives up.
pub const DEFAULT_TIMEOUT:Duration = Duration::from_secs(5);

const CHECK_INTERVAL:Duration = Duration::from_micros(100);

pub struct ControlLink<W:Write> {
    stream:W,
    timeout:Duration,
    bytes_sent:usize,
}

impl<W:Write> ControlLink<W> {
    pub fn new(stream:W) -> Self {
        Self {
            stream,
            timeout:DEFAULT_TIMEOUT,
            bytes_sent:0,
        }
    }

    pub fn with_timeout(stream:W,timeout:Duration) -> Self {
        Self {
            stream,
            timeout,
            bytes_sent:0,
        }
    }

    pub fn send(&mut self,command:&ControlCommand) -> Result<()> {
        let bytes = command.encode()?;
        debug!("sending {:?}",command);
        self.write_bytes(&bytes)
    }

    pub fn upload_sequence(&mut self,payload:&[u8]) -> Result<()> {
        debug!("uploading compiled sequence of {} bytes",payload.len());
        self.write_bytes(&encode_sequence_upload(payload))
    }

    /// Write every byte or fail. Partial writes are continued from where they stopped.
    pub fn write_bytes(&mut self,bytes:&[u8]) -> Result<()> {
        let start = Instant::now();
        let mut written = 0;
        while written < bytes.len() {
            match self.stream.write(&bytes[written..]) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => {
                    written += n;
                    trace!("{} of {} bytes accepted",written,bytes.len());
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    let waited = start.elapsed();
                    if waited >= self.timeout {
                        warn!("console link stalled after {} of {} bytes",written,bytes.len());
                        return Err(LinkError::LinkStalled{written,total:bytes.len(),waited})
                    }
                    thread::sleep(CHECK_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.flush(start)?;
        self.bytes_sent += written;
        Ok(())
    }

    fn flush(&mut self,start:Instant) -> Result<()> {
        loop {
            match self.stream.flush() {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if start.elapsed() >= self.timeout {
                        return Err(LinkError::LinkStalled{written:0,total:0,waited:start.elapsed()})
                    }
                    thread::sleep(CHECK_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.stream
    }
}
