//! Pulls sample bytes off a non-blocking reader and feeds them to the scanner
//! until the acquisition completes or the link gives out.
use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use log::trace;
use crate::config::ScannerSettings;
use crate::error::ScanError;
use crate::scanner::{LinkEvent, ScanState, Scanner};

/// Each read is capped at the bytes the current block still needs, so a
/// console that streams faster than we poll never produces surplus.
pub fn receive<R:Read,W:Write>(scanner:&mut Scanner<W>,reader:&mut R,settings:&ScannerSettings) -> Result<ScanState,ScanError> {
    let mut buf = vec![0u8;settings.read_chunk_bytes.max(1)];
    let poll = Duration::from_micros(settings.poll_interval_us);
    let read_timeout = Duration::from_millis(settings.read_timeout_ms);
    let mut last_data = Instant::now();
    loop {
        let want = scanner.bytes_wanted().unwrap_or(buf.len()).clamp(1,buf.len());
        let event = match reader.read(&mut buf[..want]) {
            Ok(0) => LinkEvent::Closed,
            Ok(n) => {
                trace!("read {} of {} bytes",n,want);
                last_data = Instant::now();
                LinkEvent::BytesAvailable(buf[..n].to_vec())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if last_data.elapsed() < read_timeout {
                    thread::sleep(poll);
                    continue
                }
                LinkEvent::Error(format!("no samples for {:?}",read_timeout))
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => LinkEvent::Error(e.to_string()),
        };
        match scanner.handle_event(event)? {
            ScanState::Complete => return Ok(ScanState::Complete),
            ScanState::Acquiring{..} => {}
            state => return Err(ScanError::NotReady{operation:"receive samples",state}),
        }
    }
}
