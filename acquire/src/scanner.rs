//! Acquisition lifecycle.
//!
//! ```text
//! Idle -> Connected -> Configured -> Acquiring -> Complete -> (Configured)
//!                  any state -> stop() -> Idle
//!           link failure -> Faulted (stop() + start() to recover)
//! ```
//! The scanner owns the outbound link and is driven from a single thread:
//! user calls on one side, `LinkEvent`s from the transport on the other.
use std::io::Write;
use log::{debug, info, warn};
use mr_data::kspace::KSpace;
use mr_data::session::AcquisitionSession;
use mr_data::stream::SampleStreamAssembler;
use mr_data::trajectory::TrajectoryMapper;
use recon::engine::{Averager, ReconstructedImage, ReconstructionEngine};
use scan_control::command::{AcquireParams, ControlCommand};
use scan_control::link::ControlLink;
use crate::error::ScanError;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum ScanState {
    Idle,
    Connected,
    Configured,
    Acquiring{repetition:usize},
    Complete,
    Faulted,
}

/// What the transport reports about the inbound side of the connection.
#[derive(Clone,Debug,PartialEq)]
pub enum LinkEvent {
    BytesAvailable(Vec<u8>),
    Closed,
    Error(String),
}

/// Per-acquisition machinery, rebuilt whenever the session changes.
struct Pipeline {
    session:AcquisitionSession,
    assembler:SampleStreamAssembler,
    mapper:TrajectoryMapper,
    averager:Averager,
}

impl Pipeline {
    fn new(session:AcquisitionSession) -> Result<Self,ScanError> {
        let mapper = TrajectoryMapper::new(session.clone())?;
        Ok(Self {
            assembler:SampleStreamAssembler::for_session(&session),
            averager:Averager::new(session.averaging),
            mapper,
            session,
        })
    }

    fn reset(&mut self) {
        self.assembler.reset();
        self.mapper.reset();
        self.averager.reset();
    }
}

pub struct Scanner<W:Write> {
    link:ControlLink<W>,
    engine:ReconstructionEngine,
    app_id:u32,
    state:ScanState,
    pipeline:Option<Pipeline>,
    sequence_uploaded:bool,
    listening:bool,
    blocks_received:usize,
    kspace:Option<KSpace>,
    image:Option<ReconstructedImage>,
    fault:Option<String>,
}

impl<W:Write> Scanner<W> {
    pub fn new(link:ControlLink<W>,engine:ReconstructionEngine,app_id:u32) -> Self {
        Self {
            link,
            engine,
            app_id,
            state:ScanState::Idle,
            pipeline:None,
            sequence_uploaded:false,
            listening:false,
            blocks_received:0,
            kspace:None,
            image:None,
            fault:None,
        }
    }

    fn not_ready(&self,operation:&'static str) -> ScanError {
        ScanError::NotReady{operation,state:self.state}
    }

    /// Tell the console to start and begin listening for samples.
    pub fn start(&mut self) -> Result<(),ScanError> {
        if self.state != ScanState::Idle {
            return Err(self.not_ready("start"))
        }
        let id = self.pipeline.as_ref().map(|p| p.session.session_id).unwrap_or(self.app_id);
        self.link.send(&ControlCommand::Start(id))?;
        self.listening = true;
        self.state = match self.pipeline {
            Some(_) => ScanState::Configured,
            None => ScanState::Connected,
        };
        info!("console started with id {}",id);
        Ok(())
    }

    /// Replace the session. Rejected mid-acquisition and after a fault.
    pub fn configure(&mut self,session:AcquisitionSession) -> Result<(),ScanError> {
        match self.state {
            ScanState::Acquiring{..} | ScanState::Faulted => return Err(self.not_ready("configure")),
            _=> {}
        }
        let pipeline = Pipeline::new(session)?;
        debug!(
            "configured {:?}: {} repetitions x {} averages, k-space {:?}",
            pipeline.session.trajectory,pipeline.session.repetitions(),pipeline.session.averages,pipeline.session.kspace_shape()
        );
        self.pipeline = Some(pipeline);
        self.kspace = None;
        self.image = None;
        if self.state != ScanState::Idle {
            self.state = ScanState::Configured;
        }
        Ok(())
    }

    pub fn upload_sequence(&mut self,payload:&[u8]) -> Result<(),ScanError> {
        match self.state {
            ScanState::Connected | ScanState::Configured | ScanState::Complete => {}
            _=> return Err(self.not_ready("upload a sequence")),
        }
        self.link.upload_sequence(payload)?;
        self.sequence_uploaded = true;
        Ok(())
    }

    /// Trigger one acquisition of the configured session.
    pub fn acquire(&mut self) -> Result<(),ScanError> {
        match self.state {
            ScanState::Configured | ScanState::Complete => {}
            _=> return Err(self.not_ready("acquire")),
        }
        if !self.sequence_uploaded {
            return Err(self.not_ready("acquire without an uploaded sequence"))
        }
        let pipeline = self.pipeline.as_mut().ok_or(ScanError::NotReady{operation:"acquire",state:self.state})?;
        if let Some(mhz) = pipeline.session.frequency_mhz {
            self.link.send(&ControlCommand::SetFrequency(mhz))?;
        }
        self.link.send(&ControlCommand::Acquire(acquire_params(&pipeline.session)))?;
        pipeline.reset();
        self.blocks_received = 0;
        self.kspace = None;
        self.image = None;
        self.listening = true;
        self.state = ScanState::Acquiring{repetition:0};
        info!("acquiring {} blocks",pipeline.session.total_blocks());
        Ok(())
    }

    /// Feed one transport event. Blocks are placed in arrival order; the
    /// final block reconstructs the image and completes the acquisition.
    pub fn handle_event(&mut self,event:LinkEvent) -> Result<ScanState,ScanError> {
        if !self.listening {
            debug!("not listening, dropping {:?}",event_kind(&event));
            return Ok(self.state)
        }
        match event {
            LinkEvent::Closed => Err(self.fault(String::from("connection closed by console"))),
            LinkEvent::Error(e) => Err(self.fault(e)),
            LinkEvent::BytesAvailable(chunk) => {
                match self.state {
                    ScanState::Acquiring{..} => {}
                    state => {
                        warn!("{} bytes arrived while {:?}, ignoring",chunk.len(),state);
                        return Ok(state)
                    }
                }
                match self.on_bytes(&chunk) {
                    Ok(state) => Ok(state),
                    Err(e) => {
                        let reason = e.to_string();
                        self.fault(reason);
                        Err(e)
                    }
                }
            }
        }
    }

    fn on_bytes(&mut self,chunk:&[u8]) -> Result<ScanState,ScanError> {
        let pipeline = self.pipeline.as_mut().ok_or(ScanError::NotReady{operation:"receive samples",state:self.state})?;
        let total = pipeline.session.total_blocks();
        let (blocks,desync) = match pipeline.assembler.on_bytes_available(chunk) {
            Ok(blocks) => (blocks,None),
            Err(mut desync) => (std::mem::take(&mut desync.completed),Some(desync)),
        };
        for block in blocks {
            if self.blocks_received >= total {
                warn!("block {} arrived after the acquisition completed",block.sequence());
                continue
            }
            if let Some(kspace) = pipeline.mapper.place_block(&block)? {
                debug!("pass complete with {} rows",kspace.rows_filled());
                pipeline.averager.add_pass(&self.engine,&pipeline.session,&kspace)?;
                self.kspace = Some(kspace);
            }
            self.blocks_received += 1;
            self.state = ScanState::Acquiring{repetition:self.blocks_received};
            if self.blocks_received == total {
                self.image = Some(pipeline.averager.finish(&self.engine,&pipeline.session)?);
                self.state = ScanState::Complete;
                info!("acquisition complete after {} blocks",total);
            }
        }
        match desync {
            Some(desync) => Err(desync.into()),
            None => Ok(self.state),
        }
    }

    fn fault(&mut self,reason:String) -> ScanError {
        warn!("faulted: {}",reason);
        self.state = ScanState::Faulted;
        self.listening = false;
        self.fault = Some(reason.clone());
        ScanError::LinkLost(reason)
    }

    /// Stop the console from any state. Transient buffers are dropped, the
    /// session is kept. The stop word goes out on every call.
    pub fn stop(&mut self) -> Result<(),ScanError> {
        let was = self.state;
        self.listening = false;
        self.sequence_uploaded = false;
        self.blocks_received = 0;
        self.fault = None;
        if let Some(p) = self.pipeline.as_mut() {
            p.reset();
        }
        self.state = ScanState::Idle;
        info!("stopped from {:?}",was);
        self.link.send(&ControlCommand::Stop)?;
        Ok(())
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn session(&self) -> Option<&AcquisitionSession> {
        self.pipeline.as_ref().map(|p| &p.session)
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn sequence_uploaded(&self) -> bool {
        self.sequence_uploaded
    }

    pub fn blocks_received(&self) -> usize {
        self.blocks_received
    }

    /// Bytes of the block currently being assembled.
    pub fn partial_block_bytes(&self) -> usize {
        self.pipeline.as_ref().map(|p| p.assembler.offset()).unwrap_or(0)
    }

    /// Bytes left before the block being assembled is complete, while acquiring.
    /// Reads no larger than this never carry surplus.
    pub fn bytes_wanted(&self) -> Option<usize> {
        match (self.state,self.pipeline.as_ref()) {
            (ScanState::Acquiring{..},Some(p)) => Some(p.assembler.block_bytes() - p.assembler.offset()),
            _=> None,
        }
    }

    /// Surplus bytes dropped since the last acquire.
    pub fn bytes_discarded(&self) -> usize {
        self.pipeline.as_ref().map(|p| p.assembler.bytes_discarded()).unwrap_or(0)
    }

    /// k-space of the most recently completed pass
    pub fn kspace(&self) -> Option<&KSpace> {
        self.kspace.as_ref()
    }

    pub fn image(&self) -> Option<&ReconstructedImage> {
        self.image.as_ref()
    }

    pub fn fault_reason(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn engine(&self) -> &ReconstructionEngine {
        &self.engine
    }

    pub fn link(&self) -> &ControlLink<W> {
        &self.link
    }
}

/// Trajectory, log2 of the phase encode count and echo train length, one nibble each.
pub fn acquire_params(session:&AcquisitionSession) -> AcquireParams {
    AcquireParams {
        trajectory_code:session.trajectory.code(),
        matrix_code:session.phase_encodes.max(1).ilog2().min(15) as u8,
        echo_code:session.trajectory.segments_per_block().min(15) as u8,
    }
}

fn event_kind(event:&LinkEvent) -> String {
    match event {
        LinkEvent::BytesAvailable(b) => format!("{} bytes",b.len()),
        LinkEvent::Closed => String::from("close"),
        LinkEvent::Error(e) => format!("error {}",e),
    }
}
