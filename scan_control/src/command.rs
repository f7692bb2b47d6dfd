//! Fixed-width control words understood by the console.
//!
//! Every command is one little-endian 32 bit word except the sequence upload,
//! which is a marker word followed by the compiled program verbatim.
//!
//! ```text
//!  31..28   27..24    23..21   20     19..0
//!  class    selector  unused   sign   magnitude
//! ```
//! Frequency words use bits 0..27 for the integer frequency in Hz.
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use crate::error::CommandError;

pub const WORD_BYTES:usize = 4;

const CLASS_SHIFT:u32 = 28;
const SELECTOR_SHIFT:u32 = 24;
const NIBBLE:u32 = 0xF;
const SIGN_BIT:u32 = 1 << 20;
pub const MAX_MAGNITUDE:u32 = (1 << 20) - 1;
pub const MAX_FREQUENCY_HZ:u32 = (1 << 28) - 1;
pub const MAX_SESSION_ID:u32 = (1 << 28) - 1;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum CommandClass {
    Control,
    Frequency,
    Parameter,
    Upload,
    Realtime,
    Shim,
}

impl CommandClass {
    pub fn id(&self) -> u32 {
        use CommandClass::*;
        match self {
            Control => 0,
            Frequency => 1,
            Parameter => 2,
            Upload => 3,
            Realtime => 4,
            Shim => 5,
        }
    }
    pub fn from_id(id:u32) -> Option<Self> {
        use CommandClass::*;
        match id {
            0 => Some(Control),
            1 => Some(Frequency),
            2 => Some(Parameter),
            3 => Some(Upload),
            4 => Some(Realtime),
            5 => Some(Shim),
            _=> None
        }
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Serialize,Deserialize,clap::ValueEnum)]
pub enum GradientAxis {
    X,
    Y,
    Z,
    Z2,
}

impl GradientAxis {
    /// selector nibble for the gradient offset word. selector 0 is the acquire word.
    pub fn selector(&self) -> u32 {
        use GradientAxis::*;
        match self {
            X => 1,
            Y => 2,
            Z => 3,
            Z2 => 4,
        }
    }
    pub fn from_selector(id:u32) -> Option<Self> {
        use GradientAxis::*;
        match id {
            1 => Some(X),
            2 => Some(Y),
            3 => Some(Z),
            4 => Some(Z2),
            _=> None
        }
    }
}

/// Parameters carried by the acquisition trigger word. Each code is a nibble.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Serialize,Deserialize)]
pub struct AcquireParams {
    pub trajectory_code:u8,
    pub matrix_code:u8,
    pub echo_code:u8,
}

#[derive(Clone,Debug,PartialEq)]
pub enum ControlCommand {
    Stop,
    Start(u32),
    /// Larmor frequency in MHz
    SetFrequency(f64),
    SetGradientChannel{axis:GradientAxis,value:i32},
    SetShim{channel:u8,value:i32},
    Acquire(AcquireParams),
    UploadSequenceMarker,
    UploadSequenceBytes(Vec<u8>),
}

impl ControlCommand {

    /// Bytes to put on the wire for this command.
    pub fn encode(&self) -> Result<Vec<u8>,CommandError> {
        match self {
            ControlCommand::UploadSequenceBytes(payload) => Ok(payload.clone()),
            _=> {
                let mut buf = vec![0;WORD_BYTES];
                LittleEndian::write_u32(&mut buf,self.word()?);
                Ok(buf)
            }
        }
    }

    /// The control word for single-word commands. Upload payloads have no word.
    pub fn word(&self) -> Result<u32,CommandError> {
        use ControlCommand::*;
        match self {
            Stop => Ok(0),
            Start(id) => {
                if *id == 0 {
                    return Err(CommandError::ReservedValue{field:"session id",value:0})
                }
                if *id > MAX_SESSION_ID {
                    return Err(CommandError::EncodingOverflow{field:"session id",value:*id as f64,limit:MAX_SESSION_ID})
                }
                Ok(header(CommandClass::Control,0) | id)
            }
            SetFrequency(mhz) => {
                let hz = (mhz*1E6).round();
                if !hz.is_finite() || hz < 0.0 || hz > MAX_FREQUENCY_HZ as f64 {
                    return Err(CommandError::EncodingOverflow{field:"frequency",value:hz,limit:MAX_FREQUENCY_HZ})
                }
                Ok(header(CommandClass::Frequency,0) | hz as u32)
            }
            SetGradientChannel{axis,value} => {
                Ok(header(CommandClass::Parameter,axis.selector()) | sign_magnitude("gradient offset",*value)?)
            }
            SetShim{channel,value} => {
                let channel = nibble("shim channel",*channel)?;
                Ok(header(CommandClass::Shim,channel) | sign_magnitude("shim",*value)?)
            }
            Acquire(params) => {
                let traj = nibble("trajectory code",params.trajectory_code)?;
                let matrix = nibble("matrix code",params.matrix_code)?;
                let echo = nibble("echo code",params.echo_code)?;
                Ok(header(CommandClass::Parameter,0) | echo << 8 | matrix << 4 | traj)
            }
            UploadSequenceMarker => Ok(header(CommandClass::Upload,0)),
            UploadSequenceBytes(_) => Err(CommandError::ReservedValue{field:"upload payload",value:0}),
        }
    }

    /// Parse a single control word.
    pub fn decode(word:u32) -> Result<ControlCommand,CommandError> {
        let unknown = CommandError::UnknownCommand{word};
        let class = CommandClass::from_id(word >> CLASS_SHIFT).ok_or(unknown.clone())?;
        let selector = (word >> SELECTOR_SHIFT) & NIBBLE;
        match class {
            CommandClass::Control => {
                match word {
                    0 => Ok(ControlCommand::Stop),
                    id => Ok(ControlCommand::Start(id))
                }
            }
            CommandClass::Frequency => {
                let hz = word & MAX_FREQUENCY_HZ;
                Ok(ControlCommand::SetFrequency(hz as f64 / 1E6))
            }
            CommandClass::Parameter => {
                match selector {
                    0 => {
                        if word & 0x00FF_F000 != 0 {
                            return Err(unknown)
                        }
                        Ok(ControlCommand::Acquire(AcquireParams{
                            trajectory_code:(word & NIBBLE) as u8,
                            matrix_code:((word >> 4) & NIBBLE) as u8,
                            echo_code:((word >> 8) & NIBBLE) as u8,
                        }))
                    }
                    s => {
                        let axis = GradientAxis::from_selector(s).ok_or(unknown)?;
                        Ok(ControlCommand::SetGradientChannel{axis,value:signed_value(word)})
                    }
                }
            }
            CommandClass::Upload => {
                match word & !(NIBBLE << CLASS_SHIFT) {
                    0 => Ok(ControlCommand::UploadSequenceMarker),
                    _=> Err(unknown)
                }
            }
            CommandClass::Realtime => Err(unknown),
            CommandClass::Shim => {
                Ok(ControlCommand::SetShim{channel:selector as u8,value:signed_value(word)})
            }
        }
    }

    /// Parse the first word of a little-endian byte slice.
    pub fn decode_bytes(bytes:&[u8]) -> Result<ControlCommand,CommandError> {
        if bytes.len() < WORD_BYTES {
            return Err(CommandError::UnknownCommand{word:0})
        }
        ControlCommand::decode(LittleEndian::read_u32(&bytes[0..WORD_BYTES]))
    }
}

/// Marker word followed by the compiled sequence, untouched.
pub fn encode_sequence_upload(payload:&[u8]) -> Vec<u8> {
    let mut buf = vec![0;WORD_BYTES];
    LittleEndian::write_u32(&mut buf,header(CommandClass::Upload,0));
    buf.extend_from_slice(payload);
    buf
}

fn header(class:CommandClass,selector:u32) -> u32 {
    class.id() << CLASS_SHIFT | (selector & NIBBLE) << SELECTOR_SHIFT
}

fn nibble(field:&'static str,value:u8) -> Result<u32,CommandError> {
    match value as u32 {
        v if v > NIBBLE => Err(CommandError::EncodingOverflow{field,value:value as f64,limit:NIBBLE}),
        v => Ok(v)
    }
}

fn sign_magnitude(field:&'static str,value:i32) -> Result<u32,CommandError> {
    let magnitude = value.unsigned_abs();
    if magnitude > MAX_MAGNITUDE {
        return Err(CommandError::EncodingOverflow{field,value:value as f64,limit:MAX_MAGNITUDE})
    }
    match value < 0 {
        true => Ok(SIGN_BIT | magnitude),
        false => Ok(magnitude)
    }
}

fn signed_value(word:u32) -> i32 {
    let magnitude = (word & MAX_MAGNITUDE) as i32;
    match word & SIGN_BIT {
        0 => magnitude,
        _=> -magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_of(cmd:ControlCommand) -> u32 {
        LittleEndian::read_u32(&cmd.encode().unwrap())
    }

    #[test]
    fn stop_is_the_zero_word() {
        assert_eq!(ControlCommand::Stop.encode().unwrap(),vec![0,0,0,0]);
        assert_eq!(ControlCommand::decode(0).unwrap(),ControlCommand::Stop);
    }

    #[test]
    fn start_carries_session_id() {
        assert_eq!(word_of(ControlCommand::Start(5)),5);
        assert_eq!(ControlCommand::decode(5).unwrap(),ControlCommand::Start(5));
        assert!(matches!(ControlCommand::Start(0).encode(),Err(CommandError::ReservedValue{..})));
    }

    #[test]
    fn frequency_is_integer_hz() {
        let w = word_of(ControlCommand::SetFrequency(11.3));
        assert_eq!(w >> 28,1);
        assert_eq!(w & MAX_FREQUENCY_HZ,11_300_000);
        assert_eq!(ControlCommand::decode(w).unwrap(),ControlCommand::SetFrequency(11.3));
    }

    #[test]
    fn frequency_overflow_is_rejected() {
        let r = ControlCommand::SetFrequency(300.0).encode();
        assert!(matches!(r,Err(CommandError::EncodingOverflow{field:"frequency",..})));
        let r = ControlCommand::SetFrequency(-1.0).encode();
        assert!(matches!(r,Err(CommandError::EncodingOverflow{..})));
    }

    #[test]
    fn gradient_is_sign_magnitude() {
        let w = word_of(ControlCommand::SetGradientChannel{axis:GradientAxis::Y,value:-300});
        assert_eq!(w,2 << 28 | 2 << 24 | 1 << 20 | 300);
        let w = word_of(ControlCommand::SetGradientChannel{axis:GradientAxis::Z2,value:300});
        assert_eq!(w,2 << 28 | 4 << 24 | 300);
        assert_eq!(
            ControlCommand::decode(2 << 28 | 2 << 24 | 1 << 20 | 300).unwrap(),
            ControlCommand::SetGradientChannel{axis:GradientAxis::Y,value:-300}
        );
    }

    #[test]
    fn gradient_magnitude_overflow() {
        let r = ControlCommand::SetGradientChannel{axis:GradientAxis::X,value:1 << 20}.encode();
        assert!(matches!(r,Err(CommandError::EncodingOverflow{limit:MAX_MAGNITUDE,..})));
        let r = ControlCommand::SetGradientChannel{axis:GradientAxis::X,value:-(1 << 20) + 1}.encode();
        assert!(r.is_ok());
    }

    #[test]
    fn shim_uses_its_own_class() {
        let w = word_of(ControlCommand::SetShim{channel:3,value:-12});
        assert_eq!(w,5 << 28 | 3 << 24 | 1 << 20 | 12);
        assert_eq!(ControlCommand::decode(w).unwrap(),ControlCommand::SetShim{channel:3,value:-12});
        assert!(ControlCommand::SetShim{channel:16,value:0}.encode().is_err());
    }

    #[test]
    fn acquire_word_packs_nibbles() {
        let p = AcquireParams{trajectory_code:3,matrix_code:2,echo_code:1};
        let w = word_of(ControlCommand::Acquire(p));
        assert_eq!(w,2 << 28 | 1 << 8 | 2 << 4 | 3);
        assert_eq!(ControlCommand::decode(w).unwrap(),ControlCommand::Acquire(p));
    }

    #[test]
    fn upload_is_marker_then_payload() {
        let payload = vec![0xde,0xad,0xbe,0xef,0x01];
        let bytes = encode_sequence_upload(&payload);
        assert_eq!(&bytes[0..4],&[0,0,0,0x30]);
        assert_eq!(&bytes[4..],&payload[..]);
        assert_eq!(ControlCommand::decode_bytes(&bytes).unwrap(),ControlCommand::UploadSequenceMarker);
    }

    #[test]
    fn unknown_classes_fail_to_decode() {
        assert!(ControlCommand::decode(4 << 28).is_err());
        assert!(ControlCommand::decode(0xF000_0000).is_err());
        assert!(ControlCommand::decode(2 << 28 | 9 << 24).is_err());
    }
}
