use std::path::Path;
use serde::{Deserialize, Serialize};
use utils::{ConfigError, ConfigFile};
pub use utils::Config;
use crate::filter::CutShape;

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct FermiSettings {
    pub w1:f32,
    pub w2:f32,
}

/// Center and edge cuts may be used together.
#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct CutSettings {
    pub shape:CutShape,
    pub center_percent:Option<f32>,
    pub outside_percent:Option<f32>,
}

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct ExportSettings {
    pub cfl:bool,
    pub nifti:bool,
    pub text:bool,
}

/// How k-space is prepared, transformed and written out.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct ReconSettings {
    /// overrides the session's crop center fraction when set
    pub center_fraction:Option<f32>,
    /// zero half of every n readout samples
    pub undersample_readout:Option<usize>,
    /// zero half of every n phase encodes
    pub undersample_phase:Option<usize>,
    pub fermi:Option<FermiSettings>,
    pub cut:Option<CutSettings>,
    pub export:ExportSettings,
    /// receiver bandwidth the spectrum spans
    #[serde(default = "default_frequency_range")]
    pub frequency_range_hz:f64,
}

fn default_frequency_range() -> f64 {
    250000.0
}

impl Config for ReconSettings {
    fn default() -> Self {
        Self {
            center_fraction:None,
            undersample_readout:None,
            undersample_phase:None,
            fermi:None,
            cut:None,
            export:ExportSettings{cfl:true,nifti:true,text:false},
            frequency_range_hz:default_frequency_range(),
        }
    }
}

impl ConfigFile for ReconSettings {
    fn to_file(&self, filename:&Path) -> Result<(),ConfigError> {
        utils::toml_to_file(self,filename,&Self::file_ext())
    }
    fn from_file(filename:&Path) -> Result<Self,ConfigError> {
        utils::toml_from_file(filename,&Self::file_ext())
    }
    fn file_ext() -> String {
        String::from("recon_settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_toml() {
        let mut s:ReconSettings = Config::default();
        s.center_fraction = Some(0.98);
        s.fermi = Some(FermiSettings{w1:0.15,w2:0.75});
        s.cut = Some(CutSettings{shape:CutShape::Rectangle,center_percent:Some(10.0),outside_percent:Some(60.0)});
        let t = toml::to_string_pretty(&s).unwrap();
        let back:ReconSettings = toml::from_str(&t).unwrap();
        assert_eq!(s,back);
    }

    #[test]
    fn partial_file_is_readable() {
        let t = "[export]\ncfl = false\nnifti = true\ntext = true\n";
        let s:ReconSettings = toml::from_str(t).unwrap();
        assert!(s.fermi.is_none());
        assert!(s.export.text);
        assert_eq!(s.frequency_range_hz,250000.0);
    }
}
