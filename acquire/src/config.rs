use std::path::Path;
use serde::{Deserialize, Serialize};
use utils::{Config, ConfigError, ConfigFile};

/// How to reach the console and how to poll it.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct ScannerSettings {
    pub address:String,
    /// id sent with the start word when no session is configured
    pub app_id:u32,
    pub write_timeout_ms:u64,
    pub read_chunk_bytes:usize,
    pub poll_interval_us:u64,
    /// give up on an acquisition when no bytes arrive for this long
    pub read_timeout_ms:u64,
}

impl Config for ScannerSettings {
    fn default() -> Self {
        Self {
            address:String::from("192.168.1.101:1001"),
            app_id:5,
            write_timeout_ms:5000,
            read_chunk_bytes:65536,
            poll_interval_us:100,
            read_timeout_ms:30000,
        }
    }
}

impl ConfigFile for ScannerSettings {
    fn to_file(&self, filename:&Path) -> Result<(),ConfigError> {
        utils::toml_to_file(self,filename,&Self::file_ext())
    }
    fn from_file(filename:&Path) -> Result<Self,ConfigError> {
        utils::toml_from_file(filename,&Self::file_ext())
    }
    fn file_ext() -> String {
        String::from("scanner_settings")
    }
}
