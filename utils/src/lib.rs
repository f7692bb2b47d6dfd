use std::path::{Path, PathBuf};
use std::fs::File;
use std::io::{Write, Read};
use glob::glob;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error on {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("cannot parse toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("cannot serialize toml: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings with a documented default value.
pub trait Config {
    fn default() -> Self;
}

/// Settings persisted to disk under a type-specific extension.
pub trait ConfigFile: Sized {
    fn to_file(&self, filename:&Path) -> Result<(),ConfigError>;
    fn from_file(filename:&Path) -> Result<Self,ConfigError>;
    fn file_ext() -> String;
}

pub fn m_number_formatter(n_elements:usize) -> Vec<String>{
    (0..n_elements).map(|index| m_number(index,n_elements)).collect()
}

pub fn m_number(index:usize,n_total:usize) -> String {
    let w = match n_total {
        0 | 1 => 1,
        _ => ((n_total-1) as f32).log10().floor() as usize + 1
    };
    format!("m{:0width$}",index,width=w)
}

pub fn read_to_string(filepath:&Path,extension:&str) -> Result<String,ConfigError> {
    let p = filepath.with_extension(extension);
    let mut s = String::new();
    File::open(&p)
        .and_then(|mut f| f.read_to_string(&mut s))
        .map_err(|source| ConfigError::Io { path: p.clone(), source })?;
    Ok(s)
}

pub fn write_to_file(filepath:&Path,extension:&str,string:&str) -> Result<(),ConfigError> {
    let p = filepath.with_extension(extension);
    File::create(&p)
        .and_then(|mut f| f.write_all(string.as_bytes()))
        .map_err(|source| ConfigError::Io { path: p.clone(), source })
}

pub fn toml_to_file<T:Serialize>(value:&T,filepath:&Path,extension:&str) -> Result<(),ConfigError> {
    let s = toml::to_string_pretty(value)?;
    write_to_file(filepath,extension,&s)
}

pub fn toml_from_file<T:DeserializeOwned>(filepath:&Path,extension:&str) -> Result<T,ConfigError> {
    let s = read_to_string(filepath,extension)?;
    Ok(toml::from_str(&s)?)
}

pub fn json_to_file<T:Serialize>(value:&T,filepath:&Path,extension:&str) -> Result<(),ConfigError> {
    let s = serde_json::to_string_pretty(value)?;
    write_to_file(filepath,extension,&s)
}

pub fn json_from_file<T:DeserializeOwned>(filepath:&Path,extension:&str) -> Result<T,ConfigError> {
    let s = read_to_string(filepath,extension)?;
    Ok(serde_json::from_str(&s)?)
}

pub fn vec_to_string<T>(vec:&[T]) -> String
    where T:std::string::ToString {
    let vstr:Vec<String> = vec.iter().map(|num| num.to_string()).collect();
    vstr.join(" ")
}

pub fn get_first_match(dir:&Path,pattern:&str) -> Option<PathBuf>  {
    let pat = dir.join(pattern);
    let pat = pat.to_str()?;
    glob(pat).ok()?.flat_map(|m| m).next()
}
