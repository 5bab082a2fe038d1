//! In-memory action archives.
//!
//! Artifacts are zip files. An archive is loaded fully into memory, its entry
//! point rewritten for the target runtime, then re-serialized with deflate and
//! base64-encoded for transport.

use crate::error::DeployError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArchive {
    entries: Vec<(String, Vec<u8>)>,
}

impl ActionArchive {
    pub fn read(path: &Path) -> Result<Self, DeployError> {
        let bytes = std::fs::read(path).map_err(|e| {
            DeployError::packaging(format!(
                "Unable to read artifact {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_bytes(&bytes).map_err(|e| {
            DeployError::packaging(format!("Invalid artifact {}: {}", path.display(), e))
        })
    }

    /// Parses a zip archive. Directory entries are dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeployError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).map_err(packaging_error)?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip.by_index(index).map_err(packaging_error)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(packaging_error)?;
            entries.push((file.name().to_string(), data));
        }
        Ok(Self { entries })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(entry, _)| entry == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Adds an entry, replacing one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        self.entries.retain(|(entry, _)| *entry != name);
        self.entries.push((name, data));
    }

    /// Moves entry `from` to `to`.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), DeployError> {
        let position = self
            .entries
            .iter()
            .position(|(entry, _)| entry == from)
            .ok_or_else(|| {
                DeployError::packaging(format!("Function handler ({}) does not exist.", from))
            })?;
        let (_, data) = self.entries.remove(position);
        self.insert(to, data);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DeployError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9));
        for (name, data) in &self.entries {
            writer
                .start_file(name.as_str(), options)
                .map_err(packaging_error)?;
            writer.write_all(data).map_err(packaging_error)?;
        }
        let cursor = writer.finish().map_err(packaging_error)?;
        Ok(cursor.into_inner())
    }

    /// Base64 of the serialized archive, as the platform expects in `exec.code`.
    pub fn encode(&self) -> Result<String, DeployError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }
}

fn packaging_error(err: impl std::fmt::Display) -> DeployError {
    DeployError::packaging(format!("Unable to process action archive: {}", err))
}
