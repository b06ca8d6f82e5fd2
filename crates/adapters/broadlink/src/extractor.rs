use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use irhub_app::ports::CodeExtractor;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BroadlinkError;
use crate::mac::normalize_mac;

#[derive(Debug, Default, Deserialize)]
struct CodesFile {
    #[serde(default)]
    data: HashMap<String, HashMap<String, Value>>,
}

/// Reads captured codes from the Broadlink integration's storage.
///
/// Only blasters registered with [`BroadlinkExtractor::with_blaster`] are
/// supported, so the registry falls through to the next strategy for the
/// others.
#[derive(Debug, Clone)]
pub struct BroadlinkExtractor {
    storage_dir: PathBuf,
    macs: HashMap<String, String>,
}

impl BroadlinkExtractor {
    #[must_use]
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            macs: HashMap::new(),
        }
    }

    /// Register the MAC address of a Broadlink blaster.
    ///
    /// # Errors
    ///
    /// Returns [`BroadlinkError::InvalidMac`] when `mac` is not a MAC address.
    pub fn with_blaster(
        mut self,
        blaster: impl Into<String>,
        mac: &str,
    ) -> Result<Self, BroadlinkError> {
        self.macs.insert(blaster.into(), normalize_mac(mac)?);
        Ok(self)
    }

    /// Path of the codes file for an already normalized MAC.
    #[must_use]
    pub fn codes_file(&self, mac: &str) -> PathBuf {
        self.storage_dir.join(format!("broadlink_remote_{mac}_codes"))
    }

    async fn read_codes(path: &Path) -> Option<CodesFile> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "could not read broadlink codes file");
                return None;
            }
        };
        serde_json::from_slice(&bytes)
            .inspect_err(|err| {
                tracing::debug!(path = %path.display(), error = %err, "could not parse broadlink codes file");
            })
            .ok()
    }
}

#[async_trait]
impl CodeExtractor for BroadlinkExtractor {
    fn name(&self) -> &'static str {
        "broadlink"
    }

    fn supports(&self, blaster: &str) -> bool {
        self.macs.contains_key(blaster)
    }

    async fn retrieve_learned_code(
        &self,
        blaster: &str,
        device_label: &str,
        command_label: &str,
    ) -> Option<String> {
        let Some(mac) = self.macs.get(blaster) else {
            tracing::debug!(blaster, "no MAC address configured");
            return None;
        };
        let mut codes = Self::read_codes(&self.codes_file(mac)).await?;
        let code = codes
            .data
            .get_mut(device_label)
            .and_then(|commands| commands.remove(command_label))
            .and_then(|code| match code {
                Value::String(code) if !code.is_empty() => Some(code),
                _ => None,
            });
        if code.is_some() {
            tracing::debug!(device_label, command_label, "retrieved code from broadlink storage");
        }
        code
    }
}
