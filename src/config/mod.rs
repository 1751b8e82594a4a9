//! JSON configuration of the demo binaries.
//!
//! - [`lane`] – `lane_demo`: input sequence, tracker parameters, outputs.
//! - [`mask`] – `mask_demo`: one frame through the mask and rectify stages.

pub mod lane;
pub mod mask;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
