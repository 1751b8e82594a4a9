use crate::LaneParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Per-frame `FrameRecord`s as one JSON array.
    pub records_json: Option<PathBuf>,
    /// Frames with the lane overlay blended in, one PNG per frame.
    pub overlay_dir: Option<PathBuf>,
    /// Frame-space and bird's-eye masks, one PNG pair per frame.
    pub debug_dir: Option<PathBuf>,
    /// Add the window pixels of each side to the records.
    pub include_points: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Image file or directory of frames.
    pub input: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub max_frames: Option<usize>,
    #[serde(default)]
    pub params: LaneParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    super::read_json(path)
}
