use crate::mask::MaskOptions;
use crate::rectify::RectifyOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct MaskToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub mask: MaskOptions,
    #[serde(default)]
    pub rectify: RectifyOptions,
    pub output: MaskOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct MaskOutputConfig {
    pub mask_image: PathBuf,
    #[serde(default)]
    pub birdseye_image: Option<PathBuf>,
    #[serde(default)]
    pub summary_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<MaskToolConfig, String> {
    super::read_json(path)
}
