//! Frame sources feeding the tracker.
//!
//! Acquisition sits outside the tracking core; a source only has to hand out
//! frames in order and report the end of the stream with `Ok(None)`.
use crate::error::{LaneError, Result};
use crate::image::io::load_frame;
use crate::image::{ChannelOrder, ColorImage};
use log::debug;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Ordered supply of frames.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<ColorImage>>;
}

/// Image files decoded one per frame, in lexicographic path order.
#[derive(Clone, Debug)]
pub struct ImageSequence {
    paths: VecDeque<PathBuf>,
    order: ChannelOrder,
}

impl ImageSequence {
    /// Open a directory of images, or a single image file.
    pub fn open(path: &Path, order: ChannelOrder) -> Result<Self> {
        let paths = if path.is_dir() {
            let mut paths = Vec::new();
            for entry in fs::read_dir(path)? {
                let p = entry?.path();
                if p.is_file() && has_image_extension(&p) {
                    paths.push(p);
                }
            }
            paths.sort();
            paths
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(LaneError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such input: {}", path.display()),
            )));
        };
        debug!("ImageSequence::open path={} frames={}", path.display(), paths.len());
        Ok(Self {
            paths: paths.into(),
            order,
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<ColorImage>> {
        match self.paths.pop_front() {
            Some(path) => load_frame(&path, self.order).map(Some),
            None => Ok(None),
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Frames already in memory.
#[derive(Clone, Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<ColorImage>,
}

impl FrameQueue {
    pub fn new(frames: impl IntoIterator<Item = ColorImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: ColorImage) {
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FrameQueue {
    fn next_frame(&mut self) -> Result<Option<ColorImage>> {
        Ok(self.frames.pop_front())
    }
}

/// Wraps a source so the first pending frame can be inspected without
/// consuming it, e.g. to size a tracker before the stream starts.
#[derive(Debug)]
pub struct PeekableSource<S> {
    inner: S,
    peeked: Option<ColorImage>,
}

impl<S: FrameSource> PeekableSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            peeked: None,
        }
    }

    /// The frame the next `next_frame` call returns.
    pub fn peek(&mut self) -> Result<Option<&ColorImage>> {
        if self.peeked.is_none() {
            self.peeked = self.inner.next_frame()?;
        }
        Ok(self.peeked.as_ref())
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSource> FrameSource for PeekableSource<S> {
    fn next_frame(&mut self) -> Result<Option<ColorImage>> {
        match self.peeked.take() {
            Some(frame) => Ok(Some(frame)),
            None => self.inner.next_frame(),
        }
    }
}
