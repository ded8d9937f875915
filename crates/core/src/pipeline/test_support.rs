//! Stub video backend shared by the pipeline tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_backend::VideoBackend;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

pub fn metadata(width: u32, height: u32, total_frames: usize) -> VideoMetadata {
    VideoMetadata {
        width,
        height,
        fps: 30.0,
        total_frames,
        codec: String::new(),
        source_path: None,
    }
}

pub fn solid_frame(index: usize, width: u32, height: u32, value: u8) -> Frame {
    Frame::new(
        vec![value; (width * height * 3) as usize],
        width,
        height,
        3,
        index,
    )
}

#[derive(Default)]
struct State {
    readers_created: usize,
    readers_closed: usize,
    opened: Vec<PathBuf>,
    closed: HashSet<PathBuf>,
    close_calls: usize,
    written: HashMap<PathBuf, Vec<Frame>>,
}

/// Serves a fixed frame list to every reader and records everything the
/// writers receive. Writers create an empty file on open, like a real
/// encoder does.
pub struct StubBackend {
    frames: Vec<Frame>,
    metadata: VideoMetadata,
    fail_open: bool,
    decode_error_at_end: bool,
    state: Arc<Mutex<State>>,
}

impl StubBackend {
    pub fn new(frames: Vec<Frame>) -> Self {
        let (w, h) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((4, 4));
        let total = frames.len();
        Self {
            frames,
            metadata: metadata(w, h, total),
            fail_open: false,
            decode_error_at_end: false,
            state: Arc::default(),
        }
    }

    pub fn with_total_frames(mut self, total_frames: usize) -> Self {
        self.metadata.total_frames = total_frames;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Yields an `Err` after the last frame instead of ending cleanly.
    pub fn with_decode_error(mut self) -> Self {
        self.decode_error_at_end = true;
        self
    }

    pub fn readers_created(&self) -> usize {
        self.state.lock().unwrap().readers_created
    }

    pub fn readers_closed(&self) -> usize {
        self.state.lock().unwrap().readers_closed
    }

    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn written(&self, path: &Path) -> Vec<Frame> {
        self.state
            .lock()
            .unwrap()
            .written
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn all_closed(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.opened.iter().all(|p| state.closed.contains(p))
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }
}

impl VideoBackend for StubBackend {
    fn reader(&self) -> Box<dyn VideoReader> {
        self.state.lock().unwrap().readers_created += 1;
        Box::new(StubReader {
            frames: self.frames.clone(),
            metadata: self.metadata.clone(),
            fail_open: self.fail_open,
            decode_error_at_end: self.decode_error_at_end,
            state: Arc::clone(&self.state),
        })
    }

    fn writer(&self) -> Box<dyn VideoWriter> {
        Box::new(StubWriter {
            path: None,
            state: Arc::clone(&self.state),
        })
    }
}

struct StubReader {
    frames: Vec<Frame>,
    metadata: VideoMetadata,
    fail_open: bool,
    decode_error_at_end: bool,
    state: Arc<Mutex<State>>,
}

impl VideoReader for StubReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if self.fail_open {
            return Err("invalid data found when processing input".into());
        }
        Ok(VideoMetadata {
            source_path: Some(path.to_path_buf()),
            ..self.metadata.clone()
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let tail: Option<Result<Frame, Box<dyn std::error::Error>>> = self
            .decode_error_at_end
            .then(|| Err("corrupt packet".into()));
        Box::new(self.frames.drain(..).map(Ok).chain(tail))
    }

    fn close(&mut self) {
        self.state.lock().unwrap().readers_closed += 1;
    }
}

struct StubWriter {
    path: Option<PathBuf>,
    state: Arc<Mutex<State>>,
}

impl VideoWriter for StubWriter {
    fn open(
        &mut self,
        path: &Path,
        _metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"")?;
        self.state.lock().unwrap().opened.push(path.to_path_buf());
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.path.clone().ok_or("writer not opened")?;
        self.state
            .lock()
            .unwrap()
            .written
            .entry(path)
            .or_default()
            .push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        if let Some(path) = &self.path {
            state.closed.insert(path.clone());
        }
        Ok(())
    }
}
