//! Mock collaborators for tests and headless runs.

use crate::camera::FrameSource;
use crate::detector::FaceDetector;
use crate::display::{DisplaySink, KeyPoll};
use crate::error::Result;
use crate::frame::{FaceRegion, Frame};
use image::GrayImage;
use std::collections::VecDeque;

/// Frame source backed by a fixed queue of frames, then end-of-stream
pub struct MockFrameSource {
    frames: VecDeque<Frame>,
    pub close_count: u32,
}

impl MockFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            close_count: 0,
        }
    }

    /// A source of `count` frames where every pixel of frame `i` has
    /// brightness `i`, so downstream code can tell frames apart.
    pub fn numbered(count: u8, width: u32, height: u32) -> Self {
        let frames = (0..count)
            .map(|i| {
                let mut frame = Frame::new(width, height);
                frame.data_mut().fill(i);
                frame
            })
            .collect();
        Self::new(frames)
    }
}

impl FrameSource for MockFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.close_count += 1;
        Ok(())
    }
}

/// Detector that records the brightness of each grayscale input it sees
/// and returns a fixed set of regions.
pub struct MockDetector {
    regions: Vec<FaceRegion>,
    pub seen_brightness: Vec<u8>,
}

impl MockDetector {
    pub fn new(regions: Vec<FaceRegion>) -> Self {
        Self {
            regions,
            seen_brightness: Vec::new(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.seen_brightness.len()
    }
}

impl FaceDetector for MockDetector {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<FaceRegion>> {
        let brightness = gray.get_pixel(0, 0).0[0];
        self.seen_brightness.push(brightness);
        Ok(self.regions.clone())
    }
}

/// Display sink that counts presentations, optionally keeps the presented
/// frames, and can request quit after a given number of frames.
#[derive(Default)]
pub struct NullDisplay {
    pub presented: u64,
    pub close_count: u32,
    pub recorded: Vec<Frame>,
    record: bool,
    quit_after: Option<u64>,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a copy of every presented frame
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Report `KeyPoll::Quit` once `count` frames have been presented
    pub fn quit_after(count: u64) -> Self {
        Self {
            quit_after: Some(count),
            ..Self::default()
        }
    }
}

impl DisplaySink for NullDisplay {
    fn present(&mut self, frame: &Frame) -> Result<KeyPoll> {
        self.presented += 1;
        if self.record {
            self.recorded.push(frame.clone());
        }
        match self.quit_after {
            Some(count) if self.presented >= count => Ok(KeyPoll::Quit),
            _ => Ok(KeyPoll::None),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.close_count += 1;
        Ok(())
    }
}
