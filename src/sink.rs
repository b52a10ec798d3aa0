//! Delivery of intermediate buffers to progress observers.
//!
//! The carving loop publishes the working buffer after every mutation.
//! Delivery is strictly best-effort: a sink must return without blocking,
//! and a full queue drops the newest frame rather than stalling the
//! carver. Frames arrive in iteration order, with possible gaps at the
//! tail.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use image::RgbaImage;
use std::sync::{Arc, Mutex};

/// One intermediate result of the carving loop, in upright orientation.
#[derive(Clone, Debug)]
pub struct ProgressFrame {
    /// The working buffer after this iteration.
    pub image: RgbaImage,
    /// Zero-based carve iteration index.
    pub iteration: usize,
}

/// Observer of intermediate buffers.
pub trait ProgressSink: Send + Sync {
    /// Accepts one frame. Implementations must return promptly and may
    /// drop the frame; they must never block the caller.
    fn deliver(&self, frame: ProgressFrame);
}

/// Sink that discards every frame.
///
/// Useful as a stand-in wherever a `ProgressSink` is required but nobody
/// wants to watch, e.g. a preview slot that is configured off.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn deliver(&self, _frame: ProgressFrame) {}
}

/// Queue-backed sink for previews running on another thread.
///
/// The queue is bounded; when the consumer falls behind, the newest frame
/// is discarded and the carver keeps going.
pub struct ChannelSink {
    tx: Sender<ProgressFrame>,
}

impl ChannelSink {
    /// Creates a sink and its receiving end, with room for `capacity`
    /// in-flight frames.
    pub fn bounded(capacity: usize) -> (ChannelSink, Receiver<ProgressFrame>) {
        let (tx, rx) = bounded(capacity);
        (ChannelSink { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn deliver(&self, frame: ProgressFrame) {
        match self.tx.try_send(frame) {
            Ok(()) => {}
            // A full queue or a vanished consumer both mean the frame is
            // simply dropped.
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Records every frame so an animated encoder can replay the whole carve.
#[derive(Clone, Default)]
pub struct GifRecorder {
    frames: Arc<Mutex<Vec<RgbaImage>>>,
}

impl GifRecorder {
    /// Creates an empty recorder.
    pub fn new() -> GifRecorder {
        GifRecorder::default()
    }

    /// Drains the recorded frames, in iteration order.
    pub fn take_frames(&self) -> Vec<RgbaImage> {
        std::mem::take(&mut *self.frames.lock().expect("frame store poisoned"))
    }
}

impl ProgressSink for GifRecorder {
    fn deliver(&self, frame: ProgressFrame) {
        self.frames
            .lock()
            .expect("frame store poisoned")
            .push(frame.image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(iteration: usize) -> ProgressFrame {
        ProgressFrame {
            image: RgbaImage::new(2, 2),
            iteration,
        }
    }

    #[test]
    fn noop_sink_swallows_frames() {
        let sink = NoopSink;
        for i in 0..3 {
            sink.deliver(frame(i));
        }
    }

    #[test]
    fn channel_sink_preserves_order() {
        let (sink, rx) = ChannelSink::bounded(8);
        for i in 0..5 {
            sink.deliver(frame(i));
        }
        let received: Vec<usize> = rx.try_iter().map(|f| f.iteration).collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn channel_sink_drops_newest_when_full() {
        let (sink, rx) = ChannelSink::bounded(2);
        for i in 0..5 {
            sink.deliver(frame(i));
        }
        let received: Vec<usize> = rx.try_iter().map(|f| f.iteration).collect();
        assert_eq!(received, vec![0, 1]);
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (sink, rx) = ChannelSink::bounded(2);
        drop(rx);
        sink.deliver(frame(0));
    }

    #[test]
    fn recorder_replays_frames_in_order() {
        let recorder = GifRecorder::new();
        recorder.deliver(ProgressFrame {
            image: RgbaImage::new(3, 1),
            iteration: 0,
        });
        recorder.deliver(ProgressFrame {
            image: RgbaImage::new(2, 1),
            iteration: 1,
        });

        let frames = recorder.take_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].dimensions(), (3, 1));
        assert_eq!(frames[1].dimensions(), (2, 1));
        assert!(recorder.take_frames().is_empty());
    }
}
