//! Inbound audio frame processing
//!
//! The pipeline decodes each `audio_data` frame, keeps delivery statistics,
//! and hands the decoded buffer downstream. Statistics are owned by the
//! pipeline instance, so independent pipelines count independently and tests
//! stay deterministic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use airlink_core::{DataFrame, Result, AUDIO_DATA_EVENT};

use crate::channel::Channel;

/// Diagnostic sampling period, in frames
///
/// Sampling triggers on exact multiples of this count, never on a time
/// window, to bound log volume under high-frequency streams.
pub const SAMPLE_INTERVAL: u64 = 500;

/// Observer invoked on each diagnostic sample
pub type SampleObserver = Arc<dyn Fn(u64, &Bytes) + Send + Sync>;

/// Decode pipeline for a high-frequency data stream
///
/// Cloning is cheap and clones share the same counters, so the pipeline can
/// be handed to a channel listener and still be read by the caller.
#[derive(Clone, Default)]
pub struct FramePipeline {
    stats: Arc<PipelineStats>,
    observer: Option<SampleObserver>,
}

#[derive(Default)]
struct PipelineStats {
    frames_received: AtomicU64,
    decode_failures: AtomicU64,
}

impl FramePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer called on each diagnostic sample
    pub fn on_sample(mut self, observer: impl Fn(u64, &Bytes) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Frames decoded successfully so far
    pub fn frames_received(&self) -> u64 {
        self.stats.frames_received.load(Ordering::Relaxed)
    }

    /// Frames dropped because the payload was malformed
    pub fn decode_failures(&self) -> u64 {
        self.stats.decode_failures.load(Ordering::Relaxed)
    }

    /// Decode one frame and update statistics
    ///
    /// The counter is incremented exactly once per successful decode and
    /// never on failure.
    pub fn process(&self, frame: &DataFrame) -> Result<Bytes> {
        let buffer = match frame.decode() {
            Ok(buffer) => buffer,
            Err(e) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let count = self.stats.frames_received.fetch_add(1, Ordering::Relaxed) + 1;

        if count % SAMPLE_INTERVAL == 0 {
            info!("Received {} audio packets", count);
            debug!(bytes = buffer.len(), "latest buffer: {:?}", buffer);
            if let Some(observer) = &self.observer {
                observer(count, &buffer);
            }
        }

        Ok(buffer)
    }

    /// Decode a frame straight from an event payload
    pub fn process_event(&self, payload: &serde_json::Value) -> Result<Bytes> {
        let frame = match DataFrame::from_event(payload) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.process(&frame)
    }

    /// Wire this pipeline to a channel's audio stream
    ///
    /// Registers the `audio_data` listener; each inbound frame is decoded
    /// and the buffer handed to `sink`. Malformed frames are logged and
    /// counted, and the stream continues with the next frame.
    pub fn attach(&self, channel: &Channel, sink: impl Fn(Bytes) + Send + Sync + 'static) {
        let pipeline = self.clone();
        channel.on(AUDIO_DATA_EVENT, move |payload| {
            match pipeline.process_event(payload) {
                Ok(buffer) => sink(buffer),
                Err(e) => warn!("dropping malformed audio frame: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlink_core::Error;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_counter_tracks_successes() {
        let pipeline = FramePipeline::new();

        for _ in 0..3 {
            pipeline.process(&DataFrame::new("aGVsbG8=")).unwrap();
        }

        assert_eq!(pipeline.frames_received(), 3);
        assert_eq!(pipeline.decode_failures(), 0);
    }

    #[test]
    fn test_failed_decode_not_counted() {
        let pipeline = FramePipeline::new();

        let result = pipeline.process(&DataFrame::new("not base64!!"));
        assert!(matches!(result, Err(Error::MalformedPayload(_))));
        assert_eq!(pipeline.frames_received(), 0);
        assert_eq!(pipeline.decode_failures(), 1);

        // The stream continues after a bad frame
        pipeline.process(&DataFrame::new("aGVsbG8=")).unwrap();
        assert_eq!(pipeline.frames_received(), 1);
    }

    #[test]
    fn test_process_event_wrong_shape_counted_as_failure() {
        let pipeline = FramePipeline::new();

        assert!(pipeline.process_event(&json!({"wrong": "shape"})).is_err());
        assert_eq!(pipeline.frames_received(), 0);
        assert_eq!(pipeline.decode_failures(), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let pipeline = FramePipeline::new();
        let clone = pipeline.clone();

        clone.process(&DataFrame::new("AAEC")).unwrap();
        assert_eq!(pipeline.frames_received(), 1);
    }

    #[test]
    fn test_independent_pipelines_count_independently() {
        let first = FramePipeline::new();
        let second = FramePipeline::new();

        first.process(&DataFrame::new("AAEC")).unwrap();
        assert_eq!(first.frames_received(), 1);
        assert_eq!(second.frames_received(), 0);
    }

    #[test]
    fn test_sampling_fires_on_exact_multiples() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let collected = samples.clone();
        let pipeline = FramePipeline::new().on_sample(move |count, _| {
            collected.lock().push(count);
        });

        // 1499 successful decodes: samples at 500 and 1000 only
        for _ in 0..1499 {
            pipeline.process(&DataFrame::new("AAEC")).unwrap();
        }

        assert_eq!(pipeline.frames_received(), 1499);
        assert_eq!(&*samples.lock(), &[500, 1000]);
    }

    #[test]
    fn test_sampling_ignores_failures() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let collected = samples.clone();
        let pipeline = FramePipeline::new().on_sample(move |count, _| {
            collected.lock().push(count);
        });

        // 499 good frames, one bad one, then the 500th good frame
        for _ in 0..499 {
            pipeline.process(&DataFrame::new("AAEC")).unwrap();
        }
        let _ = pipeline.process(&DataFrame::new("!!!"));
        assert!(samples.lock().is_empty());

        pipeline.process(&DataFrame::new("AAEC")).unwrap();
        assert_eq!(&*samples.lock(), &[500]);
    }
}
