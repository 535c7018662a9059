use std::sync::Mutex;

/// Counters for the frame streams served by this process.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub streams_opened: usize,
    pub streams_closed: usize,
    pub frames_sent: usize,
    pub encode_errors: usize,
}

impl Metrics {
    pub fn active_streams(&self) -> usize {
        self.streams_opened.saturating_sub(self.streams_closed)
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_stream_opened(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.streams_opened += 1;
        }
    }

    pub fn record_stream_closed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.streams_closed += 1;
        }
    }

    pub fn record_frame_sent(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_sent += 1;
        }
    }

    pub fn record_encode_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.encode_errors += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner.lock().map(|metrics| *metrics).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_streams_track_open_minus_closed() {
        let recorder = MetricsRecorder::new();
        recorder.record_stream_opened();
        recorder.record_stream_opened();
        recorder.record_stream_closed();
        recorder.record_frame_sent();

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.active_streams(), 1);
        assert_eq!(snapshot.frames_sent, 1);
        assert_eq!(snapshot.encode_errors, 0);
    }
}
