use crate::state::PluginState;
use crate::stream::encode::encode_png;
use crate::stream::multipart::frame_part;
use crate::stream::shutdown::ShutdownSignal;
use futures_util::stream::{self, Stream};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, Instant};

/// Target interval between frames at `fps` frames per second.
pub fn frame_period(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
}

/// How long to sleep before the next frame, given the time the previous one
/// took to fetch and encode. `None` while the stream is paused at 0 FPS.
pub fn frame_wait(fps: u32, last_duration: Duration) -> Option<Duration> {
    if fps == 0 {
        None
    } else {
        Some(frame_period(fps).saturating_sub(last_duration))
    }
}

/// Per-connection loop that re-reads, encodes and yields the current frame.
pub struct FramePoller {
    state: Arc<PluginState>,
    shutdown: ShutdownSignal,
}

impl FramePoller {
    pub fn new(state: Arc<PluginState>, shutdown: ShutdownSignal) -> Self {
        Self { state, shutdown }
    }

    /// Turns the poller into an endless stream of multipart parts.
    ///
    /// Nothing runs until the consumer asks for the next part, so every part
    /// carries the artifact as it was when the consumer became ready for it.
    /// The frame rate is re-read before each part; at 0 FPS no frame is read
    /// or sent until the rate changes. The stream ends on shutdown, and the
    /// loop stops as soon as the consumer drops it.
    pub fn into_stream(self) -> impl Stream<Item = Vec<u8>> + Send + 'static {
        let session = FrameSession::open(self.state, self.shutdown);
        stream::unfold(session, |mut session| async move {
            let part = session.next_part().await?;
            Some((part, session))
        })
    }
}

struct FrameSession {
    state: Arc<PluginState>,
    shutdown: ShutdownSignal,
    rates: watch::Receiver<u32>,
    last_duration: Duration,
    sent: usize,
}

impl FrameSession {
    fn open(state: Arc<PluginState>, shutdown: ShutdownSignal) -> Self {
        let metrics = state.metrics();
        metrics.record_stream_opened();
        info!("frame stream opened ({} active)", metrics.snapshot().active_streams());
        let rates = state.config().subscribe_fps();
        Self {
            state,
            shutdown,
            rates,
            last_duration: Duration::ZERO,
            sent: 0,
        }
    }

    async fn next_part(&mut self) -> Option<Vec<u8>> {
        loop {
            if self.shutdown.is_triggered() {
                return None;
            }

            let fps = *self.rates.borrow_and_update();
            match frame_wait(fps, self.last_duration) {
                // Paused: nothing to send until the viewer picks a new rate.
                None => {
                    tokio::select! {
                        changed = self.rates.changed() => {
                            if changed.is_err() {
                                return None;
                            }
                        }
                        _ = self.shutdown.triggered() => return None,
                    }
                    continue;
                }
                Some(wait) => {
                    tokio::select! {
                        _ = time::sleep(wait) => {}
                        changed = self.rates.changed() => {
                            if changed.is_err() {
                                return None;
                            }
                            continue;
                        }
                        _ = self.shutdown.triggered() => return None,
                    }
                }
            }

            let started = Instant::now();
            let state = self.state.clone();
            let encoded =
                task::spawn_blocking(move || encode_png(&state.frames().fetch_current_frame()))
                    .await;
            self.last_duration = started.elapsed();

            let metrics = self.state.metrics();
            match encoded {
                Ok(Ok(png)) => {
                    self.sent += 1;
                    metrics.record_frame_sent();
                    return Some(frame_part(&png));
                }
                Ok(Err(err)) => {
                    warn!("skipping frame: {}", err);
                    metrics.record_encode_error();
                }
                Err(err) => {
                    warn!("frame encoder task failed: {}", err);
                    return None;
                }
            }
        }
    }
}

impl Drop for FrameSession {
    fn drop(&mut self) {
        let metrics = self.state.metrics();
        metrics.record_stream_closed();
        let snapshot = metrics.snapshot();
        info!(
            "frame stream closed after {} frames ({} active, {} sent overall)",
            self.sent,
            snapshot.active_streams(),
            snapshot.frames_sent
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::write_frame_artifact;
    use crate::plugin_dir::PluginDirectory;
    use crate::prelude::Frame;
    use crate::stream::shutdown::shutdown_channel;
    use futures_util::StreamExt;
    use ndarray::Array3;
    use std::pin::Pin;

    const HEADER: &[u8] = b"--frame\r\nContent-Type: image/png\r\n\r\n";

    type Parts = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

    fn state_with_fps(fps: &str) -> (tempfile::TempDir, Arc<PluginState>) {
        let logdir = tempfile::tempdir().unwrap();
        let state = PluginState::open(PluginDirectory::for_logdir(logdir.path())).unwrap();
        state.config().apply_config_update(vec![("FPS", fps)]).unwrap();
        (logdir, Arc::new(state))
    }

    fn parts(state: &Arc<PluginState>, signal: ShutdownSignal) -> Parts {
        Box::pin(FramePoller::new(state.clone(), signal).into_stream())
    }

    fn write_frame(state: &PluginState, fill: u8) -> Frame {
        let frame = Array3::<u8>::from_elem((3, 5, 1), fill);
        write_frame_artifact(&state.dir().summary_path(), frame.view()).unwrap();
        frame
    }

    fn part_for(frame: &Frame) -> Vec<u8> {
        frame_part(&encode_png(frame).unwrap())
    }

    #[test]
    fn frame_period_is_reciprocal_of_fps() {
        assert_eq!(frame_period(10), Duration::from_millis(100));
        assert_eq!(frame_period(1), Duration::from_secs(1));
    }

    #[test]
    fn frame_wait_subtracts_the_previous_iteration() {
        let period = frame_period(10);
        assert_eq!(
            frame_wait(10, Duration::from_millis(30)),
            Some(Duration::from_millis(70))
        );
        assert_eq!(frame_wait(10, Duration::ZERO), Some(period));
        assert_eq!(frame_wait(10, period), Some(Duration::ZERO));
        assert_eq!(frame_wait(10, Duration::from_millis(250)), Some(Duration::ZERO));
    }

    #[test]
    fn frame_wait_is_none_while_paused() {
        assert_eq!(frame_wait(0, Duration::ZERO), None);
        assert_eq!(frame_wait(0, Duration::from_secs(3)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_fps_sends_nothing_until_the_rate_changes() {
        let (_logdir, state) = state_with_fps("0");
        let (_trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        let waited = time::timeout(Duration::from_secs(30), parts.next()).await;
        assert!(waited.is_err());
        assert_eq!(state.metrics().snapshot().frames_sent, 0);

        state.config().apply_config_update(vec![("FPS", "10")]).unwrap();
        let resumed = Instant::now();
        let part = parts.next().await.unwrap();
        assert!(part.starts_with(HEADER));
        assert!(resumed.elapsed() >= frame_period(10));
        assert!(resumed.elapsed() < frame_period(10) * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn positive_fps_paces_frames() {
        let (_logdir, state) = state_with_fps("10");
        let (_trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        let start = Instant::now();
        for _ in 0..3 {
            parts.next().await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_changes_apply_to_running_streams() {
        let (_logdir, state) = state_with_fps("1");
        let (_trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        parts.next().await.unwrap();
        state.config().apply_config_update(vec![("FPS", "0")]).unwrap();
        let paused = time::timeout(Duration::from_secs(10), parts.next()).await;
        assert!(paused.is_err());
        assert_eq!(state.metrics().snapshot().frames_sent, 1);

        state.config().apply_config_update(vec![("FPS", "4")]).unwrap();
        let resumed = Instant::now();
        for _ in 0..2 {
            assert!(parts.next().await.unwrap().starts_with(HEADER));
        }
        assert!(resumed.elapsed() >= frame_period(4) * 2);
        assert!(resumed.elapsed() < frame_period(1));
    }

    #[tokio::test(start_paused = true)]
    async fn parts_carry_the_latest_artifact() {
        let (_logdir, state) = state_with_fps("20");
        let frame = Array3::<u8>::from_elem((3, 5, 3), 9);
        write_frame_artifact(&state.dir().summary_path(), frame.view()).unwrap();
        let (_trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        assert_eq!(parts.next().await.unwrap(), part_for(&frame));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_consumers_get_the_frame_current_when_they_read() {
        let (_logdir, state) = state_with_fps("1");
        let (_trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        let first = write_frame(&state, 1);
        assert_eq!(parts.next().await.unwrap(), part_for(&first));

        time::sleep(Duration::from_secs(10)).await;
        let second = write_frame(&state, 200);
        assert_eq!(parts.next().await.unwrap(), part_for(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_consumer_ends_the_loop() {
        let (_logdir, state) = state_with_fps("5");
        let (_trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        parts.next().await.unwrap();
        assert_eq!(state.metrics().snapshot().active_streams(), 1);
        drop(parts);

        let metrics = state.metrics().snapshot();
        assert_eq!(metrics.active_streams(), 0);
        assert_eq!(metrics.frames_sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_stream() {
        let (_logdir, state) = state_with_fps("2");
        let (trigger, signal) = shutdown_channel();
        let mut first = parts(&state, signal.clone());
        let mut second = parts(&state, signal);

        trigger.trigger();

        assert!(first.next().await.is_none());
        assert!(second.next().await.is_none());
        drop((first, second));
        let metrics = state.metrics().snapshot();
        assert_eq!(metrics.streams_opened, 2);
        assert_eq!(metrics.active_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_paused_streams() {
        let (_logdir, state) = state_with_fps("0");
        let (trigger, signal) = shutdown_channel();
        let mut parts = parts(&state, signal);

        let next = tokio::spawn(async move { parts.next().await.is_none() });
        task::yield_now().await;
        trigger.trigger();

        let ended = time::timeout(Duration::from_secs(1), next).await.unwrap().unwrap();
        assert!(ended);
    }
}
