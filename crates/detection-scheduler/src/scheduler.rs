//! Detection Scheduler Implementation

use crate::gateway::{DetectorError, DetectorGateway};
use crate::handle::{Control, SessionHandle, StabilizedState};
use crate::render::RenderSink;
use crate::telemetry;
use crate::SchedulerError;
use consensus::ConsensusSummary;
use face_model::RawDetection;
use face_pipeline::{FaceSession, SessionConfig};
use frame_source::{FrameDimensions, FrameSource, VideoFrame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// A finished detector call on its way back to the loop task
#[derive(Debug)]
struct Completion {
    /// Dimensions of the frame the detector saw
    source: FrameDimensions,
    result: Result<Vec<RawDetection>, DetectorError>,
}

/// Drives one face session.
///
/// Every tick renders the current stabilized state. A detection starts only
/// when none is in flight, the detection interval has elapsed since the last
/// start, and the source has a frame. The detector call runs on its own task
/// and its result is applied here, so rendering never waits on detection.
pub struct DetectionScheduler<G: ?Sized, S, R> {
    session: FaceSession,
    gateway: Arc<G>,
    source: S,
    renderer: R,
    detection_interval: Duration,
    tick_interval: Duration,
    in_flight: bool,
    last_started: Option<Instant>,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    control_rx: watch::Receiver<Control>,
    /// Last reset generation applied on this task
    resets_applied: u64,
    stabilized_tx: watch::Sender<StabilizedState>,
    consensus_tx: watch::Sender<Option<ConsensusSummary>>,
}

impl<G, S, R> DetectionScheduler<G, S, R>
where
    G: DetectorGateway + ?Sized + 'static,
    S: FrameSource,
    R: RenderSink,
{
    /// Create a scheduler and the handle used to observe and control it
    pub fn new(
        config: SessionConfig,
        gateway: Arc<G>,
        source: S,
        renderer: R,
    ) -> Result<(Self, SessionHandle), SchedulerError> {
        let detection_interval = Duration::from_millis(config.detection_interval_ms);
        let tick_interval = Duration::from_millis(config.tick_interval_ms);
        let session = FaceSession::new(config)?;

        // One detection in flight means at most one pending completion
        let (completions_tx, completions_rx) = mpsc::channel(1);
        let (control_tx, control_rx) = watch::channel(Control::default());
        let (stabilized_tx, stabilized_rx) = watch::channel(StabilizedState::default());
        let (consensus_tx, consensus_rx) = watch::channel(None);

        info!(
            "Detection scheduler created: detect every {:?}, tick every {:?}",
            detection_interval, tick_interval
        );

        let scheduler = Self {
            session,
            gateway,
            source,
            renderer,
            detection_interval,
            tick_interval,
            in_flight: false,
            last_started: None,
            completions_tx,
            completions_rx,
            control_rx,
            resets_applied: 0,
            stabilized_tx,
            consensus_tx,
        };
        let handle = SessionHandle::new(control_tx, stabilized_rx, consensus_rx);
        Ok((scheduler, handle))
    }

    /// Run the loop on a new task
    pub fn spawn(self) -> JoinHandle<()>
    where
        S: 'static,
        R: 'static,
    {
        tokio::spawn(self.run())
    }

    /// Run until shutdown is requested or every handle is dropped
    pub async fn run(mut self) {
        info!("Detection scheduler starting");
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                changed = self.control_rx.changed() => {
                    // Every handle dropped
                    if changed.is_err() {
                        break;
                    }
                    let control = *self.control_rx.borrow_and_update();
                    if control.shutdown {
                        break;
                    }
                    if control.reset_generation != self.resets_applied {
                        self.resets_applied = control.reset_generation;
                        self.reset();
                    }
                }
                Some(completion) = self.completions_rx.recv() => self.apply(completion),
                _ = ticker.tick() => self.tick(),
            }
        }

        if self.in_flight {
            debug!("Stopping with a detection in flight; its result will be discarded");
        }
        info!("Detection scheduler stopped");
    }

    fn tick(&mut self) {
        if self.detection_due(Instant::now()) {
            self.start_detection();
        }

        if let Err(e) = self.renderer.render(self.session.stabilized()) {
            warn!("Render failed: {}", e);
            telemetry::record_render_failure();
        }
    }

    fn detection_due(&self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        let interval_elapsed = self
            .last_started
            .map_or(true, |started| now.duration_since(started) >= self.detection_interval);
        interval_elapsed && self.source.is_ready()
    }

    fn start_detection(&mut self) {
        let Some(frame) = self.source.current_frame() else {
            debug!("Source reported ready but had no frame");
            return;
        };
        let source = frame.dimensions();

        self.in_flight = true;
        self.last_started = Some(Instant::now());
        telemetry::record_detection_started();
        debug!("Starting detection on frame {}", frame.sequence);

        let gateway = Arc::clone(&self.gateway);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = detect_isolated(gateway, frame).await;
            if completions.send(Completion { source, result }).await.is_err() {
                debug!("Scheduler stopped, discarding late detection result");
                telemetry::record_detection_discarded();
            }
        });
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = false;
        let elapsed = self
            .last_started
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or_default();

        match completion.result {
            Ok(raw) => {
                let outcome = self.session.process(raw, completion.source);
                telemetry::record_detection_completed(elapsed, outcome.subjects);

                self.stabilized_tx
                    .send_replace(Arc::new(self.session.stabilized().to_vec()));
                if outcome.history_changed {
                    self.consensus_tx.send_replace(self.session.consensus().cloned());
                    telemetry::set_history_length(self.session.history().len());
                }
            }
            Err(e) => {
                warn!("Detection failed, keeping previous state: {}", e);
                telemetry::record_detection_failed();
            }
        }
    }

    fn reset(&mut self) {
        self.session.reset();
        self.consensus_tx.send_replace(None);
        telemetry::set_history_length(0);
    }
}

/// Run the detector on its own task so a panic becomes an ordinary failure
async fn detect_isolated<G>(
    gateway: Arc<G>,
    frame: VideoFrame,
) -> Result<Vec<RawDetection>, DetectorError>
where
    G: DetectorGateway + ?Sized + 'static,
{
    match tokio::spawn(async move { gateway.detect(&frame).await }).await {
        Ok(result) => result,
        Err(e) => Err(DetectorError::Panicked(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Headless, RenderError};
    use async_trait::async_trait;
    use face_model::{BoundingBox, Classification, DetectionResult, Point2D};
    use frame_source::LatestFrame;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::sleep;

    fn raw(age: f64) -> RawDetection {
        RawDetection {
            bbox: BoundingBox::new(100.0, 80.0, 200.0, 240.0),
            age,
            gender: Classification::new("female", 0.9),
            expressions: vec![("happy".into(), 0.7), ("neutral".into(), 0.3)],
            landmarks: (0..68).map(|i| Point2D::new(150.0 + i as f64, 200.0)).collect(),
        }
    }

    fn ready_source() -> LatestFrame {
        let source = LatestFrame::new();
        source.publish(VideoFrame::blank(64, 48, 0));
        source
    }

    fn config(sample_interval: u64) -> SessionConfig {
        SessionConfig {
            history_sample_interval: sample_interval,
            ..Default::default()
        }
    }

    /// Answers from a script, then hangs once the script runs out
    struct ScriptedGateway {
        script: Mutex<VecDeque<Result<Vec<RawDetection>, DetectorError>>>,
        delay: Duration,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        finished: AtomicBool,
    }

    impl ScriptedGateway {
        fn new(
            script: impl IntoIterator<Item = Result<Vec<RawDetection>, DetectorError>>,
            delay: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                delay,
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                finished: AtomicBool::new(false),
            })
        }

        fn ages(ages: &[f64], delay: Duration) -> Arc<Self> {
            Self::new(ages.iter().map(|&age| Ok(vec![raw(age)])), delay)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DetectorGateway for ScriptedGateway {
        async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<RawDetection>, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);

            let next = self.script.lock().unwrap().pop_front();
            let Some(result) = next else {
                return std::future::pending().await;
            };

            sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.store(true, Ordering::SeqCst);
            result
        }
    }

    /// Always returns the same subject immediately
    struct SteadyGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DetectorGateway for SteadyGateway {
        async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<RawDetection>, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![raw(30.0)])
        }
    }

    struct PanickingGateway;

    #[async_trait]
    impl DetectorGateway for PanickingGateway {
        async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<RawDetection>, DetectorError> {
            panic!("model crashed");
        }
    }

    fn recording_renderer() -> (
        Arc<Mutex<Vec<Vec<DetectionResult>>>>,
        impl FnMut(&[DetectionResult]) -> Result<(), RenderError> + Send,
    ) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&frames);
        let renderer = move |detections: &[DetectionResult]| {
            sink.lock().unwrap().push(detections.to_vec());
            Ok(())
        };
        (frames, renderer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_detection_in_flight() {
        let gateway = ScriptedGateway::ages(&[30.0; 10], Duration::from_millis(350));
        let (scheduler, handle) =
            DetectionScheduler::new(config(1), Arc::clone(&gateway), ready_source(), Headless)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(1000)).await;
        handle.shutdown();
        task.await.unwrap();

        assert_eq!(gateway.max_active.load(Ordering::SeqCst), 1);
        // Starts near 0, 350 and 700 ms
        assert!((2..=3).contains(&gateway.calls()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_rate_is_capped() {
        let gateway = Arc::new(SteadyGateway {
            calls: AtomicUsize::new(0),
        });
        let (scheduler, handle) =
            DetectionScheduler::new(config(1), Arc::clone(&gateway), ready_source(), Headless)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(1000)).await;
        handle.shutdown();
        task.await.unwrap();

        let calls = gateway.calls.load(Ordering::SeqCst);
        assert!(calls >= 5, "only {calls} detections");
        assert!(calls <= 11, "{calls} detections exceed the 100 ms cap");
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_smoothed_in_completion_order() {
        let gateway =
            ScriptedGateway::ages(&[20.0, 22.0, 24.0, 26.0, 28.0], Duration::from_millis(30));
        let (frames, renderer) = recording_renderer();
        let (scheduler, handle) =
            DetectionScheduler::new(config(5), gateway, ready_source(), renderer).unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(1000)).await;
        handle.shutdown();
        task.await.unwrap();

        let frames = frames.lock().unwrap();
        let mut ages: Vec<f64> = Vec::new();
        for frame in frames.iter().filter(|frame| !frame.is_empty()) {
            if ages.last() != Some(&frame[0].age) {
                ages.push(frame[0].age);
            }
        }
        assert_eq!(ages, vec![20.0, 21.0, 22.5, 24.25, 26.125]);
        assert_eq!(handle.stabilized()[0].age, 26.125);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_detector_does_not_block_rendering() {
        let gateway = ScriptedGateway::ages(&[], Duration::ZERO);
        let (frames, renderer) = recording_renderer();
        let (scheduler, handle) =
            DetectionScheduler::new(config(5), Arc::clone(&gateway), ready_source(), renderer)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(500)).await;
        handle.shutdown();
        task.await.unwrap();

        assert_eq!(gateway.calls(), 1);
        assert!(frames.lock().unwrap().len() >= 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_previous_state() {
        let gateway = ScriptedGateway::new(
            vec![
                Ok(vec![raw(30.0)]),
                Err(DetectorError::Failed("inference error".into())),
                Err(DetectorError::Unavailable("model unloaded".into())),
                Ok(vec![raw(40.0)]),
            ],
            Duration::from_millis(10),
        );
        let (scheduler, handle) =
            DetectionScheduler::new(config(5), Arc::clone(&gateway), ready_source(), Headless)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(1000)).await;
        assert!(handle.is_running());
        handle.shutdown();
        task.await.unwrap();

        assert_eq!(gateway.calls(), 5);
        assert_eq!(handle.stabilized()[0].age, 35.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detector_panic_is_a_failure() {
        let (scheduler, handle) =
            DetectionScheduler::new(config(5), Arc::new(PanickingGateway), ready_source(), Headless)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(500)).await;
        assert!(handle.is_running());
        assert!(handle.stabilized().is_empty());
        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_detection_until_source_ready() {
        let gateway = ScriptedGateway::ages(&[30.0], Duration::ZERO);
        let source = LatestFrame::new();
        let (frames, renderer) = recording_renderer();
        let (scheduler, handle) =
            DetectionScheduler::new(config(5), Arc::clone(&gateway), source.clone(), renderer)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(300)).await;
        assert_eq!(gateway.calls(), 0);
        assert!(!frames.lock().unwrap().is_empty());

        source.publish(VideoFrame::blank(64, 48, 1));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(gateway.calls(), 1);
        assert_eq!(handle.stabilized().len(), 1);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_in_flight_result() {
        let gateway = ScriptedGateway::ages(&[40.0], Duration::from_millis(500));
        let (scheduler, handle) =
            DetectionScheduler::new(config(1), Arc::clone(&gateway), ready_source(), Headless)
                .unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(50)).await;
        assert_eq!(gateway.calls(), 1);
        handle.shutdown();
        task.await.unwrap();
        assert!(!handle.is_running());

        // The detector finishes, but nothing is applied
        sleep(Duration::from_millis(1000)).await;
        assert!(gateway.finished.load(Ordering::SeqCst));
        assert!(handle.stabilized().is_empty());
        assert!(handle.consensus().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_consensus() {
        let gateway = ScriptedGateway::ages(&[30.0, 32.0, 34.0], Duration::ZERO);
        let (scheduler, handle) =
            DetectionScheduler::new(config(1), gateway, ready_source(), Headless).unwrap();
        let mut consensus = handle.subscribe_consensus();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(500)).await;
        let summary = handle.consensus().unwrap();
        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.gender.as_deref(), Some("female"));
        assert!(consensus.has_changed().unwrap());
        consensus.mark_unchanged();

        handle.reset().unwrap();
        handle.reset().unwrap();
        sleep(Duration::from_millis(50)).await;
        assert!(handle.consensus().is_none());
        assert!(consensus.has_changed().unwrap());
        // Overlay keeps the last stabilized subject
        assert_eq!(handle.stabilized().len(), 1);

        handle.shutdown();
        task.await.unwrap();
        assert!(matches!(handle.reset(), Err(SchedulerError::Stopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_stops_scheduler() {
        let (scheduler, handle) = DetectionScheduler::new(
            config(5),
            ScriptedGateway::ages(&[], Duration::ZERO),
            ready_source(),
            Headless,
        )
        .unwrap();
        let task = scheduler.spawn();

        let other = handle.clone();
        drop(handle);
        sleep(Duration::from_millis(100)).await;
        assert!(other.is_running());

        drop(other);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_trait_object_gateway() {
        let gateway: Arc<dyn DetectorGateway> = Arc::new(SteadyGateway {
            calls: AtomicUsize::new(0),
        });
        let (scheduler, handle) =
            DetectionScheduler::new(config(5), gateway, ready_source(), Headless).unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(200)).await;
        assert_eq!(handle.stabilized()[0].age, 30.0);
        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_resets_coalesce() {
        let gateway = ScriptedGateway::ages(&[30.0], Duration::ZERO);
        let (scheduler, handle) =
            DetectionScheduler::new(config(1), Arc::clone(&gateway), ready_source(), Headless)
                .unwrap();

        for _ in 0..100_000 {
            handle.reset().unwrap();
        }
        // All requests fold into one slot
        let pending = *scheduler.control_rx.borrow();
        assert_eq!(pending.reset_generation, 100_000);
        assert!(!pending.shutdown);

        let task = scheduler.spawn();
        sleep(Duration::from_millis(100)).await;
        assert!(handle.is_running());
        assert_eq!(gateway.calls(), 1);
        assert_eq!(handle.consensus().map(|c| c.sample_count), Some(1));

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_not_lost_behind_resets() {
        let gateway = ScriptedGateway::ages(&[30.0], Duration::ZERO);
        let (scheduler, handle) =
            DetectionScheduler::new(config(1), Arc::clone(&gateway), ready_source(), Headless)
                .unwrap();

        handle.reset().unwrap();
        handle.reset().unwrap();
        handle.shutdown();
        handle.reset().unwrap();

        scheduler.spawn().await.unwrap();
        assert_eq!(gateway.calls(), 0);
        assert!(!handle.is_running());
    }

    /// Reports a stale size, as if the capture side switched resolution
    /// between two reads
    struct StaleSizeSource {
        frame: VideoFrame,
    }

    impl FrameSource for StaleSizeSource {
        fn is_ready(&self) -> bool {
            true
        }

        fn dimensions(&self) -> FrameDimensions {
            FrameDimensions::new(640, 480)
        }

        fn current_frame(&self) -> Option<VideoFrame> {
            Some(self.frame.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scaling_uses_detected_frame_size() {
        let source = StaleSizeSource {
            frame: VideoFrame::blank(64, 48, 0),
        };
        let config = SessionConfig {
            display: Some(FrameDimensions::new(128, 96)),
            ..Default::default()
        };
        let gateway = Arc::new(SteadyGateway {
            calls: AtomicUsize::new(0),
        });
        let (scheduler, handle) =
            DetectionScheduler::new(config, gateway, source, Headless).unwrap();
        let task = scheduler.spawn();

        sleep(Duration::from_millis(50)).await;
        let stabilized = handle.stabilized();
        assert_eq!(stabilized[0].bbox.x, 200.0);
        assert_eq!(stabilized[0].bbox.height, 480.0);

        handle.shutdown();
        task.await.unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = DetectionScheduler::new(
            SessionConfig {
                smoothing_factor: 2.0,
                ..Default::default()
            },
            Arc::new(PanickingGateway),
            LatestFrame::new(),
            Headless,
        );
        assert!(matches!(result, Err(SchedulerError::Pipeline(_))));
    }
}
