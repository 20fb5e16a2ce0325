//! Detection session: owns the camera and models, runs the per-frame
//! extract -> fuse -> debounce -> trigger chain and publishes render state.

use crate::config::AppConfig;
use crate::debounce::ConfirmCounter;
use crate::donation::{Charity, DonationError, DonationResult, DonationSink};
use crate::error::{Result, SessionError};
use crate::feedback::{ceil_secs, Feedback, SessionStatus, Toast, ToastKind};
use crate::fusion::looks_like_doomscrolling;
use crate::perception::{retain_phones, PerceptionProvider, TimestampClock};
use crate::settings::LiveSettings;
use crate::signals::extract_signals;
use crate::trigger::{TriggerDecision, TriggerPolicy, TriggerState};
use crate::types::{PerceptionFrame, SignalSet};
use crate::video::VideoSource;
use anyhow::{anyhow, Context};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// What one call to `tick` did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Cancellation flag was set; resources have been released.
    Cancelled,
    /// Models or video not ready yet; nothing was processed.
    NotReady,
    Processed(FrameReport),
    /// The frame could not be processed. State is unchanged; the loop goes on.
    Faulted(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub now_ms: u64,
    pub signals: SignalSet,
    pub pitch: Option<f32>,
    pub raw: bool,
    pub confirmed: bool,
    pub decision: TriggerDecision,
    /// Charity a donation was dispatched to on this frame.
    pub fired: Option<Charity>,
}

#[derive(Debug)]
struct DonationOutcome {
    charity: Charity,
    fired_at_ms: u64,
    result: std::result::Result<DonationResult, DonationError>,
}

/// Cloneable remote control for a running session.
#[derive(Clone)]
pub struct SessionHandle {
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl SessionHandle {
    /// Ask the session to stop. Teardown happens on the session's next tick.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

pub struct DetectionSession {
    config: AppConfig,
    policy: TriggerPolicy,
    provider: Option<Box<dyn PerceptionProvider>>,
    video: Option<Box<dyn VideoSource>>,
    sink: Arc<dyn DonationSink>,
    settings: LiveSettings,

    counter: ConfirmCounter,
    trigger: TriggerState,
    clock: TimestampClock,
    last_tick_ms: u64,
    ready: bool,
    torn_down: bool,

    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    runtime: Option<Handle>,
    outcomes_tx: mpsc::UnboundedSender<DonationOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<DonationOutcome>,

    feedback: Feedback,
    feedback_tx: watch::Sender<Feedback>,
}

impl DetectionSession {
    pub fn new(
        config: AppConfig,
        provider: Box<dyn PerceptionProvider>,
        video: Box<dyn VideoSource>,
        sink: Arc<dyn DonationSink>,
        settings: LiveSettings,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (feedback_tx, _) = watch::channel(Feedback::default());
        let config = config.validated();
        Self {
            policy: TriggerPolicy::from(&config.policy),
            counter: ConfirmCounter::new(config.policy.confirm_frames),
            config,
            provider: Some(provider),
            video: Some(video),
            sink,
            settings,
            trigger: TriggerState::default(),
            clock: TimestampClock::new(),
            last_tick_ms: 0,
            ready: false,
            torn_down: false,
            cancel: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            runtime: None,
            outcomes_tx,
            outcomes_rx,
            feedback: Feedback::default(),
            feedback_tx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            cancel: self.cancel.clone(),
            wake: self.wake.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Feedback> {
        self.feedback_tx.subscribe()
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn status(&self) -> &SessionStatus {
        &self.feedback.status
    }

    pub fn counter(&self) -> ConfirmCounter {
        self.counter
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.trigger
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Acquire the camera, then load the models. On any failure everything
    /// acquired so far is released and the session ends in `Error`.
    pub async fn start(&mut self) -> Result<()> {
        if self.torn_down || self.cancel.load(Ordering::SeqCst) {
            return Err(SessionError::Stopped);
        }
        if self.ready {
            return Ok(());
        }
        self.set_status(SessionStatus::Initializing);
        match Handle::try_current() {
            Ok(runtime) => self.runtime = Some(runtime),
            Err(e) => return Err(self.fail(format!("no tokio runtime to dispatch donations on: {}", e))),
        }

        self.set_status(SessionStatus::RequestingCamera);
        let opened = match self.video.as_mut() {
            Some(video) => video.open().with_context(|| format!("{} unavailable", video.name())),
            None => Err(anyhow!("no video source")),
        };
        if let Err(e) = opened {
            return Err(self.fail(format!("{:#}", e)));
        }

        self.set_status(SessionStatus::LoadingModels);
        let loaded = match self.provider.as_mut() {
            Some(provider) => {
                let name = provider.name();
                provider.load().await.with_context(|| format!("{} failed to load", name))
            }
            None => Err(anyhow!("no perception provider")),
        };
        if let Err(e) = loaded {
            return Err(self.fail(format!("{:#}", e)));
        }

        self.ready = true;
        self.set_status(SessionStatus::Running);
        info!(
            "Detection running: provider={}, video={}, charity={}",
            self.provider.as_ref().map(|p| p.name()).unwrap_or_default(),
            self.video.as_ref().map(|v| v.name()).unwrap_or_default(),
            self.settings.charity()
        );
        Ok(())
    }

    /// Drive `tick` from a timer at the configured frame rate until the
    /// session is cancelled, then tear down.
    pub async fn run(&mut self) -> Result<()> {
        if !self.ready {
            return Err(if self.torn_down { SessionError::Stopped } else { SessionError::NotStarted });
        }
        let wake = self.wake.clone();
        let started = Instant::now();
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.frame_interval_ms()));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = wake.notified() => {}
            }
            let now_ms = started.elapsed().as_millis() as u64;
            if let TickOutcome::Cancelled = self.tick(now_ms) {
                break;
            }
        }
        Ok(())
    }

    /// Process one frame. Never returns an error: failures are logged and
    /// reported as `Faulted` so the caller keeps scheduling.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        if self.cancel.load(Ordering::SeqCst) {
            self.teardown();
            return TickOutcome::Cancelled;
        }

        self.last_tick_ms = now_ms;
        self.drain_donations(now_ms);
        self.expire_toast(now_ms);

        let video_ready = self.video.as_ref().map_or(false, |v| v.dimensions().is_some());
        if !self.ready || self.provider.is_none() || !video_ready {
            self.publish();
            return TickOutcome::NotReady;
        }

        let outcome = match self.process_frame(now_ms) {
            Ok(report) => TickOutcome::Processed(report),
            Err(e) => {
                warn!("Frame at {}ms skipped: {:#}", now_ms, e);
                TickOutcome::Faulted(format!("{:#}", e))
            }
        };
        self.publish();
        outcome
    }

    /// Cancel and release everything. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        self.teardown();
    }

    fn process_frame(&mut self, now_ms: u64) -> anyhow::Result<FrameReport> {
        let observed = self.observe(now_ms)?;

        let extraction = extract_signals(&observed, &self.config.detection);
        let raw = looks_like_doomscrolling(&extraction.signals, &self.config.detection);
        let confirmed = self.counter.observe(raw);

        let (trigger, decision) = self.policy.step(self.trigger, confirmed, now_ms);
        self.trigger = trigger;

        let fired = match decision {
            TriggerDecision::Fire => Some(self.dispatch_donation(now_ms)),
            _ => None,
        };

        self.feedback.signals = extraction.signals;
        self.feedback.raw = raw;
        self.feedback.confirmed = confirmed;
        self.feedback.counter = self.counter.count();
        if extraction.pitch.is_some() {
            self.feedback.pitch = extraction.pitch;
        }
        self.feedback.cooldown_secs_remaining =
            ceil_secs(self.policy.cooldown_remaining_ms(&self.trigger, now_ms));

        Ok(FrameReport {
            now_ms,
            signals: extraction.signals,
            pitch: extraction.pitch,
            raw,
            confirmed,
            decision,
            fired,
        })
    }

    /// Capture a frame and query the three models, each with its own timestamp.
    /// A failing model call is a gap for this frame, not an error.
    fn observe(&mut self, now_ms: u64) -> anyhow::Result<PerceptionFrame> {
        let video = self.video.as_mut().context("video source released")?;
        let frame = video.capture().context("capture failed")?;

        let provider = self.provider.as_mut().context("perception provider released")?;
        provider.next_frame();

        let ts = self.clock.next(now_ms);
        let hands = provider.detect_hands(&frame, ts).unwrap_or_else(|e| {
            warn!("Hand model failed at {}ms: {:#}", ts, e);
            Vec::new()
        });
        let ts = self.clock.next(now_ms);
        let faces = provider.detect_faces(&frame, ts).unwrap_or_else(|e| {
            warn!("Face model failed at {}ms: {:#}", ts, e);
            Vec::new()
        });
        let ts = self.clock.next(now_ms);
        let detections = provider.detect_objects(&frame, ts).unwrap_or_else(|e| {
            warn!("Object model failed at {}ms: {:#}", ts, e);
            Vec::new()
        });

        let detection = &self.config.detection;
        Ok(PerceptionFrame {
            hands,
            faces: faces.into_iter().take(1).collect(),
            detections: retain_phones(detections, &detection.phone_label, detection.phone_min_score),
        })
    }

    /// Fire-and-forget donation. The trigger state has already committed, so
    /// the outcome only drives the toast.
    fn dispatch_donation(&mut self, now_ms: u64) -> Charity {
        let charity = self.settings.charity();
        info!("Doomscrolling held; donating to {}", charity);

        let Some(runtime) = self.runtime.as_ref() else {
            error!("No runtime to dispatch donation on; dropping it");
            return charity;
        };

        let donation = self.sink.donate(charity);
        let tx = self.outcomes_tx.clone();
        runtime.spawn(async move {
            let result = donation.await;
            match &result {
                Ok(r) if r.success => info!("Donation {} succeeded: {}", r.identifier, r.message),
                Ok(r) => warn!("Donation {} not completed ({}): {}", r.identifier, r.status, r.message),
                Err(e) => warn!("Donation to {} failed: {}", charity, e),
            }
            // Receiver is gone once the session is dropped.
            let _ = tx.send(DonationOutcome {
                charity,
                fired_at_ms: now_ms,
                result,
            });
        });
        charity
    }

    fn drain_donations(&mut self, now_ms: u64) {
        let ttl = self.config.session.toast_ms;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            debug!(
                "Donation fired at {}ms to {} resolved at {}ms",
                outcome.fired_at_ms, outcome.charity, now_ms
            );
            let toast = match outcome.result {
                Ok(result) if result.success => {
                    self.feedback.donation_count += 1;
                    Toast::new(ToastKind::Success, result.message, now_ms, ttl)
                }
                Ok(result) => Toast::new(ToastKind::Error, result.message, now_ms, ttl),
                Err(e) => Toast::new(ToastKind::Error, format!("Donation failed: {}", e), now_ms, ttl),
            };
            self.feedback.toast = Some(toast);
        }
    }

    fn expire_toast(&mut self, now_ms: u64) {
        if self.feedback.toast.as_ref().map_or(false, |t| t.is_expired(now_ms)) {
            self.feedback.toast = None;
        }
    }

    fn fail(&mut self, detail: String) -> SessionError {
        error!("Perception unavailable: {}", detail);
        self.release_resources();
        self.torn_down = true;
        self.set_status(SessionStatus::Error(detail.clone()));
        SessionError::PerceptionUnavailable(detail)
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        // Count donations that resolved since the last tick; later ones are dropped.
        self.drain_donations(self.last_tick_ms);
        self.release_resources();
        self.counter.reset();
        self.trigger = TriggerState::default();
        if !matches!(self.feedback.status, SessionStatus::Error(_)) {
            self.set_status(SessionStatus::Stopped);
        }
        info!("Detection session stopped");
    }

    fn release_resources(&mut self) {
        self.ready = false;
        if let Some(mut video) = self.video.take() {
            video.release();
        }
        if let Some(mut provider) = self.provider.take() {
            provider.close();
        }
    }

    fn set_status(&mut self, status: SessionStatus) {
        debug!("Session status: {}", status);
        self.feedback.status = status;
        self.publish();
    }

    fn publish(&self) {
        self.feedback_tx.send_replace(self.feedback.clone());
    }
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        self.release_resources();
    }
}
