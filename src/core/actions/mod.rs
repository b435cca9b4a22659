//! # Action lifecycle controller
//!
//! Every user-triggerable control (call-request button, soundboard phrase)
//! shares the same small state machine:
//!
//! `Idle --trigger--> Pending --(external call resolves)--> Success | Error
//! --(reset delay elapses)--> Idle`
//!
//! The controller serializes triggers per control (while Pending, new
//! triggers are ignored), schedules exactly one reset timer per terminal
//! state, and records the human-readable failure classification for the
//! toast presenter. It renders no UI.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The assistance requests a patient can trigger, with their display
/// metadata. Closed set; adding a request type is a compile-time change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Pain,
    Bathroom,
    Water,
    Reposition,
    Emergency,
    General,
}

impl RequestKind {
    pub const ALL: [RequestKind; 6] = [
        RequestKind::Pain,
        RequestKind::Bathroom,
        RequestKind::Water,
        RequestKind::Reposition,
        RequestKind::Emergency,
        RequestKind::General,
    ];

    /// Stable token sent to the paging backend.
    pub const fn token(self) -> &'static str {
        match self {
            RequestKind::Pain => "pain",
            RequestKind::Bathroom => "bathroom",
            RequestKind::Water => "water",
            RequestKind::Reposition => "reposition",
            RequestKind::Emergency => "emergency",
            RequestKind::General => "general",
        }
    }

    /// Symbol name used when displaying the request.
    pub const fn icon(self) -> &'static str {
        match self {
            RequestKind::Pain => "bandage.fill",
            RequestKind::Bathroom => "toilet.fill",
            RequestKind::Water => "drop.fill",
            RequestKind::Reposition => "arrow.triangle.2.circlepath",
            RequestKind::Emergency => "exclamationmark.triangle.fill",
            RequestKind::General => "bell.fill",
        }
    }

    /// Catalog path of the localized label.
    pub const fn label_key(self) -> &'static str {
        match self {
            RequestKind::Pain => "callRequests.pain",
            RequestKind::Bathroom => "callRequests.bathroom",
            RequestKind::Water => "callRequests.water",
            RequestKind::Reposition => "callRequests.reposition",
            RequestKind::Emergency => "callRequests.emergency",
            RequestKind::General => "callRequests.general",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Identity of an independently-triggerable control.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlId {
    Request(RequestKind),
    Phrase(String),
}

/// Visual/operational state of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// What happened to a trigger.
#[derive(Debug)]
pub enum ActionOutcome<T, E> {
    /// The external call ran. The `Display` form of the error is what the
    /// controller records for the toast presenter.
    Completed(Result<T, E>),
    /// The control was already Pending; no external call was made.
    Ignored,
}

#[derive(Default)]
struct ControlState {
    status: ActionStatus,
    last_error: Option<String>,
    /// Bumped on every trigger; a reset timer only fires for the
    /// generation it was scheduled in, so a stale timer can never reset a
    /// control that has been retriggered since.
    generation: u64,
    reset_timer: Option<JoinHandle<()>>,
}

/// Per-control state machines behind a shared map.
pub struct ActionController {
    controls: Arc<Mutex<HashMap<ControlId, ControlState>>>,
    reset_delay: Duration,
}

impl ActionController {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            controls: Arc::new(Mutex::new(HashMap::new())),
            reset_delay,
        }
    }

    pub fn status(&self, id: &ControlId) -> ActionStatus {
        self.controls
            .lock()
            .get(id)
            .map(|c| c.status)
            .unwrap_or_default()
    }

    /// Classification recorded by the latest failed trigger, until the
    /// control resets.
    pub fn last_error(&self, id: &ControlId) -> Option<String> {
        self.controls
            .lock()
            .get(id)
            .and_then(|c| c.last_error.clone())
    }

    /// Drive one trigger through the state machine. `op` is the external
    /// call; it is started only if the control is not already Pending, and
    /// its resolution is the only thing that moves the control to Success
    /// or Error.
    pub async fn run<T, E>(
        &self,
        id: ControlId,
        op: impl Future<Output = Result<T, E>>,
    ) -> ActionOutcome<T, E>
    where
        E: fmt::Display,
    {
        {
            let mut controls = self.controls.lock();
            let control = controls.entry(id.clone()).or_default();
            if control.status == ActionStatus::Pending {
                debug!("trigger on {id:?} ignored: already pending");
                return ActionOutcome::Ignored;
            }
            // A legitimate restart cancels the prior reset timer first.
            if let Some(timer) = control.reset_timer.take() {
                timer.abort();
            }
            control.generation += 1;
            control.status = ActionStatus::Pending;
            control.last_error = None;
        }

        let result = op.await;

        let mut controls = self.controls.lock();
        let control = controls.entry(id.clone()).or_default();
        match &result {
            Ok(_) => control.status = ActionStatus::Success,
            Err(err) => {
                let message = err.to_string();
                warn!("external call for {id:?} failed: {message}");
                control.status = ActionStatus::Error;
                control.last_error = Some(message);
            }
        }
        let generation = control.generation;
        let controls_shared = Arc::clone(&self.controls);
        let delay = self.reset_delay;
        let timer_id = id.clone();
        control.reset_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut controls = controls_shared.lock();
            if let Some(control) = controls.get_mut(&timer_id) {
                if control.generation == generation {
                    control.status = ActionStatus::Idle;
                    control.last_error = None;
                    control.reset_timer = None;
                }
            }
        }));

        ActionOutcome::Completed(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn water() -> ControlId {
        ControlId::Request(RequestKind::Water)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_then_auto_reset_to_idle() {
        let controller = ActionController::new(Duration::from_millis(5000));

        let outcome = controller.run(water(), async { Ok::<_, String>(()) }).await;
        assert!(matches!(outcome, ActionOutcome::Completed(Ok(()))));
        assert_eq!(controller.status(&water()), ActionStatus::Success);

        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(controller.status(&water()), ActionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_carries_classification_then_resets() {
        let controller = ActionController::new(Duration::from_millis(5000));

        let outcome = controller
            .run(water(), async { Err::<(), _>("timeout".to_string()) })
            .await;
        match outcome {
            ActionOutcome::Completed(Err(message)) => assert!(message.contains("timeout")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(controller.status(&water()), ActionStatus::Error);
        assert!(controller.last_error(&water()).unwrap().contains("timeout"));

        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(controller.status(&water()), ActionStatus::Idle);
        assert_eq!(controller.last_error(&water()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_while_pending() {
        let controller = Arc::new(ActionController::new(Duration::from_millis(5000)));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_op = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, String>(())
        };

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            let calls = Arc::clone(&calls);
            async move { controller.run(water(), slow_op(calls)).await }
        });
        // Let the first trigger reach Pending.
        tokio::task::yield_now().await;
        assert_eq!(controller.status(&water()), ActionStatus::Pending);

        let second = controller.run(water(), slow_op(Arc::clone(&calls))).await;
        assert!(matches!(second, ActionOutcome::Ignored));

        assert!(matches!(
            first.await.unwrap(),
            ActionOutcome::Completed(Ok(()))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_cancels_prior_reset_timer() {
        let controller = ActionController::new(Duration::from_millis(5000));

        controller
            .run(water(), async { Ok::<_, String>(()) })
            .await;
        assert_eq!(controller.status(&water()), ActionStatus::Success);

        // Retrigger at t=3s; the original timer would have fired at t=5s.
        tokio::time::sleep(Duration::from_millis(3000)).await;
        controller
            .run(water(), async { Ok::<_, String>(()) })
            .await;
        assert_eq!(controller.status(&water()), ActionStatus::Success);

        // t=5.5s: the first timer must not have reset the control.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(controller.status(&water()), ActionStatus::Success);

        // t=8.5s: the second timer resets it, exactly once.
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(controller.status(&water()), ActionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_are_independent() {
        let controller = ActionController::new(Duration::from_millis(5000));
        let pain = ControlId::Request(RequestKind::Pain);
        let phrase = ControlId::Phrase("I'm thirsty".to_string());

        controller
            .run(pain.clone(), async { Err::<(), _>("offline".to_string()) })
            .await;
        controller
            .run(phrase.clone(), async { Ok::<_, String>(()) })
            .await;

        assert_eq!(controller.status(&pain), ActionStatus::Error);
        assert_eq!(controller.status(&phrase), ActionStatus::Success);
        assert_eq!(controller.status(&water()), ActionStatus::Idle);
    }

    #[test]
    fn test_request_kind_metadata_is_total() {
        for kind in RequestKind::ALL {
            assert!(!kind.token().is_empty());
            assert!(!kind.icon().is_empty());
            assert!(kind.label_key().starts_with("callRequests."));
        }
    }
}
