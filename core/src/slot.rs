//! Settle-once slot with a shared, re-awaitable accessor.
//!
//! The slot wires a one-shot channel the first time anything touches it. Settling
//! consumes the sending half; the first accessor request turns the receiving half
//! into a [`Shared`] future that every observer clones. Because each side only
//! ever talks to the channel, observing before settling and settling before
//! observing end up in the same place.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

/// Default rejection type. Observers receive clones of the same `Arc`.
pub type SlotError = Arc<dyn Error + Send + Sync>;

type Outcome<T, E> = Result<T, E>;

// ============================================================================
// SlotState
// ============================================================================

/// Value-free view of where a slot is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    Unsettled,
    Fulfilled,
    Rejected,
}

impl SlotState {
    fn of<T, E>(outcome: &Outcome<T, E>) -> Self {
        match outcome {
            Ok(_) => Self::Fulfilled,
            Err(_) => Self::Rejected,
        }
    }

    #[must_use]
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Unsettled)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unsettled => "unsettled",
            Self::Fulfilled => "fulfilled",
            Self::Rejected => "rejected",
        })
    }
}

/// Returned by the `try_*` settlement methods when the slot is already terminal.
///
/// Carries the payload that was not delivered.
#[derive(Debug)]
pub struct AlreadySettled<V> {
    state: SlotState,
    value: V,
}

impl<V> AlreadySettled<V> {
    /// The terminal state the slot was already in.
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V> fmt::Display for AlreadySettled<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deferred slot is already {}", self.state)
    }
}

impl<V: fmt::Debug> Error for AlreadySettled<V> {}

// ============================================================================
// Accessor
// ============================================================================

/// Awaitable handle for a slot's eventual outcome.
///
/// Clones share one underlying future: it is driven once and each clone gets a
/// copy of the result. Awaiting a clone after the outcome is known returns
/// immediately.
pub struct Accessor<T, E = SlotError> {
    shared: Shared<BoxFuture<'static, Outcome<T, E>>>,
}

impl<T, E> Accessor<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn from_receiver(receiver: oneshot::Receiver<Outcome<T, E>>) -> Self {
        let settled = async move {
            match receiver.await {
                Ok(outcome) => outcome,
                // Every slot handle went away unsettled.
                Err(_) => future::pending().await,
            }
        };
        Self {
            shared: settled.boxed().shared(),
        }
    }

    /// True when both handles observe the same slot.
    ///
    /// A handle that has itself completed no longer compares equal to anything.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.shared.ptr_eq(&other.shared)
    }

    /// The outcome, if some clone has already observed it.
    #[must_use]
    pub fn peek(&self) -> Option<&Outcome<T, E>> {
        self.shared.peek()
    }
}

impl<T, E> Clone for Accessor<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone, E: Clone> Future for Accessor<T, E> {
    type Output = Outcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared.poll_unpin(cx)
    }
}

impl<T, E> fmt::Debug for Accessor<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("observed", &self.peek().is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DeferredSlot
// ============================================================================

enum Observer<T, E> {
    /// Receiving half, waiting for the first accessor request.
    Parked(oneshot::Receiver<Outcome<T, E>>),
    Claimed(Accessor<T, E>),
}

struct Wiring<T, E> {
    /// Present until the first settlement takes it.
    hook: Option<oneshot::Sender<Outcome<T, E>>>,
    observer: Observer<T, E>,
}

impl<T, E> Wiring<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn new() -> Self {
        let (hook, receiver) = oneshot::channel();
        Self {
            hook: Some(hook),
            observer: Observer::Parked(receiver),
        }
    }

    fn claim(self) -> (Self, Accessor<T, E>) {
        let Self { hook, observer } = self;
        let accessor = match observer {
            Observer::Parked(receiver) => Accessor::from_receiver(receiver),
            Observer::Claimed(accessor) => accessor,
        };
        let wiring = Self {
            hook,
            observer: Observer::Claimed(accessor.clone()),
        };
        (wiring, accessor)
    }
}

struct Inner<T, E> {
    /// Copy of the settled outcome, written under the lock before observers are woken.
    settled: Option<Outcome<T, E>>,
    /// `None` until the slot is first settled or observed.
    wiring: Option<Wiring<T, E>>,
}

struct Core<T, E> {
    label: Option<Cow<'static, str>>,
    inner: Mutex<Inner<T, E>>,
}

/// A settle-once container for an eventual value or failure.
///
/// `DeferredSlot` is a handle: clones refer to the same slot, so a producer and
/// any number of consumers can each hold one. The first call to
/// [`fulfill`](Self::fulfill), [`reject`](Self::reject) or
/// [`settle`](Self::settle) decides the outcome; later calls are ignored. Use
/// the `try_*` variants to find out when that happens.
///
/// ```
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// use settle_core::DeferredSlot;
///
/// let slot = DeferredSlot::<String>::new();
/// let pending = slot.accessor();
/// slot.fulfill("success".to_owned());
/// assert_eq!(pending.await.unwrap(), "success");
/// assert_eq!(slot.accessor().await.unwrap(), "success");
/// # });
/// ```
pub struct DeferredSlot<T, E = SlotError> {
    core: Arc<Core<T, E>>,
}

impl<T, E> DeferredSlot<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::from_label(None)
    }

    /// Create a slot whose log events carry `label`.
    pub fn labeled(label: impl Into<Cow<'static, str>>) -> Self {
        Self::from_label(Some(label.into()))
    }

    fn from_label(label: Option<Cow<'static, str>>) -> Self {
        Self {
            core: Arc::new(Core {
                label,
                inner: Mutex::new(Inner {
                    settled: None,
                    wiring: None,
                }),
            }),
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.core.label.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> SlotState {
        self.lock()
            .settled
            .as_ref()
            .map_or(SlotState::Unsettled, SlotState::of)
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state().is_settled()
    }

    /// Settle with `value`. No effect if the slot is already settled.
    pub fn fulfill(&self, value: T) {
        self.settle(Ok(value));
    }

    /// Settle with `error`. No effect if the slot is already settled.
    pub fn reject(&self, error: E) {
        self.settle(Err(error));
    }

    /// Settle with `outcome`. No effect if the slot is already settled.
    pub fn settle(&self, outcome: Outcome<T, E>) {
        if let Err(ignored) = self.try_settle(outcome) {
            tracing::debug!(
                slot = self.label().unwrap_or_default(),
                state = %ignored.state(),
                "Ignoring settlement of already-settled slot"
            );
        }
    }

    pub fn try_fulfill(&self, value: T) -> Result<(), AlreadySettled<T>> {
        self.deliver(value, Ok)
    }

    pub fn try_reject(&self, error: E) -> Result<(), AlreadySettled<E>> {
        self.deliver(error, Err)
    }

    pub fn try_settle(
        &self,
        outcome: Outcome<T, E>,
    ) -> Result<(), AlreadySettled<Outcome<T, E>>> {
        self.deliver(outcome, |outcome| outcome)
    }

    /// Handle for the eventual outcome.
    ///
    /// The first call builds the handle; every later call returns a clone of it.
    /// Requesting it never settles the slot.
    #[must_use]
    pub fn accessor(&self) -> Accessor<T, E> {
        let mut inner = self.lock();
        let wiring = inner.wiring.take().unwrap_or_else(Wiring::new);
        let (wiring, accessor) = wiring.claim();
        inner.wiring = Some(wiring);
        accessor
    }

    /// The settled outcome, or `None` while unsettled. Never waits.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T, E>> {
        self.lock().settled.clone()
    }

    fn deliver<V>(
        &self,
        payload: V,
        into_outcome: impl FnOnce(V) -> Outcome<T, E>,
    ) -> Result<(), AlreadySettled<V>> {
        let mut inner = self.lock();
        let current = inner.settled.as_ref().map_or(SlotState::Unsettled, SlotState::of);
        let wiring = inner.wiring.get_or_insert_with(Wiring::new);
        let Some(hook) = wiring.hook.take() else {
            return Err(AlreadySettled {
                state: current,
                value: payload,
            });
        };

        let outcome = into_outcome(payload);
        let state = SlotState::of(&outcome);
        inner.settled = Some(outcome.clone());
        // The receiver is held by `wiring.observer`, so the send cannot fail.
        let _ = hook.send(outcome);
        drop(inner);

        tracing::debug!(
            slot = self.label().unwrap_or_default(),
            %state,
            "Deferred slot settled"
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.core.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, E> Clone for DeferredSlot<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T, E> Default for DeferredSlot<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for DeferredSlot<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredSlot")
            .field("label", &self.label())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
