use std::{collections::VecDeque, fmt, sync::Arc};

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use tracing::trace;

use crate::{error::BindingError, value::ExternalValue};

/// Callback invoked with every emitted value.
pub type ValueListener = Arc<dyn Fn(&ExternalValue) + Send + Sync>;

/// Identifies one listener registration on a [`BindingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// Options for [`BindingHost::set_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValueOptions {
    /// Notify listeners about the write.
    pub emit_event: bool,
}

impl Default for SetValueOptions {
    fn default() -> Self {
        Self { emit_event: true }
    }
}

impl SetValueOptions {
    #[must_use]
    pub fn silent() -> Self {
        Self { emit_event: false }
    }
}

/// A form value that can be read, written, and observed.
pub trait BindingHost: Send + Sync + 'static {
    fn value(&self) -> ExternalValue;

    fn set_value(&self, value: ExternalValue, options: SetValueOptions);

    fn subscribe(&self, listener: ValueListener) -> SubscriptionHandle;

    /// Returns `false` when `handle` was not registered.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool;
}

#[derive(Default)]
struct FormControlState {
    value: ExternalValue,
    listeners: Vec<(SubscriptionHandle, ValueListener)>,
    next_id: u64,
}

/// Shared, observable form value.
///
/// Clones refer to the same value. Listeners run synchronously inside
/// [`FormControl::set_value`], after the internal lock is released, so they may
/// read the control.
#[derive(Clone, Default)]
pub struct FormControl {
    state: Arc<Mutex<FormControlState>>,
}

impl FormControl {
    #[must_use]
    pub fn new(value: impl Into<ExternalValue>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FormControlState {
                value: value.into(),
                ..FormControlState::default()
            })),
        }
    }

    #[must_use]
    pub fn value(&self) -> ExternalValue {
        self.state.lock().value.clone()
    }

    pub fn set_value(&self, value: impl Into<ExternalValue>, options: SetValueOptions) {
        let value = value.into();
        let listeners = {
            let mut state = self.state.lock();
            state.value = value.clone();
            if !options.emit_event {
                return;
            }
            state
                .listeners
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect::<Vec<_>>()
        };

        for listener in listeners {
            listener(&value);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&ExternalValue) + Send + Sync + 'static) -> SubscriptionHandle {
        self.subscribe_listener(Arc::new(listener))
    }

    fn subscribe_listener(&self, listener: ValueListener) -> SubscriptionHandle {
        let mut state = self.state.lock();
        let handle = SubscriptionHandle(state.next_id);
        state.next_id += 1;
        state.listeners.push((handle, listener));
        handle
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(registered, _)| *registered != handle);
        state.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

impl fmt::Debug for FormControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FormControl")
            .field("value", &state.value)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl BindingHost for FormControl {
    fn value(&self) -> ExternalValue {
        FormControl::value(self)
    }

    fn set_value(&self, value: ExternalValue, options: SetValueOptions) {
        FormControl::set_value(self, value, options);
    }

    fn subscribe(&self, listener: ValueListener) -> SubscriptionHandle {
        self.subscribe_listener(listener)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        FormControl::unsubscribe(self, handle)
    }
}

/// One widget's link to a [`BindingHost`].
///
/// Notifications are queued rather than handled inside the host's callback, so
/// a write made by the widget itself is seen only after the current transition
/// has finished. Echoes of the widget's own writes are dropped in the order
/// the writes were made.
///
/// Dropping the binding releases its subscription.
pub struct ValueBinding {
    host: Arc<dyn BindingHost>,
    subscription: Option<SubscriptionHandle>,
    inbox: Arc<SegQueue<ExternalValue>>,
    echoes: VecDeque<ExternalValue>,
}

impl ValueBinding {
    #[must_use]
    pub fn new(host: Arc<dyn BindingHost>) -> Self {
        Self {
            host,
            subscription: None,
            inbox: Arc::new(SegQueue::new()),
            echoes: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn host(&self) -> &Arc<dyn BindingHost> {
        &self.host
    }

    #[must_use]
    pub fn current_value(&self) -> ExternalValue {
        self.host.value()
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn subscribe(&mut self) -> Result<SubscriptionHandle, BindingError> {
        if self.subscription.is_some() {
            return Err(BindingError::AlreadySubscribed);
        }

        let inbox = self.inbox.clone();
        let handle = self.host.subscribe(Arc::new(move |value: &ExternalValue| {
            inbox.push(value.clone());
        }));
        self.subscription = Some(handle);
        Ok(handle)
    }

    /// Release the subscription and discard undelivered values.
    ///
    /// Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.host.unsubscribe(handle);
        }
        while self.inbox.pop().is_some() {}
        self.echoes.clear();
    }

    /// Write `value` to the host.
    pub fn push(&mut self, value: ExternalValue, options: SetValueOptions) {
        if options.emit_event && self.subscription.is_some() {
            self.echoes.push_back(value.clone());
        }
        self.host.set_value(value, options);
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.inbox.is_empty()
    }

    /// Drain queued notifications in delivery order, minus the echoes of our own writes.
    pub fn take_pending(&mut self) -> Vec<ExternalValue> {
        let mut pending = Vec::new();
        while let Some(value) = self.inbox.pop() {
            if self.echoes.front() == Some(&value) {
                self.echoes.pop_front();
                trace!(kind = value.kind(), "dropped echo of own write");
                continue;
            }
            pending.push(value);
        }
        pending
    }
}

impl Drop for ValueBinding {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for ValueBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueBinding")
            .field("subscription", &self.subscription)
            .field("pending", &self.inbox.len())
            .field("echoes", &self.echoes.len())
            .finish()
    }
}
