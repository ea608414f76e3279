//! Scripted handle/watcher stubs for driving the dispatch engine from tests.

use bytes::Bytes;
use manifold::{
    ManifoldError, OptionValue, Readiness, Result, SendFlags, SocketHandle, SocketOption,
    ReadinessWatcher,
};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Shared scripted state inspected and mutated by tests.
#[derive(Default)]
pub struct StubState {
    /// Readiness the handle reports; tests set and clear bits directly.
    pub readiness: Readiness,
    /// Inbound parts as (payload, more) pairs, drained by recv.
    pub inbound: VecDeque<(Bytes, bool)>,
    /// MORE flag of the part most recently handed out.
    pub last_more: bool,
    /// Every send recorded as (payload, more-flag).
    pub sent: Vec<(Bytes, bool)>,
    /// Remaining successful sends before writability drops; None = unlimited.
    pub writable_budget: Option<usize>,
    /// Force send failures.
    pub fail_sends: bool,
    /// Force bind failures.
    pub fail_bind: bool,
    /// Connection usable flag.
    pub open: bool,
    /// Ordered log of lifecycle transitions across handle and watcher.
    pub log: Vec<String>,
    /// Option store backing set_option/option.
    pub options: HashMap<SocketOption, OptionValue>,
    /// Installed subscription filters.
    pub filters: Vec<Bytes>,
}

pub type SharedState = Rc<RefCell<StubState>>;

pub fn shared_state() -> SharedState {
    Rc::new(RefCell::new(StubState {
        open: true,
        ..StubState::default()
    }))
}

/// Stage a whole inbound message and mark the handle readable.
pub fn stage_inbound(state: &SharedState, parts: &[&[u8]]) {
    let mut state = state.borrow_mut();
    let last = parts.len().saturating_sub(1);
    for (i, part) in parts.iter().enumerate() {
        state
            .inbound
            .push_back((Bytes::copy_from_slice(part), i != last));
    }
    state.readiness = state.readiness.insert(Readiness::READABLE);
}

pub struct StubHandle {
    pub state: SharedState,
}

impl StubHandle {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl SocketHandle for StubHandle {
    fn send(&mut self, part: Bytes, flags: SendFlags) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_sends {
            return Err(ManifoldError::transport("send refused"));
        }
        state.sent.push((part, flags.has_more()));
        if let Some(budget) = state.writable_budget.as_mut() {
            *budget = budget.saturating_sub(1);
            if *budget == 0 {
                state.readiness = state.readiness.remove(Readiness::WRITABLE);
            }
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<Bytes> {
        let mut state = self.state.borrow_mut();
        let (payload, more) = state.inbound.pop_front().ok_or_else(|| {
            ManifoldError::transport("recv called with nothing staged")
        })?;
        state.last_more = more;
        if state.inbound.is_empty() {
            state.readiness = state.readiness.remove(Readiness::READABLE);
        }
        Ok(payload)
    }

    fn has_more(&self) -> bool {
        self.state.borrow().last_more
    }

    fn readiness(&self) -> Readiness {
        self.state.borrow().readiness
    }

    fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    fn bind(&mut self, endpoint: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push(format!("handle:bind {endpoint}"));
        if state.fail_bind {
            return Err(ManifoldError::transport("bind refused"));
        }
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> Result<()> {
        self.state
            .borrow_mut()
            .log
            .push(format!("handle:connect {endpoint}"));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.log.push("handle:close".to_string());
        Ok(())
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()> {
        self.state.borrow_mut().options.insert(option, value);
        Ok(())
    }

    fn option(&self, option: SocketOption) -> Result<OptionValue> {
        Ok(self
            .state
            .borrow()
            .options
            .get(&option)
            .cloned()
            .unwrap_or(OptionValue::Int(0)))
    }

    fn subscribe(&mut self, filter: &[u8]) -> Result<()> {
        self.state
            .borrow_mut()
            .filters
            .push(Bytes::copy_from_slice(filter));
        Ok(())
    }

    fn unsubscribe(&mut self, filter: &[u8]) -> Result<()> {
        self.state.borrow_mut().filters.retain(|f| f != filter);
        Ok(())
    }
}

pub struct StubWatcher {
    pub state: SharedState,
    active: bool,
}

impl StubWatcher {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            active: false,
        }
    }
}

impl ReadinessWatcher for StubWatcher {
    fn start(&mut self) {
        self.active = true;
        self.state.borrow_mut().log.push("watcher:start".to_string());
    }

    fn stop(&mut self) {
        self.active = false;
        self.state.borrow_mut().log.push("watcher:stop".to_string());
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
