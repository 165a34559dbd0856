//! Scripted collaborators for readiness tests.
//!
//! Each fake records what it was asked to do so tests can assert on the
//! exact sequence of hypervisor operations and notifications.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use vmdesk::error::CommandError;
use vmdesk::notify::{Notification, Notifier, Severity};
use vmdesk::preflight::GroupMembership;
use vmdesk::vm::{Hypervisor, NeighborTable, VmState};

pub const VM: &str = "RDPWindows";
pub const MAC: &str = "52:54:00:12:34:56";

fn rejected(op: &str) -> CommandError {
    CommandError::Exit {
        program: "virsh".into(),
        status: Some(1),
        stderr: format!("error: {op} refused"),
    }
}

// ---------------------------------------------------------------------------
// Hypervisor
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Domain {
    exists: bool,
    state: VmState,
    /// Reported by successive `domain_state` calls before `state` applies.
    script: VecDeque<VmState>,
    /// State a successful `start` leaves the domain in.
    after_start: VmState,
    failing: Vec<&'static str>,
    macs: Vec<String>,
    ops: Vec<&'static str>,
    state_queries: usize,
}

/// In-memory libvirt domain with scripted state transitions.
#[derive(Debug)]
pub struct FakeHypervisor {
    domain: RefCell<Domain>,
}

impl FakeHypervisor {
    pub fn new(state: VmState) -> Self {
        Self {
            domain: RefCell::new(Domain {
                exists: true,
                state,
                script: VecDeque::new(),
                after_start: VmState::Running,
                failing: Vec::new(),
                macs: vec![MAC.to_string()],
                ops: Vec::new(),
                state_queries: 0,
            }),
        }
    }

    pub fn absent() -> Self {
        let fake = Self::new(VmState::Absent);
        fake.domain.borrow_mut().exists = false;
        fake
    }

    /// States reported by the next `domain_state` calls, in order.
    pub fn then_report(self, states: impl IntoIterator<Item = VmState>) -> Self {
        self.domain.borrow_mut().script.extend(states);
        self
    }

    /// Make `op` ("start", "resume", "destroy") fail.
    pub fn failing(self, op: &'static str) -> Self {
        self.domain.borrow_mut().failing.push(op);
        self
    }

    pub fn start_lands_paused(self) -> Self {
        self.start_lands_in(VmState::Paused)
    }

    /// State a successful `start` leaves the domain in (default: running).
    pub fn start_lands_in(self, state: VmState) -> Self {
        self.domain.borrow_mut().after_start = state;
        self
    }

    pub fn without_macs(self) -> Self {
        self.domain.borrow_mut().macs.clear();
        self
    }

    /// Mutating operations issued so far.
    pub fn ops(&self) -> Vec<&'static str> {
        self.domain.borrow().ops.clone()
    }

    pub fn state_queries(&self) -> usize {
        self.domain.borrow().state_queries
    }

    pub fn current_state(&self) -> VmState {
        self.domain.borrow().state.clone()
    }

    fn apply(&self, op: &'static str, next: VmState) -> Result<(), CommandError> {
        let mut d = self.domain.borrow_mut();
        d.ops.push(op);
        if d.failing.contains(&op) {
            return Err(rejected(op));
        }
        d.script.clear();
        d.state = next;
        Ok(())
    }
}

impl Hypervisor for FakeHypervisor {
    async fn domain_names(&self) -> Result<Vec<String>, CommandError> {
        let d = self.domain.borrow();
        let mut names = vec!["other-vm".to_string()];
        if d.exists {
            names.push(VM.to_string());
        }
        Ok(names)
    }

    async fn domain_state(&self, _name: &str) -> Result<VmState, CommandError> {
        let mut d = self.domain.borrow_mut();
        d.state_queries += 1;
        if let Some(next) = d.script.pop_front() {
            d.state = next;
        }
        Ok(d.state.clone())
    }

    async fn start(&self, _name: &str) -> Result<(), CommandError> {
        let next = self.domain.borrow().after_start.clone();
        self.apply("start", next)
    }

    async fn resume(&self, _name: &str) -> Result<(), CommandError> {
        self.apply("resume", VmState::Running)
    }

    async fn destroy(&self, _name: &str) -> Result<(), CommandError> {
        self.apply("destroy", VmState::ShutOff)
    }

    async fn mac_addresses(&self, _name: &str) -> Result<Vec<String>, CommandError> {
        Ok(self.domain.borrow().macs.clone())
    }
}

// ---------------------------------------------------------------------------
// Neighbor table
// ---------------------------------------------------------------------------

/// Neighbor table that returns scripted snapshots, then `steady` forever.
#[derive(Debug, Default)]
pub struct FakeNeighbors {
    script: RefCell<VecDeque<String>>,
    steady: String,
    snapshots: RefCell<usize>,
}

impl FakeNeighbors {
    /// Never has an entry for the VM.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Has the VM at `ip` from the first snapshot on.
    pub fn with_entry(ip: &str) -> Self {
        Self {
            steady: entry(ip),
            ..Self::default()
        }
    }

    /// The VM shows up at `ip` on snapshot number `n` (1-based).
    pub fn entry_on_snapshot(n: usize, ip: &str) -> Self {
        let script = std::iter::repeat_n(String::new(), n - 1).collect();
        Self {
            script: RefCell::new(script),
            steady: entry(ip),
            snapshots: RefCell::new(0),
        }
    }

    pub fn snapshots(&self) -> usize {
        *self.snapshots.borrow()
    }
}

fn entry(ip: &str) -> String {
    format!("{ip} dev virbr0 lladdr {MAC} REACHABLE\n")
}

impl NeighborTable for FakeNeighbors {
    async fn snapshot(&self) -> Result<String, CommandError> {
        *self.snapshots.borrow_mut() += 1;
        Ok(self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.steady.clone()))
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.severity == Severity::Error)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.sent.borrow_mut().push(notification.clone());
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

pub struct FixedGroups(pub Vec<&'static str>);

impl FixedGroups {
    pub fn privileged() -> Self {
        Self(vec!["users", "libvirt", "kvm"])
    }
}

impl GroupMembership for FixedGroups {
    fn group_names(&self) -> io::Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}
