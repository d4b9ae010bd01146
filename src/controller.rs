/// Debounced change controller
///
/// Sits between the interaction surface and the UDP link. Decides on every
/// parameter edit whether to transmit now (auto-send, subject to a 200 ms
/// per-channel debounce window) or to store only, and runs the multi-step
/// "send all" / "send advanced" sequences as scheduled steps with 100 ms
/// gaps. The gaps exist because the firmware is a single-threaded text
/// receiver that needs breathing room between commands; they are queued
/// steps drained by the UI tick, never thread-blocking sleeps.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::params::ParamStore;
use crate::protocol::Command;
use crate::robot_link::{ConnectionState, RobotLink, SendError};

/// Minimum spacing between auto-transmissions on one control surface.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);
/// Gap between consecutive datagrams of a multi-step sequence.
pub const SEQUENCE_GAP: Duration = Duration::from_millis(100);

/// Which tab the edit or send button belongs to: one of the three stage tabs
/// or the advanced-parameters tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabContext {
    /// Stage number 1..=3
    Stage(u8),
    Advanced,
}

impl TabContext {
    /// Debounce channel slot. Each tab has its own last-send timestamp.
    fn channel(self) -> usize {
        match self {
            TabContext::Stage(n) => (n - 1) as usize,
            TabContext::Advanced => 3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SendStep {
    Stage(u8),
    Smoothing,
    Offset,
}

#[derive(Debug)]
struct QueuedStep {
    due: Instant,
    step: SendStep,
}

pub struct TunerController {
    pub store: ParamStore,
    pub link: RobotLink,
    pub auto_send: bool,
    /// Last time the debounce gate opened, per channel (3 stages + advanced).
    last_gate: [Option<Instant>; 4],
    /// Pending scheduled sends; non-empty means a sequence is in flight.
    queue: VecDeque<QueuedStep>,
    /// Whether to announce completion once the queue drains (set by send-all).
    announce_drain: bool,
    /// Status lines for the surface to drain and display.
    status: VecDeque<String>,
}

impl TunerController {
    pub fn new(link: RobotLink) -> Self {
        Self {
            store: ParamStore::default(),
            link,
            auto_send: false,
            last_gate: [None; 4],
            queue: VecDeque::new(),
            announce_drain: false,
            status: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.link.state
    }

    fn note(&mut self, msg: impl Into<String>) {
        self.status.push_back(msg.into());
    }

    /// Take all status lines produced since the last drain.
    pub fn drain_status(&mut self) -> Vec<String> {
        self.status.drain(..).collect()
    }

    pub fn pending_sends(&self) -> bool {
        !self.queue.is_empty()
    }

    /// When the next queued step is due, for repaint scheduling.
    pub fn next_due(&self) -> Option<Instant> {
        self.queue.front().map(|q| q.due)
    }

    /// Update the target host and fire a STATUS probe. Success only means the
    /// local send worked - there is no acknowledgment from the robot.
    pub fn test_connection(&mut self, host: &str) -> Result<(), SendError> {
        match self.link.test_connection(host) {
            Ok(()) => {
                let line = format!("✓ Connected to {}:{}", self.link.host, self.link.port);
                self.note(line);
                self.note("✓ Ready to send parameters");
                Ok(())
            }
            Err(e) => {
                self.note(format!("✗ Connection failed: {}", e));
                Err(e)
            }
        }
    }

    /// A parameter on the given tab was edited. With auto-send off this is a
    /// no-op (the value already lives in the store). With auto-send on, the
    /// context is transmitted immediately if the channel's debounce window
    /// has elapsed; otherwise the edit is dropped for transmission purposes.
    /// The gate consumes the window even if the send then fails, so a
    /// disconnected slider drag retries at most once per window, not per
    /// frame.
    pub fn param_edited(&mut self, ctx: TabContext, now: Instant) {
        if !self.auto_send {
            return;
        }
        let ch = ctx.channel();
        let open = match self.last_gate[ch] {
            Some(t) => now.duration_since(t) >= DEBOUNCE_WINDOW,
            None => true,
        };
        if open {
            self.last_gate[ch] = Some(now);
            let _ = self.send_context(ctx, now);
        }
    }

    /// Explicit "send current stage" for whichever tab is active.
    pub fn send_context(&mut self, ctx: TabContext, now: Instant) -> Result<(), SendError> {
        match ctx {
            TabContext::Stage(n) => self.send_stage(n),
            TabContext::Advanced => self.send_advanced(now),
        }
    }

    pub fn send_stage(&mut self, n: u8) -> Result<(), SendError> {
        self.fire_step(SendStep::Stage(n)).map_err(|e| {
            self.report_send_error(&format!("Stage {}", n), &e);
            e
        })
    }

    /// Schedule SMOOTH then OFFSET with one sequence gap between them.
    pub fn send_advanced(&mut self, now: Instant) -> Result<(), SendError> {
        if self.state() != ConnectionState::Connected {
            let e = SendError::NotConnected;
            self.report_send_error("advanced parameters", &e);
            return Err(e);
        }
        self.enqueue_sequence(now, &[SendStep::Smoothing, SendStep::Offset]);
        self.tick(now);
        Ok(())
    }

    /// Append a sequence, keeping at least one gap after whatever is already
    /// queued so overlapping requests never collapse the inter-command
    /// spacing the firmware needs.
    fn enqueue_sequence(&mut self, now: Instant, steps: &[SendStep]) {
        let mut due = match self.queue.back() {
            Some(last) => std::cmp::max(now, last.due + SEQUENCE_GAP),
            None => now,
        };
        for &step in steps {
            self.queue.push_back(QueuedStep { due, step });
            due += SEQUENCE_GAP;
        }
    }

    /// Schedule the full parameter set: S1, S2, S3, SMOOTH, OFFSET, in that
    /// order with one sequence gap between consecutive datagrams. Values are
    /// read from the store when each step fires.
    pub fn send_all(&mut self, now: Instant) -> Result<(), SendError> {
        if self.state() != ConnectionState::Connected {
            let e = SendError::NotConnected;
            self.report_send_error("all parameters", &e);
            return Err(e);
        }
        self.enqueue_sequence(
            now,
            &[
                SendStep::Stage(1),
                SendStep::Stage(2),
                SendStep::Stage(3),
                SendStep::Smoothing,
                SendStep::Offset,
            ],
        );
        self.announce_drain = true;
        self.tick(now);
        Ok(())
    }

    /// Fire every queued step that has come due. A failure aborts the rest of
    /// the sequence; already-sent steps stay sent (partial application is
    /// visible on the robot and permanent).
    pub fn tick(&mut self, now: Instant) {
        while let Some(front) = self.queue.front() {
            if front.due > now {
                return;
            }
            let step = self.queue.pop_front().map(|q| q.step).unwrap();
            if let Err(e) = self.fire_step(step) {
                let what = match step {
                    SendStep::Stage(n) => format!("Stage {}", n),
                    SendStep::Smoothing => "smoothing".to_string(),
                    SendStep::Offset => "offset".to_string(),
                };
                self.report_send_error(&what, &e);
                self.queue.clear();
                self.announce_drain = false;
                return;
            }
        }
        if self.announce_drain {
            self.announce_drain = false;
            self.note("✓ All parameters sent! Robot should be ready to balance.");
        }
    }

    /// Restore defaults and clear the sent flags. If auto-send is on and the
    /// link believes it is connected, push the fresh defaults right away.
    pub fn reset(&mut self, now: Instant) {
        self.store.reset();
        self.note("↻ Reset to defaults");
        if self.auto_send && self.state() == ConnectionState::Connected {
            let _ = self.send_all(now);
        }
    }

    pub fn set_auto_send(&mut self, on: bool) {
        self.auto_send = on;
        self.note(if on { "🔄 Auto-send enabled" } else { "⏸ Auto-send disabled" });
    }

    fn fire_step(&mut self, step: SendStep) -> Result<(), SendError> {
        let cmd = match step {
            SendStep::Stage(n) => {
                let g = self.store.stage_gains(n);
                Command::StageGains { stage: n, k1: g.k1, k2: g.k2 }
            }
            SendStep::Smoothing => Command::Smoothing(self.store.smoothing),
            SendStep::Offset => Command::Offset(self.store.offset),
        };
        self.link.send(&cmd)?;
        match step {
            SendStep::Stage(n) => {
                let g = self.store.stage_gains(n);
                self.store.mark_sent(n);
                self.note(format!("→ Stage {}: K1={:.3}, K2={:.3}", n, g.k1, g.k2));
            }
            SendStep::Smoothing => {
                let v = self.store.smoothing;
                self.note(format!("→ Smoothing={:.3}", v));
            }
            SendStep::Offset => {
                let v = self.store.offset;
                self.note(format!("→ Offset={:.3}", v));
            }
        }
        Ok(())
    }

    fn report_send_error(&mut self, what: &str, e: &SendError) {
        match e {
            SendError::NotConnected => {
                self.note("✗ Not connected - test connection first");
            }
            SendError::Transport(_) => {
                self.note(format!("✗ Failed to send {}: {}", what, e));
            }
        }
    }
}
