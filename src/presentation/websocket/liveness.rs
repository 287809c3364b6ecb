//! Liveness Monitor
//!
//! Heartbeat state machine for one connection. The session loop owns the
//! actual timers and feeds their events in here; the monitor only decides.
//!
//! ```text
//!   ALIVE --tick--> AWAITING_PONG --pong--> ALIVE
//!                        |
//!                 death timer fires
//!                        v
//!                      DEAD   (also reached from any state on transport close)
//! ```

use std::time::Duration;

use crate::config::WebSocketSettings;

/// Heartbeat timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Period of the repeating ping timer
    pub heartbeat_interval: Duration,
    /// How long a ping may go unanswered
    pub pong_timeout: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            pong_timeout: Duration::from_secs(1),
        }
    }
}

impl From<&WebSocketSettings> for LivenessConfig {
    fn from(settings: &WebSocketSettings) -> Self {
        Self {
            heartbeat_interval: settings.heartbeat_interval(),
            pong_timeout: settings.pong_timeout(),
        }
    }
}

impl LivenessConfig {
    /// Longest a silent connection can stay registered
    pub fn worst_case_staleness(&self) -> Duration {
        self.heartbeat_interval + self.pong_timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Alive,
    AwaitingPong,
    Dead,
}

/// What the session loop should do after a heartbeat tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a ping; arm the death timer if `arm_death_timer`
    SendPing { arm_death_timer: bool },
    None,
}

#[derive(Debug)]
pub struct LivenessMonitor {
    state: LivenessState,
    pings_sent: u64,
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessMonitor {
    pub fn new() -> Self {
        Self {
            state: LivenessState::Alive,
            pings_sent: 0,
        }
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == LivenessState::Dead
    }

    pub fn pings_sent(&self) -> u64 {
        self.pings_sent
    }

    /// Heartbeat timer fired
    pub fn on_heartbeat(&mut self) -> HeartbeatAction {
        match self.state {
            LivenessState::Alive => {
                self.state = LivenessState::AwaitingPong;
                self.pings_sent += 1;
                HeartbeatAction::SendPing {
                    arm_death_timer: true,
                }
            }
            // Re-ping, but the deadline from the first unanswered ping stands
            LivenessState::AwaitingPong => {
                self.pings_sent += 1;
                HeartbeatAction::SendPing {
                    arm_death_timer: false,
                }
            }
            LivenessState::Dead => HeartbeatAction::None,
        }
    }

    /// Pong received. Returns true when the death timer must be cancelled.
    pub fn on_pong(&mut self) -> bool {
        match self.state {
            LivenessState::AwaitingPong => {
                self.state = LivenessState::Alive;
                true
            }
            // unsolicited pong
            LivenessState::Alive | LivenessState::Dead => false,
        }
    }

    /// Death timer fired
    pub fn on_death_timeout(&mut self) {
        self.state = LivenessState::Dead;
    }

    /// Peer closed or the transport failed
    pub fn on_transport_closed(&mut self) {
        self.state = LivenessState::Dead;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_pong_cycle() {
        let mut monitor = LivenessMonitor::new();
        assert_eq!(monitor.state(), LivenessState::Alive);

        assert_eq!(
            monitor.on_heartbeat(),
            HeartbeatAction::SendPing {
                arm_death_timer: true
            }
        );
        assert_eq!(monitor.state(), LivenessState::AwaitingPong);

        assert!(monitor.on_pong());
        assert_eq!(monitor.state(), LivenessState::Alive);
    }

    #[test]
    fn test_unsolicited_pong_is_ignored() {
        let mut monitor = LivenessMonitor::new();
        assert!(!monitor.on_pong());
        assert_eq!(monitor.state(), LivenessState::Alive);
    }

    #[test]
    fn test_second_tick_keeps_existing_deadline() {
        let mut monitor = LivenessMonitor::new();
        monitor.on_heartbeat();
        assert_eq!(
            monitor.on_heartbeat(),
            HeartbeatAction::SendPing {
                arm_death_timer: false
            }
        );
        assert_eq!(monitor.pings_sent(), 2);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut monitor = LivenessMonitor::new();
        monitor.on_heartbeat();
        monitor.on_death_timeout();
        assert!(monitor.is_dead());

        assert_eq!(monitor.on_heartbeat(), HeartbeatAction::None);
        assert!(!monitor.on_pong());
        assert!(monitor.is_dead());
    }

    #[test]
    fn test_transport_close_from_any_state() {
        let mut alive = LivenessMonitor::new();
        alive.on_transport_closed();
        assert!(alive.is_dead());

        let mut waiting = LivenessMonitor::new();
        waiting.on_heartbeat();
        waiting.on_transport_closed();
        assert!(waiting.is_dead());
    }

    #[test]
    fn test_default_staleness() {
        assert_eq!(
            LivenessConfig::default().worst_case_staleness(),
            Duration::from_secs(6)
        );
    }
}
