//! Pairing window controller
//!
//! A single time-boxed authorization window shared by all enrolment
//! requests. The window is coarse on purpose: the operator presses
//! "enable", powers on new hardware, and every device enrolling inside
//! the window is accepted. Expiry is evaluated lazily on each query, so
//! there is no background timer to race against concurrent requests.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// Shared pairing window state
pub struct PairingWindow {
    window: Duration,
    deadline: Mutex<Option<Instant>>,
}

impl PairingWindow {
    /// Create a closed pairing window with the given open duration
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: Mutex::new(None),
        }
    }

    /// Open duration of this window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Open the window for the full duration. Re-enabling an already open
    /// window re-arms the deadline.
    pub fn enable(&self) -> Duration {
        let mut deadline = self.deadline.lock().expect("pairing lock poisoned");
        *deadline = Some(Instant::now() + self.window);
        info!("Pairing enabled for {}s", self.window.as_secs());
        self.window
    }

    /// Close the window immediately (administrative override)
    pub fn disable(&self) {
        let mut deadline = self.deadline.lock().expect("pairing lock poisoned");
        if deadline.take().is_some() {
            info!("Pairing disabled");
        }
    }

    /// True iff the window is open and not yet expired. Observing an
    /// elapsed deadline clears it so later reads see a plain Closed state.
    pub fn is_authorized(&self) -> bool {
        let mut deadline = self.deadline.lock().expect("pairing lock poisoned");
        match *deadline {
            Some(expires_at) if Instant::now() < expires_at => true,
            Some(_) => {
                *deadline = None;
                false
            }
            None => false,
        }
    }

    /// Time left until expiry, if the window is open
    pub fn remaining(&self) -> Option<Duration> {
        let mut deadline = self.deadline.lock().expect("pairing lock poisoned");
        match *deadline {
            Some(expires_at) => {
                let now = Instant::now();
                if now < expires_at {
                    Some(expires_at - now)
                } else {
                    *deadline = None;
                    None
                }
            }
            None => None,
        }
    }
}
