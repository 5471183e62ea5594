use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

/// Ensures that only one execution of a named operation runs at a time.
///
/// The first caller to find the gate idle becomes the leader and runs the
/// action; callers arriving while it runs are enqueued and resumed, in FIFO
/// order, with a clone of the leader's result once it completes. A failed
/// action is broadcast the same way and leaves the gate idle, so the next
/// caller retries the operation fresh.
pub struct SingleFlightGate<T> {
    name: &'static str,
    state: Mutex<FlightState<T>>,
}

struct FlightState<T> {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<T>>,
}

impl<T: Clone> SingleFlightGate<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(FlightState {
                in_flight: false,
                waiters: VecDeque::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn run<F, Fut>(&self, action: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut action = Some(action);
        loop {
            let waiter = {
                let mut state = self.state.lock().expect("gate state poisoned");
                if state.in_flight {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push_back(tx);
                    Some(rx)
                } else {
                    state.in_flight = true;
                    None
                }
            };

            let Some(rx) = waiter else {
                debug!(gate = self.name, "flight.lead");
                // The action is taken at most once: leading returns below.
                let action = action.take().expect("gate action already consumed");
                let mut reset = FlightReset::arm(&self.state);
                let result = action().await;
                let waiters = {
                    let mut state = self.state.lock().expect("gate state poisoned");
                    state.in_flight = false;
                    std::mem::take(&mut state.waiters)
                };
                reset.disarm();
                let resumed = waiters.len();
                for tx in waiters {
                    let _ = tx.send(result.clone());
                }
                debug!(gate = self.name, waiters = resumed, "flight.broadcast");
                return result;
            };

            debug!(gate = self.name, "flight.join");
            match rx.await {
                Ok(result) => return result,
                // The leader's future was dropped before broadcasting;
                // contend for leadership again instead of hanging.
                Err(_) => continue,
            }
        }
    }
}

/// Clears in-flight state if the leader's future is dropped mid-action, so
/// enqueued waiters observe a closed channel and re-contend.
struct FlightReset<'a, T> {
    state: &'a Mutex<FlightState<T>>,
    armed: bool,
}

impl<'a, T> FlightReset<'a, T> {
    fn arm(state: &'a Mutex<FlightState<T>>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T> Drop for FlightReset<'_, T> {
    fn drop(&mut self) {
        if self.armed
            && let Ok(mut state) = self.state.lock()
        {
            state.in_flight = false;
            state.waiters.clear();
        }
    }
}
