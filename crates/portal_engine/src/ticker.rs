use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

use engine_logging::engine_trace;
use rand::Rng;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, Ticket};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerSpec {
    pub period: Duration,
    /// Upper bound (exclusive) of the random increment sent with each tick.
    pub max_step: f64,
}

/// Live progress tickers keyed by ticket. Owned by the engine thread.
#[derive(Default)]
pub struct TickerSet {
    tickers: HashMap<Ticket, CancellationToken>,
}

impl TickerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting a ticket that is already running replaces the old ticker.
    pub fn start(
        &mut self,
        runtime: &Handle,
        ticket: Ticket,
        spec: TickerSpec,
        events: mpsc::Sender<EngineEvent>,
    ) {
        let token = CancellationToken::new();
        if let Some(previous) = self.tickers.insert(ticket, token.clone()) {
            previous.cancel();
        }
        runtime.spawn(run_ticker(ticket, spec, token, events));
    }

    /// Returns false if the ticket was not running; stopping twice is fine.
    pub fn stop(&mut self, ticket: Ticket) -> bool {
        match self.tickers.remove(&ticket) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for (_, token) in self.tickers.drain() {
            token.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl Drop for TickerSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn run_ticker(
    ticket: Ticket,
    spec: TickerSpec,
    token: CancellationToken,
    events: mpsc::Sender<EngineEvent>,
) {
    let mut interval = tokio::time::interval(spec.period);
    // The first tick of an interval completes immediately.
    interval.tick().await;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let increment = random_step(spec.max_step);
                if events.send(EngineEvent::Tick { ticket, increment }).is_err() {
                    break;
                }
            }
        }
    }
    engine_trace!("Ticker {} finished", ticket);
}

fn random_step(max_step: f64) -> f64 {
    if max_step > 0.0 && max_step.is_finite() {
        rand::thread_rng().gen_range(0.0..max_step)
    } else {
        0.0
    }
}
