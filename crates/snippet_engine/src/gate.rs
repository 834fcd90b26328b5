use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// Single-assignment completion shared by racing tasks.
///
/// Only the first [`CompletionGate::resolve`] delivers its value; later
/// calls are no-ops and return `false`.
#[derive(Debug)]
pub struct CompletionGate<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> CompletionGate<T> {
    pub fn new() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let gate = Arc::new(Self {
            sender: Mutex::new(Some(tx)),
        });
        (gate, rx)
    }

    /// Returns `true` when this call decided the outcome.
    pub fn resolve(&self, value: T) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => {
                // A dropped receiver still counts as resolved: nobody else may win.
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self.sender.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_resolution_wins() {
        let (gate, rx) = CompletionGate::new();
        assert!(!gate.is_resolved());
        assert!(gate.resolve("stdout"));
        assert!(!gate.resolve("timeout"));
        assert!(gate.is_resolved());
        assert_eq!(rx.await.unwrap(), "stdout");
    }

    #[tokio::test]
    async fn concurrent_resolvers_yield_exactly_one_winner() {
        let (gate, rx) = CompletionGate::new();
        let mut handles = Vec::new();
        for n in 0..32u32 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move { gate.resolve(n) }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(rx.await.unwrap() < 32);
    }
}
