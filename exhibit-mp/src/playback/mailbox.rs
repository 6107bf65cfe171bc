//! Single-slot request mailbox
//!
//! Producers (console and controller handlers) hand a request to the
//! scheduler through a mailbox. Only the most recent undrained value is kept:
//! if two producers submit before the scheduler drains, the earlier request
//! is lost. The lock is held for a value copy only, never across I/O.

use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct Mailbox<T> {
    /// `Some` doubles as the dirty flag
    slot: Mutex<Option<T>>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store `value`, replacing any undrained request
    pub fn submit(&self, value: T) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(value);
    }

    /// Take the pending request, if any. Scheduler only.
    pub fn drain(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_empty() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        assert_eq!(mailbox.drain(), None);
    }

    #[test]
    fn test_drain_clears() {
        let mailbox = Mailbox::new();
        mailbox.submit(3);
        assert_eq!(mailbox.drain(), Some(3));
        assert_eq!(mailbox.drain(), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let mailbox = Mailbox::new();
        mailbox.submit(1);
        mailbox.submit(2);
        assert_eq!(mailbox.drain(), Some(2));
        assert_eq!(mailbox.drain(), None);
    }

    #[test]
    fn test_concurrent_producers_leave_one_value() {
        let mailbox = Arc::new(Mailbox::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    for j in 0..100 {
                        mailbox.submit(i * 100 + j);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = mailbox.drain().expect("one value survives");
        assert_eq!(value % 100, 99, "survivor is some producer's last write");
        assert_eq!(mailbox.drain(), None);
    }
}
