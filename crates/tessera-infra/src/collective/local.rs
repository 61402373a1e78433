// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Ranks as threads of one process, connected by `flume` channels.
//!
//! Each rank owns an inbox; every rank holds a sender to every inbox. Each
//! collective call takes the next sequence number on the calling rank, so
//! ranks that enter the same operations in the same order tag them
//! identically. A message for a later operation that arrives early is parked
//! until the rank gets there; a message tagged with the current sequence but
//! the wrong operation means the ranks diverged.

use flume::{Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tessera_core::collective::{check_root, Collective};
use tessera_core::error::CollectiveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Broadcast,
    Gather,
    BarrierArrive,
    BarrierRelease,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::Broadcast => "broadcast",
            Op::Gather => "gather",
            Op::BarrierArrive | Op::BarrierRelease => "barrier",
        }
    }
}

enum Message {
    Data {
        seq: u64,
        op: Op,
        from: usize,
        payload: Vec<u8>,
    },
    Abort {
        reason: String,
    },
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Data { seq, op, from, .. } => {
                write!(f, "{} #{} from rank {}", op.name(), seq, from)
            }
            Message::Abort { reason } => write!(f, "abort ({reason})"),
        }
    }
}

/// Factory for a group of in-process ranks.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `world_size` connected ranks, indexed by rank.
    ///
    /// Every blocking receive gives up after `timeout`.
    pub fn create(world_size: usize, timeout: Duration) -> Vec<LocalCollective> {
        let world_size = world_size.max(1);
        let (senders, inboxes): (Vec<Sender<Message>>, Vec<Receiver<Message>>) =
            (0..world_size).map(|_| flume::unbounded()).unzip();
        let aborted = Arc::new(Mutex::new(None));
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalCollective {
                rank,
                peers: senders.clone(),
                inbox,
                parked: Mutex::new(Vec::new()),
                sequence: AtomicU64::new(0),
                timeout,
                aborted: aborted.clone(),
            })
            .collect()
    }
}

/// One rank of a [`LocalGroup`].
pub struct LocalCollective {
    rank: usize,
    peers: Vec<Sender<Message>>,
    inbox: Receiver<Message>,
    parked: Mutex<Vec<Message>>,
    sequence: AtomicU64,
    timeout: Duration,
    aborted: Arc<Mutex<Option<String>>>,
}

impl LocalCollective {
    fn begin(&self) -> Result<u64, CollectiveError> {
        if let Some(reason) = self.aborted.lock().expect("abort lock poisoned").as_ref() {
            return Err(CollectiveError::Aborted {
                reason: reason.clone(),
            });
        }
        Ok(self.sequence.fetch_add(1, Ordering::AcqRel) + 1)
    }

    fn send(&self, to: usize, seq: u64, op: Op, payload: Vec<u8>) -> Result<(), CollectiveError> {
        self.peers[to]
            .send(Message::Data {
                seq,
                op,
                from: self.rank,
                payload,
            })
            .map_err(|_| CollectiveError::Disconnected { rank: self.rank })
    }

    /// Receives the message tagged `(seq, op)`, optionally from a given rank.
    fn receive(&self, seq: u64, op: Op, from: Option<usize>) -> Result<(usize, Vec<u8>), CollectiveError> {
        let matches = |m: &Message| {
            matches!(m, Message::Data { seq: s, op: o, from: f, .. }
                if *s == seq && *o == op && from.map_or(true, |r| r == *f))
        };

        {
            let mut parked = self.parked.lock().expect("parked lock poisoned");
            if let Some(i) = parked.iter().position(matches) {
                if let Message::Data { from, payload, .. } = parked.swap_remove(i) {
                    return Ok((from, payload));
                }
            }
        }

        let started = Instant::now();
        let deadline = started + self.timeout;
        loop {
            let message = match self.inbox.recv_deadline(deadline) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CollectiveError::Timeout {
                        rank: self.rank,
                        operation: op.name(),
                        waited_ms: started.elapsed().as_millis() as u64,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CollectiveError::Disconnected { rank: self.rank })
                }
            };
            match message {
                Message::Data {
                    seq: s,
                    op: o,
                    from: f,
                    payload,
                } if s == seq && o == op && from.map_or(true, |r| r == f) => return Ok((f, payload)),
                Message::Abort { reason } => return Err(CollectiveError::Aborted { reason }),
                Message::Data { seq: s, .. } if s > seq => {
                    self.parked.lock().expect("parked lock poisoned").push(message);
                }
                Message::Data { seq: s, op: o, from: f, .. } => {
                    return Err(CollectiveError::Mismatch {
                        rank: self.rank,
                        expected: format!("{} #{}", op.name(), seq),
                        received: format!("{} #{} from rank {}", o.name(), s, f),
                    })
                }
            }
        }
    }
}

impl Collective for LocalCollective {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.peers.len()
    }

    fn broadcast(&self, payload: &[u8], root: usize) -> Result<Vec<u8>, CollectiveError> {
        check_root(root, self.world_size())?;
        let seq = self.begin()?;
        if self.rank == root {
            for to in (0..self.world_size()).filter(|&r| r != root) {
                self.send(to, seq, Op::Broadcast, payload.to_vec())?;
            }
            Ok(payload.to_vec())
        } else {
            self.receive(seq, Op::Broadcast, Some(root)).map(|(_, p)| p)
        }
    }

    fn gather(&self, payload: &[u8], root: usize) -> Result<Option<Vec<Vec<u8>>>, CollectiveError> {
        check_root(root, self.world_size())?;
        let seq = self.begin()?;
        if self.rank != root {
            self.send(root, seq, Op::Gather, payload.to_vec())?;
            return Ok(None);
        }

        let mut slots: Vec<Option<Vec<u8>>> = vec![None; self.world_size()];
        slots[root] = Some(payload.to_vec());
        for _ in 1..self.world_size() {
            let (from, data) = self.receive(seq, Op::Gather, None)?;
            if slots[from].replace(data).is_some() {
                return Err(CollectiveError::Mismatch {
                    rank: self.rank,
                    expected: format!("one gather #{seq} message per rank"),
                    received: format!("a second one from rank {from}"),
                });
            }
        }
        Ok(Some(slots.into_iter().flatten().collect()))
    }

    fn barrier(&self) -> Result<(), CollectiveError> {
        let seq = self.begin()?;
        if self.rank == 0 {
            for _ in 1..self.world_size() {
                self.receive(seq, Op::BarrierArrive, None)?;
            }
            for to in 1..self.world_size() {
                self.send(to, seq, Op::BarrierRelease, Vec::new())?;
            }
        } else {
            self.send(0, seq, Op::BarrierArrive, Vec::new())?;
            self.receive(seq, Op::BarrierRelease, Some(0))?;
        }
        Ok(())
    }

    fn abort(&self, reason: &str) {
        {
            let mut aborted = self.aborted.lock().expect("abort lock poisoned");
            if aborted.is_some() {
                return;
            }
            *aborted = Some(reason.to_string());
        }
        log::error!("LocalGroup: rank {} aborted the group: {}", self.rank, reason);
        for (to, peer) in self.peers.iter().enumerate() {
            if to != self.rank {
                let _ = peer.send(Message::Abort {
                    reason: reason.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn run_ranks<T, F>(world_size: usize, timeout: Duration, body: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(LocalCollective) -> T + Send + Sync + Clone + 'static,
    {
        let handles: Vec<_> = LocalGroup::create(world_size, timeout)
            .into_iter()
            .map(|rank| {
                let body = body.clone();
                thread::spawn(move || body(rank))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_broadcast_delivers_root_value() {
        let results = run_ranks(4, TIMEOUT, |group| {
            let mine = vec![group.rank() as u8];
            group.broadcast(&mine, 2).unwrap()
        });
        assert!(results.iter().all(|r| r == &vec![2_u8]));
    }

    #[test]
    fn test_gather_orders_by_rank() {
        let results = run_ranks(3, TIMEOUT, |group| {
            group.gather(&[group.rank() as u8 * 10], 0).unwrap()
        });
        assert_eq!(results[0], Some(vec![vec![0], vec![10], vec![20]]));
        assert_eq!(results[1], None);
    }

    #[test]
    fn test_consecutive_collectives_with_different_roots() {
        let results = run_ranks(4, TIMEOUT, |group| {
            let mut seen = Vec::new();
            for round in 0..20_u8 {
                let root = round as usize % 4;
                seen.extend(group.broadcast(&[round], root).unwrap());
                group.barrier().unwrap();
            }
            seen
        });
        let expected: Vec<u8> = (0..20).collect();
        assert!(results.iter().all(|r| r == &expected));
    }

    #[test]
    fn test_missing_participant_times_out() {
        let results = run_ranks(2, Duration::from_millis(100), |group| {
            if group.rank() == 0 {
                group.broadcast(&[1], 0).map(|_| ())
            } else {
                group.barrier()
            }
        });
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(CollectiveError::Mismatch { .. })
                | Err(CollectiveError::Timeout { .. })
                | Err(CollectiveError::Disconnected { .. })
        ));
    }

    #[test]
    fn test_abort_wakes_blocked_ranks() {
        let results = run_ranks(3, TIMEOUT, |group| {
            if group.rank() == 1 {
                group.abort("rank 1 failed");
                Err(CollectiveError::Aborted {
                    reason: "self".into(),
                })
            } else {
                group.barrier()
            }
        });
        for result in [&results[0], &results[2]] {
            assert!(matches!(result, Err(CollectiveError::Aborted { .. })));
        }
    }
}
