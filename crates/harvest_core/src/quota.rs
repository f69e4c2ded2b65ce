use crate::batch::{Batch, Entry};

const BYTES_PER_MB: u64 = 1_000_000;

/// How a cycle's collection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaStatus {
    /// Collected the requested number of articles.
    Met,
    /// Ran out of attempts first.
    Unreachable { collected: usize, target: usize },
    /// The next article would have pushed the batch past its byte budget.
    BudgetReached { collected: usize, target: usize },
}

/// Per-cycle counters: accepted articles against the target, draws against the cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleQuota {
    target: usize,
    max_attempts: usize,
    attempts: usize,
    accepted: usize,
}

impl CycleQuota {
    pub fn new(target: usize, max_attempts: usize) -> Self {
        Self {
            target,
            max_attempts,
            attempts: 0,
            accepted: 0,
        }
    }

    /// Claims one attempt. Returns `false` once the attempt cap is used up.
    pub fn begin_attempt(&mut self) -> bool {
        if self.attempts >= self.max_attempts {
            return false;
        }
        self.attempts += 1;
        true
    }

    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn is_met(&self) -> bool {
        self.accepted >= self.target
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn status(&self) -> QuotaStatus {
        if self.is_met() {
            QuotaStatus::Met
        } else {
            QuotaStatus::Unreachable {
                collected: self.accepted,
                target: self.target,
            }
        }
    }

    pub fn budget_reached(&self) -> QuotaStatus {
        QuotaStatus::BudgetReached {
            collected: self.accepted,
            target: self.target,
        }
    }
}

/// Upper bound on the encoded size of one batch. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteBudget {
    limit: Option<u64>,
}

impl ByteBudget {
    pub fn unbounded() -> Self {
        Self { limit: None }
    }

    /// Decimal megabytes; `0` disables the budget.
    pub fn from_megabytes(mb: u64) -> Self {
        if mb == 0 {
            return Self::unbounded();
        }
        Self {
            limit: Some(mb.saturating_mul(BYTES_PER_MB)),
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// An empty batch admits anything so a single oversized article still lands.
    pub fn admits(&self, batch: &Batch, entry: &Entry) -> bool {
        match self.limit {
            None => true,
            Some(_) if batch.is_empty() => true,
            Some(limit) => batch.byte_len() + entry.encoded_len() <= limit,
        }
    }
}
