//! Identity allocation for unmatched remote records.

use std::ops::RangeInclusive;

use crate::error::{ReconcileError, Result};
use crate::models::IdentityId;

/// Hands out identity ids above every id already in use
#[derive(Debug, Clone)]
pub struct IdAllocator {
    max_in_use: Option<IdentityId>,
    issued: IdentityId,
}

impl IdAllocator {
    /// Allocator whose first id is `max_in_use + 1`, or 1 when no id is in use
    #[must_use]
    pub const fn after(max_in_use: Option<IdentityId>) -> Self {
        Self {
            max_in_use,
            issued: 0,
        }
    }

    fn first(&self) -> Option<IdentityId> {
        match self.max_in_use {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// Next free identity id
    ///
    /// # Errors
    ///
    /// Returns `IdentityExhausted` once the id space above the maximum is used up
    pub fn allocate(&mut self) -> Result<IdentityId> {
        let id = self
            .first()
            .and_then(|first| first.checked_add(self.issued))
            .ok_or_else(|| {
                ReconcileError::IdentityExhausted(
                    self.max_in_use.unwrap_or(0).saturating_add(self.issued),
                )
            })?;
        self.issued += 1;
        Ok(id)
    }

    /// Range of ids handed out so far, `None` when nothing was allocated
    #[must_use]
    pub fn allocated(&self) -> Option<RangeInclusive<IdentityId>> {
        if self.issued == 0 {
            return None;
        }
        let first = self.first()?;
        Some(first..=first + (self.issued - 1))
    }
}
