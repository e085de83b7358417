//! Order key assignment for insertions into an ordered list.

use crate::config::CardsConfig;
use crate::error::{BoardError, BoardResult};

/// Keys produced by [`OrderAssigner::assign_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPlan {
    /// Keys for the inserted tasks, in insertion order.
    pub inserted: Vec<i64>,
    /// `(sibling index, new key)` for every sibling whose key changed.
    pub renumbered: Vec<(usize, i64)>,
}

impl OrderPlan {
    /// Key of the first inserted task.
    #[must_use]
    pub fn first_key(&self) -> Option<i64> {
        self.inserted.first().copied()
    }
}

/// Computes order keys so that inserted tasks land at a target position.
///
/// Siblings are the destination list's keys in list order, without the tasks
/// being placed. Keyed siblings come before unkeyed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAssigner {
    gap: i64,
    renumber_step: usize,
}

impl Default for OrderAssigner {
    fn default() -> Self {
        Self::new(10, 1)
    }
}

impl OrderAssigner {
    /// Assigner with explicit spacing and window growth.
    #[must_use]
    pub const fn new(gap: i64, renumber_step: usize) -> Self {
        Self {
            gap: if gap > 0 { gap } else { 1 },
            renumber_step: if renumber_step > 0 { renumber_step } else { 1 },
        }
    }

    /// Assigner tuned by `cards.order_gap` and `cards.renumber_step`.
    #[must_use]
    pub const fn from_config(cards: &CardsConfig) -> Self {
        Self::new(cards.order_gap, cards.renumber_step)
    }

    /// Plan the insertion of a single task at `position`.
    ///
    /// # Errors
    /// Returns [`BoardError::OrderConflict`] when no key fits in `i64`.
    pub fn assign(&self, siblings: &[Option<i64>], position: usize) -> BoardResult<OrderPlan> {
        self.assign_many(siblings, position, 1)
    }

    /// Plan the insertion of `count` consecutive tasks starting at `position`.
    ///
    /// `position` is clamped to `siblings.len()`.
    ///
    /// # Errors
    /// Returns [`BoardError::OrderConflict`] when no increasing key sequence
    /// fits in `i64`.
    pub fn assign_many(
        &self,
        siblings: &[Option<i64>],
        position: usize,
        count: usize,
    ) -> BoardResult<OrderPlan> {
        if count == 0 {
            return Ok(OrderPlan::default());
        }
        let position = position.min(siblings.len());
        let mut keys = siblings.to_vec();

        // Placing after an unkeyed task: key the unkeyed run up to it first.
        if let Some(prev) = position.checked_sub(1)
            && keys[prev].is_none()
        {
            let first_unkeyed = keys[..position]
                .iter()
                .rposition(Option::is_some)
                .map_or(0, |idx| idx + 1);
            let base = first_unkeyed.checked_sub(1).and_then(|idx| keys[idx]);
            let run = self.spread(base, None, position - first_unkeyed)?.unwrap_or_default();
            for (idx, key) in (first_unkeyed..position).zip(run) {
                keys[idx] = Some(key);
            }
        }

        let lower = position.checked_sub(1).and_then(|idx| keys[idx]);
        let upper = keys.get(position).copied().flatten();
        let inserted = match self.spread(lower, upper, count)? {
            Some(inserted) => inserted,
            None => self.renumber_window(&mut keys, position, count)?,
        };

        let renumbered: Vec<(usize, i64)> = keys
            .iter()
            .zip(siblings)
            .enumerate()
            .filter_map(|(idx, (new, old))| match new {
                Some(key) if new != old => Some((idx, *key)),
                _ => None,
            })
            .collect();

        ensure_increasing(&keys, position, &inserted, &renumbered)?;
        Ok(OrderPlan {
            inserted,
            renumbered,
        })
    }

    // Grow a window of keyed siblings around `position` until its outer
    // bounds leave room for the window plus the inserted tasks.
    fn renumber_window(
        &self,
        keys: &mut [Option<i64>],
        position: usize,
        count: usize,
    ) -> BoardResult<Vec<i64>> {
        let mut lo = position.saturating_sub(1);
        let mut hi = (position + 1).min(keys.len());
        loop {
            let outer_lower = lo.checked_sub(1).and_then(|idx| keys[idx]);
            let outer_upper = keys.get(hi).copied().flatten();
            let slots = (hi - lo) + count;
            if let Some(spread) = self.spread(outer_lower, outer_upper, slots)? {
                let before = position - lo;
                for (idx, key) in (lo..position).zip(&spread[..before]) {
                    keys[idx] = Some(*key);
                }
                for (idx, key) in (position..hi).zip(&spread[before + count..]) {
                    keys[idx] = Some(*key);
                }
                tracing::debug!(from = lo, to = hi, "renumbered order keys");
                return Ok(spread[before..before + count].to_vec());
            }

            let next_lo = lo.saturating_sub(self.renumber_step);
            let mut next_hi = hi;
            for _ in 0..self.renumber_step {
                if keys.get(next_hi).copied().flatten().is_none() {
                    break;
                }
                next_hi += 1;
            }
            if next_lo == lo && next_hi == hi {
                return Err(BoardError::OrderConflict(format!(
                    "no room for {count} key(s) at position {position}"
                )));
            }
            lo = next_lo;
            hi = next_hi;
        }
    }

    // Keys for `slots` consecutive entries between the bounds, or `None` when
    // both bounds are set and too close.
    fn spread(
        &self,
        lower: Option<i64>,
        upper: Option<i64>,
        slots: usize,
    ) -> BoardResult<Option<Vec<i64>>> {
        let gap = i128::from(self.gap);
        let n = wide(slots);
        let raw: Vec<i128> = match (lower, upper) {
            (None, None) => (0..n).map(|j| gap * j).collect(),
            (Some(lower), None) => (1..=n).map(|j| i128::from(lower) + gap * j).collect(),
            (None, Some(upper)) => (0..n).map(|j| i128::from(upper) - gap * (n - j)).collect(),
            (Some(lower), Some(upper)) => {
                let width = i128::from(upper) - i128::from(lower);
                if width < n + 1 {
                    return Ok(None);
                }
                let step = width / (n + 1);
                (1..=n).map(|j| i128::from(lower) + step * j).collect()
            }
        };
        raw.into_iter()
            .map(|key| {
                i64::try_from(key)
                    .map_err(|_| BoardError::OrderConflict(format!("order key {key} overflows")))
            })
            .collect::<BoardResult<Vec<_>>>()
            .map(Some)
    }
}

fn wide(n: usize) -> i128 {
    i128::try_from(n).unwrap_or(i128::MAX)
}

fn ensure_increasing(
    keys: &[Option<i64>],
    position: usize,
    inserted: &[i64],
    renumbered: &[(usize, i64)],
) -> BoardResult<()> {
    let mut merged: Vec<(Option<i64>, bool)> = keys
        .iter()
        .enumerate()
        .map(|(idx, key)| (*key, renumbered.iter().any(|(changed, _)| *changed == idx)))
        .collect();
    merged.splice(
        position..position,
        inserted.iter().map(|key| (Some(*key), true)),
    );
    for pair in merged.windows(2) {
        let [(Some(a), a_changed), (Some(b), b_changed)] = pair else {
            continue;
        };
        if (*a_changed || *b_changed) && a >= b {
            return Err(BoardError::OrderConflict(format!(
                "order keys {a} and {b} are not increasing"
            )));
        }
    }
    Ok(())
}
