use std::{collections::VecDeque, fmt::Display};

use serde::{Deserialize, Serialize};

/// This represents the id of any kind of identifiable snapshot item
/// (projectiles, lasers, pickups, markers).
///
/// Ids are small integers, so the snapshot stays compact, and they are
/// recycled once the owning entity is gone long enough for every client
/// to have forgotten it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct IdGeneratorIdType(u32);

impl IdGeneratorIdType {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Display for IdGeneratorIdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A freed id is only handed out again after this many ticks.
pub const ID_REUSE_DELAY_TICKS: u64 = 50;

#[derive(Debug, Default)]
pub struct IdGenerator {
    cur_id: u32,
    /// ids in the order they were freed, with the tick they were freed at
    freed: VecDeque<(IdGeneratorIdType, u64)>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// generate the next id. Prefers recycled ids whose reuse delay expired.
    pub fn next_id<T: From<IdGeneratorIdType>>(&mut self, cur_tick: u64) -> T {
        if let Some((id, freed_at)) = self.freed.front().copied() {
            if freed_at + ID_REUSE_DELAY_TICKS <= cur_tick {
                self.freed.pop_front();
                return id.into();
            }
        }
        let id = IdGeneratorIdType(self.cur_id);
        self.cur_id += 1;
        id.into()
    }

    pub fn free_id(&mut self, id: IdGeneratorIdType, cur_tick: u64) {
        self.freed.push_back((id, cur_tick));
    }

    /// Amount of ids ever handed out, recycled ones not counted twice.
    #[must_use]
    pub fn peek_next_id(&self) -> IdGeneratorIdType {
        IdGeneratorIdType(self.cur_id)
    }
}

#[cfg(test)]
mod test {
    use super::{IdGenerator, IdGeneratorIdType, ID_REUSE_DELAY_TICKS};

    #[test]
    fn recycles_after_delay() {
        let mut gen = IdGenerator::new();
        let a: IdGeneratorIdType = gen.next_id(0);
        let b: IdGeneratorIdType = gen.next_id(0);
        assert_ne!(a, b);
        gen.free_id(a, 10);
        let c: IdGeneratorIdType = gen.next_id(11);
        assert_ne!(c, a);
        let d: IdGeneratorIdType = gen.next_id(10 + ID_REUSE_DELAY_TICKS);
        assert_eq!(d, a);
    }
}
