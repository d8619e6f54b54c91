/// Phrases cycled by the counter.
pub const DHIKR: [&str; 3] = ["سبحان الله", "الحمد لله", "الله أكبر"];

/// Beads per phrase. Reaching it moves on to the next phrase.
pub const ROUND: u32 = 33;

/// Dhikr counter shown on the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasbihCounter {
    count: u32,
    total: u32,
    phrase: usize,
}

impl Default for TasbihCounter {
    fn default() -> Self {
        Self {
            count: 1,
            total: 0,
            phrase: 0,
        }
    }
}

impl TasbihCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self) {
        self.total += 1;
        self.count += 1;
        if self.count >= ROUND {
            self.phrase = (self.phrase + 1) % DHIKR.len();
            self.count = 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn phrase(&self) -> &'static str {
        DHIKR[self.phrase]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_a_round_and_advances_the_phrase() {
        let mut counter = TasbihCounter::new();
        for _ in 0..31 {
            counter.increment();
        }
        assert_eq!(counter.count(), 32);
        assert_eq!(counter.phrase(), DHIKR[0]);

        counter.increment();
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.total(), 32);
        assert_eq!(counter.phrase(), DHIKR[1]);
    }

    #[test]
    fn phrases_cycle_back_to_the_first() {
        let mut counter = TasbihCounter::new();
        for _ in 0..(32 * 3) {
            counter.increment();
        }
        assert_eq!(counter.phrase(), DHIKR[0]);
        assert_eq!(counter.total(), 96);
    }

    #[test]
    fn reset_restores_the_start() {
        let mut counter = TasbihCounter::new();
        counter.increment();
        counter.reset();
        assert_eq!(counter, TasbihCounter::new());
    }
}
