//! Turn-order dice.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

/// Faces on the turn-order die.
pub const DIE_FACES: u8 = 6;

/// Source of die rolls, injected so tests can fix the draw.
pub trait DieRoller: Send + Sync {
    /// A value in `1..=DIE_FACES`.
    fn roll(&self) -> u8;
}

/// Uniform rolls from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngDie;

impl DieRoller for ThreadRngDie {
    fn roll(&self) -> u8 {
        rand::thread_rng().gen_range(1..=DIE_FACES)
    }
}

/// Replays a fixed sequence, then repeats its last value.
#[derive(Debug)]
pub struct ScriptedDie {
    values: Mutex<VecDeque<u8>>,
    last: Mutex<u8>,
}

impl ScriptedDie {
    pub fn new(values: impl IntoIterator<Item = u8>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            last: Mutex::new(1),
        }
    }
}

impl DieRoller for ScriptedDie {
    fn roll(&self) -> u8 {
        let next = self.values.lock().ok().and_then(|mut v| v.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(value) = next {
            *last = value.clamp(1, DIE_FACES);
        }
        *last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_in_range() {
        let die = ThreadRngDie;
        for _ in 0..200 {
            let value = die.roll();
            assert!((1..=DIE_FACES).contains(&value));
        }
    }

    #[test]
    fn test_scripted_sequence() {
        let die = ScriptedDie::new([4, 4, 9]);
        assert_eq!(die.roll(), 4);
        assert_eq!(die.roll(), 4);
        assert_eq!(die.roll(), 6);
        assert_eq!(die.roll(), 6);
    }
}
