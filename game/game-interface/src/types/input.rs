use serde::{Deserialize, Serialize};

/// Input counters (fire, next/prev weapon) wrap around at this mask.
pub const INPUT_STATE_MASK: i32 = 0x3f;

/// The raw per-tick player input, as received from the network.
///
/// `fire`, `next_weapon` and `prev_weapon` are counters: every press and every
/// release increments them, so an odd value means "held".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInput {
    pub direction: i32,
    pub target_x: i32,
    pub target_y: i32,
    pub jump: bool,
    pub fire: i32,
    pub hook: bool,
    /// `0` = no request, otherwise weapon index + 1
    pub wanted_weapon: i32,
    pub next_weapon: i32,
    pub prev_weapon: i32,
}

impl CharacterInput {
    /// It is not allowed to aim in the center.
    pub fn sanitize_target(&mut self) {
        if self.target_x == 0 && self.target_y == 0 {
            self.target_y = -1;
        }
    }

    pub fn fire_held(&self) -> bool {
        (self.fire & 1) != 0
    }

    /// Simulates releasing every button.
    pub fn reset(&mut self) {
        self.direction = 0;
        self.hook = false;
        if self.fire_held() {
            self.fire = self.fire.wrapping_add(1);
        }
        self.fire &= INPUT_STATE_MASK;
        self.jump = false;
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct InputCount {
    pub presses: i32,
    pub releases: i32,
}

impl InputCount {
    /// Counts the press and release edges between two input counter values,
    /// walking forward on the masked circle.
    pub fn count(prev: i32, cur: i32) -> Self {
        let mut c = Self::default();
        let prev = prev & INPUT_STATE_MASK;
        let cur = cur & INPUT_STATE_MASK;
        let mut i = prev;
        while i != cur {
            i = (i + 1) & INPUT_STATE_MASK;
            if (i & 1) != 0 {
                c.presses += 1;
            } else {
                c.releases += 1;
            }
        }
        c
    }
}

#[cfg(test)]
mod test {
    use super::{CharacterInput, InputCount, INPUT_STATE_MASK};

    #[test]
    fn count_press_edges() {
        assert_eq!(InputCount::count(0, 0).presses, 0);
        assert_eq!(InputCount::count(0, 1).presses, 1);
        assert_eq!(InputCount::count(0, 2), InputCount { presses: 1, releases: 1 });
        assert_eq!(InputCount::count(1, 4).presses, 1);
    }

    #[test]
    fn count_wraps_around_mask() {
        let c = InputCount::count(INPUT_STATE_MASK - 1, 1);
        assert_eq!(c.presses, 2);
        assert_eq!(c.releases, 1);
        // values outside the mask are folded first
        assert_eq!(InputCount::count(64, 65).presses, 1);
    }

    #[test]
    fn reset_survives_any_counter() {
        let mut inp = CharacterInput {
            fire: i32::MAX,
            ..Default::default()
        };
        inp.reset();
        assert!(!inp.fire_held());
        assert_eq!(inp.fire, i32::MIN & INPUT_STATE_MASK);
    }

    #[test]
    fn reset_releases_fire() {
        let mut inp = CharacterInput {
            direction: 1,
            fire: 3,
            jump: true,
            hook: true,
            ..Default::default()
        };
        inp.reset();
        assert_eq!(inp.fire, 4);
        assert!(!inp.fire_held());
        assert_eq!(inp.direction, 0);
        assert!(!inp.jump && !inp.hook);
    }
}
