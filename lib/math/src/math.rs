use std::ops::RangeInclusive;

use num_traits::Float;
use rand::{Rng as _, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use self::vector::vec2;

pub mod vector {
    use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

    use serde::{Deserialize, Serialize};

    macro_rules! impl_vec2 {
        ($name:ident, $ty:ty) => {
            #[allow(non_camel_case_types)]
            #[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                pub x: $ty,
                pub y: $ty,
            }

            impl $name {
                pub const fn new(x: $ty, y: $ty) -> Self {
                    Self { x, y }
                }
            }

            impl Add for $name {
                type Output = Self;
                fn add(self, rhs: Self) -> Self {
                    Self::new(self.x + rhs.x, self.y + rhs.y)
                }
            }

            impl Sub for $name {
                type Output = Self;
                fn sub(self, rhs: Self) -> Self {
                    Self::new(self.x - rhs.x, self.y - rhs.y)
                }
            }

            impl Mul<$ty> for $name {
                type Output = Self;
                fn mul(self, rhs: $ty) -> Self {
                    Self::new(self.x * rhs, self.y * rhs)
                }
            }

            impl Div<$ty> for $name {
                type Output = Self;
                fn div(self, rhs: $ty) -> Self {
                    Self::new(self.x / rhs, self.y / rhs)
                }
            }

            impl Neg for $name {
                type Output = Self;
                fn neg(self) -> Self {
                    Self::new(-self.x, -self.y)
                }
            }

            impl AddAssign for $name {
                fn add_assign(&mut self, rhs: Self) {
                    self.x += rhs.x;
                    self.y += rhs.y;
                }
            }

            impl SubAssign for $name {
                fn sub_assign(&mut self, rhs: Self) {
                    self.x -= rhs.x;
                    self.y -= rhs.y;
                }
            }

            impl MulAssign<$ty> for $name {
                fn mul_assign(&mut self, rhs: $ty) {
                    self.x *= rhs;
                    self.y *= rhs;
                }
            }

            impl DivAssign<$ty> for $name {
                fn div_assign(&mut self, rhs: $ty) {
                    self.x /= rhs;
                    self.y /= rhs;
                }
            }
        };
    }

    impl_vec2!(vec2, f32);
    impl_vec2!(ivec2, i32);

    impl Eq for ivec2 {}
}

/// Rounds away from zero at .5, the way positions are snapped to the tile grid.
#[inline(always)]
pub fn round_to_int(f: f32) -> i32 {
    if f > 0.0 {
        (f + 0.5) as i32
    } else {
        (f - 0.5) as i32
    }
}

#[inline]
pub fn dot(a: &vec2, b: &vec2) -> f32 {
    a.x * b.x + a.y * b.y
}

#[inline]
pub fn length(a: &vec2) -> f32 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: &vec2, b: &vec2) -> f32 {
    length(&(*a - *b))
}

#[inline]
pub fn distance_squared(a: &vec2, b: &vec2) -> f32 {
    let d = *a - *b;
    dot(&d, &d)
}

/// Zero vectors stay zero instead of producing NaN.
pub fn normalize(a: &vec2) -> vec2 {
    let l = length(a);
    if l == 0.0 {
        return vec2::default();
    }
    *a / l
}

pub fn mix(a: &vec2, b: &vec2, amount: f32) -> vec2 {
    *a + (*b - *a) * amount
}

pub fn lerp(a: &vec2, b: &vec2, amount: f32) -> vec2 {
    mix(a, b, amount)
}

/// Angle of the vector in radians.
pub fn angle(a: &vec2) -> f32 {
    a.y.atan2(a.x)
}

pub fn direction(angle: f32) -> vec2 {
    vec2::new(angle.cos(), angle.sin())
}

pub fn sign<F: Float>(f: F) -> F {
    if f < F::zero() {
        -F::one()
    } else if f > F::zero() {
        F::one()
    } else {
        F::zero()
    }
}

/// Projects `target` onto the segment `line_pos0`..`line_pos1`, clamped to its ends.
/// Returns `false` only for a degenerate segment.
pub fn closest_point_on_line(
    line_pos0: &vec2,
    line_pos1: &vec2,
    target_pos: &vec2,
    out_pos: &mut vec2,
) -> bool {
    let ab = *line_pos1 - *line_pos0;
    let squared_len = dot(&ab, &ab);
    if squared_len > 0.0 {
        let ap = *target_pos - *line_pos0;
        let t = dot(&ap, &ab) / squared_len;
        *out_pos = *line_pos0 + ab * t.clamp(0.0, 1.0);
        true
    } else {
        *out_pos = *line_pos0;
        false
    }
}

/// Deterministic random source, seeded per world.
#[derive(Debug, Clone)]
pub struct Rng {
    rng: Xoshiro256PlusPlus,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// In `[0, 1)`.
    pub fn random_float(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    pub fn random_int_in(&mut self, range: RangeInclusive<u64>) -> u64 {
        self.rng.gen_range(range)
    }
}

#[cfg(test)]
mod test {
    use super::{closest_point_on_line, normalize, round_to_int, vector::vec2, Rng};

    #[test]
    fn rounding_is_symmetric() {
        assert_eq!(round_to_int(1.5), 2);
        assert_eq!(round_to_int(-1.5), -2);
        assert_eq!(round_to_int(0.49), 0);
    }

    #[test]
    fn normalize_zero() {
        assert_eq!(normalize(&vec2::default()), vec2::default());
    }

    #[test]
    fn closest_point() {
        let mut out = vec2::default();
        assert!(closest_point_on_line(
            &vec2::new(0.0, 0.0),
            &vec2::new(10.0, 0.0),
            &vec2::new(5.0, 3.0),
            &mut out
        ));
        assert_eq!(out, vec2::new(5.0, 0.0));
        assert!(closest_point_on_line(
            &vec2::new(0.0, 0.0),
            &vec2::new(10.0, 0.0),
            &vec2::new(-5.0, 3.0),
            &mut out
        ));
        assert_eq!(out, vec2::new(0.0, 0.0));
        assert!(!closest_point_on_line(
            &vec2::new(1.0, 1.0),
            &vec2::new(1.0, 1.0),
            &vec2::new(-5.0, 3.0),
            &mut out
        ));
    }

    #[test]
    fn vector_lives_next_to_the_helpers() {
        let v: crate::math::vector::vec2 = crate::math::direction(0.0);
        assert_eq!(crate::math::length(&v), 1.0);
    }

    #[test]
    fn rng_is_seeded() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..16 {
            assert_eq!(a.random_int_in(0..=100), b.random_int_in(0..=100));
        }
        let f = a.random_float();
        assert!((0.0..1.0).contains(&f));
    }
}
