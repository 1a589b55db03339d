//! Wheel sector table and landing resolution
//!
//! Sectors are laid out clockwise from the wheel's 0° axis (3 o'clock when
//! unrotated). The pointer is fixed at the top of the wheel, which sits at
//! 270° in wheel space before any rotation is applied.

/// Pointer position in unrotated wheel space
pub const POINTER_ANGLE: f64 = 270.0;

const MINUTE_MS: i64 = 60 * 1000;

/// One slice of the fate wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelSector {
    /// Angular width in degrees
    pub width_degrees: u16,
    /// Signed change to the countdown end time (positive = penalty)
    pub delta_ms: i64,
    pub label: &'static str,
}

impl WheelSector {
    /// True if landing here removes time from the countdown
    pub fn is_reward(&self) -> bool {
        self.delta_ms < 0
    }
}

/// The wheel, in clockwise order. Four of seven sectors (and 245° of 360°)
/// add time.
pub const SECTORS: [WheelSector; 7] = [
    WheelSector { width_degrees: 75, delta_ms: 60 * MINUTE_MS, label: "+60 min" },
    WheelSector { width_degrees: 65, delta_ms: 30 * MINUTE_MS, label: "+30 min" },
    WheelSector { width_degrees: 55, delta_ms: 10 * MINUTE_MS, label: "+10 min" },
    WheelSector { width_degrees: 50, delta_ms: MINUTE_MS, label: "+1 min" },
    WheelSector { width_degrees: 45, delta_ms: -10 * MINUTE_MS, label: "-10 min" },
    WheelSector { width_degrees: 40, delta_ms: -30 * MINUTE_MS, label: "-30 min" },
    WheelSector { width_degrees: 30, delta_ms: -60 * MINUTE_MS, label: "-60 min" },
];

/// Angle on the wheel that sits under the pointer after rotating by
/// `rotation_deg` clockwise
pub fn pointer_angle(rotation_deg: f64) -> f64 {
    let rotation = rotation_deg.rem_euclid(360.0);
    (POINTER_ANGLE - rotation + 360.0).rem_euclid(360.0)
}

/// Index of the sector containing `angle_deg`, using half-open
/// `[start, start + width)` ranges
pub fn sector_at(angle_deg: f64) -> usize {
    let angle = angle_deg.rem_euclid(360.0);
    let mut start = 0.0;
    for (i, sector) in SECTORS.iter().enumerate() {
        let end = start + sector.width_degrees as f64;
        if angle >= start && angle < end {
            return i;
        }
        start = end;
    }
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    0
}

/// Sector under the pointer once the wheel stops at `rotation_deg`
pub fn sector_for_rotation(rotation_deg: f64) -> usize {
    sector_at(pointer_angle(rotation_deg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_widths_sum_to_full_turn() {
        let total: u32 = SECTORS.iter().map(|s| s.width_degrees as u32).sum();
        assert_eq!(total, 360);
    }

    #[test]
    fn test_wheel_is_biased_toward_penalties() {
        let penalties = SECTORS.iter().filter(|s| !s.is_reward()).count();
        let rewards = SECTORS.iter().filter(|s| s.is_reward()).count();
        assert!(penalties > rewards);
    }

    #[test]
    fn test_boundaries_belong_to_the_next_sector() {
        assert_eq!(sector_at(0.0), 0);
        assert_eq!(sector_at(74.999), 0);
        assert_eq!(sector_at(75.0), 1);
        assert_eq!(sector_at(140.0), 2);
        assert_eq!(sector_at(195.0), 3);
        assert_eq!(sector_at(245.0), 4);
        assert_eq!(sector_at(290.0), 5);
        assert_eq!(sector_at(330.0), 6);
        assert_eq!(sector_at(359.999), 6);
    }

    #[test]
    fn test_pointer_angle_unrotated_is_top() {
        assert_eq!(pointer_angle(0.0), 270.0);
        assert_eq!(pointer_angle(360.0 * 5.0), 270.0);
        assert_eq!(pointer_angle(90.0), 180.0);
        assert_eq!(pointer_angle(300.0), 330.0);
    }

    #[test]
    fn test_sector_for_rotation() {
        // Unrotated, the pointer reads 270° -> "-10 min"
        assert_eq!(sector_for_rotation(0.0), 4);
        // Rotate 100° clockwise -> pointer reads 170° -> "+10 min"
        assert_eq!(sector_for_rotation(1800.0 + 100.0), 2);
    }

    proptest! {
        #[test]
        fn prop_every_angle_maps_to_exactly_one_sector(angle in 0.0f64..360.0) {
            let mut start = 0.0;
            let mut hits = 0;
            for sector in SECTORS.iter() {
                let end = start + sector.width_degrees as f64;
                if angle >= start && angle < end {
                    hits += 1;
                }
                start = end;
            }
            prop_assert_eq!(hits, 1);
            let idx = sector_at(angle);
            prop_assert!(idx < SECTORS.len());
        }
    }
}
