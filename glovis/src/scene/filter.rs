//! Per-scene visibility predicates.
//!
//! Each predicate owns one bit of a [`FilterFlags`] word. A set bit means
//! the scene fails that predicate; a scene is visible only while every bit
//! is clear.

use std::fmt;

/// One independent visibility predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterPredicate {
    /// Scene footprint lies outside the current viewport.
    Viewport,
    /// Cloud cover above the configured ceiling.
    CloudCover,
    /// Acquisition date outside the year/month window.
    DateRange,
    /// Not a member of the active scene list.
    SceneList,
    /// Worst quality digit below the configured floor.
    Quality,
    /// Data version differs from the selected one.
    DataVersion,
    /// Entity ID is on the hidden list.
    Hidden,
    /// Footprint misses the user-defined area.
    UserArea,
    /// Grid cell outside the column/row rectangle.
    GridRange,
    /// Scene cannot be downloaded while downloadable-only is on.
    Downloadable,
}

impl FilterPredicate {
    /// Every predicate, in bit order.
    pub const ALL: [FilterPredicate; 10] = [
        FilterPredicate::Viewport,
        FilterPredicate::CloudCover,
        FilterPredicate::DateRange,
        FilterPredicate::SceneList,
        FilterPredicate::Quality,
        FilterPredicate::DataVersion,
        FilterPredicate::Hidden,
        FilterPredicate::UserArea,
        FilterPredicate::GridRange,
        FilterPredicate::Downloadable,
    ];

    #[inline]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterPredicate::Viewport => "viewport",
            FilterPredicate::CloudCover => "cloud_cover",
            FilterPredicate::DateRange => "date_range",
            FilterPredicate::SceneList => "scene_list",
            FilterPredicate::Quality => "quality",
            FilterPredicate::DataVersion => "data_version",
            FilterPredicate::Hidden => "hidden",
            FilterPredicate::UserArea => "user_area",
            FilterPredicate::GridRange => "grid_range",
            FilterPredicate::Downloadable => "downloadable",
        }
    }
}

/// Bitmask of failed predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterFlags(u16);

impl FilterFlags {
    /// No predicate failing.
    pub const NONE: FilterFlags = FilterFlags(0);

    /// Every predicate failing; the state of a freshly copied scene.
    pub const ALL: FilterFlags = FilterFlags(0x03ff);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Mark a predicate as failing.
    #[inline]
    pub fn set(&mut self, predicate: FilterPredicate) {
        self.0 |= predicate.bit();
    }

    /// Mark a predicate as passing.
    #[inline]
    pub fn clear(&mut self, predicate: FilterPredicate) {
        self.0 &= !predicate.bit();
    }

    /// Set or clear a predicate from its evaluation.
    #[inline]
    pub fn update(&mut self, predicate: FilterPredicate, fails: bool) {
        if fails {
            self.set(predicate);
        } else {
            self.clear(predicate);
        }
    }

    #[inline]
    pub fn contains(self, predicate: FilterPredicate) -> bool {
        self.0 & predicate.bit() != 0
    }

    #[inline]
    pub fn is_visible(self) -> bool {
        self.0 == 0
    }

    /// Failing predicates, in bit order.
    pub fn failing(self) -> impl Iterator<Item = FilterPredicate> {
        FilterPredicate::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl fmt::Display for FilterFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_visible() {
            return write!(f, "visible");
        }
        let names: Vec<&str> = self.failing().map(FilterPredicate::name).collect();
        write!(f, "hidden by {}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_are_distinct() {
        let mut seen = 0u16;
        for p in FilterPredicate::ALL {
            assert_eq!(seen & p.bit(), 0, "{} shares a bit", p.name());
            seen |= p.bit();
        }
        assert_eq!(seen, FilterFlags::ALL.bits());
    }

    #[test]
    fn test_set_and_clear() {
        let mut flags = FilterFlags::NONE;
        assert!(flags.is_visible());

        flags.set(FilterPredicate::CloudCover);
        flags.set(FilterPredicate::Hidden);
        assert!(!flags.is_visible());

        flags.clear(FilterPredicate::CloudCover);
        assert!(!flags.is_visible(), "hidden bit still set");

        flags.clear(FilterPredicate::Hidden);
        assert!(flags.is_visible());
    }

    #[test]
    fn test_update() {
        let mut flags = FilterFlags::NONE;
        flags.update(FilterPredicate::Quality, true);
        assert!(flags.contains(FilterPredicate::Quality));
        flags.update(FilterPredicate::Quality, false);
        assert!(!flags.contains(FilterPredicate::Quality));
    }

    #[test]
    fn test_from_bits_masks_unknown_bits() {
        assert_eq!(FilterFlags::from_bits(0xffff), FilterFlags::ALL);
    }

    #[test]
    fn test_display() {
        let mut flags = FilterFlags::NONE;
        assert_eq!(flags.to_string(), "visible");
        flags.set(FilterPredicate::DateRange);
        flags.set(FilterPredicate::Downloadable);
        assert_eq!(flags.to_string(), "hidden by date_range,downloadable");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn predicate() -> impl Strategy<Value = FilterPredicate> {
            (0usize..FilterPredicate::ALL.len()).prop_map(|i| FilterPredicate::ALL[i])
        }

        proptest! {
            #[test]
            fn test_setting_one_bit_leaves_others(start in 0u16..0x0400, p in predicate()) {
                let before = FilterFlags::from_bits(start);
                let mut after = before;
                after.set(p);

                for other in FilterPredicate::ALL {
                    if other != p {
                        prop_assert_eq!(after.contains(other), before.contains(other));
                    }
                }
                prop_assert!(after.contains(p));
            }

            #[test]
            fn test_clearing_all_set_bits_restores_visibility(
                ops in proptest::collection::vec(predicate(), 0..20)
            ) {
                let mut flags = FilterFlags::NONE;
                for p in &ops {
                    flags.set(*p);
                }
                for p in &ops {
                    flags.clear(*p);
                }
                prop_assert!(flags.is_visible());
            }
        }
    }
}
