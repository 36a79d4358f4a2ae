//! Phase model — the ordered dispatch groups of the frame lifecycle.
//!
//! A [`Phase`] is just an index. Phases are dispatched in ascending order,
//! and the world lifecycle is:
//!
//! - [`Phase::ON_START`] (0), dispatched exactly once
//! - the game loop — every registered phase strictly between the anchors,
//!   swept repeatedly until quit is signaled
//! - [`Phase::ON_END`] (`u64::MAX`), dispatched exactly once
//!
//! The named anchors between `ON_START` and `ON_END` are evenly spaced so
//! callers can slot their own phases in between; see [`Phase::offset`].

/// An ordered dispatch group in the per-frame lifecycle.
///
/// Carries no state beyond its position: it is a sort key and a grouping
/// key for registered actions and systems, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Phase(pub u64);

impl Phase {
    /// Dispatched once, before the game loop.
    pub const ON_START: Self = Self(0);
    /// First anchor of the game loop.
    pub const PRE_FRAME: Self = Self(100);
    /// Asset and input intake.
    pub const ON_LOAD: Self = Self(200);
    /// Reactions to freshly loaded data.
    pub const POST_LOAD: Self = Self(300);
    /// Preparation before the main update.
    pub const PRE_UPDATE: Self = Self(400);
    /// The main update — where most game logic lives.
    pub const ON_UPDATE: Self = Self(500);
    /// Consistency checks over the updated state.
    pub const ON_VALIDATE: Self = Self(600);
    /// Reactions to the main update.
    pub const POST_UPDATE: Self = Self(700);
    /// Preparation before persisting state.
    pub const PRE_STORE: Self = Self(800);
    /// State persistence.
    pub const ON_STORE: Self = Self(900);
    /// Last anchor of the game loop.
    pub const POST_FRAME: Self = Self(1000);
    /// Dispatched once, after the game loop.
    pub const ON_END: Self = Self(u64::MAX);

    /// Anchors in descending order, for [`Display`](std::fmt::Display)
    /// bucketing. `ON_END` is handled separately.
    const ANCHORS: [(Phase, &'static str); 11] = [
        (Self::POST_FRAME, "PostFrame"),
        (Self::ON_STORE, "OnStore"),
        (Self::PRE_STORE, "PreStore"),
        (Self::POST_UPDATE, "PostUpdate"),
        (Self::ON_VALIDATE, "OnValidate"),
        (Self::ON_UPDATE, "OnUpdate"),
        (Self::PRE_UPDATE, "PreUpdate"),
        (Self::POST_LOAD, "PostLoad"),
        (Self::ON_LOAD, "OnLoad"),
        (Self::PRE_FRAME, "PreFrame"),
        (Self::ON_START, "OnStart"),
    ];

    /// The raw position of this phase.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// A phase `n` positions after this one.
    ///
    /// Lets callers define their own phases relative to an anchor, e.g.
    /// `Phase::ON_UPDATE.offset(10)` for a group that must run after the
    /// main update systems but before `ON_VALIDATE`.
    #[must_use]
    pub const fn offset(self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::ON_END {
            return f.write_str("OnEnd");
        }

        for (anchor, name) in Self::ANCHORS {
            if *self >= anchor {
                return if *self == anchor {
                    f.write_str(name)
                } else {
                    write!(f, "{name}(+{})", self.0 - anchor.0)
                };
            }
        }

        // Unreachable: ON_START is 0 and the scan above always matches it.
        write!(f, "Phase({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_ordering() {
        assert!(Phase::ON_START < Phase::PRE_FRAME);
        assert!(Phase::PRE_FRAME < Phase::ON_LOAD);
        assert!(Phase::ON_UPDATE < Phase::ON_VALIDATE);
        assert!(Phase::POST_FRAME < Phase::ON_END);
    }

    #[test]
    fn test_offset_lands_between_anchors() {
        let custom = Phase::ON_UPDATE.offset(10);
        assert!(Phase::ON_UPDATE < custom);
        assert!(custom < Phase::ON_VALIDATE);
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(Phase::ON_END.offset(1), Phase::ON_END);
    }

    #[test]
    fn test_display_anchors() {
        assert_eq!(Phase::ON_START.to_string(), "OnStart");
        assert_eq!(Phase::ON_UPDATE.to_string(), "OnUpdate");
        assert_eq!(Phase::ON_END.to_string(), "OnEnd");
    }

    #[test]
    fn test_display_buckets_custom_phases() {
        assert_eq!(Phase::ON_UPDATE.offset(3).to_string(), "OnUpdate(+3)");
        assert_eq!(Phase(150).to_string(), "PreFrame(+50)");
        assert_eq!(Phase(1).to_string(), "OnStart(+1)");
    }
}
