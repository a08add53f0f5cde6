//! Scroll-triggered reveal planning
//!
//! Decides which `[data-reveal]` elements start hidden, their stagger delays,
//! and whether an observer is needed at all. With reduced motion everything
//! is shown immediately and nothing is observed.

use crate::consts::REVEAL_STAGGER_MS;

/// Stagger stops growing after this many siblings
const MAX_STAGGER_STEPS: u32 = 6;

/// How reveals are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMode {
    /// Hidden until scrolled into view, then transitioned in
    Animated,
    /// Shown in their final state right away
    Immediate,
}

impl RevealMode {
    pub fn from_reduced_motion(reduced_motion: bool) -> Self {
        if reduced_motion {
            RevealMode::Immediate
        } else {
            RevealMode::Animated
        }
    }

    /// Inline `transition` value that overrides the page's reveal transition
    pub fn transition_override(&self) -> Option<&'static str> {
        match self {
            RevealMode::Animated => None,
            RevealMode::Immediate => Some("none"),
        }
    }
}

/// One revealable element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealItem {
    /// Transition delay within its group
    pub delay_ms: u32,
    pub revealed: bool,
}

/// Reveal state for every element on the page, in document order
#[derive(Debug, Clone)]
pub struct RevealPlan {
    mode: RevealMode,
    items: Vec<RevealItem>,
}

impl RevealPlan {
    /// Build a plan from each element's position within its reveal group
    ///
    /// `group_positions[i]` is `Some(n)` when element `i` is the n-th child of
    /// a `[data-reveal-group]`, `None` when it stands alone.
    pub fn new(mode: RevealMode, group_positions: &[Option<usize>]) -> Self {
        let items = group_positions
            .iter()
            .map(|pos| match mode {
                RevealMode::Immediate => RevealItem {
                    delay_ms: 0,
                    revealed: true,
                },
                RevealMode::Animated => {
                    let step = pos.map_or(0, |n| (n as u32).min(MAX_STAGGER_STEPS));
                    RevealItem {
                        delay_ms: step * REVEAL_STAGGER_MS,
                        revealed: false,
                    }
                }
            })
            .collect();
        Self { mode, items }
    }

    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    pub fn items(&self) -> &[RevealItem] {
        &self.items
    }

    /// An observer is only worth creating if something is still hidden
    pub fn needs_observer(&self) -> bool {
        self.mode == RevealMode::Animated && self.items.iter().any(|i| !i.revealed)
    }

    /// Element `index` scrolled into view; true if it should be revealed now
    ///
    /// Reveals are one-shot: the caller stops observing once this returns true.
    pub fn on_intersect(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) if !item.revealed => {
                item.revealed = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_reveals_everything_without_observer() {
        let mode = RevealMode::from_reduced_motion(true);
        let mut plan = RevealPlan::new(mode, &[None, Some(0), Some(1), Some(2)]);

        assert!(plan.items().iter().all(|i| i.revealed && i.delay_ms == 0));
        assert!(!plan.needs_observer());
        assert_eq!(plan.mode().transition_override(), Some("none"));
        // A late intersection changes nothing
        assert!(!plan.on_intersect(1));
    }

    #[test]
    fn test_animated_staggers_group_children() {
        let plan = RevealPlan::new(RevealMode::Animated, &[None, Some(0), Some(1), Some(2), Some(40)]);
        let delays: Vec<u32> = plan.items().iter().map(|i| i.delay_ms).collect();
        assert_eq!(delays, vec![0, 0, 80, 160, 480]);
        assert!(plan.needs_observer());
        assert_eq!(plan.mode().transition_override(), None);
    }

    #[test]
    fn test_intersections_are_one_shot() {
        let mut plan = RevealPlan::new(RevealMode::Animated, &[None, None]);
        assert!(plan.on_intersect(0));
        assert!(!plan.on_intersect(0));
        assert!(!plan.on_intersect(7));
        let revealed: Vec<bool> = plan.items().iter().map(|i| i.revealed).collect();
        assert_eq!(revealed, vec![true, false]);

        assert!(plan.on_intersect(1));
        assert!(!plan.needs_observer());
    }
}
