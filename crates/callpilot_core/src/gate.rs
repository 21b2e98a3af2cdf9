use pilot_logging::{pilot_debug, pilot_warn};

/// Tabs of the workflow, in the order they unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageId {
    Email,
    Plan,
    Recording,
    Emails,
    Opportunity,
    Coaching,
}

const STAGE_COUNT: usize = 6;

impl StageId {
    pub const ALL: [StageId; STAGE_COUNT] = [
        StageId::Email,
        StageId::Plan,
        StageId::Recording,
        StageId::Emails,
        StageId::Opportunity,
        StageId::Coaching,
    ];

    pub fn first() -> Self {
        Self::ALL[0]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn label(self) -> &'static str {
        match self {
            StageId::Email => "Email Thread",
            StageId::Plan => "Call Plan",
            StageId::Recording => "Recording",
            StageId::Emails => "Follow-up Emails",
            StageId::Opportunity => "Opportunity",
            StageId::Coaching => "Coaching",
        }
    }
}

/// `(target, prerequisite)`: target is navigable as soon as the prerequisite
/// is ready, independent of the predecessor rule. Recording setup may start
/// while the plan is still being reviewed.
const EARLY_UNLOCKS: &[(StageId, StageId)] = &[(StageId::Recording, StageId::Plan)];

/// State change notifications for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    Ready(StageId),
    Unlocked(StageId),
    Cleared(StageId),
    Navigated(StageId),
    NavigationRejected(StageId),
    Reset,
}

/// Readiness and navigation state over the ordered stage list.
///
/// `cursor` is the furthest stage whose actions are interactable; `active` is
/// the tab currently shown. Nothing is ready initially and only the first
/// stage is interactable. Email readiness comes from the intake pipeline
/// stage storing the thread, so the Call Plan tab stays locked until then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGate {
    ready: [bool; STAGE_COUNT],
    cursor: StageId,
    active: StageId,
    events: Vec<GateEvent>,
}

impl Default for StageGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StageGate {
    pub fn new() -> Self {
        Self {
            ready: [false; STAGE_COUNT],
            cursor: StageId::first(),
            active: StageId::first(),
            events: Vec::new(),
        }
    }

    pub fn is_ready(&self, stage: StageId) -> bool {
        self.ready[stage.index()]
    }

    pub fn active(&self) -> StageId {
        self.active
    }

    pub fn cursor(&self) -> StageId {
        self.cursor
    }

    /// Whether the actions of `stage` may be used.
    pub fn is_interactable(&self, stage: StageId) -> bool {
        stage <= self.cursor
    }

    /// Returns `true` if the flag changed.
    pub fn mark_ready(&mut self, stage: StageId) -> bool {
        let slot = &mut self.ready[stage.index()];
        if *slot {
            return false;
        }
        *slot = true;
        self.events.push(GateEvent::Ready(stage));
        true
    }

    pub fn is_navigable_to(&self, stage: StageId) -> bool {
        let Some(previous) = stage.previous() else {
            return true;
        };
        if self.is_ready(previous) {
            return true;
        }
        EARLY_UNLOCKS
            .iter()
            .any(|&(target, prerequisite)| target == stage && self.is_ready(prerequisite))
    }

    /// Advances the cursor past `current`. Returns the stage that became
    /// interactable, or `None` at the final stage or when it already was.
    pub fn enable_next(&mut self, current: StageId) -> Option<StageId> {
        let next = current.next()?;
        if next <= self.cursor {
            return None;
        }
        self.cursor = next;
        self.events.push(GateEvent::Unlocked(next));
        Some(next)
    }

    /// Switches the visible tab. Non-navigable targets are ignored.
    pub fn navigate(&mut self, target: StageId) -> bool {
        if !self.is_navigable_to(target) {
            pilot_warn!("Navigation to {:?} rejected: stage is locked", target);
            self.events.push(GateEvent::NavigationRejected(target));
            return false;
        }
        if self.active != target {
            pilot_debug!("Navigated {:?} -> {:?}", self.active, target);
            self.active = target;
            self.events.push(GateEvent::Navigated(target));
        }
        true
    }

    /// Drops the ready flag of a stage that is being regenerated.
    pub fn clear(&mut self, stage: StageId) {
        let slot = &mut self.ready[stage.index()];
        if !*slot {
            return;
        }
        *slot = false;
        self.events.push(GateEvent::Cleared(stage));
        self.retreat_active();
    }

    /// Back to the initial state; pending events are kept.
    pub fn reset(&mut self) {
        let events = std::mem::take(&mut self.events);
        *self = Self::new();
        self.events = events;
        self.events.push(GateEvent::Reset);
    }

    pub fn take_events(&mut self) -> Vec<GateEvent> {
        std::mem::take(&mut self.events)
    }

    fn retreat_active(&mut self) {
        while !self.is_navigable_to(self.active) {
            match self.active.previous() {
                Some(previous) => self.active = previous,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(StageId::first(), StageId::Email);
        assert_eq!(StageId::Plan.next(), Some(StageId::Recording));
        assert_eq!(StageId::Coaching.next(), None);
        assert_eq!(StageId::Email.previous(), None);
        assert_eq!(StageId::Emails.previous(), Some(StageId::Recording));
    }

    #[test]
    fn enable_next_is_idempotent_at_the_final_stage() {
        let mut gate = StageGate::new();
        for stage in StageId::ALL {
            gate.enable_next(stage);
        }
        assert_eq!(gate.cursor(), StageId::Coaching);
        assert_eq!(gate.enable_next(StageId::Coaching), None);
        assert_eq!(gate.cursor(), StageId::Coaching);
    }

    #[test]
    fn enable_next_never_moves_the_cursor_back() {
        let mut gate = StageGate::new();
        gate.enable_next(StageId::Recording);
        assert_eq!(gate.cursor(), StageId::Emails);
        assert_eq!(gate.enable_next(StageId::Email), None);
        assert_eq!(gate.cursor(), StageId::Emails);
    }

    #[test]
    fn clearing_the_visible_stage_prerequisite_moves_the_tab_back() {
        let mut gate = StageGate::new();
        gate.mark_ready(StageId::Email);
        gate.mark_ready(StageId::Plan);
        assert!(gate.navigate(StageId::Recording));

        gate.clear(StageId::Plan);

        assert_eq!(gate.active(), StageId::Plan);
    }

    #[test]
    fn reset_keeps_undelivered_events() {
        let mut gate = StageGate::new();
        gate.mark_ready(StageId::Email);
        gate.reset();

        assert_eq!(
            gate.take_events(),
            vec![GateEvent::Ready(StageId::Email), GateEvent::Reset]
        );
        assert!(!gate.is_ready(StageId::Email));
        assert!(gate.take_events().is_empty());
    }
}
