//! Pointer interaction state machine
//!
//! Tells a press meant to drag the window apart from a press meant to
//! activate a button, using only the order of press, move and release
//! events. The machine is pure: it reports what should happen and the bar
//! turns that into host actions.

/// Drag progress for one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pressed on the bar body, waiting for the first move
    PendingDrag,
    /// Window move is active
    Dragging,
}

/// What a press landed on, in the bar's local frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    Outside,
    /// Index into the button registry
    Button(usize),
    Body,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    BeginMove,
    EndMove,
    Activate(usize),
}

/// Whether the host should keep handling the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    #[default]
    Pass,
    Cancel,
}

impl Propagation {
    pub fn is_cancelled(self) -> bool {
        self == Propagation::Cancel
    }

    /// Cancelled if either side cancels.
    pub fn merge(self, other: Propagation) -> Propagation {
        if self.is_cancelled() || other.is_cancelled() {
            Propagation::Cancel
        } else {
            Propagation::Pass
        }
    }
}

/// Outcome of feeding one event to [`PointerState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reaction {
    pub effect: Option<Effect>,
    pub propagation: Propagation,
}

impl Reaction {
    fn pass(effect: Option<Effect>) -> Self {
        Self { effect, propagation: Propagation::Pass }
    }

    fn cancel(effect: Option<Effect>) -> Self {
        Self { effect, propagation: Propagation::Cancel }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    drag: DragState,
    /// The current press was claimed by the bar, so its release is too
    suppress_release: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn suppresses_release(&self) -> bool {
        self.suppress_release
    }

    pub fn press(&mut self, target: PressTarget) -> Reaction {
        match target {
            PressTarget::Outside => {
                // a stray press must not leave a move running
                let effect = (self.drag == DragState::Dragging).then_some(Effect::EndMove);
                self.drag = DragState::Idle;
                Reaction::pass(effect)
            }
            PressTarget::Button(index) => {
                self.suppress_release = true;
                Reaction::cancel(Some(Effect::Activate(index)))
            }
            PressTarget::Body => {
                self.suppress_release = true;
                if self.drag == DragState::Idle {
                    self.drag = DragState::PendingDrag;
                }
                Reaction::cancel(None)
            }
        }
    }

    pub fn release(&mut self) -> Reaction {
        let effect = (self.drag == DragState::Dragging).then_some(Effect::EndMove);
        self.drag = DragState::Idle;

        if std::mem::take(&mut self.suppress_release) {
            Reaction::cancel(effect)
        } else {
            Reaction::pass(effect)
        }
    }

    /// Any movement confirms a pending drag; there is no threshold.
    pub fn motion(&mut self) -> Option<Effect> {
        if self.drag == DragState::PendingDrag {
            self.drag = DragState::Dragging;
            return Some(Effect::BeginMove);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(drag: DragState, suppress_release: bool) -> PointerState {
        PointerState { drag, suppress_release }
    }

    #[test]
    fn test_transition_table() {
        use DragState::*;

        // (from, event, to, effect, propagation)
        let cases: Vec<(PointerState, &str, PointerState, Option<Effect>, Propagation)> = vec![
            (state(Idle, false), "body", state(PendingDrag, true), None, Propagation::Cancel),
            (state(Idle, false), "button", state(Idle, true), Some(Effect::Activate(1)), Propagation::Cancel),
            (state(Idle, false), "outside", state(Idle, false), None, Propagation::Pass),
            (state(Dragging, false), "outside", state(Idle, false), Some(Effect::EndMove), Propagation::Pass),
            (state(Dragging, true), "body", state(Dragging, true), None, Propagation::Cancel),
            (state(PendingDrag, true), "move", state(Dragging, true), Some(Effect::BeginMove), Propagation::Pass),
            (state(Idle, false), "move", state(Idle, false), None, Propagation::Pass),
            (state(Dragging, true), "move", state(Dragging, true), None, Propagation::Pass),
            (state(PendingDrag, true), "release", state(Idle, false), None, Propagation::Cancel),
            (state(Dragging, true), "release", state(Idle, false), Some(Effect::EndMove), Propagation::Cancel),
            (state(Dragging, false), "release", state(Idle, false), Some(Effect::EndMove), Propagation::Pass),
            (state(Idle, false), "release", state(Idle, false), None, Propagation::Pass),
        ];

        for (from, event, to, effect, propagation) in cases {
            let mut pointer = from;
            let reaction = match event {
                "body" => pointer.press(PressTarget::Body),
                "button" => pointer.press(PressTarget::Button(1)),
                "outside" => pointer.press(PressTarget::Outside),
                "release" => pointer.release(),
                "move" => Reaction::pass(pointer.motion()),
                _ => unreachable!(),
            };
            assert_eq!(pointer, to, "{:?} + {}", from, event);
            assert_eq!(reaction.effect, effect, "{:?} + {}", from, event);
            assert_eq!(reaction.propagation, propagation, "{:?} + {}", from, event);
        }
    }

    #[test]
    fn test_click_never_drags() {
        let mut pointer = PointerState::new();
        let down = pointer.press(PressTarget::Button(0));
        let up = pointer.release();

        assert_eq!(down.effect, Some(Effect::Activate(0)));
        assert_eq!(up.effect, None);
        assert_eq!(pointer.drag(), DragState::Idle);
    }

    #[test]
    fn test_body_press_move_release() {
        let mut pointer = PointerState::new();
        let mut effects = Vec::new();

        effects.extend(pointer.press(PressTarget::Body).effect);
        for _ in 0..3 {
            effects.extend(pointer.motion());
        }
        effects.extend(pointer.release().effect);

        assert_eq!(effects, vec![Effect::BeginMove, Effect::EndMove]);
    }

    #[test]
    fn test_release_suppressed_once_per_press() {
        let mut pointer = PointerState::new();
        pointer.press(PressTarget::Body);

        assert!(pointer.release().propagation.is_cancelled());
        assert!(!pointer.release().propagation.is_cancelled());
        assert!(!pointer.suppresses_release());
    }

    #[test]
    fn test_propagation_merge() {
        assert_eq!(Propagation::Pass.merge(Propagation::Pass), Propagation::Pass);
        assert_eq!(Propagation::Pass.merge(Propagation::Cancel), Propagation::Cancel);
        assert_eq!(Propagation::Cancel.merge(Propagation::Pass), Propagation::Cancel);
    }
}
