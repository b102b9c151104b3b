/// Logical buttons of one pointer for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub trigger: bool,
    pub grab: bool,
    pub menu: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    TriggerPressed,
    GrabPressed,
    GrabReleased,
    MenuPressed,
}

/// Edge detector over one pointer's buttons.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputTracker {
    previous: ButtonState,
}

impl InputTracker {
    pub fn previous(&self) -> ButtonState {
        self.previous
    }

    /// Compare against last frame and remember `current`.
    pub fn update(&mut self, current: ButtonState) -> Vec<InputEvent> {
        let prev = self.previous;
        self.previous = current;

        let mut events = Vec::new();
        if current.menu && !prev.menu {
            events.push(InputEvent::MenuPressed);
        }
        if current.grab && !prev.grab {
            events.push(InputEvent::GrabPressed);
        } else if !current.grab && prev.grab {
            events.push(InputEvent::GrabReleased);
        }
        if current.trigger && !prev.trigger {
            events.push(InputEvent::TriggerPressed);
        }
        events
    }

    pub fn reset(&mut self) {
        self.previous = ButtonState::default();
    }
}
