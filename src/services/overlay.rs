use crate::models::{Event, User};

/// Points subtracted from an offset when the click lies past the middle of
/// the viewport, so the panel opens back toward the centre.
const FLIP_SHIFT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Panel position as percentages of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayPosition {
    pub top_percent: f64,
    pub left_percent: f64,
}

impl OverlayPosition {
    pub fn for_click(x: f64, y: f64, viewport: Viewport) -> Self {
        let mut top = percent(y, viewport.height);
        let mut left = percent(x, viewport.width);
        if x > viewport.width / 2.0 {
            left -= FLIP_SHIFT;
        }
        if y > viewport.height / 2.0 {
            top -= FLIP_SHIFT;
        }
        Self {
            top_percent: top,
            left_percent: left,
        }
    }
}

fn percent(value: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        value * 100.0 / total
    }
}

/// Detail panel for a single event.
#[derive(Debug, Clone, Default)]
pub struct EventDetailsOverlay {
    event: Option<Event>,
    position: OverlayPosition,
}

impl EventDetailsOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, event: Event, x: f64, y: f64, viewport: Viewport) -> OverlayPosition {
        self.position = OverlayPosition::for_click(x, y, viewport);
        tracing::debug!("Showing event {} at {:?}", event.id, self.position);
        self.event = Some(event);
        self.position
    }

    pub fn hide(&mut self) {
        self.event = None;
    }

    pub fn is_visible(&self) -> bool {
        self.event.is_some()
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn position(&self) -> OverlayPosition {
        self.position
    }

    /// Whether `user` may edit the shown event.
    pub fn is_owned_by(&self, user: &User) -> bool {
        match &self.event {
            Some(event) => user.is_logged_in() && event.user_id == user.id,
            None => false,
        }
    }
}

/// Edit panel. Holds the event being edited while open.
#[derive(Debug, Clone, Default)]
pub struct EditEventOverlay {
    event: Option<Event>,
}

impl EditEventOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, event: Event) {
        self.event = Some(event);
    }

    pub fn hide(&mut self) {
        self.event = None;
    }

    pub fn is_visible(&self) -> bool {
        self.event.is_some()
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }
}
