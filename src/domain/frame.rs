//! Frames: titled, selectable view snapshots

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::domain::ids::EntityId;
use crate::domain::observable::{EventBus, Notification, Observable};

pub const DEFAULT_FRAME_TITLE: &str = "New frame";

/// Camera parameters recorded by a frame.
///
/// Opaque to the presentation model: it is stored and handed back, never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees
    pub angle: f64,
    pub clipped: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            cx: 0.0,
            cy: 0.0,
            width: 1.0,
            height: 1.0,
            angle: 0.0,
            clipped: true,
        }
    }
}

impl ViewState {
    /// Camera framing the given `viewBox` (`"min-x min-y width height"`).
    ///
    /// Returns `None` unless the value holds exactly four numbers with a
    /// positive width and height.
    pub fn from_view_box(view_box: &str) -> Option<Self> {
        let numbers: Vec<f64> = view_box
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        let [x, y, width, height] = numbers.as_slice() else {
            return None;
        };
        if *width <= 0.0 || *height <= 0.0 {
            return None;
        }
        Some(Self {
            cx: x + width / 2.0,
            cy: y + height / 2.0,
            width: *width,
            height: *height,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameEventKind {
    Change,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// The title was set
    Change { title: String },
}

impl Notification for FrameEvent {
    type Kind = FrameEventKind;

    fn kind(&self) -> FrameEventKind {
        match self {
            FrameEvent::Change { .. } => FrameEventKind::Change,
        }
    }
}

/// A snapshot of view state in a presentation's ordered frame sequence.
///
/// Shared as `Rc<Frame>`; `title` and `selected` use interior mutability so view
/// collaborators can hold a frame while the presentation keeps mutating it.
#[derive(Debug)]
pub struct Frame {
    id: EntityId,
    presentation: EntityId,
    title: RefCell<String>,
    selected: Cell<bool>,
    state: ViewState,
    events: EventBus<FrameEvent>,
}

impl Frame {
    pub(crate) fn new(
        id: EntityId,
        presentation: EntityId,
        title: impl Into<String>,
        state: ViewState,
    ) -> Self {
        Self {
            id,
            presentation,
            title: RefCell::new(title.into()),
            selected: Cell::new(true),
            state,
            events: EventBus::new(),
        }
    }

    /// Id of the owning presentation.
    pub fn presentation(&self) -> EntityId {
        self.presentation
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        *self.title.borrow_mut() = title.clone();
        self.fire(FrameEvent::Change { title });
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub(crate) fn set_selected(&self, selected: bool) {
        self.selected.set(selected);
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            id: self.id,
            title: self.title(),
            selected: self.is_selected(),
            state: self.state.clone(),
        }
    }
}

impl Observable for Frame {
    type Event = FrameEvent;

    fn id(&self) -> EntityId {
        self.id
    }

    fn events(&self) -> &EventBus<FrameEvent> {
        &self.events
    }
}

/// Serialisable view of a frame for outbound collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub id: EntityId,
    pub title: String,
    pub selected: bool,
    pub state: ViewState,
}
