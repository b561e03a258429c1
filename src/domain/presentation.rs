//! Presentation: layer map, ordered frames and their selection state

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::document::Document;
use crate::domain::error::{DomainError, DomainResult, InvalidReference};
use crate::domain::frame::{Frame, FrameSnapshot, ViewState, DEFAULT_FRAME_TITLE};
use crate::domain::ids::{EntityId, IdGenerator};
use crate::domain::layers::{Layer, LayerBuilder, LayerRules, LayerSnapshot};
use crate::domain::observable::{EventBus, Notification, Observable};

/// Construction parameters of a presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationOptions {
    pub layer_rules: LayerRules,
    pub default_frame_title: String,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            layer_rules: LayerRules::default(),
            default_frame_title: DEFAULT_FRAME_TITLE.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationEventKind {
    SelectLayer,
    DeselectLayer,
    SelectFrame,
    DeselectFrame,
    AddFrame,
    RemoveFrame,
}

#[derive(Debug, Clone)]
pub enum PresentationEvent {
    SelectLayer { id: String },
    DeselectLayer { id: String },
    SelectFrame { index: usize },
    DeselectFrame { index: usize },
    AddFrame { frame: Rc<Frame>, index: usize },
    RemoveFrame { frame: Rc<Frame>, index: usize },
}

impl Notification for PresentationEvent {
    type Kind = PresentationEventKind;

    fn kind(&self) -> PresentationEventKind {
        match self {
            PresentationEvent::SelectLayer { .. } => PresentationEventKind::SelectLayer,
            PresentationEvent::DeselectLayer { .. } => PresentationEventKind::DeselectLayer,
            PresentationEvent::SelectFrame { .. } => PresentationEventKind::SelectFrame,
            PresentationEvent::DeselectFrame { .. } => PresentationEventKind::DeselectFrame,
            PresentationEvent::AddFrame { .. } => PresentationEventKind::AddFrame,
            PresentationEvent::RemoveFrame { .. } => PresentationEventKind::RemoveFrame,
        }
    }
}

/// Everything an external serializer needs from a presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSnapshot {
    pub layers: BTreeMap<String, LayerSnapshot>,
    pub frames: Vec<FrameSnapshot>,
}

/// The document model of one loaded presentation.
///
/// Operations take `&self` and release every internal borrow before firing, so
/// handlers may call back into the presentation (e.g. through a `Weak`).
#[derive(Debug)]
pub struct Presentation {
    id: EntityId,
    ids: Rc<IdGenerator>,
    document: Document,
    layers: RefCell<BTreeMap<String, Layer>>,
    frames: RefCell<Vec<Rc<Frame>>>,
    default_frame_title: String,
    events: EventBus<PresentationEvent>,
}

impl Presentation {
    /// Take ownership of `document` and partition it into layers.
    ///
    /// The document must already be a valid graphics document; it is not re-validated.
    #[instrument(level = "debug", skip_all)]
    pub fn new(
        mut document: Document,
        ids: Rc<IdGenerator>,
        options: &PresentationOptions,
    ) -> DomainResult<Self> {
        let id = ids.next_id();
        let mut layers = BTreeMap::new();
        LayerBuilder::new(&options.layer_rules, id).build(&mut document, &mut layers)?;
        info!(presentation = %id, layers = layers.len(), "presentation created");

        Ok(Self {
            id,
            ids,
            document,
            layers: RefCell::new(layers),
            frames: RefCell::new(Vec::new()),
            default_frame_title: options.default_frame_title.clone(),
            events: EventBus::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    // ------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------

    pub fn layer(&self, id: &str) -> Option<Layer> {
        self.layers.borrow().get(id).cloned()
    }

    /// All layers in map order.
    pub fn layers(&self) -> Vec<Layer> {
        self.layers.borrow().values().cloned().collect()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.borrow().len()
    }

    /// Layers in document (rendering) order.
    pub fn ordered_layers(&self) -> Vec<Layer> {
        let layers = self.layers.borrow();
        self.document
            .children(self.document.root())
            .iter()
            .filter_map(|&node| layers.values().find(|l| l.node == node).cloned())
            .collect()
    }

    pub fn selected_layer_ids(&self) -> Vec<String> {
        self.layers
            .borrow()
            .values()
            .filter(|l| l.selected)
            .map(|l| l.id.clone())
            .collect()
    }

    pub fn select_layer(&self, id: &str) -> DomainResult<()> {
        self.set_layer_selected(id, true)?;
        self.fire(PresentationEvent::SelectLayer { id: id.to_owned() });
        Ok(())
    }

    pub fn deselect_layer(&self, id: &str) -> DomainResult<()> {
        self.set_layer_selected(id, false)?;
        self.fire(PresentationEvent::DeselectLayer { id: id.to_owned() });
        Ok(())
    }

    pub fn select_all_layers(&self) -> DomainResult<()> {
        for id in self.layer_ids() {
            self.select_layer(&id)?;
        }
        Ok(())
    }

    pub fn deselect_all_layers(&self) -> DomainResult<()> {
        for id in self.layer_ids() {
            self.deselect_layer(&id)?;
        }
        Ok(())
    }

    fn layer_ids(&self) -> Vec<String> {
        self.layers.borrow().keys().cloned().collect()
    }

    fn set_layer_selected(&self, id: &str, selected: bool) -> DomainResult<()> {
        let mut layers = self.layers.borrow_mut();
        let layer = layers.get_mut(id).ok_or_else(|| {
            DomainError::InvalidReference(InvalidReference::Layer(id.to_owned()))
        })?;
        layer.selected = selected;
        Ok(())
    }

    // ------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------

    pub fn frame(&self, index: usize) -> Option<Rc<Frame>> {
        self.frames.borrow().get(index).cloned()
    }

    pub fn frames(&self) -> Vec<Rc<Frame>> {
        self.frames.borrow().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn frame_index(&self, id: EntityId) -> Option<usize> {
        self.frames.borrow().iter().position(|f| f.id() == id)
    }

    pub fn selected_frame_indices(&self) -> Vec<usize> {
        self.frames
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_selected())
            .map(|(i, _)| i)
            .collect()
    }

    /// Insert a new frame after the last selected one (or at the end) and make it
    /// the only selected frame.
    #[instrument(level = "debug", skip(self, state), fields(presentation = %self.id))]
    pub fn add_frame(&self, state: ViewState) -> DomainResult<Rc<Frame>> {
        let frame = Rc::new(Frame::new(
            self.ids.next_id(),
            self.id,
            self.default_frame_title.as_str(),
            state,
        ));
        let index = {
            let mut frames = self.frames.borrow_mut();
            let index = frames
                .iter()
                .rposition(|f| f.is_selected())
                .map_or(frames.len(), |last| last + 1);
            frames.insert(index, Rc::clone(&frame));
            index
        };
        debug!(frame = %frame.id(), index, "frame added");

        self.fire(PresentationEvent::AddFrame {
            frame: Rc::clone(&frame),
            index,
        });
        self.deselect_all_frames()?;
        let index = self
            .frame_index(frame.id())
            .ok_or(DomainError::InvalidReference(InvalidReference::FrameId(
                frame.id(),
            )))?;
        self.select_frame(index)?;
        Ok(frame)
    }

    /// Remove and return the frame at `index`.
    pub fn remove_frame(&self, index: usize) -> DomainResult<Rc<Frame>> {
        let frame = {
            let mut frames = self.frames.borrow_mut();
            if index >= frames.len() {
                return Err(Self::frame_out_of_range(index, frames.len()));
            }
            frames.remove(index)
        };
        debug!(frame = %frame.id(), index, "frame removed");
        self.fire(PresentationEvent::RemoveFrame {
            frame: Rc::clone(&frame),
            index,
        });
        Ok(frame)
    }

    pub fn select_frame(&self, index: usize) -> DomainResult<()> {
        self.set_frame_selected(index, true)?;
        self.fire(PresentationEvent::SelectFrame { index });
        Ok(())
    }

    pub fn deselect_frame(&self, index: usize) -> DomainResult<()> {
        self.set_frame_selected(index, false)?;
        self.fire(PresentationEvent::DeselectFrame { index });
        Ok(())
    }

    pub fn select_all_frames(&self) -> DomainResult<()> {
        let mut index = 0;
        while index < self.frame_count() {
            self.select_frame(index)?;
            index += 1;
        }
        Ok(())
    }

    pub fn deselect_all_frames(&self) -> DomainResult<()> {
        let mut index = 0;
        while index < self.frame_count() {
            self.deselect_frame(index)?;
            index += 1;
        }
        Ok(())
    }

    fn set_frame_selected(&self, index: usize, selected: bool) -> DomainResult<()> {
        let frames = self.frames.borrow();
        let frame = frames
            .get(index)
            .ok_or_else(|| Self::frame_out_of_range(index, frames.len()))?;
        frame.set_selected(selected);
        Ok(())
    }

    fn frame_out_of_range(index: usize, len: usize) -> DomainError {
        DomainError::InvalidReference(InvalidReference::Frame { index, len })
    }

    // ------------------------------------------------------------
    // Outbound data
    // ------------------------------------------------------------

    pub fn snapshot(&self) -> PresentationSnapshot {
        PresentationSnapshot {
            layers: self
                .layers
                .borrow()
                .iter()
                .map(|(id, layer)| (id.clone(), LayerSnapshot::from(layer)))
                .collect(),
            frames: self.frames.borrow().iter().map(|f| f.snapshot()).collect(),
        }
    }
}

impl Observable for Presentation {
    type Event = PresentationEvent;

    fn id(&self) -> EntityId {
        self.id
    }

    fn events(&self) -> &EventBus<PresentationEvent> {
        &self.events
    }
}
