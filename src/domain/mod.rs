//! Domain layer: the presentation document model
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod document;
pub mod error;
pub mod frame;
pub mod ids;
pub mod layers;
pub mod observable;
pub mod presentation;

pub use document::{Attribute, Document, Element, NamespaceDecl, Node, NodeId, NodeKind, QName};
pub use error::{DomainError, DomainResult, InvalidReference};
pub use frame::{Frame, FrameEvent, FrameEventKind, FrameSnapshot, ViewState, DEFAULT_FRAME_TITLE};
pub use ids::{EntityId, IdGenerator};
pub use layers::{
    Layer, LayerBuilder, LayerRules, LayerSnapshot, DEFAULT_DRAWABLE_TAGS, INKSCAPE_NAMESPACE,
    SVG_NAMESPACE,
};
pub use observable::{EventBus, ListenerId, Notification, Observable};
pub use presentation::{
    Presentation, PresentationEvent, PresentationEventKind, PresentationOptions,
    PresentationSnapshot,
};
