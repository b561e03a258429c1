//! Presentation document model for Sozi-style zooming presentations.
//!
//! An SVG document is partitioned into layers (authored groups plus synthesized
//! wrappers for loose content) and paired with an ordered sequence of frames.
//! Layers and frames carry independent selection state; every change is
//! announced synchronously to subscribed view collaborators.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    Document, DomainError, Frame, Layer, Observable, Presentation, PresentationEvent,
    PresentationEventKind,
};
