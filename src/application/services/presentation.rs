//! Presentation service
//!
//! Opens SVG documents from disk, builds presentations from them and hands the
//! results to output collaborators (snapshot export, normalized SVG).

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::svg::{initial_view_state, parse_document, write_document};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    Element, IdGenerator, Layer, NodeKind, Presentation, PresentationOptions,
    PresentationSnapshot,
};
use crate::infrastructure::traits::FileSystem;

/// A layer together with a short description of the nodes it groups.
#[derive(Debug, Clone)]
pub struct LayerOverview {
    pub layer: Layer,
    /// `tag#id` (or just `tag`) of each direct member, in document order
    pub members: Vec<String>,
}

/// Service building presentations for one editing session.
///
/// All presentations opened through the same service draw their ids from one
/// [`IdGenerator`], so wrapper and frame ids never collide within the session.
pub struct PresentationService {
    fs: Arc<dyn FileSystem>,
    options: PresentationOptions,
    ids: Rc<IdGenerator>,
}

impl PresentationService {
    pub fn new(fs: Arc<dyn FileSystem>, options: PresentationOptions) -> Self {
        Self::with_ids(fs, options, Rc::new(IdGenerator::new()))
    }

    /// Create a service sharing an existing id generator.
    pub fn with_ids(
        fs: Arc<dyn FileSystem>,
        options: PresentationOptions,
        ids: Rc<IdGenerator>,
    ) -> Self {
        Self { fs, options, ids }
    }

    pub fn options(&self) -> &PresentationOptions {
        &self.options
    }

    /// Load an SVG file and build its presentation.
    #[instrument(level = "debug", skip(self))]
    pub fn open(&self, path: &Path) -> ApplicationResult<Presentation> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("document not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        self.open_str(&text)
    }

    /// Build a presentation from SVG source text.
    pub fn open_str(&self, text: &str) -> ApplicationResult<Presentation> {
        let document = parse_document(text)?;
        let presentation = Presentation::new(document, Rc::clone(&self.ids), &self.options)?;
        info!(layers = presentation.layer_count(), "document opened");
        Ok(presentation)
    }

    /// Append one frame per title, each framing the whole document.
    pub fn add_frames(
        &self,
        presentation: &Presentation,
        titles: &[String],
    ) -> ApplicationResult<()> {
        let state = initial_view_state(presentation.document());
        for title in titles {
            let frame = presentation.add_frame(state.clone())?;
            frame.set_title(title.as_str());
            debug!(%title, "frame added");
        }
        Ok(())
    }

    /// Layers in document order with their direct members.
    pub fn overview(&self, presentation: &Presentation) -> Vec<LayerOverview> {
        let document = presentation.document();
        presentation
            .ordered_layers()
            .into_iter()
            .map(|layer| {
                let members = document
                    .children(layer.node)
                    .iter()
                    .filter_map(|&child| match &document.node(child).ok()?.kind {
                        NodeKind::Element(element) => Some(describe(element)),
                        _ => None,
                    })
                    .collect();
                LayerOverview { layer, members }
            })
            .collect()
    }

    /// Serialize the layer map and frame sequence as TOML.
    pub fn export_toml(&self, presentation: &Presentation) -> ApplicationResult<String> {
        let snapshot: PresentationSnapshot = presentation.snapshot();
        toml::to_string_pretty(&snapshot).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize presentation".into(),
            source: Box::new(e),
        })
    }

    /// The regrouped document as SVG text.
    pub fn render_svg(&self, presentation: &Presentation) -> String {
        write_document(presentation.document())
    }

    /// Write the regrouped document as SVG.
    #[instrument(level = "debug", skip(self, presentation))]
    pub fn save_svg(&self, presentation: &Presentation, path: &Path) -> ApplicationResult<()> {
        let text = self.render_svg(presentation);
        self.fs
            .write(path, &text)
            .with_path_context("write document", path)?;
        info!(path = %path.display(), "normalized document written");
        Ok(())
    }
}

fn describe(element: &Element) -> String {
    match element.id() {
        Some(id) => format!("{}#{}", element.name.local, id),
        None => element.name.local.clone(),
    }
}
