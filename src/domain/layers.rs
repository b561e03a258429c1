//! Layer partitioning of a document's top-level content

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::document::{Document, Element, NodeId, NodeKind, QName};
use crate::domain::error::DomainResult;
use crate::domain::ids::EntityId;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const INKSCAPE_NAMESPACE: &str = "http://www.inkscape.org/namespaces/inkscape";

/// Tags eligible to become, or belong to, a layer.
pub const DEFAULT_DRAWABLE_TAGS: &[&str] = &[
    "g", "image", "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text",
    "clippath",
];

/// Parameters of the partitioning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRules {
    pub drawable_tags: HashSet<String>,
    pub group_tag: String,
    /// Editor label attribute: (namespace, local name)
    pub label_attribute: (Option<String>, String),
    pub wrapper_prefix: String,
    /// Remove text/comment children of the root instead of leaving them in place.
    pub strip_non_elements: bool,
}

impl Default for LayerRules {
    fn default() -> Self {
        Self {
            drawable_tags: DEFAULT_DRAWABLE_TAGS.iter().map(|t| t.to_string()).collect(),
            group_tag: "g".into(),
            label_attribute: (Some(INKSCAPE_NAMESPACE.into()), "label".into()),
            wrapper_prefix: "sozi-wrapper".into(),
            strip_non_elements: true,
        }
    }
}

impl LayerRules {
    pub fn is_drawable(&self, element: &Element) -> bool {
        self.drawable_tags.contains(&element.name.local)
    }

    fn is_group(&self, element: &Element) -> bool {
        element.name.local == self.group_tag
    }

    fn label_of(&self, element: &Element) -> Option<String> {
        let (namespace, local) = &self.label_attribute;
        element
            .attribute(namespace.as_deref(), local)
            .map(str::to_owned)
    }
}

/// A named, selectable group of drawable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub id: String,
    /// Synthesized wrapper rather than an authored group
    pub auto: bool,
    pub selected: bool,
    pub label: String,
    pub node: NodeId,
}

impl Layer {
    fn explicit(id: String, label: Option<String>, node: NodeId) -> Self {
        let label = label.unwrap_or_else(|| format!("#{id}"));
        Self {
            id,
            auto: false,
            selected: true,
            label,
            node,
        }
    }

    fn wrapper(id: String, node: NodeId) -> Self {
        Self {
            label: format!("#{id}"),
            id,
            auto: true,
            selected: true,
            node,
        }
    }
}

/// Serialisable view of a layer for outbound collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub auto: bool,
    pub selected: bool,
    pub label: String,
}

impl From<&Layer> for LayerSnapshot {
    fn from(layer: &Layer) -> Self {
        Self {
            auto: layer.auto,
            selected: layer.selected,
            label: layer.label.clone(),
        }
    }
}

/// One-shot pass that turns the root's direct children into layers.
///
/// Iterates a snapshot of the root's original children and applies every
/// insert/append/remove against the live tree. Runs of drawables that are not
/// qualifying groups collapse into a single synthesized wrapper group.
pub struct LayerBuilder<'a> {
    rules: &'a LayerRules,
    presentation: EntityId,
    wrapper_count: usize,
}

impl<'a> LayerBuilder<'a> {
    pub fn new(rules: &'a LayerRules, presentation: EntityId) -> Self {
        Self {
            rules,
            presentation,
            wrapper_count: 0,
        }
    }

    #[instrument(level = "debug", skip_all, fields(presentation = %self.presentation))]
    pub fn build(
        mut self,
        document: &mut Document,
        layers: &mut BTreeMap<String, Layer>,
    ) -> DomainResult<()> {
        let root = document.root();
        let snapshot: Vec<NodeId> = document.children(root).to_vec();
        let mut wrapper = self.new_wrapper(document);

        for child in snapshot {
            let Some(element) = document.element(child) else {
                if self.rules.strip_non_elements {
                    trace!(%child, "removing non-element child");
                    document.remove(child)?;
                }
                continue;
            };
            if !self.rules.is_drawable(element) {
                trace!(%child, tag = %element.name, "skipping non-drawable");
                continue;
            }

            let explicit_id = match element.id() {
                Some(id)
                    if self.rules.is_group(element)
                        && !id.is_empty()
                        && !layers.contains_key(id) =>
                {
                    Some(id.to_owned())
                }
                _ => None,
            };

            match explicit_id {
                Some(id) => {
                    let label = self.rules.label_of(element);
                    debug!(%id, "explicit layer");
                    layers.insert(id.clone(), Layer::explicit(id, label, child));
                    // Registered after the explicit layer so a wrapper never claims its id
                    if !document.children(wrapper).is_empty() {
                        document.insert_before(root, wrapper, child)?;
                        self.register_wrapper(document, wrapper, layers)?;
                        wrapper = self.new_wrapper(document);
                    }
                }
                None => document.append_child(wrapper, child)?,
            }
        }

        if document.children(wrapper).is_empty() {
            document.remove(wrapper)?;
        } else {
            document.append_child(root, wrapper)?;
            self.register_wrapper(document, wrapper, layers)?;
        }
        Ok(())
    }

    /// Detached, empty group; it receives its id when registered.
    fn new_wrapper(&self, document: &mut Document) -> NodeId {
        let name = document
            .element(document.root())
            .map(|root| root.name.sibling(self.rules.group_tag.as_str()))
            .unwrap_or_else(|| QName::local(self.rules.group_tag.as_str()));
        document.create(NodeKind::Element(Element::new(name)))
    }

    fn register_wrapper(
        &mut self,
        document: &mut Document,
        wrapper: NodeId,
        layers: &mut BTreeMap<String, Layer>,
    ) -> DomainResult<()> {
        let mut id = self.wrapper_id();
        while layers.contains_key(&id) {
            self.wrapper_count += 1;
            id = self.wrapper_id();
        }
        document
            .element_mut(wrapper)?
            .set_attribute(QName::local("id"), id.as_str());
        debug!(%id, members = document.children(wrapper).len(), "auto layer");
        layers.insert(id.clone(), Layer::wrapper(id, wrapper));
        self.wrapper_count += 1;
        Ok(())
    }

    fn wrapper_id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.rules.wrapper_prefix, self.presentation, self.wrapper_count
        )
    }
}
