//! Data structures describing the measured content of a résumé.
//!
//! The editor produces a [`ContentBlock`] tree once its layout pass has
//! finished: every block carries the height it was rendered at, in logical
//! pixels. The tree is serialization-friendly so it can be handed over as JSON
//! and it never references the PDF or imaging crates, which keeps the planner
//! usable from frontends that only need break positions.

use serde::{Deserialize, Serialize};

use crate::oracle;

/// Structural role of a block.
///
/// Pagination behaviour is not stored on the variants; it is looked up in the
/// rule table of [`crate::oracle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    /// Generic grouping whose children may land on different pages.
    Container,
    /// A résumé section (experience, education, ...).
    Section,
    /// Title line of a section.
    SectionHeader,
    /// One entry of a section, such as a position or a degree.
    Item,
    /// A labelled group of skills.
    SkillGroup,
    /// A single highlight bullet.
    HighlightItem,
    /// Intrinsic content without further structure.
    Leaf,
}

impl BlockKind {
    /// Every kind, in declaration order.
    pub const ALL: [BlockKind; 7] = [
        BlockKind::Container,
        BlockKind::Section,
        BlockKind::SectionHeader,
        BlockKind::Item,
        BlockKind::SkillGroup,
        BlockKind::HighlightItem,
        BlockKind::Leaf,
    ];
}

/// Node of the measured document tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    id: String,
    kind: BlockKind,
    height_px: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<ContentBlock>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ContentBlock {
    /// Creates a childless block with the given measured height.
    pub fn new(id: impl Into<String>, kind: BlockKind, height_px: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            height_px,
            label: None,
            hidden: false,
            children: Vec::new(),
        }
    }

    /// Creates a generic container block.
    pub fn container(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::Container, height_px)
    }

    /// Creates a section block.
    pub fn section(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::Section, height_px)
    }

    /// Creates a section header block.
    pub fn section_header(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::SectionHeader, height_px)
    }

    /// Creates an item block.
    pub fn item(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::Item, height_px)
    }

    /// Creates a skill group block.
    pub fn skill_group(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::SkillGroup, height_px)
    }

    /// Creates a highlight item block.
    pub fn highlight_item(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::HighlightItem, height_px)
    }

    /// Creates a leaf block.
    pub fn leaf(id: impl Into<String>, height_px: f64) -> Self {
        Self::new(id, BlockKind::Leaf, height_px)
    }

    /// Creates a non-atomic block of `kind` whose height is derived from its
    /// visible children, separated by `spacing_px`.
    ///
    /// The result satisfies the container height invariant checked by the
    /// planner, which makes it the usual way to assemble fixtures.
    pub fn stacked(
        id: impl Into<String>,
        kind: BlockKind,
        children: Vec<ContentBlock>,
        spacing_px: f64,
    ) -> Self {
        let height_px = stacked_height(&children, spacing_px);
        let mut block = Self::new(id, kind, height_px);
        block.children = children;
        block
    }

    /// Returns the identifier of the block.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the kind of the block.
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Returns the measured height in logical pixels.
    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    /// Returns the human readable label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns whether the block is hidden from the rendered output.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns whether the block must be placed as an indivisible unit.
    pub fn is_atomic(&self) -> bool {
        oracle::is_atomic(self.kind)
    }

    /// Returns all children, including hidden ones.
    pub fn children(&self) -> &[ContentBlock] {
        &self.children
    }

    /// Iterates over the children that take part in layout.
    pub fn visible_children(&self) -> impl Iterator<Item = &ContentBlock> {
        self.children.iter().filter(|child| !child.hidden)
    }

    /// Sets the label and returns the updated block.
    pub fn with_label(mut self, label: impl Into<Option<String>>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the hidden flag and returns the updated block.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Appends a child and returns the updated block.
    ///
    /// The measured height is left untouched.
    pub fn with_child(mut self, child: ContentBlock) -> Self {
        self.children.push(child);
        self
    }

    /// Extends the block with multiple children and returns the updated block.
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = ContentBlock>,
    {
        self.children.extend(children);
        self
    }

    /// Finds a block by identifier in this subtree (depth first).
    pub fn find(&self, id: &str) -> Option<&ContentBlock> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Returns the identifiers of every visible atomic block in document order.
    ///
    /// Atomic blocks are not descended into, matching the granularity the
    /// planner places at.
    pub fn atomic_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        collect_atomic_ids(self, &mut ids);
        ids
    }
}

fn collect_atomic_ids<'a>(block: &'a ContentBlock, ids: &mut Vec<&'a str>) {
    if block.hidden {
        return;
    }
    if block.is_atomic() {
        ids.push(block.id());
        return;
    }
    for child in &block.children {
        collect_atomic_ids(child, ids);
    }
}

/// Height of `children` stacked vertically with `spacing_px` between visible
/// siblings.
pub fn stacked_height(children: &[ContentBlock], spacing_px: f64) -> f64 {
    let mut count = 0usize;
    let mut total = 0.0;
    for child in children.iter().filter(|child| !child.hidden) {
        count += 1;
        total += child.height_px;
    }
    if count > 1 {
        total += spacing_px * (count - 1) as f64;
    }
    total
}
