//! Page break planning.
//!
//! [`plan`] distributes a measured [`ContentBlock`] tree over fixed-height
//! pages. The tree is first flattened into placement candidates in document
//! order, then a single left fold threads a [`Cursor`] (finished pages, the
//! page being filled and its remaining height) through the candidates. No
//! rendering happens here; the output is a [`PaginationPlan`] that the
//! rasterizer and the assembler consume.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Serialize;

use crate::error::{ExportError, Result};
use crate::geometry::PageGeometry;
use crate::model::{stacked_height, BlockKind, ContentBlock};
use crate::oracle;

/// Slack allowed between a container height and the sum of its children.
pub const MEASUREMENT_TOLERANCE_PX: f64 = 0.5;

/// Rounding slack for fit decisions, so a block that exactly fills the
/// remaining space stays on the page.
const FIT_TOLERANCE_PX: f64 = 1e-6;

/// One block positioned on a page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    block_id: String,
    kind: BlockKind,
    y_offset_px: f64,
    height_px: f64,
}

impl Placement {
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Distance from the top of the content area, in logical pixels.
    pub fn y_offset_px(&self) -> f64 {
        self.y_offset_px
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    /// Bottom edge of the block relative to the top of the content area.
    pub fn bottom_px(&self) -> f64 {
        self.y_offset_px + self.height_px
    }
}

/// Placements assigned to one output page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    page_index: usize,
    placements: Vec<Placement>,
    used_height_px: f64,
}

impl PagePlan {
    /// Zero-based index of the page.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Placements in top-to-bottom order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Bottom edge of the last placement.
    pub fn used_height_px(&self) -> f64 {
        self.used_height_px
    }
}

/// A rule the planner had to bend to produce a plan at all.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Degradation {
    /// An atomic block taller than the content area was placed on a fresh
    /// page and overflows it.
    #[serde(rename_all = "camelCase")]
    OversizedAtomicBlock {
        block_id: String,
        page_index: usize,
        height_px: f64,
    },
    /// A header group is taller than the content area; the header and every
    /// block up to `follower_id` share a fresh page and overflow it.
    #[serde(rename_all = "camelCase")]
    OverflowingHeaderGroup {
        header_id: String,
        follower_id: String,
        page_index: usize,
        height_px: f64,
    },
}

impl Degradation {
    /// Page the degradation affects.
    pub fn page_index(&self) -> usize {
        match self {
            Degradation::OversizedAtomicBlock { page_index, .. }
            | Degradation::OverflowingHeaderGroup { page_index, .. } => *page_index,
        }
    }
}

/// First page of a labelled section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnchor {
    pub title: String,
    pub block_id: String,
    pub page_index: usize,
}

/// Ordered pages covering every placed block exactly once.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationPlan {
    content_height_px: f64,
    pages: Vec<PagePlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degradations: Vec<Degradation>,
}

impl PaginationPlan {
    pub fn pages(&self) -> &[PagePlan] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Usable page height the plan was computed for.
    pub fn content_height_px(&self) -> f64 {
        self.content_height_px
    }

    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// Identifiers of all placed blocks, page by page, top to bottom.
    pub fn placed_ids(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|page| page.placements.iter().map(Placement::block_id))
            .collect()
    }

    /// Returns the page a block was placed on.
    pub fn page_of(&self, block_id: &str) -> Option<usize> {
        self.pages
            .iter()
            .find(|page| page.placements.iter().any(|p| p.block_id == block_id))
            .map(PagePlan::page_index)
    }

    /// Returns whether `page_index` overflows the content area.
    pub fn is_oversized(&self, page_index: usize) -> bool {
        self.degradations
            .iter()
            .any(|degradation| degradation.page_index() == page_index)
    }

    /// Lists the first page of every visible, labelled section of `root`.
    ///
    /// Sections whose content was not placed (all children hidden) are
    /// skipped.
    pub fn section_anchors(&self, root: &ContentBlock) -> Vec<SectionAnchor> {
        let pages: HashMap<&str, usize> = self
            .pages
            .iter()
            .flat_map(|page| {
                page.placements
                    .iter()
                    .map(move |placement| (placement.block_id.as_str(), page.page_index))
            })
            .collect();

        let mut anchors = Vec::new();
        collect_anchors(root, &pages, &mut anchors);
        anchors
    }
}

fn collect_anchors(
    block: &ContentBlock,
    pages: &HashMap<&str, usize>,
    anchors: &mut Vec<SectionAnchor>,
) {
    if block.is_hidden() {
        return;
    }
    if block.kind() == BlockKind::Section {
        if let (Some(title), Some(page_index)) = (block.label(), first_page(block, pages)) {
            anchors.push(SectionAnchor {
                title: title.to_string(),
                block_id: block.id().to_string(),
                page_index,
            });
        }
    }
    if block.is_atomic() {
        return;
    }
    for child in block.children() {
        collect_anchors(child, pages, anchors);
    }
}

fn first_page(block: &ContentBlock, pages: &HashMap<&str, usize>) -> Option<usize> {
    if block.is_hidden() {
        return None;
    }
    if let Some(page) = pages.get(block.id()) {
        return Some(*page);
    }
    if block.is_atomic() {
        return None;
    }
    block.children().iter().find_map(|child| first_page(child, pages))
}

/// Splits `root` into pages for `geometry`.
///
/// Fails with [`ExportError::EmptyDocument`] when nothing visible is left to
/// place and with the validation errors described on [`ExportError`] when the
/// measurements are inconsistent. Planning the same tree twice yields equal
/// plans.
pub fn plan(root: &ContentBlock, geometry: &PageGeometry) -> Result<PaginationPlan> {
    geometry.validate()?;
    validate_tree(root, geometry.block_spacing_px())?;

    let candidates = flatten(root);
    if candidates.is_empty() {
        return Err(ExportError::EmptyDocument);
    }

    let layout = Layout {
        capacity_px: geometry.content_height_px(),
        spacing_px: geometry.block_spacing_px(),
    };

    let cursor = candidates.iter().enumerate().fold(
        Cursor::new(),
        |cursor, (index, candidate)| {
            let group = header_group(&candidates, index, &layout);
            cursor.advance(index, candidate, group.as_ref(), &layout)
        },
    );

    let plan = cursor.finish(layout.capacity_px);
    debug!(
        "planned {} blocks onto {} pages ({} degradations)",
        candidates.len(),
        plan.pages.len(),
        plan.degradations.len()
    );
    Ok(plan)
}

struct Layout {
    capacity_px: f64,
    spacing_px: f64,
}

struct Candidate<'a> {
    block: &'a ContentBlock,
    /// Ordinals of the enclosing sections, outermost first.
    sections: Vec<usize>,
}

/// Blocks a header has to share its page with: the headers directly below
/// it and the first block that is not a header, all inside the header's
/// section.
struct HeaderGroup<'a> {
    last_index: usize,
    last: &'a ContentBlock,
    height_px: f64,
}

fn fits(height_px: f64, room_px: f64) -> bool {
    height_px <= room_px + FIT_TOLERANCE_PX
}

fn header_group<'a>(
    candidates: &[Candidate<'a>],
    index: usize,
    layout: &Layout,
) -> Option<HeaderGroup<'a>> {
    let header = candidates.get(index)?;
    if !oracle::avoids_orphan(header.block.kind()) {
        return None;
    }

    let mut group = None;
    let mut height_px = header.block.height_px();
    for (offset, next) in candidates[index + 1..].iter().enumerate() {
        if !next.sections.starts_with(&header.sections) {
            break;
        }
        height_px += layout.spacing_px + next.block.height_px();
        group = Some(HeaderGroup {
            last_index: index + 1 + offset,
            last: next.block,
            height_px,
        });
        if !oracle::avoids_orphan(next.block.kind()) {
            break;
        }
    }
    group
}

fn flatten(root: &ContentBlock) -> Vec<Candidate<'_>> {
    let mut candidates = Vec::new();
    if root.is_hidden() {
        return candidates;
    }
    if root.is_atomic() {
        candidates.push(Candidate {
            block: root,
            sections: Vec::new(),
        });
        return candidates;
    }

    let mut ordinal = 0usize;
    let sections = open_section(root, &[], &mut ordinal);
    for child in root.visible_children() {
        flatten_into(child, &sections, &mut ordinal, &mut candidates);
    }
    candidates
}

fn flatten_into<'a>(
    block: &'a ContentBlock,
    sections: &[usize],
    ordinal: &mut usize,
    candidates: &mut Vec<Candidate<'a>>,
) {
    if block.is_atomic() || block.children().is_empty() {
        candidates.push(Candidate {
            block,
            sections: sections.to_vec(),
        });
        return;
    }
    let sections = open_section(block, sections, ordinal);
    for child in block.visible_children() {
        flatten_into(child, &sections, ordinal, candidates);
    }
}

fn open_section(block: &ContentBlock, enclosing: &[usize], ordinal: &mut usize) -> Vec<usize> {
    let mut sections = enclosing.to_vec();
    if block.kind() == BlockKind::Section {
        *ordinal += 1;
        sections.push(*ordinal);
    }
    sections
}

fn validate_tree(root: &ContentBlock, spacing_px: f64) -> Result<()> {
    let mut seen = HashSet::new();
    validate_block(root, spacing_px, &mut seen)
}

fn validate_block<'a>(
    block: &'a ContentBlock,
    spacing_px: f64,
    seen: &mut HashSet<&'a str>,
) -> Result<()> {
    if !seen.insert(block.id()) {
        return Err(ExportError::DuplicateBlockId(block.id().to_string()));
    }

    let height_px = block.height_px();
    if !height_px.is_finite() || height_px < 0.0 {
        return Err(ExportError::InvalidHeight {
            id: block.id().to_string(),
            height_px,
        });
    }

    for child in block.children() {
        validate_block(child, spacing_px, seen)?;
    }

    if block.is_hidden() || block.is_atomic() || block.children().is_empty() {
        return Ok(());
    }

    let expected_px = stacked_height(block.children(), spacing_px);
    if (expected_px - height_px).abs() > MEASUREMENT_TOLERANCE_PX {
        return Err(ExportError::StaleMeasurement {
            id: block.id().to_string(),
            expected_px,
            measured_px: height_px,
        });
    }
    Ok(())
}

/// Accumulator threaded through the planning fold.
struct Cursor {
    pages: Vec<PagePlan>,
    current: Vec<Placement>,
    /// Offset of the next placement from the top of the content area.
    filled_px: f64,
    /// Index of the last candidate of the header group being placed.
    keep_until: Option<usize>,
    degradations: Vec<Degradation>,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            filled_px: 0.0,
            keep_until: None,
            degradations: Vec::new(),
        }
    }

    fn page_index(&self) -> usize {
        self.pages.len()
    }

    fn remaining_px(&self, layout: &Layout) -> f64 {
        layout.capacity_px - self.filled_px
    }

    fn advance(
        self,
        index: usize,
        candidate: &Candidate<'_>,
        group: Option<&HeaderGroup<'_>>,
        layout: &Layout,
    ) -> Self {
        let block = candidate.block;
        let height_px = block.height_px();
        let was_kept = self.keep_until.map_or(false, |last| index <= last);

        // Room for kept blocks was reserved when their group was opened.
        let mut cursor = if was_kept || fits(height_px, self.remaining_px(layout)) {
            self
        } else {
            self.break_page()
        };

        if let Some(group) = group.filter(|_| !was_kept) {
            if !fits(group.height_px, cursor.remaining_px(layout)) {
                debug!(
                    "deferring header `{}` to keep it with `{}`",
                    block.id(),
                    group.last.id()
                );
                cursor = cursor.break_page();
            }
            if !fits(group.height_px, layout.capacity_px) {
                warn!(
                    "header `{}` and `{}` need {:.1}px together but a page holds {:.1}px; page {} will overflow",
                    block.id(),
                    group.last.id(),
                    group.height_px,
                    layout.capacity_px,
                    cursor.page_index()
                );
                cursor.degradations.push(Degradation::OverflowingHeaderGroup {
                    header_id: block.id().to_string(),
                    follower_id: group.last.id().to_string(),
                    page_index: cursor.page_index(),
                    height_px: group.height_px,
                });
            }
            cursor.keep_until = Some(group.last_index);
        }

        if !fits(height_px, layout.capacity_px) {
            warn!(
                "block `{}` is {:.1}px tall but a page holds {:.1}px; it will overflow page {}",
                block.id(),
                height_px,
                layout.capacity_px,
                cursor.page_index()
            );
            cursor.degradations.push(Degradation::OversizedAtomicBlock {
                block_id: block.id().to_string(),
                page_index: cursor.page_index(),
                height_px,
            });
        }

        cursor.place(block, layout);
        if cursor.keep_until.map_or(false, |last| index >= last) {
            cursor.keep_until = None;
        }
        cursor
    }

    fn place(&mut self, block: &ContentBlock, layout: &Layout) {
        let y_offset_px = self.filled_px;
        self.current.push(Placement {
            block_id: block.id().to_string(),
            kind: block.kind(),
            y_offset_px,
            height_px: block.height_px(),
        });
        self.filled_px += block.height_px() + layout.spacing_px;
    }

    fn break_page(mut self) -> Self {
        if self.current.is_empty() {
            return self;
        }

        let placements = std::mem::take(&mut self.current);
        let used_height_px = placements.last().map(Placement::bottom_px).unwrap_or(0.0);
        self.pages.push(PagePlan {
            page_index: self.pages.len(),
            placements,
            used_height_px,
        });
        self.filled_px = 0.0;
        self.keep_until = None;
        self
    }

    fn finish(self, capacity_px: f64) -> PaginationPlan {
        let cursor = self.break_page();
        PaginationPlan {
            content_height_px: capacity_px,
            pages: cursor.pages,
            degradations: cursor.degradations,
        }
    }
}
