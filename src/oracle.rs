//! Break rules shared by the PDF export path and the print stylesheet.
//!
//! [`RULES`] is the only place where block kinds are tagged as atomic or as
//! headers that must stay with their first follower. The planner reads it
//! through [`rule`], and [`print_stylesheet`] renders the same table as CSS so
//! the browser print path breaks pages at the same places. A new
//! [`BlockKind`] has to be registered here before either path can honour it.

use std::fmt::Write as _;

use crate::model::BlockKind;

/// Pagination behaviour of one block kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRule {
    /// Kind the rule applies to.
    pub kind: BlockKind,
    /// CSS class the editor puts on elements of this kind.
    pub class_name: &'static str,
    /// Never split across a page boundary.
    pub atomic: bool,
    /// Never the last placement on a page when its section continues.
    pub avoid_orphan_header: bool,
}

/// The rule table, one entry per [`BlockKind`] in declaration order.
pub const RULES: [BlockRule; 7] = [
    BlockRule {
        kind: BlockKind::Container,
        class_name: "cv-container",
        atomic: false,
        avoid_orphan_header: false,
    },
    BlockRule {
        kind: BlockKind::Section,
        class_name: "cv-section",
        atomic: false,
        avoid_orphan_header: false,
    },
    BlockRule {
        kind: BlockKind::SectionHeader,
        class_name: "cv-section-header",
        atomic: true,
        avoid_orphan_header: true,
    },
    BlockRule {
        kind: BlockKind::Item,
        class_name: "cv-item",
        atomic: true,
        avoid_orphan_header: false,
    },
    BlockRule {
        kind: BlockKind::SkillGroup,
        class_name: "cv-skill-group",
        atomic: true,
        avoid_orphan_header: false,
    },
    BlockRule {
        kind: BlockKind::HighlightItem,
        class_name: "cv-highlight-item",
        atomic: true,
        avoid_orphan_header: false,
    },
    BlockRule {
        kind: BlockKind::Leaf,
        class_name: "cv-leaf",
        atomic: false,
        avoid_orphan_header: false,
    },
];

/// Returns the rule registered for `kind`.
pub fn rule(kind: BlockKind) -> &'static BlockRule {
    // RULES is indexed by discriminant; the unit tests keep the two in sync.
    &RULES[kind as usize]
}

/// Returns whether blocks of `kind` must not be split across pages.
pub fn is_atomic(kind: BlockKind) -> bool {
    rule(kind).atomic
}

/// Returns whether blocks of `kind` must be kept with the block that follows.
pub fn avoids_orphan(kind: BlockKind) -> bool {
    rule(kind).avoid_orphan_header
}

/// Renders the print-path stylesheet for the rule table.
///
/// Atomic kinds receive `break-inside: avoid` and orphan-avoiding kinds
/// receive `break-after: avoid`, each with the legacy `page-break-*` alias.
pub fn print_stylesheet() -> String {
    let mut css = String::new();

    for rule in RULES.iter().filter(|rule| rule.atomic) {
        let _ = writeln!(
            css,
            ".{} {{ break-inside: avoid; page-break-inside: avoid; }}",
            rule.class_name
        );
    }

    for rule in RULES.iter().filter(|rule| rule.avoid_orphan_header) {
        let _ = writeln!(
            css,
            ".{} {{ break-after: avoid; page-break-after: avoid; }}",
            rule.class_name
        );
    }

    css
}
