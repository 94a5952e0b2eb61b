use std::collections::HashSet;

use resume_pager::error::ExportError;
use resume_pager::geometry::PageGeometry;
use resume_pager::model::{BlockKind, ContentBlock};
use resume_pager::planner::{self, PaginationPlan, Placement};

const TOLERANCE_PX: f64 = 1e-3;

fn fixture() -> ContentBlock {
    let text = include_str!("fixtures/resume.json");
    serde_json::from_str(text).expect("fixture parses")
}

fn ids(plan: &PaginationPlan, page: usize) -> Vec<&str> {
    plan.pages()[page]
        .placements()
        .iter()
        .map(Placement::block_id)
        .collect()
}

/// Small deterministic generator so the property checks run over many trees
/// without pulling in a property-testing framework.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn range(&mut self, low: u64, high: u64) -> u64 {
        low + self.next() % (high - low + 1)
    }

    fn height(&mut self) -> f64 {
        // Mostly page-friendly heights with the occasional oversized block.
        if self.range(0, 19) == 0 {
            self.range(260, 420) as f64
        } else {
            self.range(8, 180) as f64
        }
    }
}

fn generated_resume(seed: u64, spacing_px: f64) -> ContentBlock {
    let mut rng = Lcg(seed);
    let mut next_id = 0usize;
    let mut id = |prefix: &str| {
        next_id += 1;
        format!("{prefix}-{next_id}")
    };

    let mut sections = vec![ContentBlock::leaf(id("profile"), rng.height())];
    for _ in 0..rng.range(1, 6) {
        let mut children = vec![ContentBlock::section_header(
            id("title"),
            rng.range(20, 60) as f64,
        )];
        if rng.range(0, 3) == 0 {
            children.push(ContentBlock::section_header(
                id("subtitle"),
                rng.range(10, 40) as f64,
            ));
        }

        // Zero entries leaves the header at the end of its section.
        for _ in 0..rng.range(0, 5) {
            let block = match rng.range(0, 4) {
                0 => ContentBlock::item(id("item"), rng.height()),
                1 => ContentBlock::highlight_item(id("highlight"), rng.height()),
                2 => {
                    let groups = (0..rng.range(1, 4))
                        .map(|_| ContentBlock::skill_group(id("skills"), rng.height()))
                        .collect();
                    ContentBlock::stacked(id("grid"), BlockKind::Container, groups, spacing_px)
                }
                3 => {
                    let mut nested = vec![ContentBlock::section_header(
                        id("nested-title"),
                        rng.range(20, 50) as f64,
                    )];
                    for _ in 0..rng.range(0, 3) {
                        nested.push(ContentBlock::item(id("nested-item"), rng.height()));
                    }
                    ContentBlock::stacked(id("nested"), BlockKind::Section, nested, spacing_px)
                }
                _ => ContentBlock::leaf(id("note"), rng.height()),
            };
            let hidden = rng.range(0, 9) == 0;
            children.push(block.with_hidden(hidden));
        }

        sections.push(
            ContentBlock::stacked(id("section"), BlockKind::Section, children, spacing_px)
                .with_label(Some(format!("Section {seed}"))),
        );
    }

    ContentBlock::stacked("root", BlockKind::Container, sections, spacing_px)
}

fn parent_of<'a>(block: &'a ContentBlock, id: &str) -> Option<&'a ContentBlock> {
    block.children().iter().find_map(|child| {
        if child.id() == id {
            Some(block)
        } else {
            parent_of(child, id)
        }
    })
}

fn check_properties(root: &ContentBlock, geometry: &PageGeometry) {
    let plan = planner::plan(root, geometry).expect("generated tree plans");
    let content = geometry.content_height_px();
    let placed = plan.placed_ids();

    // Completeness and order preservation.
    let placed_set: HashSet<_> = placed.iter().copied().collect();
    assert_eq!(placed_set.len(), placed.len(), "a block was placed twice");
    let atomic: Vec<_> = root.atomic_ids();
    let placed_atomic: Vec<_> = placed
        .iter()
        .copied()
        .filter(|id| root.find(id).map(ContentBlock::is_atomic).unwrap_or(false))
        .collect();
    assert_eq!(placed_atomic, atomic);

    for (index, page) in plan.pages().iter().enumerate() {
        assert_eq!(page.page_index(), index);
        assert!(!page.placements().is_empty(), "page {index} is empty");

        // Placements go strictly down the page.
        for pair in page.placements().windows(2) {
            assert!(pair[1].y_offset_px() >= pair[0].bottom_px() - TOLERANCE_PX);
        }

        // Page capacity and the no-split guarantee.
        if !plan.is_oversized(index) {
            assert!(
                page.used_height_px() <= content + TOLERANCE_PX,
                "page {index} uses {} of {content}",
                page.used_height_px()
            );
            for placement in page.placements() {
                assert!(placement.bottom_px() <= content + TOLERANCE_PX);
            }
        }

        // A header closing a page must not have its section continue on the
        // next one.
        if let Some(next_page) = plan.pages().get(index + 1) {
            let last = page.placements().last().expect("non-empty page");
            if last.kind() == BlockKind::SectionHeader {
                let section = parent_of(root, last.block_id()).expect("header has a parent");
                let first = next_page.placements()[0].block_id();
                assert!(
                    section.find(first).is_none(),
                    "header `{}` ends page {index} but its section continues with `{first}`",
                    last.block_id()
                );
            }
        }
    }

    // Idempotence.
    assert_eq!(planner::plan(root, geometry).expect("second plan"), plan);
}

#[test]
fn scenario_three_items_two_pages() {
    let root = ContentBlock::stacked(
        "root",
        BlockKind::Container,
        vec![
            ContentBlock::item("item-1", 100.0),
            ContentBlock::item("item-2", 100.0),
            ContentBlock::item("item-3", 100.0),
        ],
        0.0,
    );
    let plan = planner::plan(&root, &PageGeometry::with_content_height_px(250.0)).expect("plan");

    assert_eq!(plan.page_count(), 2);
    assert_eq!(ids(&plan, 0), vec!["item-1", "item-2"]);
    assert_eq!(plan.pages()[0].used_height_px(), 200.0);
    assert_eq!(ids(&plan, 1), vec!["item-3"]);
}

#[test]
fn scenario_header_deferred_with_its_item() {
    let root = ContentBlock::stacked(
        "root",
        BlockKind::Container,
        vec![
            ContentBlock::item("prior", 60.0),
            ContentBlock::stacked(
                "experience",
                BlockKind::Section,
                vec![
                    ContentBlock::section_header("experience-title", 40.0),
                    ContentBlock::item("job", 220.0),
                ],
                0.0,
            ),
        ],
        0.0,
    );
    let plan = planner::plan(&root, &PageGeometry::with_content_height_px(250.0)).expect("plan");

    assert_eq!(ids(&plan, 0), vec!["prior"]);
    assert_eq!(ids(&plan, 1), vec!["experience-title", "job"]);
    assert_eq!(plan.page_of("experience-title"), plan.page_of("job"));
}

#[test]
fn scenario_oversized_block_overflows_its_own_page() {
    let root = ContentBlock::stacked(
        "root",
        BlockKind::Container,
        vec![ContentBlock::item("poster", 400.0)],
        0.0,
    );
    let plan = planner::plan(&root, &PageGeometry::with_content_height_px(250.0)).expect("plan");

    assert_eq!(plan.page_count(), 1);
    assert_eq!(ids(&plan, 0), vec!["poster"]);
    assert!(plan.is_oversized(0));
    assert_eq!(plan.degradations().len(), 1);
    assert_eq!(plan.pages()[0].used_height_px(), 400.0);
}

#[test]
fn scenario_empty_model_produces_no_pages() {
    let root = ContentBlock::container("root", 0.0);
    assert!(matches!(
        planner::plan(&root, &PageGeometry::default()),
        Err(ExportError::EmptyDocument)
    ));
}

#[test]
fn fixture_fits_two_a4_pages() {
    let root = fixture();
    let plan = planner::plan(&root, &PageGeometry::default()).expect("plan");

    assert_eq!(plan.page_count(), 2);
    assert_eq!(ids(&plan, 1)[0], "skills-tooling");
    assert_eq!(plan.page_of("job-intern"), None);
    let titles: Vec<_> = plan
        .section_anchors(&root)
        .into_iter()
        .map(|anchor| (anchor.title, anchor.page_index))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Experience".to_string(), 0),
            ("Skills".to_string(), 0),
            ("Highlights".to_string(), 1),
        ]
    );
}

#[test]
fn fixture_on_short_pages_keeps_headers_with_entries() {
    let root = fixture();
    let plan = planner::plan(&root, &PageGeometry::with_content_height_px(530.0)).expect("plan");

    assert_eq!(plan.page_count(), 4);
    assert_eq!(ids(&plan, 0), vec!["profile", "experience-title", "job-staff-engineer"]);
    assert_eq!(ids(&plan, 1), vec!["job-senior-engineer", "job-engineer"]);
    assert_eq!(ids(&plan, 2)[0], "skills-title");
    assert_eq!(ids(&plan, 3), vec!["highlight-mentoring"]);
    assert!(plan.degradations().is_empty());
}

#[test]
fn stale_fixture_is_reported_not_repaired() {
    let text = include_str!("fixtures/resume.json").replacen("\"heightPx\": 1510", "\"heightPx\": 1400", 1);
    let root: ContentBlock = serde_json::from_str(&text).expect("fixture parses");

    match planner::plan(&root, &PageGeometry::default()) {
        Err(ExportError::StaleMeasurement { id, expected_px, .. }) => {
            assert_eq!(id, "resume");
            assert_eq!(expected_px, 1510.0);
        }
        other => panic!("expected stale measurement, got {other:?}"),
    }
}

#[test]
fn generated_trees_hold_pagination_properties() {
    for seed in 1..=200 {
        let root = generated_resume(seed, 0.0);
        check_properties(&root, &PageGeometry::with_content_height_px(250.0));
    }
}

#[test]
fn generated_trees_hold_properties_with_spacing() {
    for seed in 1..=200 {
        let root = generated_resume(seed, 6.0);
        let geometry = PageGeometry::with_content_height_px(320.0).with_block_spacing_px(6.0);
        check_properties(&root, &geometry);
    }
}

#[test]
fn plan_serializes_for_the_cli() {
    let root = fixture();
    let plan = planner::plan(&root, &PageGeometry::default()).expect("plan");
    let json = serde_json::to_value(&plan).expect("serialize");

    assert_eq!(json["pages"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["pages"][0]["placements"][0]["blockId"], "profile");
    assert_eq!(json["pages"][0]["placements"][0]["kind"], "leaf");
    assert!(json.get("degradations").is_none());
}
