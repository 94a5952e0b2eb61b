use resume_pager::model::{BlockKind, ContentBlock};

/// Gap between stacked blocks, matching the preview geometry.
pub const SPACING_PX: f64 = 8.0;

/// Builds a measured résumé with three labelled sections.
///
/// Heights stand in for the editor's measurement pass; every container is
/// stacked from its children so the tree is never stale.
pub fn build_sample_resume() -> ContentBlock {
    let profile = ContentBlock::leaf("profile", 140.0);

    let experience = ContentBlock::stacked(
        "experience",
        BlockKind::Section,
        vec![
            ContentBlock::section_header("experience-title", 44.0),
            ContentBlock::item("job-platform-lead", 310.0),
            ContentBlock::item("job-staff-engineer", 280.0),
            ContentBlock::item("job-senior-engineer", 260.0),
            ContentBlock::item("job-engineer", 230.0),
        ],
        SPACING_PX,
    )
    .with_label(Some("Experience".to_string()));

    let skills_grid = ContentBlock::stacked(
        "skills-grid",
        BlockKind::Container,
        ["languages", "infrastructure", "tooling", "practices"]
            .into_iter()
            .map(|name| ContentBlock::skill_group(format!("skills-{name}"), 76.0))
            .collect(),
        SPACING_PX,
    );
    let skills = ContentBlock::stacked(
        "skills",
        BlockKind::Section,
        vec![ContentBlock::section_header("skills-title", 44.0), skills_grid],
        SPACING_PX,
    )
    .with_label(Some("Skills".to_string()));

    let highlights = ContentBlock::stacked(
        "highlights",
        BlockKind::Section,
        vec![
            ContentBlock::section_header("highlights-title", 44.0),
            ContentBlock::highlight_item("highlight-latency", 120.0),
            ContentBlock::highlight_item("highlight-migration", 132.0),
            ContentBlock::highlight_item("highlight-oncall", 118.0),
            ContentBlock::highlight_item("highlight-mentoring", 104.0),
        ],
        SPACING_PX,
    )
    .with_label(Some("Highlights".to_string()));

    ContentBlock::stacked(
        "resume",
        BlockKind::Container,
        vec![profile, experience, skills, highlights],
        SPACING_PX,
    )
}
