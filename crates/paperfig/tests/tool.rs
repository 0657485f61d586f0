//! Tests for the `extract_pdf_figure` tool executor over an in-memory backend.

use std::path::PathBuf;

use base64::Engine;
use paperfig::tool::{FigureTool, ToolContent};
use paperfig_core::memory::{MemoryBackend, MemoryDocument};
use paperfig_core::{ImagePlacement, PageLayout, Rect, TextBlock};
use serde_json::json;

fn paper(caption: &str) -> MemoryDocument {
    MemoryDocument::new(vec![
        PageLayout {
            index: 0,
            bounds: Rect::new(0.0, 0.0, 612.0, 792.0),
            blocks: vec![TextBlock::text("Introduction", Rect::new(50.0, 80.0, 200.0, 95.0))],
            images: vec![],
        },
        PageLayout {
            index: 1,
            bounds: Rect::new(0.0, 0.0, 612.0, 792.0),
            blocks: vec![TextBlock::text(caption, Rect::new(50.0, 600.0, 300.0, 615.0))],
            images: vec![ImagePlacement {
                bbox: Rect::new(50.0, 300.0, 550.0, 595.0),
            }],
        },
    ])
}

fn tool_with(caption: &str) -> FigureTool {
    let backend = MemoryBackend::new().with_document("paper.pdf", paper(caption));
    let mut tool = FigureTool::new(backend);
    tool.set_current_pdf(Some(PathBuf::from("paper.pdf")));
    tool
}

#[test]
fn no_pdf_loaded() {
    let tool = FigureTool::new(MemoryBackend::new());
    let result = tool.execute(&json!({ "figure_number": 1 }));
    assert!(result.is_error);
    assert_eq!(result.text(), "No PDF is currently loaded.");
}

#[test]
fn missing_or_invalid_argument() {
    let tool = tool_with("Figure 1. Overview.");
    for args in [json!({}), json!({ "figure_number": "one" }), json!({ "figure_number": -2 })] {
        let result = tool.execute(&args);
        assert!(result.is_error);
        assert_eq!(result.text(), "Missing figure_number argument.");
    }
}

#[test]
fn figure_not_found() {
    let tool = tool_with("Figure 1. Overview.");
    let result = tool.execute(&json!({ "figure_number": 4 }));
    assert!(result.is_error);
    assert_eq!(result.text(), "Figure 4 not found in the current paper.");
}

#[test]
fn extraction_failure_is_error_result() {
    let mut tool = tool_with("Figure 1. Overview.");
    tool.set_current_pdf(Some(PathBuf::from("other.pdf")));
    let result = tool.execute(&json!({ "figure_number": 1 }));
    assert!(result.is_error);
    assert!(result.text().starts_with("Figure extraction failed:"));
}

#[test]
fn found_figure_returns_image_and_caption() -> anyhow::Result<()> {
    let tool = tool_with("Figure 1. Overview of the system.");
    let result = tool.execute(&json!({ "figure_number": 1 }));

    assert!(!result.is_error);
    assert_eq!(result.content.len(), 2);

    let ToolContent::Image { source } = &result.content[0] else {
        panic!("expected an image block first");
    };
    assert_eq!(source.kind, "base64");
    assert_eq!(source.media_type, "image/png");
    let png = base64::engine::general_purpose::STANDARD.decode(&source.data)?;
    assert_eq!(&png[1..4], b"PNG");

    assert_eq!(
        result.text(),
        "Figure 1 (page 2). Caption: Figure 1. Overview of the system."
    );
    Ok(())
}

#[test]
fn long_caption_truncated() {
    let long = format!("Figure 1. {}", "x".repeat(800));
    let tool = tool_with(&long);
    let result = tool.execute(&json!({ "figure_number": 1 }));

    let text = result.text();
    let caption = text
        .strip_prefix("Figure 1 (page 2). Caption: ")
        .unwrap_or_default();
    assert_eq!(caption.chars().count(), 500);
}

#[test]
fn clearing_pdf() {
    let mut tool = tool_with("Figure 1. Overview.");
    assert!(tool.current_pdf().is_some());
    tool.set_current_pdf(None);
    assert!(tool.execute(&json!({ "figure_number": 1 })).is_error);
}
