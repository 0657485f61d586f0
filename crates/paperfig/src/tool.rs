//! The `extract_pdf_figure` conversational tool.
//!
//! Wraps figure extraction for an LLM tool-use loop: the host sets the PDF the
//! user is reading, the model asks for a figure by number, and the result
//! comes back as a base64 PNG block plus a caption text block.

use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use paperfig_core::PdfBackend;
use paperfig_layout::{FigureConfig, FigureExtractor};

pub const TOOL_NAME: &str = "extract_pdf_figure";

/// Captions longer than this are cut in the text block.
const MAX_CAPTION_CHARS: usize = 500;

/// Source of an image content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ToolContent::Text { text } => Some(text.as_str()),
                ToolContent::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Executor for the `extract_pdf_figure` tool.
pub struct FigureTool {
    backend: Box<dyn PdfBackend>,
    extractor: FigureExtractor,
    current_pdf: Option<PathBuf>,
}

#[cfg(feature = "pdf")]
impl Default for FigureTool {
    fn default() -> Self {
        Self::new(paperfig_mupdf::MupdfBackend::default())
    }
}

impl FigureTool {
    pub fn new(backend: impl PdfBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            extractor: FigureExtractor::new(),
            current_pdf: None,
        }
    }

    pub fn with_config(mut self, config: FigureConfig) -> Self {
        self.extractor = FigureExtractor::with_config(config);
        self
    }

    /// JSON tool definition (name, description, input schema).
    pub fn definition() -> Value {
        json!({
            "name": TOOL_NAME,
            "description": "Extract a specific figure from the currently loaded PDF paper. \
                Returns a precisely cropped image of the figure plus its caption text. \
                Use this when the user mentions a specific figure number (e.g. \
                'Figure 3', 'Fig. 1'). Prefer this over a screenshot when discussing \
                a specific numbered figure in the loaded paper.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "figure_number": {
                        "type": "integer",
                        "description": "The figure number to extract (e.g. 3 for 'Figure 3')"
                    }
                },
                "required": ["figure_number"]
            }
        })
    }

    /// Set (or clear) the PDF the user is currently reading.
    pub fn set_current_pdf(&mut self, path: Option<PathBuf>) {
        self.current_pdf = path;
    }

    pub fn current_pdf(&self) -> Option<&Path> {
        self.current_pdf.as_deref()
    }

    /// Run the tool with the model-supplied arguments.
    pub fn execute(&self, args: &Value) -> ToolResult {
        let Some(path) = self.current_pdf.as_deref() else {
            return ToolResult::error("No PDF is currently loaded.");
        };

        let Some(number) = args
            .get("figure_number")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
        else {
            return ToolResult::error("Missing figure_number argument.");
        };

        let figure = match self
            .extractor
            .extract_figure_by_number(path, number, self.backend.as_ref())
        {
            Ok(Some(figure)) => figure,
            Ok(None) => {
                return ToolResult::error(format!(
                    "Figure {number} not found in the current paper."
                ));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), number, error = %e, "figure extraction failed");
                return ToolResult::error(format!("Figure extraction failed: {e}"));
            }
        };

        let data = base64::engine::general_purpose::STANDARD.encode(&figure.png_bytes);
        tracing::info!(
            number,
            page = figure.page + 1,
            size_kb = figure.png_bytes.len() / 1024,
            "extracted figure"
        );

        let caption: String = figure.caption.chars().take(MAX_CAPTION_CHARS).collect();
        ToolResult {
            content: vec![
                ToolContent::Image {
                    source: ImageSource {
                        kind: "base64".into(),
                        media_type: "image/png".into(),
                        data,
                    },
                },
                ToolContent::Text {
                    text: format!(
                        "Figure {number} (page {}). Caption: {caption}",
                        figure.page + 1
                    ),
                },
            ],
            is_error: false,
        }
    }
}
