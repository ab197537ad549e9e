//! Language detection and tree-sitter grammar loading
//!
//! Store modules are written in the JavaScript family only. Vue single file
//! components are accepted as module files: their `<script>` block is
//! extracted and parsed with the grammar named by its `lang` attribute.

use std::path::Path;
use tree_sitter::Language;

use crate::error::{EngineError, Result};

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    /// Vue Single File Component (.vue)
    Vue,
    /// JSON documents can be import targets but never declare store modules
    Json,
}

impl Lang {
    /// Detect language from file path extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| EngineError::UnsupportedLanguage {
                extension: "none".to_string(),
            })?;

        Self::from_extension(ext)
    }

    /// Detect language from file extension string
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "js" | "mjs" | "cjs" => Ok(Self::JavaScript),
            "jsx" => Ok(Self::Jsx),
            "vue" => Ok(Self::Vue),
            "json" => Ok(Self::Json),
            _ => Err(EngineError::UnsupportedLanguage {
                extension: ext.to_string(),
            }),
        }
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::Vue => "vue",
            Self::Json => "json",
        }
    }

    /// Get the tree-sitter Language for parsing script sources.
    ///
    /// Returns `None` for containers that are not parsed directly: a `.vue`
    /// file is parsed through its script block, JSON is never parsed.
    pub fn tree_sitter_language(&self) -> Option<Language> {
        match self {
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Self::JavaScript | Self::Jsx => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::Vue | Self::Json => None,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Vue SFC script extraction
// =============================================================================

/// Extracted script content from a Vue SFC
#[derive(Debug)]
pub struct VueSfcScript {
    /// The script content (without script tags)
    pub content: String,
    /// The language (ts, tsx, js, jsx)
    pub lang: Lang,
    /// Number of lines of the `.vue` file before the script content
    pub line_offset: usize,
}

/// Extract the script section from a Vue SFC.
///
/// A plain `<script>` block wins over `<script setup>`: store modules and
/// option objects live in the former.
pub fn extract_sfc_script(source: &str) -> Option<VueSfcScript> {
    let mut search_from = 0;
    let mut setup_block = None;

    while let Some(found) = source[search_from..].find("<script") {
        let tag_start = search_from + found;
        let after_tag = &source[tag_start..];
        let tag_end_offset = after_tag.find('>')?;
        let opening_tag = &after_tag[..tag_end_offset + 1];

        let content_start = tag_start + tag_end_offset + 1;
        let content_end = source[content_start..].find("</script>")?;

        let script = VueSfcScript {
            content: source[content_start..content_start + content_end].to_string(),
            lang: detect_script_lang(opening_tag),
            line_offset: source[..content_start].matches('\n').count(),
        };

        if opening_tag.contains("setup") {
            setup_block.get_or_insert(script);
        } else {
            return Some(script);
        }
        search_from = content_start + content_end;
    }

    setup_block
}

/// Detect the script language from the opening tag
fn detect_script_lang(tag: &str) -> Lang {
    let has_lang = |value: &str| {
        tag.contains(&format!("lang=\"{}\"", value)) || tag.contains(&format!("lang='{}'", value))
    };

    if has_lang("ts") || has_lang("typescript") {
        Lang::TypeScript
    } else if has_lang("tsx") {
        Lang::Tsx
    } else if has_lang("jsx") {
        Lang::Jsx
    } else {
        Lang::JavaScript
    }
}
