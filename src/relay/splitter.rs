//! Splits the tutor's answer into its English body and Chinese translation.
//!
//! The upstream model is asked to append the translation inside
//! `<div class="translation">...</div>`. When it does not, the last line of the
//! answer is taken as the translation.

pub const TRANSLATION_MARKER: &str = r#"<div class="translation">"#;
const TRANSLATION_CLOSE: &str = "</div>";

/// Returned as the translation when nothing could be extracted
pub const TRANSLATION_PLACEHOLDER: &str = "中文翻译未能正确提取，请查看英文回复内容。";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResponse {
    pub english: String,
    pub translation: String,
}

pub fn split_response(content: &str) -> SplitResponse {
    if let Some((english, rest)) = content.split_once(TRANSLATION_MARKER) {
        // Only a closing tag that ends the answer is dropped
        let rest = rest.trim_end();
        let translation = rest.strip_suffix(TRANSLATION_CLOSE).unwrap_or(rest);
        return SplitResponse {
            english: english.trim().to_string(),
            translation: translation.trim().to_string(),
        };
    }

    let lines: Vec<&str> = content.split('\n').collect();
    match lines.split_last() {
        Some((last, init)) if !init.is_empty() => SplitResponse {
            english: init.join("\n").trim().to_string(),
            translation: last.trim().to_string(),
        },
        _ => SplitResponse {
            english: content.to_string(),
            translation: TRANSLATION_PLACEHOLDER.to_string(),
        },
    }
}
