//! Instruction texts sent alongside each image.
//!
//! Both pipelines send a single user turn: one text part carrying the
//! instruction below and one image part. Callers can override either via
//! [`crate::config::ConversionConfig::prompt`] or
//! [`crate::config::TranscriptionConfig::prompt`].

/// Instruction for `pdf2html`: one PDF page image in, raw HTML out.
pub const HTML_PROMPT: &str = "Convert this image to HTML. Respond with only the HTML.";

/// Instruction for `img2tei`. The model is asked for a code block, which
/// [`crate::pipeline::postprocess::extract_xml_block`] strips again.
pub const TEI_PROMPT: &str =
    "Transcribe this image to TEI P5 XML. Respond with only the XML in a code block.";

/// Line printed before reading an image path from stdin.
pub const IMAGE_PATH_PROMPT: &str = "Please enter the path to the image file: ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tei_prompt_asks_for_code_block() {
        assert!(TEI_PROMPT.contains("TEI P5"));
        assert!(TEI_PROMPT.contains("code block"));
    }

    #[test]
    fn html_prompt_asks_for_html_only() {
        assert!(HTML_PROMPT.contains("only the HTML"));
    }
}
