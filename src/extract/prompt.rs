//! Address extraction prompt.

/// OCR text beyond this many characters is not sent to the model.
pub const MAX_PROMPT_CHARS: usize = 3000;

/// Build the prompt asking for the single most likely mailing address.
pub fn address_prompt(ocr_text: &str) -> String {
    format!(
        "From the text below, extract the single most likely physical mailing address \
         (the property address).\n\
         Reply with only a list literal containing exactly one string, such as \
         [\"123 Main St, Norfolk, VA 23510\"], and nothing else.\n\n\
         \"\"\"{}\"\"\"\n",
        truncate_chars(ocr_text, MAX_PROMPT_CHARS)
    )
}

/// The first `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
