//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate an anchor tag; external links open in a new tab
pub fn link_to(href: &str, text: &str, external: bool) -> String {
    if external {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
            html_escape(href),
            text
        )
    } else {
        format!(r#"<a href="{}">{}</a>"#, html_escape(href), text)
    }
}

/// Count words in plain text
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if !in_word {
                in_word = true;
                count += 1;
            }
        } else {
            in_word = false;
        }
    }

    count
}
