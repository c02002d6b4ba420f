/// Truncate to at most `max_bytes` without splitting a character.
pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

/// Collapse markup into a one-line preview for logs and terminal frames.
pub fn fragment_preview(html: &str, max_bytes: usize) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_string(&collapsed, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_string("abc", 10), "abc");
        assert_eq!(truncate_string("→→", 4), "→");
    }

    #[test]
    fn preview_strips_tags() {
        let html = "<h4>Table in 1NF</h4><table><tr><td>1</td></tr></table>";
        assert_eq!(fragment_preview(html, 100), "Table in 1NF 1");
        assert_eq!(fragment_preview(html, 5), "Table");
    }
}
