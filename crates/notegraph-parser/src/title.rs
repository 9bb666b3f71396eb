//! Note title inference

/// Infer a display title from note content
///
/// The title is the first line with visible characters, with a heading or
/// quote sigil and wikilink brackets removed.
pub fn infer_note_title(content: &str) -> String {
    let Some(line) = content.lines().find(|line| !line.trim().is_empty()) else {
        return String::new();
    };

    let line = line.trim();
    let line = if line.starts_with('#') {
        line.trim_start_matches('#')
    } else {
        line.strip_prefix('>').unwrap_or(line)
    };

    line.replace("[[", "").replace("]]", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_title() {
        assert_eq!(infer_note_title("# Heading\nbody"), "Heading");
        assert_eq!(infer_note_title("\n  \n> Quoted title"), "Quoted title");
        assert_eq!(infer_note_title("About [[Rust]] things"), "About Rust things");
        assert_eq!(infer_note_title("## Nested"), "Nested");
        assert_eq!(infer_note_title("plain"), "plain");
        assert_eq!(infer_note_title("  \n\t"), "");
    }
}
