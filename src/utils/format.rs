//! Formatting utilities.

/// Format a byte count as a human-readable size.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Shorten a file name for a progress line, keeping the extension visible.
pub fn truncate_display_name(name: &str, max_chars: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_chars {
        return name.to_string();
    }

    if let Some(dot) = chars.iter().rposition(|c| *c == '.') {
        let ext_len = chars.len() - dot;
        if ext_len + 4 < max_chars {
            let prefix: String = chars[..max_chars - ext_len - 3].iter().collect();
            let ext: String = chars[dot..].iter().collect();
            return format!("{}...{}", prefix, ext);
        }
    }

    let prefix: String = chars[..max_chars.saturating_sub(3)].iter().collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1500), "1.5 KB");
        assert_eq!(format_size(1_500_000), "1.5 MB");
        assert_eq!(format_size(1_500_000_000), "1.5 GB");
    }

    #[test]
    fn test_truncate_display_name() {
        assert_eq!(truncate_display_name("short.mp4", 20), "short.mp4");
        assert_eq!(
            truncate_display_name("A-Very-Long-Lecture-Title-On-Gravity.mp4", 25),
            "A-Very-Long-Lectur....mp4"
        );
        assert_eq!(truncate_display_name("no_extension", 8), "no_ex...");
        // Multi-byte titles are cut on character boundaries
        assert_eq!(truncate_display_name("ééééééééé", 6), "ééé...");
    }
}
