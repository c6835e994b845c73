use unicode_width::UnicodeWidthStr;

/// Width of one lyric line on screen, in columns
pub const LYRIC_LINE_WIDTH: usize = 42;

/// `m:ss` for a countdown. Negative values show as `0:00`.
pub fn format_time(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Greedy word wrap measured in display columns. A word wider than
/// `max_width` gets a line to itself rather than being broken.
pub fn split_lyrics(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0;

    for word in text.split_whitespace() {
        let w = word.width();
        if !line.is_empty() && width + 1 + w > max_width {
            lines.push(std::mem::take(&mut line));
            width = 0;
        }
        if !line.is_empty() {
            line.push(' ');
            width += 1;
        }
        line.push_str(word);
        width += w;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(1000), "0:01");
        assert_eq!(format_time(65_000), "1:05");
        assert_eq!(format_time(600_000), "10:00");
    }

    #[test]
    fn test_format_time_negative() {
        assert_eq!(format_time(-500), "0:00");
        assert_eq!(format_time(i64::MIN), "0:00");
    }

    #[test]
    fn test_split_short_line() {
        assert_eq!(split_lyrics("you are my sunshine", 42), vec!["you are my sunshine"]);
    }

    #[test]
    fn test_split_wraps_on_words() {
        let lines = split_lyrics("you make me happy when skies are gray", 16);
        assert_eq!(lines, vec!["you make me", "happy when skies", "are gray"]);
        assert!(lines.iter().all(|l| l.width() <= 16));
    }

    #[test]
    fn test_split_collapses_whitespace() {
        assert_eq!(split_lyrics("  la   la\n la ", 42), vec!["la la la"]);
        assert!(split_lyrics("   ", 42).is_empty());
    }

    #[test]
    fn test_split_long_word_stands_alone() {
        assert_eq!(
            split_lyrics("a supercalifragilistic b", 10),
            vec!["a", "supercalifragilistic", "b"]
        );
    }

    #[test]
    fn test_split_measures_display_width() {
        // each ideograph is two columns wide
        let lines = split_lyrics("太陽 太陽 太陽", 10);
        assert_eq!(lines, vec!["太陽 太陽", "太陽"]);
    }
}
