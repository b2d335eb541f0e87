//! WebVTT caption parsing.
//!
//! Handles both uploaded captions and YouTube's auto-generated ones, which
//! repeat the previous line in every cue and carry inline word timing tags.

use super::TranscriptSegment;
use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

/// Parse WebVTT content into transcript segments.
///
/// Header, NOTE and STYLE blocks are skipped. Lines already emitted by the
/// previous cue are dropped, so rolling auto-captions yield each line once.
pub fn parse_vtt(content: &str) -> Vec<TranscriptSegment> {
    let mut segments = Vec::new();
    let mut last_line: Option<String> = None;
    let normalized = content.replace("\r\n", "\n");

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().skip_while(|l| !l.contains("-->"));
        let Some(timing) = lines.next() else {
            continue;
        };
        let Some((start, end)) = parse_timing(timing) else {
            continue;
        };

        let mut texts = Vec::new();
        for raw in lines {
            let line = clean_line(raw);
            if line.is_empty() {
                continue;
            }
            if last_line.as_deref() == Some(line.as_str()) {
                continue;
            }
            last_line = Some(line.clone());
            texts.push(line);
        }

        if !texts.is_empty() {
            segments.push(TranscriptSegment::new(start, end, texts.join(" ")));
        }
    }

    segments
}

/// Parse `00:00:01.000 --> 00:00:04.000 align:start` into seconds.
fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_time(start.trim())?, parse_time(end)?))
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm`.
fn parse_time(value: &str) -> Option<f64> {
    let value = value.replace(',', ".");
    let parts: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        _ => return None,
    };
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Strip tags, decode common entities and collapse whitespace.
fn clean_line(line: &str) -> String {
    let without_tags = tag_regex().replace_all(line, "");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_captions() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n1\n00:00:00.000 --> 00:00:02.500\nHello world.\n\n2\n00:00:02.500 --> 00:00:05.000 align:start position:0%\nThis is a test\nwith two lines.\n";
        let segments = parse_vtt(vtt);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], TranscriptSegment::new(0.0, 2.5, "Hello world.".to_string()));
        assert_eq!(segments[1].text, "This is a test with two lines.");
        assert_eq!(segments[1].end_seconds, 5.0);
    }

    #[test]
    fn test_parse_rolling_auto_captions() {
        let vtt = [
            "WEBVTT",
            "",
            "00:00:00.160 --> 00:00:02.270 align:start position:0%",
            " ",
            "so<00:00:00.560><c> today</c><00:00:00.880><c> we</c>",
            "",
            "00:00:02.270 --> 00:00:02.280 align:start position:0%",
            "so today we",
            " ",
            "",
            "00:00:02.280 --> 00:00:04.630 align:start position:0%",
            "so today we",
            "talk<00:00:02.800><c> about</c><00:00:03.100><c> rust</c>",
            "",
        ]
        .join("\n");

        let segments = parse_vtt(&vtt);
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["so today we", "talk about rust"]);
        assert_eq!(segments[1].start_seconds, 2.28);
    }

    #[test]
    fn test_entities_and_short_timestamps() {
        let vtt = "WEBVTT\n\n01:02.000 --> 01:03.500\nTom &amp; Jerry&nbsp;say &quot;hi&quot;\n";
        let segments = parse_vtt(vtt);
        assert_eq!(segments[0].start_seconds, 62.0);
        assert_eq!(segments[0].text, "Tom & Jerry say \"hi\"");
    }

    #[test]
    fn test_notes_and_garbage_are_skipped() {
        let vtt = "WEBVTT\n\nNOTE this is a comment\n\nSTYLE\n::cue { color: white }\n\nnot --> a timing\ntext\n";
        assert!(parse_vtt(vtt).is_empty());
    }
}
