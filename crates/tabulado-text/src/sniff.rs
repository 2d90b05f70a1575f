//! Delimiter detection for untyped text uploads.
//!
//! For each candidate delimiter we count occurrences per line over the
//! first non-blank lines of the file and score the candidate as
//! `mean - stddev` of those counts. A good delimiter appears often and
//! with a consistent count per line, so a high mean and a low spread win.

/// Candidate delimiters, in preference order for ties.
pub const CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];

/// How many non-blank lines the sniffer inspects.
const SAMPLE_LINES: usize = 30;

/// Pick the most plausible delimiter for `text`, or `None` when no
/// candidate scores positively (e.g. a single-column file).
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, f64)> = None;
    for &cand in &CANDIDATES {
        let counts: Vec<f64> = lines
            .iter()
            .map(|l| l.bytes().filter(|&b| b == cand).count() as f64)
            .collect();
        if counts.iter().all(|&c| c == 0.0) {
            continue;
        }
        let mean = counts.iter().sum::<f64>() / counts.len() as f64;
        let var = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
        let score = mean - var.sqrt();
        log::debug!(
            "delimiter candidate {:?}: mean {:.2}, score {:.2}",
            cand as char,
            mean,
            score
        );
        if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((cand, score));
        }
    }
    best.map(|(c, _)| c)
}

/// Fallback when sniffing was inconclusive: the candidate with the most
/// total occurrences in the sample, or `,` when none appears at all.
pub fn auto_pick(text: &str) -> u8 {
    let sample: String = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    CANDIDATES
        .iter()
        .copied()
        .map(|c| (c, sample.bytes().filter(|&b| b == c).count()))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map(|(c, _)| c)
        .unwrap_or(b',')
}
