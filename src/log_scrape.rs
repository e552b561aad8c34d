//! Scraping of the `Cell stats:` line from run logs.
//!
//! Benchmark drivers collect cell, segment and compartment counts from the
//! log rather than from structured output. This parser reads the same line
//! back, which keeps the log format and its consumers in step.

use std::sync::LazyLock;

use regex::Regex;

use crate::stats::CellStats;

static CELL_STATS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Cell stats:\s+(\d+) cells;\s+(\d+) segments;\s+(\d+) compartments;\s+([0-9.eE+-]+|NaN|inf) comp/cell",
    )
    .expect("Invalid cell stats regex")
});

/// Parsed `Cell stats:` line
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedCellStats {
    pub stats: CellStats,
    pub compartments_per_cell: f64,
}

/// Extract the cell statistics from a log line. Any prefix, such as a log
/// timestamp, is ignored.
pub fn parse_cell_stats(line: &str) -> Option<ScrapedCellStats> {
    let caps = CELL_STATS.captures(line)?;
    Some(ScrapedCellStats {
        stats: CellStats {
            num_cells: caps[1].parse().ok()?,
            segments: caps[2].parse().ok()?,
            compartments: caps[3].parse().ok()?,
        },
        compartments_per_cell: caps[4].parse().ok()?,
    })
}

/// First `Cell stats:` line found in `log`.
pub fn find_cell_stats(log: &str) -> Option<ScrapedCellStats> {
    log.lines().find_map(parse_cell_stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rendered_line() {
        let stats = CellStats {
            num_cells: 1024,
            segments: 5120,
            compartments: 6144,
        };
        let line = format!("[2026-10-17T10:00:00Z INFO  busyring::stats] {}", stats);
        let scraped = parse_cell_stats(&line).unwrap();
        assert_eq!(scraped.stats, stats);
        assert_eq!(scraped.compartments_per_cell, 6.0);
    }

    #[test]
    fn test_parse_fractional_ratio() {
        let scraped =
            parse_cell_stats("Cell stats: 3 cells; 7 segments; 10 compartments; 3.3333333333333335 comp/cell.")
                .unwrap();
        assert_eq!(scraped.stats.num_cells, 3);
        assert!((scraped.compartments_per_cell - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_find_in_log() {
        let log = "Initializing ring on rank_id=0 (num_ranks=1).\n\
                   Cell stats: 4 cells; 8 segments; 8 compartments; 2 comp/cell.\n\
                   Number of cells on rank 0: 4.";
        assert_eq!(find_cell_stats(log).unwrap().stats.compartments, 8);
        assert!(find_cell_stats("nothing here").is_none());
    }
}
