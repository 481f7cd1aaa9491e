//! Lightweight per-stage timing for the tick pipeline.
//!
//! Enable it on a world with `GameWorld::enable_profiling`; every stage run
//! is then timed under its stage name. `GameWorld::disable_profiling` logs
//! the summary and hands the profiler back.

use log::info;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Collects timing data for named sections and provides aggregated statistics.
#[derive(Debug, Default)]
pub struct Profiler {
    sections: BTreeMap<&'static str, SectionStats>,
    tick_count: u64,
}

/// Statistics for a profiled section
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.call_count += 1;
        self.min_time = Some(self.min_time.map_or(elapsed, |m| m.min(elapsed)));
        self.max_time = Some(self.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one measurement to a section.
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        self.sections.entry(name).or_default().record(elapsed);
    }

    pub fn tick(&mut self) {
        self.tick_count += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    /// Section names, most expensive first.
    pub fn section_names(&self) -> Vec<&'static str> {
        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time).then(a.0.cmp(b.0)));
        sections.into_iter().map(|(name, _)| *name).collect()
    }

    /// Table of all sections: total, average per tick, min, max and share of time.
    pub fn summary(&self) -> String {
        let total: Duration = self.sections.values().map(|s| s.total_time).sum();
        let mut out = String::new();
        let _ = writeln!(out, "=== Profiler Summary ({} ticks) ===", self.tick_count);
        let _ = writeln!(
            out,
            "{:<12} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Stage", "Total", "Avg/tick", "Min", "Max", "% Time"
        );

        for name in self.section_names() {
            let stats = &self.sections[name];
            let avg_per_tick = if self.tick_count > 0 {
                stats.total_time / self.tick_count as u32
            } else {
                Duration::ZERO
            };
            let pct = if total.as_nanos() > 0 {
                stats.total_time.as_nanos() as f64 / total.as_nanos() as f64 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:<12} {:>10.2?} {:>10.2?} {:>10.2?} {:>10.2?} {:>7.1}%",
                name,
                stats.total_time,
                avg_per_tick,
                stats.min_time.unwrap_or(Duration::ZERO),
                stats.max_time.unwrap_or(Duration::ZERO),
                pct
            );
        }

        if self.tick_count > 0 {
            let avg_tick = total / self.tick_count as u32;
            let _ = writeln!(out, "{:<12} {:>10.2?} per tick", "TOTAL", avg_tick);
        }
        out
    }

    pub fn log_summary(&self) {
        info!("\n{}", self.summary());
    }
}
