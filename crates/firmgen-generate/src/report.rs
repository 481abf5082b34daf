//! Generation report aggregating per-target outcomes of one run.

use std::fmt;

use serde::Serialize;

use crate::writer::WriteStatus;

/// What happened to one output target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Rendered and merged; `write` says whether the file changed.
    Generated { write: WriteStatus },
    /// Module not selected; the existing file was left byte-for-byte intact.
    SkippedPresent,
    /// Module not selected and no file exists.
    NotNeeded,
    /// Rendering, planning or writing failed for this target.
    Failed { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generated { .. } => "generated",
            Self::SkippedPresent => "skipped_present",
            Self::NotNeeded => "not_needed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Outcome of one (module, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub module: String,
    /// Output path relative to the output root.
    pub target: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// User regions whose content was carried over.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preserved_regions: Vec<String>,
    /// User regions of the old file the template no longer has.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_regions: Vec<String>,
}

impl GenerationResult {
    pub fn new(module: &str, target: &str, outcome: Outcome) -> Self {
        GenerationResult {
            module: module.to_string(),
            target: target.to_string(),
            outcome,
            preserved_regions: Vec::new(),
            dropped_regions: Vec::new(),
        }
    }
}

/// Counts of each outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub generated: usize,
    pub unchanged: usize,
    pub skipped_present: usize,
    pub not_needed: usize,
    pub failed: usize,
}

/// Summary of a whole generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub project: String,
    pub mcu: Option<String>,
    pub dry_run: bool,
    pub cancelled: bool,
    pub duration_ms: u64,
    /// Whether the selection record was written back.
    pub selection_saved: bool,
    pub results: Vec<GenerationResult>,
    /// Non-fatal observations (stale instance choices, unknown modules).
    pub warnings: Vec<String>,
}

impl GenerationReport {
    pub fn new(project: &str, mcu: Option<&str>, dry_run: bool) -> Self {
        GenerationReport {
            project: project.to_string(),
            mcu: mcu.map(str::to_string),
            dry_run,
            cancelled: false,
            duration_ms: 0,
            selection_saved: false,
            results: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for r in &self.results {
            match &r.outcome {
                Outcome::Generated {
                    write: WriteStatus::Unchanged,
                } => counts.unchanged += 1,
                Outcome::Generated { .. } => counts.generated += 1,
                Outcome::SkippedPresent => counts.skipped_present += 1,
                Outcome::NotNeeded => counts.not_needed += 1,
                Outcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }

    /// Results of one module, in target order.
    pub fn for_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a GenerationResult> {
        self.results.iter().filter(move |r| r.module == module)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Generation Report ===")?;
        writeln!(f, "Project: {}", self.project)?;
        writeln!(f, "MCU: {}", self.mcu.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        if self.dry_run {
            writeln!(f, "Mode: dry run (nothing written)")?;
        }

        let mut module: Option<&str> = None;
        for r in &self.results {
            if module != Some(r.module.as_str()) {
                writeln!(f)?;
                writeln!(f, "--- {} ---", r.module)?;
                module = Some(r.module.as_str());
            }
            let detail = match &r.outcome {
                Outcome::Generated { write } => format!("generated ({})", write_label(*write)),
                Outcome::Failed { reason } => format!("failed: {reason}"),
                other => other.label().to_string(),
            };
            writeln!(f, "  {}: {detail}", r.target)?;
            if !r.dropped_regions.is_empty() {
                writeln!(f, "    dropped regions: {}", r.dropped_regions.join(", "))?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Warnings ({}) ---", self.warnings.len())?;
            for w in &self.warnings {
                writeln!(f, "  {w}")?;
            }
        }

        let c = self.counts();
        writeln!(f)?;
        writeln!(
            f,
            "{} generated, {} unchanged, {} skipped, {} not needed, {} failed",
            c.generated, c.unchanged, c.skipped_present, c.not_needed, c.failed
        )?;
        if self.cancelled {
            writeln!(f, "Run cancelled; selection not saved.")?;
        }
        Ok(())
    }
}

fn write_label(status: WriteStatus) -> &'static str {
    match status {
        WriteStatus::Created => "created",
        WriteStatus::Updated => "updated",
        WriteStatus::Unchanged => "unchanged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenerationReport {
        let mut report = GenerationReport::new("board", Some("STM32F407VGTx"), false);
        report.duration_ms = 7;
        report.results = vec![
            GenerationResult::new(
                "can",
                "Modules/Peripheral/can/bsp_can.c",
                Outcome::Generated {
                    write: WriteStatus::Created,
                },
            ),
            GenerationResult::new(
                "can",
                "Modules/Peripheral/can/bsp_can.h",
                Outcome::Generated {
                    write: WriteStatus::Unchanged,
                },
            ),
            GenerationResult::new(
                "uart",
                "Modules/Peripheral/uart/bsp_uart.c",
                Outcome::SkippedPresent,
            ),
            GenerationResult::new("spi", "Modules/Peripheral/spi/bsp_spi.c", Outcome::NotNeeded),
            GenerationResult::new(
                "pwm",
                "Modules/Peripheral/pwm/bsp_pwm.c",
                Outcome::Failed {
                    reason: "no hardware instances chosen for PWM".into(),
                },
            ),
        ];
        report
    }

    #[test]
    fn counts_and_failures() {
        let report = sample();
        let c = report.counts();
        assert_eq!(
            c,
            OutcomeCounts {
                generated: 1,
                unchanged: 1,
                skipped_present: 1,
                not_needed: 1,
                failed: 1,
            }
        );
        assert!(report.has_failures());
        assert_eq!(report.for_module("can").count(), 2);
    }

    #[test]
    fn report_display() {
        let output = format!("{}", sample());
        assert!(output.contains("=== Generation Report ==="));
        assert!(output.contains("--- can ---"));
        assert!(output.contains("Modules/Peripheral/can/bsp_can.c: generated (created)"));
        assert!(output.contains("bsp_uart.c: skipped_present"));
        assert!(output.contains("failed: no hardware instances chosen for PWM"));
        assert!(output.contains("1 generated, 1 unchanged, 1 skipped, 1 not needed, 1 failed"));
    }

    #[test]
    fn report_json() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["project"], "board");
        assert_eq!(value["results"][0]["outcome"], "generated");
        assert_eq!(value["results"][0]["write"], "created");
        assert_eq!(value["results"][2]["outcome"], "skipped_present");
        assert_eq!(value["results"][4]["reason"], "no hardware instances chosen for PWM");
        assert!(value["results"][0].get("preserved_regions").is_none());
    }
}
