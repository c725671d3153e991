use std::sync::Mutex;

use console::Style;
use harvester_core::{CollectionSummary, DownloadOutcome};
use harvester_engine::{ProgressRenderer, StatusEvent, StatusReporter};
use indicatif::{ProgressBar, ProgressStyle};

/// Bar resolution per item, so fractional chunk ticks still move the bar.
const UNITS_PER_ITEM: f64 = 1000.0;

const BAR_TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] {percent:>3}% ({elapsed})";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tone {
    Info,
    Success,
    Warning,
    Failure,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Info => Style::new().bold(),
            Tone::Success => Style::new().green(),
            Tone::Warning => Style::new().yellow(),
            Tone::Failure => Style::new().red().bold(),
        }
    }
}

#[derive(Default)]
struct BarState {
    bar: Option<ProgressBar>,
    done: f64,
}

/// One progress bar per collection, measured in items.
#[derive(Default)]
pub(crate) struct IndicatifProgress {
    state: Mutex<BarState>,
}

impl IndicatifProgress {
    /// Prints above the bar while one is shown.
    pub fn println(&self, line: &str) {
        if let Ok(state) = self.state.lock() {
            if let Some(bar) = &state.bar {
                bar.println(line);
                return;
            }
        }
        println!("{line}");
    }
}

impl ProgressRenderer for IndicatifProgress {
    fn start(&self, label: &str, total_units: u64) {
        let bar = ProgressBar::new(total_units.saturating_mul(UNITS_PER_ITEM as u64));
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(label.to_string());
        if let Ok(mut state) = self.state.lock() {
            if let Some(previous) = state.bar.take() {
                previous.abandon();
            }
            *state = BarState {
                bar: Some(bar),
                done: 0.0,
            };
        }
    }

    fn advance(&self, fraction: f64) {
        if let Ok(mut state) = self.state.lock() {
            state.done += fraction;
            let position = (state.done * UNITS_PER_ITEM).round() as u64;
            if let Some(bar) = &state.bar {
                bar.set_position(position);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(bar) = state.bar.take() {
                bar.finish();
            }
        }
    }
}

/// Styled status lines on stdout.
pub(crate) struct ConsoleReporter<'p> {
    progress: &'p IndicatifProgress,
}

impl<'p> ConsoleReporter<'p> {
    pub fn new(progress: &'p IndicatifProgress) -> Self {
        Self { progress }
    }
}

impl StatusReporter for ConsoleReporter<'_> {
    fn report(&self, event: StatusEvent) {
        let (tone, line) = describe(&event);
        self.progress
            .println(&tone.style().apply_to(line).to_string());
    }
}

pub(crate) fn describe(event: &StatusEvent) -> (Tone, String) {
    match event {
        StatusEvent::NoCollections => (
            Tone::Warning,
            "No collections found for this channel.".to_string(),
        ),
        StatusEvent::CollectionsSelected {
            count,
            approx_items,
        } => (
            Tone::Info,
            format!("{count} collection(s) selected, about {approx_items} item(s) in total"),
        ),
        StatusEvent::CollectionStarted { title, selected } => (
            Tone::Info,
            format!("{title}: downloading {selected} item(s)"),
        ),
        StatusEvent::ItemFailed {
            position,
            title,
            outcome,
        } => {
            let mut line = format!("  #{} {}: {}", position + 1, title, outcome);
            if *outcome == DownloadOutcome::QuotaExceeded {
                line.push_str(" (the host is throttling this file, try again later)");
            }
            (Tone::Warning, line)
        }
        StatusEvent::CollectionFinished { title, summary } => describe_summary(title, summary),
        StatusEvent::Merged { title, summary } => {
            let mut line = format!(
                "{title}: merged {} document(s), {} page(s) into {}",
                summary.merged.len(),
                summary.page_count,
                summary.output_path.display()
            );
            if !summary.missing.is_empty() {
                line.push_str(&format!(
                    "; {} item(s) without a file skipped",
                    summary.missing.len()
                ));
            }
            (Tone::Success, line)
        }
        StatusEvent::MergeFailed {
            title,
            quota_corruption,
            reason,
        } => {
            let line = if *quota_corruption {
                format!(
                    "{title}: merge aborted, a downloaded file is a quota page rather than a document ({reason})"
                )
            } else {
                format!("{title}: merge failed: {reason}")
            };
            (Tone::Failure, line)
        }
    }
}

fn describe_summary(title: &str, summary: &CollectionSummary) -> (Tone, String) {
    match summary {
        CollectionSummary::NothingSelected => (Tone::Info, format!("{title}: nothing selected")),
        CollectionSummary::Complete { downloaded } => (
            Tone::Success,
            format!("{title}: done, {downloaded} document(s) downloaded"),
        ),
        CollectionSummary::Partial {
            downloaded,
            failures,
        } => (
            Tone::Warning,
            format!("{title}: {downloaded} downloaded, {failures} failed"),
        ),
        CollectionSummary::Aborted {
            downloaded,
            failures,
            reason,
        } => (
            Tone::Failure,
            format!("{title}: stopped early ({reason}); {downloaded} downloaded, {failures} failed"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_engine::MergeSummary;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn quota_failures_carry_a_hint() {
        let (tone, line) = describe(&StatusEvent::ItemFailed {
            position: 1,
            title: "Derivatives".into(),
            outcome: DownloadOutcome::QuotaExceeded,
        });
        assert_eq!(tone, Tone::Warning);
        assert!(line.starts_with("  #2 Derivatives: download quota exceeded"));
        assert!(line.contains("try again later"));

        let (_, line) = describe(&StatusEvent::ItemFailed {
            position: 0,
            title: "Limits".into(),
            outcome: DownloadOutcome::TransportError("http status 404".into()),
        });
        assert_eq!(line, "  #1 Limits: transport error: http status 404");
    }

    #[test]
    fn summaries_pick_tone_by_outcome() {
        let tone_of = |summary: CollectionSummary| {
            describe(&StatusEvent::CollectionFinished {
                title: "Intro".into(),
                summary,
            })
            .0
        };
        assert_eq!(tone_of(CollectionSummary::Complete { downloaded: 2 }), Tone::Success);
        assert_eq!(
            tone_of(CollectionSummary::Partial {
                downloaded: 1,
                failures: 1
            }),
            Tone::Warning
        );
        assert_eq!(
            tone_of(CollectionSummary::Aborted {
                downloaded: 0,
                failures: 0,
                reason: "catalog down".into()
            }),
            Tone::Failure
        );
        assert_eq!(tone_of(CollectionSummary::NothingSelected), Tone::Info);
    }

    #[test]
    fn merge_line_mentions_skipped_items() {
        let (tone, line) = describe(&StatusEvent::Merged {
            title: "Intro".into(),
            summary: MergeSummary {
                output_path: PathBuf::from("Intro.pdf"),
                page_count: 5,
                merged: vec![0, 2],
                missing: vec![1],
            },
        });
        assert_eq!(tone, Tone::Success);
        assert_eq!(
            line,
            "Intro: merged 2 document(s), 5 page(s) into Intro.pdf; 1 item(s) without a file skipped"
        );
    }

    #[test]
    fn progress_without_bar_is_harmless() {
        let progress = IndicatifProgress::default();
        progress.advance(0.5);
        progress.finish();
        progress.println("still here");
    }
}
