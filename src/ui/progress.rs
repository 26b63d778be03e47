use indicatif::{ProgressBar, ProgressStyle};

/// Which pass of a bulk comparison an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Retry,
}

impl Pass {
    pub fn label(&self) -> &'static str {
        match self {
            Pass::First => "Progress",
            Pass::Retry => "Retry progress",
        }
    }
}

/// Typed progress events for UI rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A pass is about to run `total` symbol lookups
    PassStarted { pass: Pass, total: usize },
    /// One symbol finished (in completion order, not submission order)
    SymbolDone {
        pass: Pass,
        symbol: String,
        completed: usize,
        total: usize,
        failed: bool,
    },
}

/// Renders progress events as an indicatif bar on stderr, one bar per pass.
pub struct ProgressPrinter {
    enabled: bool,
    bar: Option<ProgressBar>,
    failed: usize,
}

impl ProgressPrinter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: None,
            failed: 0,
        }
    }

    pub fn handle_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PassStarted { pass, total } => {
                self.finish();
                self.failed = 0;
                let bar = if self.enabled {
                    ProgressBar::new(*total as u64)
                } else {
                    ProgressBar::hidden()
                };
                let style = ProgressStyle::with_template(
                    "{prefix:>14} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
                bar.set_style(style);
                bar.set_prefix(pass.label());
                self.bar = Some(bar);
            }
            ProgressEvent::SymbolDone { symbol, failed, .. } => {
                if *failed {
                    self.failed += 1;
                }
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    if self.failed > 0 {
                        bar.set_message(format!("{} ({} failed)", symbol, self.failed));
                    } else {
                        bar.set_message(symbol.clone());
                    }
                }
            }
        }
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressPrinter {
    fn drop(&mut self) {
        self.finish();
    }
}
