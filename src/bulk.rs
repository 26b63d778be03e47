//! Bulk comparison: one set of investments against many symbols.
//!
//! A bounded pool of lookups (semaphore + `JoinSet`) runs one price lookup per
//! symbol, evaluates every investment against the returned series, and hands
//! back `(symbol, outcomes)` as each task finishes. Failed (symbol, date) keys
//! get exactly one more attempt in a smaller, slower pass; whatever fails
//! there is terminal.

use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::BulkConfig;
use crate::error::LookupError;
use crate::evaluator;
use crate::models::{EvaluationResult, Failure, Investment, Keyed};
use crate::pricing::{PriceBasis, PriceSeries, PriceSource};
use crate::ui::progress::{Pass, ProgressEvent};

/// Successes and failures of one bulk run, kept apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonBatch<T> {
    pub results: Vec<T>,
    pub failures: Vec<Failure>,
}

impl<T> Default for ComparisonBatch<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl ComparisonBatch<EvaluationResult> {
    /// Best performers first
    pub fn sort_by_performance(&mut self) {
        self.results
            .sort_by(|a, b| b.percent_change.cmp(&a.percent_change));
    }
}

/// All investments to evaluate against one symbol
#[derive(Debug, Clone)]
struct Job {
    symbol: String,
    investments: Vec<Investment>,
}

type Outcome<T> = Result<T, Failure>;

pub struct BulkComparator {
    source: Arc<dyn PriceSource>,
    config: BulkConfig,
    basis: PriceBasis,
}

impl BulkComparator {
    pub fn new(source: Arc<dyn PriceSource>, config: BulkConfig) -> Self {
        Self {
            source,
            config,
            basis: PriceBasis::Adjusted,
        }
    }

    /// Which close the lookups should return
    pub fn with_basis(mut self, basis: PriceBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Evaluate lots (as investments) against every symbol up to `as_of`.
    pub async fn compare_investments<P>(
        &self,
        symbols: &[String],
        investments: &[Investment],
        as_of: NaiveDate,
        progress: &mut P,
    ) -> ComparisonBatch<EvaluationResult>
    where
        P: FnMut(&ProgressEvent),
    {
        let mut batch = self
            .compare(symbols, investments, as_of, evaluator::evaluate, progress)
            .await;
        batch.sort_by_performance();
        batch
    }

    /// Run `evaluate` for every (symbol, investment) pair, fetching each
    /// symbol's series once over `[earliest purchase date, until]`. Symbols
    /// are compared case-insensitively and repeats are dropped.
    pub async fn compare<T, F, P>(
        &self,
        symbols: &[String],
        investments: &[Investment],
        until: NaiveDate,
        evaluate: F,
        progress: &mut P,
    ) -> ComparisonBatch<T>
    where
        T: Keyed + Send + 'static,
        F: Fn(&Investment, &PriceSeries) -> Result<T, LookupError> + Send + Sync + 'static,
        P: FnMut(&ProgressEvent),
    {
        let groups = symbols
            .iter()
            .map(|symbol| symbol.trim().to_uppercase())
            .filter(|symbol| !symbol.is_empty())
            .unique()
            .map(|symbol| (symbol, investments.to_vec()))
            .collect();
        self.compare_groups(groups, until, evaluate, progress).await
    }

    /// Like [`BulkComparator::compare`], but each symbol carries its own
    /// investments. Repeated symbols are merged.
    pub async fn compare_groups<T, F, P>(
        &self,
        groups: Vec<(String, Vec<Investment>)>,
        until: NaiveDate,
        evaluate: F,
        progress: &mut P,
    ) -> ComparisonBatch<T>
    where
        T: Keyed + Send + 'static,
        F: Fn(&Investment, &PriceSeries) -> Result<T, LookupError> + Send + Sync + 'static,
        P: FnMut(&ProgressEvent),
    {
        let jobs = build_jobs(groups);
        if jobs.is_empty() {
            return ComparisonBatch::default();
        }
        let evaluate = Arc::new(evaluate);

        info!(
            "Bulk comparison: {} symbols, {} evaluations via {}",
            jobs.len(),
            jobs.iter().map(|j| j.investments.len()).sum::<usize>(),
            self.source.name()
        );

        let first = self
            .run_pass(
                jobs.clone(),
                until,
                Pass::First,
                self.config.concurrency,
                self.config.request_delay(),
                evaluate.clone(),
                progress,
            )
            .await;

        if first.failures.is_empty() {
            return first;
        }

        let succeeded: HashSet<(&str, NaiveDate)> = first
            .results
            .iter()
            .map(|r| (r.symbol(), r.key_date()))
            .collect();
        let retry_jobs = retry_jobs(&first.failures, &jobs, &succeeded);
        // Failures whose keys all succeeded elsewhere are not retried; keep them
        let carried: Vec<Failure> = first
            .failures
            .iter()
            .filter(|f| {
                !retry_jobs.iter().any(|job| {
                    job.symbol == f.symbol
                        && job.investments.iter().any(|inv| f.covers(inv.purchase_date))
                })
            })
            .cloned()
            .collect();
        info!(
            "Retrying {} failed symbols ({} failures)",
            retry_jobs.len(),
            first.failures.len()
        );

        let retried = self
            .run_pass(
                retry_jobs,
                until,
                Pass::Retry,
                self.config.retry_concurrency,
                self.config.retry_delay(),
                evaluate,
                progress,
            )
            .await;

        let mut results = first.results;
        results.extend(retried.results);
        let mut failures = carried;
        failures.extend(retried.failures);
        if !failures.is_empty() {
            warn!("{} comparisons failed after retry", failures.len());
        }
        ComparisonBatch { results, failures }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_pass<T, F, P>(
        &self,
        jobs: Vec<Job>,
        until: NaiveDate,
        pass: Pass,
        concurrency: usize,
        delay: Duration,
        evaluate: Arc<F>,
        progress: &mut P,
    ) -> ComparisonBatch<T>
    where
        T: Keyed + Send + 'static,
        F: Fn(&Investment, &PriceSeries) -> Result<T, LookupError> + Send + Sync + 'static,
        P: FnMut(&ProgressEvent),
    {
        let total = jobs.len();
        progress(&ProgressEvent::PassStarted { pass, total });

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        // Jobs still owed an outcome; anything left after draining died mid-task
        let mut outstanding: HashMap<String, Vec<Investment>> = HashMap::new();

        // Use JoinSet to get results as they complete (not in spawn order)
        let mut join_set = JoinSet::new();

        for job in jobs {
            outstanding.insert(job.symbol.clone(), job.investments.clone());
            let sem = semaphore.clone();
            let source = self.source.clone();
            let evaluate = evaluate.clone();
            let basis = self.basis;

            join_set.spawn(async move {
                // Acquire semaphore permit (limits concurrent requests)
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let failure = Failure::for_symbol(
                            job.symbol.clone(),
                            LookupError::Provider("worker pool closed".to_string()),
                        );
                        return (job.symbol, vec![Err(failure)]);
                    }
                };

                let outcomes = run_job(source.as_ref(), &job, until, basis, evaluate.as_ref()).await;
                // Pace the provider: the permit is held through the pause
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (job.symbol, outcomes)
            });
        }

        let mut batch = ComparisonBatch::default();
        let mut completed = 0;

        while let Some(joined) = join_set.join_next().await {
            let (symbol, outcomes) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!("Comparison task failed: {}", e);
                    continue;
                }
            };
            outstanding.remove(&symbol);
            completed += 1;

            let mut failed = false;
            for outcome in outcomes {
                match outcome {
                    Ok(result) => batch.results.push(result),
                    Err(failure) => {
                        debug!("{} failed: {}", failure.symbol, failure.reason);
                        failed = true;
                        batch.failures.push(failure);
                    }
                }
            }

            progress(&ProgressEvent::SymbolDone {
                pass,
                symbol,
                completed,
                total,
                failed,
            });
        }

        for (symbol, _) in outstanding {
            batch.failures.push(Failure::for_symbol(
                symbol,
                LookupError::Provider("comparison task aborted".to_string()),
            ));
        }

        batch
    }
}

async fn run_job<T, F>(
    source: &dyn PriceSource,
    job: &Job,
    until: NaiveDate,
    basis: PriceBasis,
    evaluate: &F,
) -> Vec<Outcome<T>>
where
    F: Fn(&Investment, &PriceSeries) -> Result<T, LookupError>,
{
    let Some(from) = job.investments.iter().map(|i| i.purchase_date).min() else {
        return Vec::new();
    };

    let series = match source.history(&job.symbol, from, until, basis).await {
        Ok(series) if series.is_empty() => {
            return vec![Err(Failure::for_symbol(
                job.symbol.clone(),
                LookupError::NoDataForSymbol,
            ))];
        }
        Ok(series) => series,
        Err(e) => return vec![Err(Failure::for_symbol(job.symbol.clone(), e))],
    };

    job.investments
        .iter()
        .map(|investment| {
            evaluate(investment, &series).map_err(|e| {
                Failure::for_investment(job.symbol.clone(), investment.purchase_date, e)
            })
        })
        .collect()
}

/// Normalize symbols and merge repeated ones, keeping first-seen order
fn build_jobs(groups: Vec<(String, Vec<Investment>)>) -> Vec<Job> {
    let mut jobs: Vec<Job> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (symbol, investments) in groups {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() || investments.is_empty() {
            continue;
        }
        match index.get(&symbol) {
            Some(&i) => jobs[i].investments.extend(investments),
            None => {
                index.insert(symbol.clone(), jobs.len());
                jobs.push(Job {
                    symbol,
                    investments,
                });
            }
        }
    }
    jobs
}

/// Only the (symbol, date) keys that failed go round again; a key that
/// already has a result is never re-evaluated.
fn retry_jobs(
    failures: &[Failure],
    jobs: &[Job],
    succeeded: &HashSet<(&str, NaiveDate)>,
) -> Vec<Job> {
    let mut by_symbol: HashMap<&str, Vec<&Failure>> = HashMap::new();
    for failure in failures {
        by_symbol.entry(failure.symbol.as_str()).or_default().push(failure);
    }

    jobs.iter()
        .filter_map(|job| {
            let failed = by_symbol.get(job.symbol.as_str())?;
            let retry: Vec<Investment> = job
                .investments
                .iter()
                .filter(|inv| failed.iter().any(|f| f.covers(inv.purchase_date)))
                .filter(|inv| !succeeded.contains(&(job.symbol.as_str(), inv.purchase_date)))
                .copied()
                .collect();
            (!retry.is_empty()).then(|| Job {
                symbol: job.symbol.clone(),
                investments: retry,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricePoint;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fast_config() -> BulkConfig {
        BulkConfig {
            concurrency: 3,
            retry_concurrency: 1,
            request_delay_ms: 0,
            retry_delay_ms: 0,
        }
    }

    /// Fails the first `fail_times` lookups of each flaky symbol
    struct FlakySource {
        flaky: HashSet<String>,
        fail_times: usize,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl FlakySource {
        fn new(flaky: &[&str], fail_times: usize) -> Self {
            Self {
                flaky: flaky.iter().map(|s| s.to_string()).collect(),
                fail_times,
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn calls_for(&self, symbol: &str) -> usize {
            self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl PriceSource for FlakySource {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn history(
            &self,
            symbol: &str,
            _from: NaiveDate,
            _to: NaiveDate,
            basis: PriceBasis,
        ) -> Result<PriceSeries, LookupError> {
            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(symbol.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            if self.flaky.contains(symbol) && attempt <= self.fail_times {
                return Err(LookupError::Provider("rate limited".to_string()));
            }
            Ok(PriceSeries::new(
                symbol,
                basis,
                vec![
                    PricePoint { date: date(2024, 1, 2), close: dec!(100) },
                    PricePoint { date: date(2024, 12, 31), close: dec!(120) },
                ],
            ))
        }
    }

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("SYM{}", i)).collect()
    }

    #[tokio::test]
    async fn test_all_retries_succeed() {
        let source = Arc::new(FlakySource::new(&["SYM1", "SYM4", "SYM7"], 1));
        let comparator = BulkComparator::new(source.clone(), fast_config());
        let investments = [Investment::new(date(2024, 1, 1), dec!(1000))];

        let batch = comparator
            .compare_investments(&symbols(10), &investments, date(2025, 1, 1), &mut |_| {})
            .await;

        assert_eq!(batch.results.len(), 10);
        assert!(batch.failures.is_empty());
        assert_eq!(source.calls_for("SYM1"), 2);
        assert_eq!(source.calls_for("SYM0"), 1);
    }

    #[tokio::test]
    async fn test_failures_on_both_passes_are_terminal() {
        let source = Arc::new(FlakySource::new(&["SYM2", "SYM3"], 5));
        let comparator = BulkComparator::new(source.clone(), fast_config());
        let investments = [Investment::new(date(2024, 1, 1), dec!(1000))];

        let batch = comparator
            .compare_investments(&symbols(6), &investments, date(2025, 1, 1), &mut |_| {})
            .await;

        assert_eq!(batch.results.len(), 4);
        assert_eq!(batch.failures.len(), 2);
        // Exactly one retry
        assert_eq!(source.calls_for("SYM2"), 2);
        let failed: HashSet<_> = batch.failures.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(failed, HashSet::from(["SYM2", "SYM3"]));
    }

    #[tokio::test]
    async fn test_lot_level_failures_keep_other_successes() {
        let source = Arc::new(FlakySource::new(&[], 0));
        let comparator = BulkComparator::new(source.clone(), fast_config());
        let investments = [
            Investment::new(date(2024, 1, 1), dec!(1000)),
            // No price on or after this date
            Investment::new(date(2025, 6, 1), dec!(500)),
        ];

        let batch = comparator
            .compare_investments(&symbols(2), &investments, date(2025, 7, 1), &mut |_| {})
            .await;

        assert_eq!(batch.results.len(), 2);
        assert!(batch.results.iter().all(|r| r.purchase_date == date(2024, 1, 1)));
        assert_eq!(batch.failures.len(), 2);
        assert!(batch.failures.iter().all(|f| f.date == Some(date(2025, 6, 1))));
        assert!(matches!(
            batch.failures[0].reason,
            LookupError::NoPriceOnOrAfterPurchase(_)
        ));
    }

    #[tokio::test]
    async fn test_results_sorted_and_progress_reported() {
        let source = Arc::new(FlakySource::new(&["B"], 1));
        let comparator = BulkComparator::new(source, fast_config());
        let investments = [
            Investment::new(date(2024, 1, 1), dec!(1000)),
            Investment::new(date(2024, 12, 31), dec!(1000)),
        ];
        let mut events = Vec::new();

        let batch = comparator
            .compare_investments(
                &["a".to_string(), "B".to_string(), "A".to_string()],
                &investments,
                date(2025, 1, 1),
                &mut |e| events.push(e.clone()),
            )
            .await;

        assert_eq!(batch.results.len(), 4);
        assert!(batch
            .results
            .windows(2)
            .all(|w| w[0].percent_change >= w[1].percent_change));
        assert_eq!(batch.results[0].percent_change, dec!(20));

        assert_eq!(events[0], ProgressEvent::PassStarted { pass: Pass::First, total: 2 });
        assert!(events.contains(&ProgressEvent::PassStarted { pass: Pass::Retry, total: 1 }));
        let done = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::SymbolDone { .. }))
            .count();
        assert_eq!(done, 3);
    }

    #[test]
    fn test_retry_jobs_only_cover_failed_keys() {
        let investments = vec![
            Investment::new(date(2024, 1, 1), dec!(1)),
            Investment::new(date(2024, 2, 1), dec!(1)),
        ];
        let jobs = build_jobs(vec![
            ("x".to_string(), investments.clone()),
            ("Y".to_string(), investments.clone()),
            ("Z".to_string(), investments.clone()),
        ]);
        let failures = vec![
            Failure::for_investment("X", date(2024, 2, 1), LookupError::NoDataForSymbol),
            Failure::for_symbol("Y", LookupError::NoDataForSymbol),
        ];
        let retry = retry_jobs(&failures, &jobs, &HashSet::new());
        assert_eq!(retry.len(), 2);
        assert_eq!(retry[0].symbol, "X");
        assert_eq!(retry[0].investments, vec![investments[1]]);
        assert_eq!(retry[1].investments.len(), 2);

        let succeeded = HashSet::from([("Y", date(2024, 1, 1))]);
        let retry = retry_jobs(&failures, &jobs, &succeeded);
        assert_eq!(retry[1].investments, vec![investments[1]]);
    }

    #[test]
    fn test_build_jobs_merges_repeated_symbols() {
        let jobs = build_jobs(vec![
            ("ko".to_string(), vec![Investment::new(date(2024, 1, 1), dec!(1))]),
            (" ".to_string(), vec![Investment::new(date(2024, 1, 1), dec!(1))]),
            ("KO".to_string(), vec![Investment::new(date(2024, 3, 1), dec!(2))]),
            ("PEP".to_string(), Vec::new()),
        ]);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].symbol, "KO");
        assert_eq!(jobs[0].investments.len(), 2);
    }

    #[tokio::test]
    async fn test_per_symbol_investments() {
        let source = Arc::new(FlakySource::new(&["KO"], 1));
        let comparator = BulkComparator::new(source.clone(), fast_config());
        let groups = vec![
            ("KO".to_string(), vec![Investment::new(date(2024, 1, 1), dec!(1000))]),
            (
                "PEP".to_string(),
                vec![
                    Investment::new(date(2024, 1, 1), dec!(500)),
                    Investment::new(date(2024, 6, 1), dec!(500)),
                ],
            ),
        ];

        let batch = comparator
            .compare_groups(groups, date(2025, 1, 1), evaluator::evaluate, &mut |_| {})
            .await;

        assert_eq!(batch.results.len(), 3);
        assert!(batch.failures.is_empty());
        assert_eq!(source.calls_for("PEP"), 1);
        assert_eq!(source.calls_for("KO"), 2);
    }

    #[tokio::test]
    async fn test_failure_on_succeeded_key_is_kept() {
        let source = Arc::new(FlakySource::new(&[], 0));
        let comparator = BulkComparator::new(source.clone(), fast_config());
        let groups = vec![(
            "KO".to_string(),
            vec![
                Investment::new(date(2024, 1, 1), dec!(1000)),
                Investment::new(date(2024, 1, 1), dec!(1)),
            ],
        )];

        let batch = comparator
            .compare_groups(
                groups,
                date(2025, 1, 1),
                |inv: &Investment, series: &PriceSeries| {
                    if inv.amount == dec!(1) {
                        return Err(LookupError::Provider("too small".to_string()));
                    }
                    evaluator::evaluate(inv, series)
                },
                &mut |_| {},
            )
            .await;

        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].date, Some(date(2024, 1, 1)));
        assert_eq!(source.calls_for("KO"), 1);
    }

    #[tokio::test]
    async fn test_repeated_universe_symbols_compared_once() {
        let source = Arc::new(FlakySource::new(&[], 0));
        let comparator = BulkComparator::new(source.clone(), fast_config());
        let investments = [Investment::new(date(2024, 1, 1), dec!(1000))];

        let batch = comparator
            .compare_investments(
                &["KO".to_string(), " ko ".to_string(), "PEP".to_string(), "KO".to_string()],
                &investments,
                date(2025, 1, 1),
                &mut |_| {},
            )
            .await;

        assert_eq!(batch.results.len(), 2);
        assert!(batch.failures.is_empty());
        assert_eq!(source.calls_for("KO"), 1);
        let symbols: HashSet<_> = batch.results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, HashSet::from(["KO", "PEP"]));
    }
}
