use crate::constants::{INVALID_FORMAT, NOT_FOUND};
use crate::normalize::{Classification, classify, normalize};
use crate::pacing::Pacer;
use crate::registry::{LookupOutcome, TaxonomyLookup, TaxonomyRecord};

/// One flattened line of the results sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRow {
    pub npi: String,
    pub taxonomy_code: String,
    pub taxonomy_description: String,
    pub primary_taxonomy: String,
    pub state: String,
    pub license: String,
}

impl OutputRow {
    fn marker(npi: &str, taxonomy_code: &str) -> Self {
        Self {
            npi: npi.to_string(),
            taxonomy_code: taxonomy_code.to_string(),
            ..Self::default()
        }
    }

    fn from_record(npi: &str, record: TaxonomyRecord) -> Self {
        Self {
            npi: npi.to_string(),
            taxonomy_code: record.code,
            taxonomy_description: record.description,
            primary_taxonomy: primary_label(record.primary).to_string(),
            state: record.state,
            license: record.license,
        }
    }

    pub fn fields(&self) -> [&str; 6] {
        [
            self.npi.as_str(),
            self.taxonomy_code.as_str(),
            self.taxonomy_description.as_str(),
            self.primary_taxonomy.as_str(),
            self.state.as_str(),
            self.license.as_str(),
        ]
    }
}

fn primary_label(primary: Option<bool>) -> &'static str {
    match primary {
        Some(true) => "True",
        Some(false) => "False",
        None => "",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub found: usize,
    pub not_found: usize,
    pub invalid: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.found + self.not_found + self.invalid
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub rows: Vec<OutputRow>,
    pub tally: Tally,
}

impl ResultTable {
    /// Expands one outcome into its rows and counts it.
    pub fn push(&mut self, outcome: LookupOutcome) {
        match outcome {
            LookupOutcome::Invalid(npi) => {
                self.tally.invalid += 1;
                self.rows.push(OutputRow::marker(&npi, INVALID_FORMAT));
            }
            LookupOutcome::NotFound(npi) => {
                self.tally.not_found += 1;
                self.rows.push(OutputRow::marker(&npi, NOT_FOUND));
            }
            LookupOutcome::Found(npi, records) if records.is_empty() => {
                self.tally.not_found += 1;
                self.rows.push(OutputRow::marker(&npi, NOT_FOUND));
            }
            LookupOutcome::Found(npi, records) => {
                self.tally.found += 1;
                self.rows.extend(
                    records
                        .into_iter()
                        .map(|record| OutputRow::from_record(&npi, record)),
                );
            }
        }
    }
}

/// Looks up every identifier in order, one request at a time, appending the
/// rows to `table`.
///
/// `on_progress(current, total, npi)` fires once per identifier before it is
/// classified. Malformed identifiers never reach `registry` and do not take a
/// pacing slot. Each outcome is pushed as soon as its lookup returns, so
/// dropping the future mid-batch leaves every finished identifier in `table`.
pub async fn run<L, F>(
    identifiers: &[String],
    registry: &L,
    pacer: &mut Pacer,
    table: &mut ResultTable,
    mut on_progress: F,
) where
    L: TaxonomyLookup,
    F: FnMut(usize, usize, &str),
{
    let total = identifiers.len();

    for (idx, raw) in identifiers.iter().enumerate() {
        let npi = normalize(raw);
        on_progress(idx + 1, total, &npi);

        let outcome = match classify(&npi) {
            Classification::Malformed => {
                tracing::debug!(raw = raw.as_str(), npi = npi.as_str(), "malformed NPI");
                LookupOutcome::Invalid(npi)
            }
            Classification::Valid => {
                pacer.wait().await;
                registry.lookup(&npi).await
            }
        };
        table.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Default)]
    struct StubRegistry {
        data: HashMap<String, Vec<TaxonomyRecord>>,
        calls: RefCell<Vec<(String, Instant)>>,
    }

    impl StubRegistry {
        fn with(mut self, npi: &str, records: Vec<TaxonomyRecord>) -> Self {
            self.data.insert(npi.to_string(), records);
            self
        }

        fn called(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(npi, _)| npi.clone()).collect()
        }
    }

    impl TaxonomyLookup for StubRegistry {
        async fn lookup(&self, npi: &str) -> LookupOutcome {
            self.calls
                .borrow_mut()
                .push((npi.to_string(), Instant::now()));
            match self.data.get(npi) {
                Some(records) if !records.is_empty() => {
                    LookupOutcome::Found(npi.to_string(), records.clone())
                }
                _ => LookupOutcome::NotFound(npi.to_string()),
            }
        }
    }

    fn record(
        code: &str,
        desc: &str,
        primary: Option<bool>,
        state: &str,
        license: &str,
    ) -> TaxonomyRecord {
        TaxonomyRecord {
            code: code.to_string(),
            description: desc.to_string(),
            primary,
            state: state.to_string(),
            license: license.to_string(),
        }
    }

    async fn run_all<F>(
        identifiers: &[String],
        registry: &StubRegistry,
        pacer: &mut Pacer,
        on_progress: F,
    ) -> ResultTable
    where
        F: FnMut(usize, usize, &str),
    {
        let mut table = ResultTable::default();
        run(identifiers, registry, pacer, &mut table, on_progress).await;
        table
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn found_expands_one_row_per_taxonomy() {
        let registry = StubRegistry::default().with(
            "1234567893",
            vec![
                record("207Q00000X", "Family Medicine", Some(true), "CA", "A1"),
                record("208D00000X", "General Practice", Some(false), "NV", "B2"),
            ],
        );
        let mut pacer = Pacer::new(Duration::from_millis(50));

        let table = run_all(&ids(&["1234567893"]), &registry, &mut pacer, |_, _, _| {}).await;

        assert_eq!(
            table.rows,
            vec![
                OutputRow {
                    npi: "1234567893".to_string(),
                    taxonomy_code: "207Q00000X".to_string(),
                    taxonomy_description: "Family Medicine".to_string(),
                    primary_taxonomy: "True".to_string(),
                    state: "CA".to_string(),
                    license: "A1".to_string(),
                },
                OutputRow {
                    npi: "1234567893".to_string(),
                    taxonomy_code: "208D00000X".to_string(),
                    taxonomy_description: "General Practice".to_string(),
                    primary_taxonomy: "False".to_string(),
                    state: "NV".to_string(),
                    license: "B2".to_string(),
                },
            ]
        );
        assert_eq!(
            table.tally,
            Tally {
                found: 1,
                not_found: 0,
                invalid: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_yields_single_not_found_row() {
        let registry = StubRegistry::default().with("9999999999", vec![]);
        let mut pacer = Pacer::new(Duration::from_millis(50));

        let table = run_all(&ids(&["9999999999"]), &registry, &mut pacer, |_, _, _| {}).await;

        assert_eq!(
            table.rows,
            vec![OutputRow {
                npi: "9999999999".to_string(),
                taxonomy_code: "Not Found".to_string(),
                ..OutputRow::default()
            }]
        );
        assert_eq!(table.tally.not_found, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_rows_skip_the_registry() {
        let registry = StubRegistry::default();
        let mut pacer = Pacer::new(Duration::from_millis(50));

        let table = run_all(
            &ids(&["123", "12345abcde", " 12345678901 "]),
            &registry,
            &mut pacer,
            |_, _, _| {},
        )
        .await;

        assert!(registry.called().is_empty());
        let codes: Vec<_> = table.rows.iter().map(|r| r.taxonomy_code.as_str()).collect();
        assert_eq!(codes, vec!["Invalid Format"; 3]);
        assert_eq!(table.rows[2].npi, "12345678901");
        assert_eq!(table.tally.invalid, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deduplicated_mixed_input_keeps_first_occurrence_order() {
        let registry = StubRegistry::default().with(
            "1234567893",
            vec![record("207Q00000X", "Family Medicine", Some(true), "CA", "A1")],
        );
        let mut pacer = Pacer::new(Duration::from_millis(50));
        let unique = crate::input::dedupe(ids(&["1234567893", "1234567893", "123"]));

        let table = run_all(&unique, &registry, &mut pacer, |_, _, _| {}).await;

        assert_eq!(unique.len(), 2);
        assert_eq!(table.tally.total(), 2);
        assert_eq!(registry.called(), vec!["1234567893"]);
        let summary: Vec<_> = table
            .rows
            .iter()
            .map(|r| (r.npi.as_str(), r.taxonomy_code.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("1234567893", "207Q00000X"), ("123", "Invalid Format")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn one_outcome_per_identifier() {
        let registry = StubRegistry::default()
            .with(
                "1111111111",
                vec![record("A", "", None, "", ""), record("B", "", None, "", "")],
            )
            .with("2222222222", vec![record("C", "", None, "", "")]);
        let mut pacer = Pacer::new(Duration::from_millis(10));
        let input = ids(&["1111111111", "2222222222", "3333333333", "bad", "1111111111.0 "]);

        let table = run_all(&input, &registry, &mut pacer, |_, _, _| {}).await;

        assert_eq!(table.tally.total(), input.len());
        assert_eq!(
            table.tally,
            Tally {
                found: 3,
                not_found: 1,
                invalid: 1
            }
        );
        // 2 + 1 + 1 + 1 + 2 rows
        assert_eq!(table.rows.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_reports_normalized_identifiers() {
        let registry = StubRegistry::default();
        let mut pacer = Pacer::new(Duration::ZERO);
        let mut seen = Vec::new();

        run_all(
            &ids(&[" 1234567893.0", "abc"]),
            &registry,
            &mut pacer,
            |current, total, npi| seen.push((current, total, npi.to_string())),
        )
        .await;

        assert_eq!(
            seen,
            vec![
                (1, 2, "1234567893".to_string()),
                (2, 2, "abc".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn lookups_are_spaced_by_the_pacing_interval() {
        let registry = StubRegistry::default();
        let delay = Duration::from_millis(50);
        let mut pacer = Pacer::new(delay);
        let input = ids(&["1111111111", "bad", "2222222222", "3333333333"]);

        run_all(&input, &registry, &mut pacer, |_, _, _| {}).await;

        let calls = registry.calls.borrow();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_batch_keeps_finished_rows() {
        let registry = StubRegistry::default()
            .with("1111111111", vec![record("A", "", None, "", "")])
            .with("2222222222", vec![record("B", "", None, "", "")]);
        let mut pacer = Pacer::new(Duration::from_millis(100));
        let input = ids(&["1111111111", "bad", "2222222222", "3333333333"]);
        let mut table = ResultTable::default();

        // Slots fall at 0ms, 100ms and 200ms; stop the batch at 150ms.
        let interrupted = tokio::time::timeout(
            Duration::from_millis(150),
            run(&input, &registry, &mut pacer, &mut table, |_, _, _| {}),
        )
        .await;

        assert!(interrupted.is_err());
        assert_eq!(registry.called(), vec!["1111111111", "2222222222"]);
        let codes: Vec<_> = table.rows.iter().map(|r| r.taxonomy_code.as_str()).collect();
        assert_eq!(codes, vec!["A", "Invalid Format", "B"]);
        assert_eq!(table.tally.total(), 3);
    }
}
