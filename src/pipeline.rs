// 🔁 Remediation Pipeline - four fixed steps per failed transaction
// details → analyze → suggest → fix, one aggregated result row per transaction

use crate::remediation::FixOutcome;
use crate::store::RecordStore;
use crate::tools::{Tool, ToolRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Result text for rows without a usable transaction id
pub const NO_TRANSACTION_ID: &str = "No transaction_id provided.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not create output directory `{path}`: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write results: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush results: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// STEPS
// ============================================================================

/// One stage of the pipeline, each backed by a single tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStep {
    pub label: &'static str,
    pub tool: Tool,
}

pub const STEPS: [PipelineStep; 4] = [
    PipelineStep {
        label: "Details",
        tool: Tool::GetTransactionDetails,
    },
    PipelineStep {
        label: "Analysis",
        tool: Tool::AnalyzeError,
    },
    PipelineStep {
        label: "Suggestion",
        tool: Tool::SuggestResolution,
    },
    PipelineStep {
        label: "Fix",
        tool: Tool::FixTransaction,
    },
];

// ============================================================================
// RESULTS
// ============================================================================

/// One row of the output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction_id: Option<String>,
    pub result: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<TransactionResult>,
    pub processed: usize,
    pub fixed: usize,
    pub already_complete: usize,
    pub not_found: usize,
    pub skipped: usize,
}

impl PipelineReport {
    pub fn summary(&self) -> String {
        format!(
            "Processed: {}, Fixed: {}, Already complete: {}, Not found: {}, Skipped: {}",
            self.processed, self.fixed, self.already_complete, self.not_found, self.skipped
        )
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline<'a> {
    store: &'a RecordStore,
    tools: ToolRegistry<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Pipeline {
            store,
            tools: ToolRegistry::new(store),
        }
    }

    /// Run every step for one transaction id and aggregate the outputs
    pub fn process(&self, transaction_id: &str) -> String {
        self.process_steps(transaction_id).0
    }

    /// Aggregated text plus the outcome of the fix step it reports
    fn process_steps(&self, transaction_id: &str) -> (String, FixOutcome) {
        let mut outcome = None;
        let lines: Vec<String> = STEPS
            .iter()
            .map(|step| {
                let text = match step.tool {
                    Tool::FixTransaction => {
                        let fix = self.tools.engine().simulate_fix(transaction_id);
                        let text = fix.to_string();
                        outcome = Some(fix);
                        text
                    }
                    tool => self.tools.invoke(tool, transaction_id).as_text(),
                };
                format!("{}: {}", step.label, text)
            })
            .collect();

        // STEPS always ends with the fix step
        let outcome = outcome.unwrap_or_else(|| self.tools.engine().simulate_fix(transaction_id));
        (lines.join("\n"), outcome)
    }

    /// Run the pipeline over every row of the store, in source order
    pub fn run(&self) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, transactions = self.store.len(), "pipeline started");

        let mut report = PipelineReport {
            run_id,
            started_at,
            finished_at: started_at,
            results: Vec::with_capacity(self.store.len()),
            processed: 0,
            fixed: 0,
            already_complete: 0,
            not_found: 0,
            skipped: 0,
        };

        for record in self.store.records() {
            let transaction_id = match record.transaction_id() {
                Some(id) if record.has_transaction_id() => id.to_string(),
                _ => {
                    warn!(%run_id, "row without transaction_id skipped");
                    report.skipped += 1;
                    report.results.push(TransactionResult {
                        transaction_id: None,
                        result: NO_TRANSACTION_ID.to_string(),
                    });
                    continue;
                }
            };

            let (result, outcome) = self.process_steps(&transaction_id);

            let filled = match &outcome {
                FixOutcome::Fixed { filled, .. } => {
                    report.fixed += 1;
                    filled.len()
                }
                FixOutcome::NotRequired { .. } => {
                    report.already_complete += 1;
                    0
                }
                FixOutcome::NotFound { .. } => {
                    report.not_found += 1;
                    0
                }
            };
            report.processed += 1;

            info!(
                %run_id,
                transaction_id = %transaction_id,
                filled_fields = filled,
                "transaction processed"
            );

            report.results.push(TransactionResult {
                transaction_id: Some(transaction_id),
                result,
            });
        }

        report.finished_at = Utc::now();
        info!(%run_id, summary = %report.summary(), "pipeline finished");

        report
    }
}

/// Write results as a two-column `transaction_id,result` CSV
pub fn write_results(path: &Path, results: &[TransactionResult]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = results.len(), "results written");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> RecordStore {
        let csv = "transaction_id,error_code,member_id,first_name,last_name,date_of_birth,ssn,address,policy_number,enrollment_date\n\
                   1001,ERR001,,Jane,Doe,1990-05-01,123-45-6789,1 Main St,P1,2023-01-01\n\
                   ,ERR002,M9,No,Id,1970-01-01,111-11-1111,9 Oak St,P9,2020-01-01\n\
                   1003,ERR999,M3,Ann,Lee,1975-03-03,222-22-2222,3 Pine St,P3,2021-03-03";
        RecordStore::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_steps_run_in_fixed_order() {
        let tools: Vec<Tool> = STEPS.iter().map(|s| s.tool).collect();
        assert_eq!(tools, Tool::ALL.to_vec());
    }

    #[test]
    fn test_process_aggregates_every_step() {
        let store = create_test_store();
        let pipeline = Pipeline::new(&store);

        let result = pipeline.process("1001");
        let lines: Vec<&str> = result.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Details: {\"transaction_id\": \"1001\""));
        assert_eq!(lines[1], "Analysis: Error code ERR001. Missing fields: member_id.");
        assert_eq!(
            lines[2],
            "Suggestion: To resolve error code ERR001, please provide the missing fields: member_id."
        );
        assert!(lines[3].starts_with("Fix: Transaction 1001 fixed"));
    }

    #[test]
    fn test_run_skips_rows_without_id() {
        let store = create_test_store();
        let report = Pipeline::new(&store).run();

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[1].transaction_id, None);
        assert_eq!(report.results[1].result, NO_TRANSACTION_ID);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 2);
        assert_eq!(report.fixed, 1);
        assert_eq!(report.already_complete, 1);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_run_counters_match_fix_lines() {
        let store = create_test_store();
        let report = Pipeline::new(&store).run();

        let fix_lines: Vec<&str> = report
            .results
            .iter()
            .filter_map(|r| r.result.lines().find(|line| line.starts_with("Fix: ")))
            .collect();

        let fixed = fix_lines.iter().filter(|l| l.contains(" fixed: ")).count();
        let complete = fix_lines
            .iter()
            .filter(|l| l.ends_with("did not require fixing. All fields present."))
            .count();
        let not_found = fix_lines.iter().filter(|l| l.ends_with("not found. Cannot fix.")).count();

        assert_eq!(fix_lines.len(), report.processed);
        assert_eq!(report.fixed, fixed);
        assert_eq!(report.already_complete, complete);
        assert_eq!(report.not_found, not_found);
        assert_eq!(fixed + complete + not_found, report.processed);
    }

    #[test]
    fn test_run_keeps_source_order() {
        let store = create_test_store();
        let report = Pipeline::new(&store).run();

        let ids: Vec<Option<&str>> = report
            .results
            .iter()
            .map(|r| r.transaction_id.as_deref())
            .collect();
        assert_eq!(ids, vec![Some("1001"), None, Some("1003")]);
    }

    #[test]
    fn test_write_results_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("crew_results.csv");

        let results = vec![
            TransactionResult {
                transaction_id: Some("1001".to_string()),
                result: "Line one\nLine two".to_string(),
            },
            TransactionResult {
                transaction_id: None,
                result: NO_TRANSACTION_ID.to_string(),
            },
        ];
        write_results(&path, &results).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.headers().unwrap(), vec!["transaction_id", "result"]);

        let rows: Vec<TransactionResult> = rdr.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, results);
    }
}
