// 🧰 Tool Registry - the four remediation operations, invocable by name
// Each tool takes a single transaction_id and answers with text or a record

use crate::record::TransactionRecord;
use crate::remediation::{RemediationEngine, NOT_FOUND};
use crate::store::RecordStore;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
}

// ============================================================================
// TOOL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    GetTransactionDetails,
    AnalyzeError,
    SuggestResolution,
    FixTransaction,
}

impl Tool {
    /// All tools, in pipeline order
    pub const ALL: [Tool; 4] = [
        Tool::GetTransactionDetails,
        Tool::AnalyzeError,
        Tool::SuggestResolution,
        Tool::FixTransaction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GetTransactionDetails => "get_transaction_details",
            Tool::AnalyzeError => "analyze_error",
            Tool::SuggestResolution => "suggest_resolution",
            Tool::FixTransaction => "fix_transaction",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::GetTransactionDetails => "Retrieve details of a failed transaction by transaction ID.",
            Tool::AnalyzeError => "Analyze the error code and missing attributes of a failed transaction.",
            Tool::SuggestResolution => "Suggest a resolution for a failed transaction based on the error code and missing attributes.",
            Tool::FixTransaction => "Simulate fixing a failed transaction by filling missing fields from a placeholder database.",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .iter()
            .copied()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

// ============================================================================
// TOOL RESPONSE
// ============================================================================

/// What a tool hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    Text(String),
    Record(TransactionRecord),
    Error { error: String },
}

impl ToolResponse {
    /// Plain-text form, used when aggregating pipeline results
    pub fn as_text(&self) -> String {
        match self {
            ToolResponse::Text(text) => text.clone(),
            ToolResponse::Record(record) => record.to_string(),
            ToolResponse::Error { error } => error.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolResponse::Error { .. })
    }
}

// ============================================================================
// TOOL REGISTRY
// ============================================================================

pub struct ToolRegistry<'a> {
    engine: RemediationEngine<'a>,
}

impl<'a> ToolRegistry<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        ToolRegistry {
            engine: RemediationEngine::new(store),
        }
    }

    pub fn engine(&self) -> &RemediationEngine<'a> {
        &self.engine
    }

    pub fn invoke(&self, tool: Tool, transaction_id: &str) -> ToolResponse {
        debug!(tool = tool.name(), transaction_id, "invoking tool");

        match tool {
            Tool::GetTransactionDetails => match self.engine.get_details(transaction_id) {
                Some(record) => ToolResponse::Record(record.clone()),
                None => ToolResponse::Error {
                    error: NOT_FOUND.to_string(),
                },
            },
            Tool::AnalyzeError => ToolResponse::Text(self.engine.analyze(transaction_id)),
            Tool::SuggestResolution => ToolResponse::Text(self.engine.suggest(transaction_id)),
            Tool::FixTransaction => {
                ToolResponse::Text(self.engine.simulate_fix(transaction_id).to_string())
            }
        }
    }

    /// Invoke a tool by its wire name
    pub fn invoke_by_name(&self, name: &str, transaction_id: &str) -> Result<ToolResponse, ToolError> {
        let tool: Tool = name.parse()?;
        Ok(self.invoke(tool, transaction_id))
    }
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
                   1002,ERR006,M2,John,Roe,1985-02-02,987-65-4321,2 Elm St,P2,2023-02-02";
        RecordStore::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(tool.name().parse::<Tool>().unwrap(), tool);
            assert!(!tool.description().is_empty());
        }
    }

    #[test]
    fn test_unknown_tool_name() {
        assert_eq!(
            "drop_table".parse::<Tool>(),
            Err(ToolError::UnknownTool("drop_table".to_string()))
        );
    }

    #[test]
    fn test_get_transaction_details_found() {
        let store = create_test_store();
        let registry = ToolRegistry::new(&store);

        let response = registry.invoke(Tool::GetTransactionDetails, "1002");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["transaction_id"], "1002");
        assert_eq!(json["error_code"], "ERR006");
        assert_eq!(Some(json), store.lookup("1002").map(|r| r.to_json()));
    }

    #[test]
    fn test_get_transaction_details_not_found() {
        let store = create_test_store();
        let registry = ToolRegistry::new(&store);

        let response = registry.invoke(Tool::GetTransactionDetails, "9999");
        assert!(response.is_not_found());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"error": "Transaction not found"})
        );
    }

    #[test]
    fn test_text_tools_serialize_as_strings() {
        let store = create_test_store();
        let registry = ToolRegistry::new(&store);

        let response = registry.invoke_by_name("suggest_resolution", "1002").unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!("ERR006: Duplicate enrollment detected. Please review and remove duplicates.")
        );
    }

    #[test]
    fn test_fix_transaction_by_name() {
        let store = create_test_store();
        let registry = ToolRegistry::new(&store);

        let text = registry.invoke_by_name("fix_transaction", "1001").unwrap().as_text();
        assert!(text.starts_with("Transaction 1001 fixed"));

        let missing = registry.invoke_by_name("fix_transaction", "42").unwrap().as_text();
        assert_eq!(missing, "Transaction 42 not found. Cannot fix.");
    }
}
