// 🩺 Validation & Remediation Engine
// Missing-field diagnosis, error-code resolutions and simulated fixes
//
// Every operation is a pure read of the record store. "Fixing" builds a
// derived copy with placeholder values; the stored record is never touched.

use crate::record::TransactionRecord;
use crate::store::RecordStore;
use std::fmt;

/// Reply of the detail, analysis and suggestion operations for an unknown id
pub const NOT_FOUND: &str = "Transaction not found";

// ============================================================================
// LOOKUP TABLES
// ============================================================================

/// Canned resolution text for known error codes
pub fn resolution_for_code(error_code: &str) -> Option<&'static str> {
    let text = match error_code {
        "ERR001" => "ERR001: Please check member eligibility and provide all required demographic information.",
        "ERR002" => "ERR002: Policy number is invalid or missing. Please verify and resubmit.",
        "ERR003" => "ERR003: Address or contact information incomplete. Please update member profile.",
        "ERR004" => "ERR004: Enrollment date missing or invalid. Please provide a valid date.",
        "ERR005" => "ERR005: SSN missing or invalid. Please provide a valid SSN.",
        "ERR006" => "ERR006: Duplicate enrollment detected. Please review and remove duplicates.",
        "ERR007" => "ERR007: Invalid member ID. Please check and correct the member ID.",
        _ => return None,
    };
    Some(text)
}

/// Placeholder value the simulated lookup "finds" for a missing field.
/// Fields without an entry get `FAKE_{FIELD}`.
pub fn placeholder_for(field: &str) -> String {
    let value = match field {
        "policy_number" => "PN-FAKE-12345",
        "date_of_birth" => "1980-01-01",
        "ssn" => "999-99-9999",
        "address" => "100 Default Ave",
        "enrollment_date" => "2024-01-15",
        "member_id" => "9999",
        "first_name" => "Default",
        "last_name" => "Member",
        _ => return format!("FAKE_{}", field.to_uppercase()),
    };
    value.to_string()
}

// ============================================================================
// FIX OUTCOME
// ============================================================================

/// Result of a simulated fix
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    NotFound {
        transaction_id: String,
    },
    NotRequired {
        transaction_id: String,
    },
    Fixed {
        transaction_id: String,
        filled: Vec<&'static str>,
        record: TransactionRecord,
    },
}

impl FixOutcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, FixOutcome::Fixed { .. })
    }

    /// The derived record, when a fix was applied
    pub fn record(&self) -> Option<&TransactionRecord> {
        match self {
            FixOutcome::Fixed { record, .. } => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixOutcome::NotFound { transaction_id } => {
                write!(f, "Transaction {} not found. Cannot fix.", transaction_id)
            }
            FixOutcome::NotRequired { transaction_id } => write!(
                f,
                "Transaction {} did not require fixing. All fields present.",
                transaction_id
            ),
            FixOutcome::Fixed {
                transaction_id,
                filled,
                record,
            } => write!(
                f,
                "Transaction {} fixed: missing fields filled from database simulation: {}. Updated record: {}",
                transaction_id,
                filled.join(", "),
                record
            ),
        }
    }
}

// ============================================================================
// REMEDIATION ENGINE
// ============================================================================

pub struct RemediationEngine<'a> {
    store: &'a RecordStore,
}

impl<'a> RemediationEngine<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        RemediationEngine { store }
    }

    /// Full record for a transaction id
    pub fn get_details(&self, transaction_id: &str) -> Option<&'a TransactionRecord> {
        self.store.lookup(transaction_id)
    }

    /// Diagnostic line naming the error code and any missing fields
    pub fn analyze(&self, transaction_id: &str) -> String {
        let Some(record) = self.store.lookup(transaction_id) else {
            return NOT_FOUND.to_string();
        };

        let missing = record.missing_fields();
        if missing.is_empty() {
            format!("Error code {}. No missing fields detected.", record.error_code())
        } else {
            format!(
                "Error code {}. Missing fields: {}.",
                record.error_code(),
                missing.join(", ")
            )
        }
    }

    /// Remediation text. Missing fields take priority over the error-code table.
    pub fn suggest(&self, transaction_id: &str) -> String {
        let Some(record) = self.store.lookup(transaction_id) else {
            return NOT_FOUND.to_string();
        };

        let error_code = record.error_code();
        let missing = record.missing_fields();
        if !missing.is_empty() {
            return format!(
                "To resolve error code {}, please provide the missing fields: {}.",
                error_code,
                missing.join(", ")
            );
        }

        match resolution_for_code(error_code) {
            Some(text) => text.to_string(),
            None => format!(
                "Suggested resolution for error code {}: Contact support.",
                error_code
            ),
        }
    }

    /// Fill missing fields with placeholders on a derived copy of the record
    pub fn simulate_fix(&self, transaction_id: &str) -> FixOutcome {
        let transaction_id = transaction_id.to_string();
        let Some(record) = self.store.lookup(&transaction_id) else {
            return FixOutcome::NotFound { transaction_id };
        };

        let filled = record.missing_fields();
        if filled.is_empty() {
            return FixOutcome::NotRequired { transaction_id };
        }

        let record = filled
            .iter()
            .fold(record.clone(), |acc, field| acc.with_value(field, placeholder_for(field)));

        FixOutcome::Fixed {
            transaction_id,
            filled,
            record,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::REQUIRED_FIELDS;

    fn create_complete_record(id: &str, error_code: &str) -> TransactionRecord {
        TransactionRecord::from_pairs([
            ("transaction_id", Some(id)),
            ("error_code", Some(error_code)),
            ("member_id", Some("M-100")),
            ("first_name", Some("Jane")),
            ("last_name", Some("Doe")),
            ("date_of_birth", Some("1990-05-01")),
            ("ssn", Some("123-45-6789")),
            ("address", Some("1 Main St")),
            ("policy_number", Some("P1")),
            ("enrollment_date", Some("2023-01-01")),
            ("plan_code", Some("GOLD")),
        ])
    }

    fn create_test_store() -> RecordStore {
        RecordStore::new(vec![
            create_complete_record("1001", "ERR001").with_value("member_id", ""),
            create_complete_record("1002", "ERR003"),
            create_complete_record("1003", "ERR999"),
            create_complete_record("1004", "ERR002")
                .with_value("ssn", "  ")
                .with_value("policy_number", ""),
        ])
    }

    #[test]
    fn test_not_found_for_every_operation() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        assert!(engine.get_details("9999").is_none());
        assert_eq!(engine.analyze("9999"), NOT_FOUND);
        assert_eq!(engine.suggest("9999"), NOT_FOUND);
        assert_eq!(
            engine.simulate_fix("9999").to_string(),
            "Transaction 9999 not found. Cannot fix."
        );
    }

    #[test]
    fn test_get_details_returns_all_columns() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        let record = engine.get_details("1002").unwrap();
        assert_eq!(record.get("plan_code"), Some("GOLD"));
        assert_eq!(record.columns().count(), 11);
    }

    #[test]
    fn test_analyze_missing_fields() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        assert_eq!(engine.analyze("1001"), "Error code ERR001. Missing fields: member_id.");
        assert_eq!(
            engine.analyze("1004"),
            "Error code ERR002. Missing fields: ssn, policy_number."
        );
    }

    #[test]
    fn test_analyze_complete_record() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        assert_eq!(engine.analyze("1002"), "Error code ERR003. No missing fields detected.");
    }

    #[test]
    fn test_suggest_missing_fields_take_priority() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        assert_eq!(
            engine.suggest("1001"),
            "To resolve error code ERR001, please provide the missing fields: member_id."
        );
        assert_eq!(
            engine.suggest("1004"),
            "To resolve error code ERR002, please provide the missing fields: ssn, policy_number."
        );
    }

    #[test]
    fn test_suggest_missing_fields_win_for_every_known_code() {
        let codes = ["ERR001", "ERR002", "ERR003", "ERR004", "ERR005", "ERR006", "ERR007"];
        let records = codes
            .iter()
            .zip(REQUIRED_FIELDS.iter().cycle())
            .enumerate()
            .map(|(i, (code, field))| {
                create_complete_record(&format!("30{}", i), code).with_value(field, " ")
            })
            .collect();
        let store = RecordStore::new(records);
        let engine = RemediationEngine::new(&store);

        for (i, (code, field)) in codes.iter().zip(REQUIRED_FIELDS.iter().cycle()).enumerate() {
            assert_eq!(
                engine.suggest(&format!("30{}", i)),
                format!(
                    "To resolve error code {}, please provide the missing fields: {}.",
                    code, field
                )
            );
        }
    }

    #[test]
    fn test_blank_id_is_not_found() {
        let store = RecordStore::new(vec![create_complete_record("   ", "ERR003")]);
        let engine = RemediationEngine::new(&store);

        assert!(engine.get_details("").is_none());
        assert_eq!(engine.analyze(""), NOT_FOUND);
        assert_eq!(engine.suggest(" "), NOT_FOUND);
        assert_eq!(
            engine.simulate_fix(" ").to_string(),
            "Transaction   not found. Cannot fix."
        );
    }

    #[test]
    fn test_suggest_known_and_unknown_codes() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        assert_eq!(
            engine.suggest("1002"),
            "ERR003: Address or contact information incomplete. Please update member profile."
        );
        assert_eq!(
            engine.suggest("1003"),
            "Suggested resolution for error code ERR999: Contact support."
        );
    }

    #[test]
    fn test_every_known_code_has_resolution() {
        for code in ["ERR001", "ERR002", "ERR003", "ERR004", "ERR005", "ERR006", "ERR007"] {
            let text = resolution_for_code(code).unwrap();
            assert!(text.starts_with(&format!("{}: ", code)));
        }
        assert!(resolution_for_code("ERR008").is_none());
        assert!(resolution_for_code("err001").is_none());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholder_for("member_id"), "9999");
        assert_eq!(placeholder_for("policy_number"), "PN-FAKE-12345");
        assert_eq!(placeholder_for("middle_name"), "FAKE_MIDDLE_NAME");

        for field in REQUIRED_FIELDS {
            assert!(!placeholder_for(field).starts_with("FAKE_"));
        }
    }

    #[test]
    fn test_simulate_fix_fills_only_missing_fields() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);
        let original = store.lookup("1004").unwrap();

        let outcome = engine.simulate_fix("1004");
        assert!(outcome.is_fixed());

        let fixed = outcome.record().unwrap();
        assert_eq!(fixed.get("ssn"), Some("999-99-9999"));
        assert_eq!(fixed.get("policy_number"), Some("PN-FAKE-12345"));
        assert!(fixed.missing_fields().is_empty());

        for column in original.columns() {
            if column != "ssn" && column != "policy_number" {
                assert_eq!(fixed.get(column), original.get(column));
            }
        }
    }

    #[test]
    fn test_simulate_fix_message() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        let message = engine.simulate_fix("1001").to_string();
        assert!(message.starts_with(
            "Transaction 1001 fixed: missing fields filled from database simulation: member_id. Updated record: {"
        ));
        assert!(message.contains(r#""member_id": "9999""#));
        assert!(message.contains(r#""plan_code": "GOLD""#));
    }

    #[test]
    fn test_simulate_fix_not_required() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        let outcome = engine.simulate_fix("1002");
        assert!(!outcome.is_fixed());
        assert_eq!(
            outcome.to_string(),
            "Transaction 1002 did not require fixing. All fields present."
        );
    }

    #[test]
    fn test_simulate_fix_is_repeatable_and_read_only() {
        let store = create_test_store();
        let engine = RemediationEngine::new(&store);

        let first = engine.simulate_fix("1001");
        let second = engine.simulate_fix("1001");

        assert_eq!(first, second);
        assert_eq!(store.lookup("1001").unwrap().get("member_id"), Some(""));
        assert_eq!(engine.analyze("1001"), "Error code ERR001. Missing fields: member_id.");
    }
}
