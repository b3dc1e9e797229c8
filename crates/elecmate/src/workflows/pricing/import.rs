use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::domain::{
    PricingSubmission, SubmissionId, SubmitterProfile, UserId, VerificationStatus,
};
use super::repository::{RepositoryError, SubmissionRepository};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionImportError {
    #[error("failed to read submissions export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid submissions CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error("could not store imported submission: {0}")]
    Repository(#[from] RepositoryError),
}

/// Submissions and the submitter profiles referenced by them.
#[derive(Debug, Clone, Default)]
pub struct ImportedSubmissions {
    pub submissions: Vec<PricingSubmission>,
    pub profiles: Vec<SubmitterProfile>,
}

impl ImportedSubmissions {
    /// Inserts every submission into `store`, returning how many were written.
    pub fn load_into<S: SubmissionRepository>(
        &self,
        store: &S,
    ) -> Result<usize, SubmissionImportError> {
        for submission in &self.submissions {
            store.insert(submission.clone())?;
        }
        Ok(self.submissions.len())
    }
}

/// Reads a CSV export of `community_pricing_submissions`, optionally carrying a
/// `submitter_name` column joined from `profiles`.
pub struct SubmissionCsvImporter;

impl SubmissionCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ImportedSubmissions, SubmissionImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ImportedSubmissions, SubmissionImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut submissions = Vec::new();
        let mut profiles: BTreeMap<UserId, SubmitterProfile> = BTreeMap::new();

        for (index, record) in csv_reader.deserialize::<SubmissionRow>().enumerate() {
            // Header occupies line 1.
            let row_number = index + 2;
            let row = record?;
            let (submission, profile) = row
                .into_submission()
                .map_err(|message| SubmissionImportError::InvalidRow {
                    row: row_number,
                    message,
                })?;

            if let Some(profile) = profile {
                profiles.insert(profile.id, profile);
            }
            submissions.push(submission);
        }

        Ok(ImportedSubmissions {
            submissions,
            profiles: profiles.into_values().collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    submitter_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    postcode_district: Option<String>,
    job_type: String,
    actual_price: f64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    job_description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    completion_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    materials_cost: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    labour_hours: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    complexity_notes: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    verification_status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl SubmissionRow {
    fn into_submission(self) -> Result<(PricingSubmission, Option<SubmitterProfile>), String> {
        if self.job_type.is_empty() {
            return Err("job_type is required".to_string());
        }
        if !self.actual_price.is_finite() || self.actual_price < 0.0 {
            return Err(format!("actual_price {} is not a valid amount", self.actual_price));
        }

        let id = match self.id.as_deref() {
            Some(raw) => SubmissionId(parse_uuid("id", raw)?),
            None => SubmissionId::new(),
        };
        let user_id = self
            .user_id
            .as_deref()
            .map(|raw| parse_uuid("user_id", raw).map(UserId))
            .transpose()?;
        let created_at = match self.created_at.as_deref() {
            Some(raw) => parse_timestamp(raw)
                .ok_or_else(|| format!("created_at '{raw}' is not RFC 3339 or YYYY-MM-DD"))?,
            None => Utc::now(),
        };
        let completion_date = self
            .completion_date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|err| format!("completion_date '{raw}' ({err})"))
            })
            .transpose()?;
        let verification_status = self
            .verification_status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .flatten();

        let profile = match (user_id, self.submitter_name) {
            (Some(id), Some(name)) => Some(SubmitterProfile {
                id,
                full_name: Some(name),
            }),
            _ => None,
        };

        let submission = PricingSubmission {
            id,
            user_id,
            postcode_district: self.postcode_district,
            job_type: self.job_type,
            actual_price: self.actual_price,
            job_description: self.job_description,
            completion_date,
            materials_cost: parse_optional_number("materials_cost", self.materials_cost)?,
            labour_hours: parse_optional_number("labour_hours", self.labour_hours)?,
            complexity_notes: self.complexity_notes,
            verification_status,
            verified_by: None,
            verified_at: None,
            created_at,
        };

        Ok((submission, profile))
    }
}

fn parse_status(raw: &str) -> Result<Option<VerificationStatus>, String> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(Some(VerificationStatus::Pending)),
        "approved" => Ok(Some(VerificationStatus::Approved)),
        "flagged" => Ok(Some(VerificationStatus::Flagged)),
        "null" | "unset" => Ok(None),
        "rejected" => Err("rejected submissions are deleted and cannot be imported".to_string()),
        other => Err(format!("unknown verification_status '{other}'")),
    }
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|err| format!("{field} '{raw}' is not a UUID ({err})"))
}

fn parse_optional_number(field: &str, raw: Option<String>) -> Result<Option<f64>, String> {
    raw.map(|value| {
        value
            .parse::<f64>()
            .map_err(|_| format!("{field} '{value}' is not numeric"))
    })
    .transpose()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pricing::memory::InMemoryPricingStore;

    const HEADER: &str = "id,user_id,submitter_name,postcode_district,job_type,actual_price,job_description,completion_date,materials_cost,labour_hours,complexity_notes,verification_status,created_at\n";

    #[test]
    fn imports_rows_with_optional_columns() {
        let csv = format!(
            "{HEADER}\
,6f1c1c5e-3b8e-4a47-9d0e-2f6f0f0a1b2c,Priya Sparks,SW1A,Consumer Unit Change,460,Board swap,2025-05-01,180.5,6,,approved,2025-05-02T09:00:00Z\n\
,,,,Garden Lighting,320,,,,,,,2025-05-03\n"
        );

        let imported = SubmissionCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        assert_eq!(imported.submissions.len(), 2);
        assert_eq!(imported.profiles.len(), 1);

        let first = &imported.submissions[0];
        assert_eq!(first.job_type, "Consumer Unit Change");
        assert_eq!(first.verification_status, Some(VerificationStatus::Approved));
        assert_eq!(first.materials_cost, Some(180.5));
        assert_eq!(first.labour_hours, Some(6.0));
        assert_eq!(
            first.completion_date,
            NaiveDate::from_ymd_opt(2025, 5, 1)
        );
        assert_eq!(imported.profiles[0].full_name.as_deref(), Some("Priya Sparks"));

        let second = &imported.submissions[1];
        assert!(second.awaiting_review());
        assert!(second.user_id.is_none());
        assert!(second.postcode_district.is_none());
    }

    #[test]
    fn rejected_rows_are_refused() {
        let csv = format!("{HEADER},,,,EICR,180,,,,,,rejected,2025-05-03\n");
        match SubmissionCsvImporter::from_reader(csv.as_bytes()) {
            Err(SubmissionImportError::InvalidRow { row, message }) => {
                assert_eq!(row, 2);
                assert!(message.contains("rejected"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn malformed_price_is_a_csv_error() {
        let csv = format!("{HEADER},,,,EICR,£180,,,,,,,\n");
        assert!(matches!(
            SubmissionCsvImporter::from_reader(csv.as_bytes()),
            Err(SubmissionImportError::Csv(_))
        ));
    }

    #[test]
    fn load_into_inserts_every_row() {
        let csv = format!("{HEADER},,,,EICR,180,,,,,,pending,\n,,,,EICR,190,,,,,,,\n");
        let imported = SubmissionCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        let store = InMemoryPricingStore::new();
        let written = imported.load_into(&store).expect("rows stored");
        assert_eq!(written, 2);
        assert_eq!(store.len(), 2);
    }
}
