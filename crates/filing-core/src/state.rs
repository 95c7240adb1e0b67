//! Submission lifecycle state machine.
//!
//! A submission moves strictly forward: upload, validation, then a terminal
//! outcome. Re-uploading never resets an existing submission; it creates a
//! new one with the next counter. `VALIDATION_EXPIRED` is only ever written
//! by the expiry watchdog; once a submission is expired no late validation
//! result may overwrite it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    /// Created, bytes not yet persisted.
    SubmissionStarted,
    /// Raw bytes stored successfully.
    SubmissionUploaded,
    /// Storage write failed.
    UploadFailed,
    /// Parse and validation dispatched to the blocking pool.
    ValidationInProgress,
    /// File could not be parsed into tabular form.
    SubmissionUploadMalformed,
    /// The rule validator failed or panicked.
    ValidationError,
    /// The watchdog fired before validation finished.
    ValidationExpired,
    /// All phases passed, zero findings.
    ValidationSuccessful,
    /// Only warning-severity findings.
    ValidationWithWarnings,
    /// At least one error-severity finding, any phase.
    ValidationWithErrors,
    /// Reviewer accepted the submission; enables filing signing.
    SubmissionAccepted,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmissionStarted => "SUBMISSION_STARTED",
            Self::SubmissionUploaded => "SUBMISSION_UPLOADED",
            Self::UploadFailed => "UPLOAD_FAILED",
            Self::ValidationInProgress => "VALIDATION_IN_PROGRESS",
            Self::SubmissionUploadMalformed => "SUBMISSION_UPLOAD_MALFORMED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ValidationExpired => "VALIDATION_EXPIRED",
            Self::ValidationSuccessful => "VALIDATION_SUCCESSFUL",
            Self::ValidationWithWarnings => "VALIDATION_WITH_WARNINGS",
            Self::ValidationWithErrors => "VALIDATION_WITH_ERRORS",
            Self::SubmissionAccepted => "SUBMISSION_ACCEPTED",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// `ValidationExpired` is reachable only from `ValidationInProgress`; the
    /// expiry watchdog is its only legal writer.
    pub fn may_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (SubmissionStarted, SubmissionUploaded) => true,
            (SubmissionStarted, UploadFailed) => true,
            (SubmissionUploaded, ValidationInProgress) => true,
            (ValidationInProgress, SubmissionUploadMalformed) => true,
            (ValidationInProgress, ValidationError) => true,
            (ValidationInProgress, ValidationExpired) => true,
            (ValidationInProgress, ValidationSuccessful) => true,
            (ValidationInProgress, ValidationWithWarnings) => true,
            (ValidationInProgress, ValidationWithErrors) => true,
            (ValidationSuccessful, SubmissionAccepted) => true,
            (ValidationWithWarnings, SubmissionAccepted) => true,
            _ => false,
        }
    }

    /// Terminal states: no further transition is legal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::UploadFailed
                | Self::SubmissionUploadMalformed
                | Self::ValidationError
                | Self::ValidationExpired
                | Self::ValidationWithErrors
                | Self::SubmissionAccepted
        )
    }

    /// States from which a reviewer may accept the submission.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::ValidationSuccessful | Self::ValidationWithWarnings)
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubmissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMISSION_STARTED" => Ok(Self::SubmissionStarted),
            "SUBMISSION_UPLOADED" => Ok(Self::SubmissionUploaded),
            "UPLOAD_FAILED" => Ok(Self::UploadFailed),
            "VALIDATION_IN_PROGRESS" => Ok(Self::ValidationInProgress),
            "SUBMISSION_UPLOAD_MALFORMED" => Ok(Self::SubmissionUploadMalformed),
            "VALIDATION_ERROR" => Ok(Self::ValidationError),
            "VALIDATION_EXPIRED" => Ok(Self::ValidationExpired),
            "VALIDATION_SUCCESSFUL" => Ok(Self::ValidationSuccessful),
            "VALIDATION_WITH_WARNINGS" => Ok(Self::ValidationWithWarnings),
            "VALIDATION_WITH_ERRORS" => Ok(Self::ValidationWithErrors),
            "SUBMISSION_ACCEPTED" => Ok(Self::SubmissionAccepted),
            _ => Err(format!("Unknown submission state: {}", s)),
        }
    }
}

impl TryFrom<String> for SubmissionState {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
