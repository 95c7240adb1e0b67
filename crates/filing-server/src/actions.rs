//! Per-action validation rule sets.
//!
//! Each [`ActionValidator`] inspects an [`ActionContext`] and reports why it
//! failed, if it did. The [`ActionRegistry`] runs the set registered for an
//! action: SIGN and ACCEPT collect every failure into one 403, CREATE maps
//! its two checks onto 422 (unknown period) and 409 (filing already there).

use filing_core::{
    Filing, FilingError, FilingPeriod, Institution, Submission, SubmissionState, UserActionType,
};

/// Everything a validator may need, looked up by the handler beforehand.
/// Fields irrelevant to the action in question stay `None`.
pub struct ActionContext<'a> {
    pub lei: &'a str,
    pub period: &'a str,
    pub filing_period: Option<&'a FilingPeriod>,
    pub institution: Option<&'a Institution>,
    pub filing: Option<&'a Filing>,
    pub submission: Option<&'a Submission>,
    pub latest_submission: Option<&'a Submission>,
}

impl<'a> ActionContext<'a> {
    pub fn new(lei: &'a str, period: &'a str) -> Self {
        Self {
            lei,
            period,
            filing_period: None,
            institution: None,
            filing: None,
            submission: None,
            latest_submission: None,
        }
    }
}

pub trait ActionValidator: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the check passes, otherwise the reason it failed.
    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String>;
}

// ── CREATE ────────────────────────────────────────────────────────────

struct PeriodExists;

impl PeriodExists {
    const NAME: &'static str = "period_exists";
}

impl ActionValidator for PeriodExists {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        if ctx.filing_period.is_some() {
            return None;
        }
        Some(format!(
            "the filing period {} does not exist, a filing cannot be created against it",
            ctx.period
        ))
    }
}

struct FilingAbsent;

impl ActionValidator for FilingAbsent {
    fn name(&self) -> &'static str {
        "filing_absent"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        if ctx.filing.is_none() {
            return None;
        }
        Some(format!(
            "a filing already exists for LEI {} in period {}",
            ctx.lei, ctx.period
        ))
    }
}

// ── ACCEPT ────────────────────────────────────────────────────────────

struct LatestSubmission;

impl ActionValidator for LatestSubmission {
    fn name(&self) -> &'static str {
        "latest_submission"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        let submission = ctx.submission?;
        match ctx.latest_submission {
            Some(latest) if latest.id == submission.id => None,
            _ => Some(format!(
                "submission {} is not the latest for this filing",
                submission.id
            )),
        }
    }
}

struct AcceptableState;

impl ActionValidator for AcceptableState {
    fn name(&self) -> &'static str {
        "acceptable_state"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        let submission = ctx.submission?;
        if submission.state.is_acceptable() {
            return None;
        }
        Some(format!(
            "submission {} is in state {} and cannot be accepted",
            submission.id, submission.state
        ))
    }
}

// ── SIGN ──────────────────────────────────────────────────────────────

struct LeiStatus;

impl ActionValidator for LeiStatus {
    fn name(&self) -> &'static str {
        "lei_status"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        match ctx.institution {
            None => Some(format!("institution {} is not in the registry", ctx.lei)),
            Some(i) if !i.can_file => Some(format!(
                "LEI status {} does not permit filing",
                i.lei_status_code
            )),
            Some(_) => None,
        }
    }
}

struct LeiTin;

impl ActionValidator for LeiTin {
    fn name(&self) -> &'static str {
        "lei_tin"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        let tin = ctx
            .institution
            .and_then(|i| i.tax_id.as_deref())
            .filter(|t| !t.is_empty());
        if tin.is_some() {
            return None;
        }
        Some(format!("institution {} has no TIN on record", ctx.lei))
    }
}

struct FilingExists;

impl ActionValidator for FilingExists {
    fn name(&self) -> &'static str {
        "filing_exists"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        if ctx.filing.is_some() {
            return None;
        }
        Some(format!(
            "there is no filing for LEI {} in period {}",
            ctx.lei, ctx.period
        ))
    }
}

struct AcceptedSubmission;

impl ActionValidator for AcceptedSubmission {
    fn name(&self) -> &'static str {
        "accepted_submission"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        match ctx.latest_submission {
            None => Some("no submission has been uploaded for this filing".to_string()),
            Some(s) if s.state != SubmissionState::SubmissionAccepted => Some(format!(
                "the latest submission is in state {}, not SUBMISSION_ACCEPTED",
                s.state
            )),
            Some(_) => None,
        }
    }
}

struct VoluntaryFiler;

impl ActionValidator for VoluntaryFiler {
    fn name(&self) -> &'static str {
        "voluntary_filer"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        if ctx.filing.and_then(|f| f.is_voluntary).is_some() {
            return None;
        }
        Some("the voluntary-filer flag has not been set".to_string())
    }
}

struct ContactInfoPresent;

impl ActionValidator for ContactInfoPresent {
    fn name(&self) -> &'static str {
        "contact_info"
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Option<String> {
        if ctx.filing.and_then(|f| f.contact_info.as_ref()).is_some() {
            return None;
        }
        Some("contact info has not been provided".to_string())
    }
}

// ── ActionRegistry ────────────────────────────────────────────────────

pub struct ActionRegistry {
    create: Vec<Box<dyn ActionValidator>>,
    accept: Vec<Box<dyn ActionValidator>>,
    sign: Vec<Box<dyn ActionValidator>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            create: vec![Box::new(PeriodExists), Box::new(FilingAbsent)],
            accept: vec![Box::new(LatestSubmission), Box::new(AcceptableState)],
            sign: vec![
                Box::new(LeiStatus),
                Box::new(LeiTin),
                Box::new(FilingExists),
                Box::new(AcceptedSubmission),
                Box::new(VoluntaryFiler),
                Box::new(ContactInfoPresent),
            ],
        }
    }

    pub fn validate(
        &self,
        action: UserActionType,
        ctx: &ActionContext<'_>,
    ) -> Result<(), FilingError> {
        match action {
            UserActionType::Create => self.validate_create(ctx),
            // Upload rules (type, extension, size) live with the upload
            // handler; there is no context-level SUBMIT set.
            UserActionType::Submit => Ok(()),
            UserActionType::Accept => Self::all_or_forbidden(&self.accept, ctx),
            UserActionType::Sign => Self::all_or_forbidden(&self.sign, ctx),
        }
    }

    /// CREATE failures carry their own statuses: 422 for an unknown period,
    /// 409 for a filing that already exists.
    fn validate_create(&self, ctx: &ActionContext<'_>) -> Result<(), FilingError> {
        for validator in &self.create {
            if let Some(reason) = validator.apply(ctx) {
                return Err(if validator.name() == PeriodExists::NAME {
                    FilingError::Unprocessable(reason)
                } else {
                    FilingError::Conflict(reason)
                });
            }
        }
        Ok(())
    }

    fn all_or_forbidden(
        set: &[Box<dyn ActionValidator>],
        ctx: &ActionContext<'_>,
    ) -> Result<(), FilingError> {
        let failures: Vec<String> = set
            .iter()
            .filter_map(|v| v.apply(ctx).map(|reason| format!("{}: {}", v.name(), reason)))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(FilingError::ActionForbidden(failures))
        }
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
