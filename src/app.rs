//! Four-state view model: Idle, Loading, Result, Error.
//!
//! The controller never performs I/O itself. `submit` hands back a
//! [`TailorRequest`] snapshot for the caller to run, and `complete` takes the
//! outcome, so the UI loop and the headless command share the same rules.

use anyhow::Result;
use tracing::{error, info, warn};

use crate::ai::TailorError;
use crate::input::{apply_edit, Edit};
use crate::models::{JobInput, ResumeInput, TailoringResult};

pub const VALIDATION_MESSAGE: &str = "Please provide both your resume and the job description.";
pub const FAILURE_MESSAGE: &str = "Failed to tailor resume. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Loading,
    Result,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Resume,
    Job,
}

impl Field {
    pub fn toggle(self) -> Self {
        match self {
            Field::Resume => Field::Job,
            Field::Job => Field::Resume,
        }
    }
}

/// Inputs captured at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailorRequest {
    pub resume: String,
    pub job: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started(TailorRequest),
    Invalid,
    Busy,
}

#[derive(Debug)]
pub struct App {
    resume: ResumeInput,
    job: JobInput,
    status: AppStatus,
    result: Option<TailoringResult>,
    error: Option<String>,
    file_loading: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new(ResumeInput::default(), JobInput::default())
    }
}

impl App {
    pub fn new(resume: ResumeInput, job: JobInput) -> Self {
        Self {
            resume,
            job,
            status: AppStatus::Idle,
            result: None,
            error: None,
            file_loading: false,
        }
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn resume(&self) -> &ResumeInput {
        &self.resume
    }

    pub fn job(&self) -> &JobInput {
        &self.job
    }

    pub fn result(&self) -> Option<&TailoringResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_file_loading(&self) -> bool {
        self.file_loading
    }

    /// True while the input forms are on screen.
    pub fn is_editing(&self) -> bool {
        self.status != AppStatus::Result
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.status, AppStatus::Idle | AppStatus::Error)
    }

    pub fn edit(&mut self, field: Field, edit: Edit<'_>) -> bool {
        if !self.is_editing() {
            return false;
        }
        match field {
            Field::Resume => apply_edit(&mut self.resume.content, edit),
            Field::Job => apply_edit(&mut self.job.text, edit),
        }
        true
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if !self.can_submit() {
            return SubmitOutcome::Busy;
        }

        if self.resume.is_blank() || self.job.is_blank() {
            self.error = Some(VALIDATION_MESSAGE.to_string());
            return SubmitOutcome::Invalid;
        }

        self.error = None;
        self.status = AppStatus::Loading;
        info!(
            resume_chars = self.resume.content.len(),
            job_chars = self.job.text.len(),
            "submitting tailoring request"
        );

        SubmitOutcome::Started(TailorRequest {
            resume: self.resume.content.clone(),
            job: self.job.text.clone(),
        })
    }

    pub fn complete(&mut self, outcome: Result<TailoringResult, TailorError>) {
        if self.status != AppStatus::Loading {
            warn!(status = ?self.status, "ignoring completion outside of Loading");
            return;
        }

        match outcome {
            Ok(result) => {
                info!(score = result.match_score, "tailoring succeeded");
                self.result = Some(result);
                self.error = None;
                self.status = AppStatus::Result;
            }
            Err(err) => {
                error!("tailoring failed: {err}");
                self.result = None;
                self.error = Some(FAILURE_MESSAGE.to_string());
                self.status = AppStatus::Error;
            }
        }
    }

    /// Back to the editor. Only meaningful from the result view.
    pub fn reset(&mut self) -> bool {
        if self.status != AppStatus::Result {
            return false;
        }
        self.status = AppStatus::Idle;
        self.result = None;
        self.error = None;
        true
    }

    pub fn begin_file_load(&mut self) -> bool {
        if self.file_loading || !self.is_editing() {
            return false;
        }
        self.file_loading = true;
        true
    }

    /// Overwrites the resume text with the loaded file. Load failures are
    /// returned to the caller for display and leave the view state alone.
    pub fn finish_file_load(&mut self, file_name: String, outcome: Result<String>) -> Result<()> {
        self.file_loading = false;
        let text = outcome?;
        info!(file = %file_name, chars = text.len(), "loaded resume file");
        self.resume.content = text;
        self.resume.file_name = Some(file_name);
        Ok(())
    }
}
