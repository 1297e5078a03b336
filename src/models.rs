use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeInput {
    pub content: String,
    pub file_name: Option<String>, // last file loaded into the field, if any
}

impl ResumeInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            file_name: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobInput {
    pub text: String,
    pub company_name: Option<String>, // display only, never sent to the model
    pub job_title: Option<String>,
}

impl JobInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            company_name: None,
            job_title: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// "Title at Company", whichever parts are known.
    pub fn label(&self) -> Option<String> {
        match (self.job_title.as_deref(), self.company_name.as_deref()) {
            (Some(title), Some(company)) => Some(format!("{} at {}", title, company)),
            (Some(title), None) => Some(title.to_string()),
            (None, Some(company)) => Some(company.to_string()),
            (None, None) => None,
        }
    }
}

/// Structured payload returned by the model. All three fields are required;
/// a payload missing any of them fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoringResult {
    pub tailored_resume: String,
    pub key_changes: Vec<String>,
    pub match_score: f64,
}

impl TailoringResult {
    pub fn score_in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.match_score)
    }

    /// Score formatted the way the results header shows it.
    pub fn score_label(&self) -> String {
        format!("{}%", self.match_score)
    }
}
