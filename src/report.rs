use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::models::{JobInput, TailoringResult};

pub fn render_report(
    result: &TailoringResult,
    job: &JobInput,
    generated: DateTime<Local>,
) -> String {
    let mut report = String::new();

    match job.label() {
        Some(label) => report.push_str(&format!("# Tailored Resume: {}\n\n", label)),
        None => report.push_str("# Tailored Resume\n\n"),
    }

    report.push_str(&format!("**Match Score**: {}\n\n", result.score_label()));

    if !result.key_changes.is_empty() {
        report.push_str("## Key Changes\n\n");
        for change in &result.key_changes {
            report.push_str(&format!("- {}\n", change));
        }
        report.push('\n');
    }

    report.push_str("---\n\n");
    report.push_str(result.tailored_resume.trim_end());
    report.push_str("\n\n---\n");
    report.push_str(&format!("\n*Generated: {}*\n", generated.format("%Y-%m-%d %H:%M:%S")));

    report
}

pub fn default_report_path(dir: &Path, generated: DateTime<Local>) -> PathBuf {
    dir.join(format!("tailored-resume-{}.md", generated.format("%Y%m%d-%H%M%S")))
}

pub fn write_report(path: &Path, result: &TailoringResult, job: &JobInput) -> Result<()> {
    let content = render_report(result, job, Local::now());
    std::fs::write(path, content).with_context(|| format!("Failed to write to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result() -> TailoringResult {
        TailoringResult {
            tailored_resume: "# Jane Doe\n\nSenior Go Developer\n".to_string(),
            key_changes: vec![
                "Moved distributed systems work to the top".to_string(),
                "Quantified throughput gains".to_string(),
            ],
            match_score: 81.0,
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_render_report() {
        let mut job = JobInput::new("Go role");
        job.job_title = Some("Senior Go Developer".to_string());
        job.company_name = Some("Acme".to_string());

        let report = render_report(&sample_result(), &job, fixed_time());
        assert!(report.starts_with("# Tailored Resume: Senior Go Developer at Acme\n"));
        assert!(report.contains("**Match Score**: 81%"));
        assert!(report.contains("- Moved distributed systems work to the top\n"));
        assert!(report.contains("- Quantified throughput gains\n"));
        assert!(report.contains("# Jane Doe\n\nSenior Go Developer\n\n---"));
        assert!(report.contains("*Generated: 2024-03-09 14:05:00*"));
    }

    #[test]
    fn test_render_report_without_changes_or_label() {
        let mut result = sample_result();
        result.key_changes.clear();

        let report = render_report(&result, &JobInput::new("text"), fixed_time());
        assert!(report.starts_with("# Tailored Resume\n"));
        assert!(!report.contains("## Key Changes"));
    }

    #[test]
    fn test_default_report_path() {
        let path = default_report_path(Path::new("/tmp"), fixed_time());
        assert_eq!(path, PathBuf::from("/tmp/tailored-resume-20240309-140500.md"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        write_report(&path, &sample_result(), &JobInput::new("text")).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("**Match Score**: 81%"));
        assert!(written.contains("# Jane Doe"));
    }
}
