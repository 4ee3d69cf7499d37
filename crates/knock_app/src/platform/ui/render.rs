use knock_core::{AppViewModel, JobView, Notice, NoticeLevel, PendingRequest};

const BAR_WIDTH: usize = 30;

pub fn render(view: &AppViewModel) -> String {
    let mut lines = Vec::new();

    match &view.job {
        Some(job) => render_job(job, &mut lines),
        None => render_start_form(view, &mut lines),
    }

    if let Some(pending) = view.pending {
        lines.push(format!("  ... {}", pending_label(pending)));
    }
    lines.join("\n")
}

fn render_start_form(view: &AppViewModel, lines: &mut Vec<String>) {
    lines.push("No active job.".to_string());
    if view.resumes.is_empty() {
        lines.push("  No resume links yet.".to_string());
    }
    for resume in &view.resumes {
        let marker = if view.active_resume.as_deref() == Some(resume.id.as_str()) {
            '*'
        } else {
            ' '
        };
        lines.push(format!("  {marker} {} {}", resume.id, resume.shared_url));
    }
    if view.can_start {
        lines.push("  [start]".to_string());
    }
}

fn render_job(job: &JobView, lines: &mut Vec<String>) {
    let live = if job.live { " (live)" } else { "" };
    lines.push(format!("Job {} {}{}", job.short_id, job.status.label(), live));
    lines.push(format!(
        "  {} {}%  {} / {}",
        progress_bar(job.progress),
        job.progress,
        job.processed,
        job.total
    ));
    lines.push(format!(
        "  sent {}  failed {}",
        job.sent_count, job.failed_count
    ));
    if let Some(reason) = &job.pause_reason {
        lines.push(format!("  paused: {reason}"));
    }
    lines.push(format!(
        "  started {}",
        job.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(completed_at) = job.completed_at {
        lines.push(format!(
            "  completed {}",
            completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if !job.actions.is_empty() {
        let actions: Vec<String> = job
            .actions
            .iter()
            .map(|action| format!("[{}]", action.label()))
            .collect();
        lines.push(format!("  {}", actions.join(" ")));
    }
}

fn pending_label(pending: PendingRequest) -> String {
    match pending {
        PendingRequest::Start => "starting".to_string(),
        PendingRequest::Action(action) => format!("{action} in progress"),
        PendingRequest::Refresh => "refreshing".to_string(),
    }
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use knock_core::{Job, JobStatus, ResumeChoice};

    fn job(status: JobStatus, sent: u64, failed: u64) -> Job {
        Job {
            id: "0123456789abcdef".into(),
            user_id: None,
            status,
            total: 10,
            sent_count: sent,
            failed_count: failed,
            started_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            completed_at: None,
            pause_reason: None,
        }
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert!(progress_bar(50).starts_with(&format!("[{}-", "#".repeat(15))));
    }

    #[test]
    fn paused_job_lists_reason_and_actions() {
        let mut paused = job(JobStatus::Paused, 3, 2);
        paused.pause_reason = Some("Gmail quota reached".into());
        let view = AppViewModel {
            job: Some(JobView::from_job(&paused, false)),
            resumes: Vec::new(),
            active_resume: None,
            can_start: false,
            pending: None,
            dirty: true,
        };

        let text = render(&view);
        assert!(text.contains("Job 01234567… PAUSED"));
        assert!(text.contains("50%  5 / 10"));
        assert!(text.contains("paused: Gmail quota reached"));
        assert!(text.contains("[Resume] [Retry Failed]"));
    }

    #[test]
    fn start_form_marks_active_resume() {
        let view = AppViewModel {
            job: None,
            resumes: vec![
                ResumeChoice {
                    id: "r1".into(),
                    shared_url: "https://drive.example/r1".into(),
                },
                ResumeChoice {
                    id: "r2".into(),
                    shared_url: "https://drive.example/r2".into(),
                },
            ],
            active_resume: Some("r2".into()),
            can_start: true,
            pending: Some(PendingRequest::Start),
            dirty: true,
        };

        let text = render(&view);
        assert!(text.contains("  * r2 https://drive.example/r2"));
        assert!(text.contains("    r1 https://drive.example/r1"));
        assert!(text.contains("... starting"));
    }

    #[test]
    fn notice_carries_level_tag() {
        let notice = Notice::new(NoticeLevel::Success, "Job paused");
        assert_eq!(render_notice(&notice), "[ok] Job paused");
    }
}
