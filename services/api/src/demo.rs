use crate::infra::{
    demo_admin, demo_dataset, load_csv_into, load_imported, moderation_stack, ModerationStack,
};
use clap::Args;
use elecmate::config::AppConfig;
use elecmate::error::AppError;
use elecmate::workflows::pricing::{
    format_gbp, format_percent, ModerationActionKind, ModerationViewState, PriceVerdict,
    RejectionReason, ReviewedSubmission, StatusFilter, ViewEvent,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ReviewArgs {
    /// Submissions CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Status tab to list (pending, approved, rejected, flagged, all)
    #[arg(long, value_parser = crate::infra::parse_status_filter, default_value = "pending")]
    pub(crate) status: StatusFilter,
    /// Case-insensitive match on job type, postcode, submitter, or description
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Maximum rows to print (capped at the configured list limit)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct AveragesArgs {
    /// Submissions CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Free text attached to the rejection alongside the "other" reason.
    #[arg(long)]
    pub(crate) other_text: Option<String>,
    /// Stop after approve and flag; leave the junk submission in place.
    #[arg(long)]
    pub(crate) skip_reject: bool,
}

fn configured_stack() -> Result<ModerationStack, AppError> {
    let config = AppConfig::load()?;
    Ok(moderation_stack(
        config.moderation.policy,
        config.moderation.list_limit,
    ))
}

pub(crate) fn run_review(args: ReviewArgs) -> Result<(), AppError> {
    let ReviewArgs {
        csv,
        status,
        search,
        limit,
    } = args;

    let stack = configured_stack()?;
    let loaded = load_csv_into(&stack, &csv)?;

    let mut view = ModerationViewState::default();
    view.apply(ViewEvent::TabSelected(status));
    if let Some(search) = search {
        view.apply(ViewEvent::SearchChanged(search));
    }
    let cap = stack.service.list_limit();
    let query = view.query(limit.unwrap_or(cap).min(cap));
    let rows = stack.service.review(&query)?;

    println!(
        "Pricing review: {} of {} submissions ({:?} tab)",
        rows.len(),
        loaded,
        query.status
    );
    if rows.is_empty() {
        println!("- nothing to review");
    }
    for row in &rows {
        render_row(row);
    }
    Ok(())
}

pub(crate) fn run_averages(args: AveragesArgs) -> Result<(), AppError> {
    let stack = configured_stack()?;
    load_csv_into(&stack, &args.csv)?;
    render_averages(&stack)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        other_text,
        skip_reject,
    } = args;

    let stack = configured_stack()?;
    let loaded = load_imported(&stack, &demo_dataset())?;
    let admin = demo_admin();

    println!("Pricing moderation demo ({loaded} synthetic submissions)");
    render_averages(&stack)?;

    let mut view = ModerationViewState::default();
    let queue = stack
        .service
        .review(&view.query(stack.service.list_limit()))?;
    println!("\nPending queue");
    for row in &queue {
        render_row(row);
    }

    // One row per action, picked from the pending queue by verdict.
    let within_range = queue
        .iter()
        .find(|row| matches!(row.verdict, PriceVerdict::WithinRange { .. }));
    let outlier = queue
        .iter()
        .filter(|row| row.verdict.is_suspicious())
        .max_by(|a, b| deviation(&a.verdict).total_cmp(&deviation(&b.verdict)));
    let junk = queue
        .iter()
        .find(|row| row.listing.submission.actual_price < 10.0);

    println!("\nModeration actions");
    if let Some(row) = within_range {
        let id = row.listing.submission.id;
        view.apply(ViewEvent::SubmissionOpened(id));
        view.apply(ViewEvent::ActionStarted(ModerationActionKind::Approve));
        match stack.service.approve(&id, admin) {
            Ok(updated) => {
                view.apply(ViewEvent::ActionSucceeded);
                println!(
                    "- approved {} {} -> {}",
                    updated.job_type,
                    format_gbp(updated.actual_price),
                    updated.status_label()
                );
            }
            Err(err) => {
                view.apply(ViewEvent::ActionFailed);
                println!("- approve failed: {err}");
            }
        }
    }

    if let Some(row) = outlier {
        let id = row.listing.submission.id;
        view.apply(ViewEvent::SubmissionOpened(id));
        view.apply(ViewEvent::ActionStarted(ModerationActionKind::Flag));
        match stack.service.flag(&id, admin) {
            Ok(updated) => {
                view.apply(ViewEvent::ActionSucceeded);
                println!(
                    "- flagged {} {} ({})",
                    updated.job_type,
                    format_gbp(updated.actual_price),
                    row.verdict.summary()
                );
            }
            Err(err) => {
                view.apply(ViewEvent::ActionFailed);
                println!("- flag failed: {err}");
            }
        }
    }

    if let (Some(row), false) = (junk, skip_reject) {
        view.apply(ViewEvent::SubmissionOpened(row.listing.submission.id));
        view.apply(ViewEvent::RejectDialogOpened);
        view.apply(ViewEvent::ReasonToggled(RejectionReason::Spam));
        if let Some(text) = other_text {
            view.apply(ViewEvent::ReasonToggled(RejectionReason::Other));
            view.apply(ViewEvent::OtherTextChanged(text));
        }

        if let Some((id, request)) = view.rejection_request() {
            view.apply(ViewEvent::ActionStarted(ModerationActionKind::Reject));
            match stack.service.reject(&id, admin, &request) {
                Ok(entry) => {
                    view.apply(ViewEvent::ActionSucceeded);
                    let reasons: Vec<&str> =
                        request.reasons.iter().map(|reason| reason.label()).collect();
                    println!(
                        "- rejected {} {} ({}); audit entry {}",
                        row.listing.submission.job_type,
                        row.price_label,
                        reasons.join(", "),
                        entry.id
                    );
                }
                Err(err) => {
                    view.apply(ViewEvent::ActionFailed);
                    println!("- reject failed: {err}");
                }
            }
        }
    }

    let stats = stack.service.stats()?;
    println!(
        "\nQueue after review: {} pending | {} approved | {} flagged | {} total",
        stats.pending, stats.approved, stats.flagged, stats.total
    );

    println!("Audit trail");
    for entry in stack.audit.entries() {
        let details = entry
            .details
            .as_ref()
            .map(|details| format!(" {details}"))
            .unwrap_or_default();
        println!(
            "  - {} {} {} by {}{}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.action.tag(),
            entry.target_id,
            entry.actor_id,
            details
        );
    }

    Ok(())
}

fn render_averages(stack: &ModerationStack) -> Result<(), AppError> {
    let aggregates = stack.service.averages()?;
    let minimum = stack.service.policy().minimum_samples;
    println!("Approved price averages");
    if aggregates.is_empty() {
        println!("- no approved submissions yet");
    }
    for view in aggregates.views() {
        let note = if view.sample_count < minimum {
            " (below sample minimum)"
        } else {
            ""
        };
        println!(
            "- {}: {} across {} samples{}",
            view.job_type,
            format_gbp(view.average),
            view.sample_count,
            note
        );
    }
    Ok(())
}

fn render_row(row: &ReviewedSubmission) {
    let submission = &row.listing.submission;
    let postcode = submission.postcode_district.as_deref().unwrap_or("-");
    let submitter = row.listing.submitter_name.as_deref().unwrap_or("unknown");
    let spread = match &row.verdict {
        PriceVerdict::Undetermined { .. } => String::new(),
        verdict => format!(" [{}]", format_percent(deviation(verdict))),
    };
    println!(
        "- {} | {} | {} | {} | {} | {}{}",
        submission.created_at.format("%Y-%m-%d"),
        submission.job_type,
        postcode,
        row.price_label,
        submitter,
        row.verdict.summary(),
        spread
    );
}

fn deviation(verdict: &PriceVerdict) -> f64 {
    match verdict {
        PriceVerdict::Undetermined { .. } => 0.0,
        PriceVerdict::WithinRange { deviation, .. } | PriceVerdict::Suspicious { deviation, .. } => {
            *deviation
        }
    }
}
