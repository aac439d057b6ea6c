//! Plain-text rendering of reports, plans and batch results.
//!
//! The dashboard widgets and the non-interactive CLI subcommands share these
//! so both surfaces say the same thing.

use std::fmt::Write;

use ycd_plans::{
    BatchCellView, BatchJobItem, BatchSummary, CellLimits, Limit, Plan, PlanCatalog, PlanTier,
    ResourceKind, UsageReport, truncate_text,
};

/// Placeholder shown for an empty cell.
pub use ycd_plans::batch::PLACEHOLDER;

/// Headline for the banner, e.g. "Pro plan".
///
/// Unknown tiers are labelled with the free plan name and flagged.
pub fn banner_headline(report: &UsageReport) -> String {
    if report.tier.is_known() {
        format!("{} plan", report.plan_name)
    } else {
        format!(
            "{} plan (unrecognised tier '{}')",
            report.plan_name,
            report.tier.as_str()
        )
    }
}

/// Warning about exhausted or nearly exhausted resources, if any.
pub fn limit_warning(report: &UsageReport) -> Option<String> {
    let exhausted: Vec<&str> = report
        .resources
        .iter()
        .filter(|r| r.exhausted)
        .map(|r| r.kind.display_name())
        .collect();
    let nearing: Vec<String> = report
        .nearing()
        .filter(|r| !r.exhausted)
        .map(|r| format!("{} ({} left)", r.kind.display_name(), r.remaining))
        .collect();

    let mut parts = Vec::new();
    if !exhausted.is_empty() {
        parts.push(format!("Limit reached: {}", exhausted.join(", ")));
    }
    if !nearing.is_empty() {
        parts.push(format!("Nearing limit: {}", nearing.join(", ")));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Upgrade call to action, when the report warrants one.
pub fn upgrade_hint(report: &UsageReport, catalog: &PlanCatalog) -> Option<String> {
    if !report.should_prompt_upgrade() {
        return None;
    }
    let target = report.display_tier().upgrade_target()?;
    let plan = catalog.plan(target);
    Some(format!("Upgrade to {} ({})", plan.name, plan.price_label()))
}

/// Expiry line, e.g. "Expires in 5 days (2026-10-22)".
pub fn expiry_line(report: &UsageReport) -> Option<String> {
    report
        .expiry
        .map(|expiry| format!("{} ({})", expiry.label(), expiry.date.format("%Y-%m-%d")))
}

/// "Unlimited" or "N left".
pub fn remaining_label(remaining: Limit) -> String {
    match remaining {
        Limit::Unlimited => "Unlimited".to_string(),
        Limit::Finite(n) => format!("{} left", n),
    }
}

/// Multi-line summary of a usage report.
pub fn format_subscription_summary(report: &UsageReport, catalog: &PlanCatalog) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{}", banner_headline(report));
    let _ = writeln!(output, "{}", "─".repeat(44));

    for row in &report.resources {
        let _ = writeln!(
            output,
            "{:<22} {:>9} {:>4}%  {}",
            row.kind.display_name(),
            row.usage_label(),
            row.percent,
            remaining_label(row.remaining),
        );
    }

    if let Some(line) = expiry_line(report) {
        let _ = writeln!(output, "\n{}", line);
    }
    if let Some(warning) = limit_warning(report) {
        let _ = writeln!(output, "⚠ {}", warning);
    }
    if let Some(hint) = upgrade_hint(report, catalog) {
        let _ = writeln!(output, "→ {}", hint);
    }

    output
}

/// Limit line for a plan resource, e.g. "Clean Transcripts: 100".
pub fn plan_limit_line(plan: &Plan, kind: ResourceKind) -> String {
    format!("{}: {}", kind.display_name(), plan.limit(kind))
}

/// Multi-line description of one plan.
pub fn format_plan(plan: &Plan, current: bool) -> String {
    let mut output = String::new();

    let mut heading = format!("{} · {}", plan.name, plan.price_label());
    if plan.popular {
        heading.push_str("  ★ Most popular");
    }
    if current {
        heading.push_str("  ✓ Current plan");
    }
    let _ = writeln!(output, "{}", heading);

    for kind in ResourceKind::ALL {
        let _ = writeln!(output, "  {}", plan_limit_line(plan, kind));
    }
    for feature in &plan.features {
        let _ = writeln!(output, "  • {}", feature);
    }

    output
}

/// All plans, free to premium, separated by blank lines.
pub fn format_plan_comparison(catalog: &PlanCatalog, current: Option<PlanTier>) -> String {
    catalog
        .plans()
        .iter()
        .map(|plan| format_plan(plan, current == Some(plan.tier)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-line text for a batch result cell.
pub fn format_batch_cell(view: &BatchCellView) -> String {
    match view {
        BatchCellView::Status {
            icon,
            label,
            message,
            ..
        } => match message {
            Some(message) => format!("{} {} · {}", icon, label, message),
            None => format!("{} {}", icon, label),
        },
        BatchCellView::Completed {
            links,
            file_size,
            title,
        } => {
            let mut parts: Vec<String> = links
                .iter()
                .map(|link| format!("[{}]", link.kind.label()))
                .collect();
            if let Some(size) = file_size {
                parts.push(size.clone());
            }
            if let Some(title) = title {
                parts.push(title.clone());
            }
            parts.join(" ")
        }
        BatchCellView::Failed { message, retryable } => {
            let mut line = match message {
                Some(message) => format!("✖ Failed: {}", message),
                None => "✖ Failed".to_string(),
            };
            if *retryable {
                line.push_str(" [Retry]");
            }
            line
        }
        BatchCellView::Placeholder => PLACEHOLDER.to_string(),
    }
}

/// Label identifying a batch item: title, then video id, then URL.
pub fn batch_item_label(item: &BatchJobItem, max_len: usize) -> String {
    let label = [&item.video_title, &item.video_id, &item.url]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .find(|s| !s.trim().is_empty())
        .unwrap_or(PLACEHOLDER);
    truncate_text(label, max_len)
}

/// Title-line summary of a batch, e.g. "3/6 done, 1 failed".
pub fn batch_summary_line(summary: &BatchSummary) -> String {
    let done = summary.completed + summary.failed;
    let mut line = format!("{}/{} done", done, summary.total);
    if summary.failed > 0 {
        let _ = write!(line, ", {} failed", summary.failed);
    }
    if summary.processing > 0 {
        let _ = write!(line, ", {} processing", summary.processing);
    }
    line
}

/// One line per item, with a summary header.
pub fn format_batch_report(items: &[BatchJobItem], limits: CellLimits) -> String {
    let mut output = String::new();
    let summary = BatchSummary::from_items(items);

    let _ = writeln!(output, "Batch: {}", batch_summary_line(&summary));
    let _ = writeln!(output, "{}", "─".repeat(44));

    for item in items {
        let view = BatchCellView::project(item, limits);
        let _ = writeln!(
            output,
            "{:<24} {}",
            batch_item_label(item, 24),
            format_batch_cell(&view)
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ycd_plans::{BatchStatus, LinkKind, SubscriptionStatus, UsageEvaluator};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn report(status: SubscriptionStatus) -> UsageReport {
        UsageEvaluator::default().evaluate(&status, today())
    }

    #[test]
    fn test_banner_headline_flags_unknown_tier() {
        let known = report(SubscriptionStatus::new(PlanTier::Pro));
        assert_eq!(banner_headline(&known), "Pro plan");

        let unknown = report(SubscriptionStatus::new("gold"));
        assert_eq!(
            banner_headline(&unknown),
            "Free plan (unrecognised tier 'gold')"
        );
    }

    #[test]
    fn test_limit_warning() {
        let healthy = report(SubscriptionStatus::new(PlanTier::Pro).with_usage(
            ResourceKind::CleanTranscripts,
            10,
            Limit::Finite(100),
        ));
        assert_eq!(limit_warning(&healthy), None);

        let tight = report(
            SubscriptionStatus::new(PlanTier::Free)
                .with_usage(ResourceKind::CleanTranscripts, 4, Limit::Finite(5))
                .with_usage(ResourceKind::VideoDownloads, 1, Limit::Finite(1)),
        );
        assert_eq!(
            limit_warning(&tight).as_deref(),
            Some("Limit reached: Video Downloads; Nearing limit: Clean Transcripts (1 left)")
        );
    }

    #[test]
    fn test_upgrade_hint() {
        let catalog = PlanCatalog::builtin();
        let free = report(SubscriptionStatus::new(PlanTier::Free));
        assert_eq!(
            upgrade_hint(&free, &catalog).as_deref(),
            Some("Upgrade to Pro ($9.99/mo)")
        );

        let premium = report(SubscriptionStatus::new(PlanTier::Premium));
        assert_eq!(upgrade_hint(&premium, &catalog), None);
    }

    #[test]
    fn test_summary_contains_rows_and_expiry() {
        let catalog = PlanCatalog::builtin();
        let status = SubscriptionStatus::new(PlanTier::Pro)
            .with_usage(ResourceKind::AudioDownloads, 12, Limit::Finite(50))
            .with_expiry(NaiveDate::from_ymd_opt(2026, 10, 22).unwrap());
        let text = format_subscription_summary(&report(status), &catalog);

        assert!(text.starts_with("Pro plan\n"));
        assert!(text.contains("Audio Downloads"));
        assert!(text.contains("12/50"));
        assert!(text.contains("38 left"));
        assert!(text.contains("Expires in 5 days (2026-10-22)"));
    }

    #[test]
    fn test_plan_comparison_marks_current() {
        let text = format_plan_comparison(&PlanCatalog::builtin(), Some(PlanTier::Pro));
        assert!(text.contains("Pro · $9.99/mo  ★ Most popular  ✓ Current plan"));
        assert!(text.contains("Clean Transcripts: Unlimited"));
        assert_eq!(text.matches("✓ Current plan").count(), 1);
    }

    #[test]
    fn test_batch_cell_text() {
        let limits = CellLimits::default();
        let queued = BatchJobItem::new(BatchStatus::Queued);
        assert_eq!(
            format_batch_cell(&BatchCellView::project(&queued, limits)),
            "⏳ Queued"
        );

        let done = BatchJobItem::new(BatchStatus::Completed)
            .with_link(LinkKind::Audio, "https://cdn/a.mp3")
            .with_file(2 * 1024 * 1024, "Talk");
        assert_eq!(
            format_batch_cell(&BatchCellView::project(&done, limits)),
            "[Audio] 2.0MB Talk"
        );

        let failed = BatchJobItem::new(BatchStatus::Failed).with_message("Private video");
        assert_eq!(
            format_batch_cell(&BatchCellView::project(&failed, limits)),
            "✖ Failed: Private video [Retry]"
        );

        let odd = BatchJobItem::new(BatchStatus::parse("paused"));
        assert_eq!(format_batch_cell(&BatchCellView::project(&odd, limits)), "—");
    }

    #[test]
    fn test_batch_item_label_fallbacks() {
        let mut item = BatchJobItem::new(BatchStatus::Queued);
        assert_eq!(batch_item_label(&item, 10), "—");
        item.url = Some("https://youtube.com/watch?v=abc".into());
        assert_eq!(batch_item_label(&item, 10), "https:/...");
        item.video_id = Some("abc".into());
        assert_eq!(batch_item_label(&item, 10), "abc");
    }

    #[test]
    fn test_batch_summary_line() {
        let items = vec![
            BatchJobItem::new(BatchStatus::Completed),
            BatchJobItem::new(BatchStatus::Failed),
            BatchJobItem::new(BatchStatus::Processing),
        ];
        let summary = BatchSummary::from_items(&items);
        assert_eq!(batch_summary_line(&summary), "2/3 done, 1 failed, 1 processing");
    }
}
