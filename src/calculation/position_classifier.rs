//! Position classification functionality.
//!
//! This module resolves an employee's declared category and free-text job
//! title to a bucket of the configured catalog, which in turn determines the
//! rules that apply and how the employee is paid.
//!
//! Classification never fails: a title that matches no pattern resolves to
//! the category's default bucket.

use crate::config::{BucketCatalog, IncentiveConfig, RuleCatalog, normalize_title};
use crate::models::{
    AuditStep, AuditWarning, EmployeeCategory, EmployeeRecord, PositionProfile,
    WARN_DEFAULT_BUCKET_FALLBACK, WARN_RECLASSIFIED, WarningSeverity,
};

/// The result of classifying an employee, including the audit step.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// The resolved profile.
    pub profile: PositionProfile,
    /// The audit step recording the classification.
    pub audit_step: AuditStep,
    /// Low-confidence and reclassification notices.
    pub warnings: Vec<AuditWarning>,
}

/// Resolves a category and job title to a [`PositionProfile`].
///
/// Reclassification overrides for the declared category are applied first.
/// Then the buckets of the effective category are tried in order and the
/// first bucket with a matching pattern wins; if none match, the category's
/// default bucket is used.
///
/// # Examples
///
/// ```no_run
/// use incentive_engine::calculation::classify;
/// use incentive_engine::config::ConfigLoader;
/// use incentive_engine::models::EmployeeCategory;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let config = loader.config();
///
/// let profile = classify(
///     EmployeeCategory::PositionDependent,
///     "SENIOR GROUP LEADER - LINE A",
///     config.buckets(),
///     config.rules(),
/// );
/// assert_eq!(profile.resolved_bucket, "line_leader");
/// assert!(!profile.default_fallback);
/// ```
pub fn classify(
    category: EmployeeCategory,
    job_title: &str,
    buckets: &BucketCatalog,
    rules: &RuleCatalog,
) -> PositionProfile {
    let normalized = normalize_title(job_title);

    let effective_category = buckets
        .reclassifications
        .iter()
        .find(|r| {
            r.from_category == category && r.title_patterns.iter().any(|p| p.matches(&normalized))
        })
        .map(|r| r.to_category)
        .unwrap_or(category);

    let group = buckets.for_category(effective_category);
    let (bucket, default_fallback) = match group.buckets.iter().find(|b| b.matches(&normalized)) {
        Some(bucket) => (bucket, false),
        None => (&group.default, true),
    };

    let all_rules = rules.ids();
    let applicable_rule_ids = bucket
        .applicable_rules
        .intersection(&all_rules)
        .copied()
        .collect();
    let excluded_rule_ids = all_rules
        .difference(&bucket.applicable_rules)
        .copied()
        .collect();

    PositionProfile {
        employee_category: effective_category,
        job_title: job_title.to_string(),
        resolved_bucket: bucket.id.clone(),
        applicable_rule_ids,
        excluded_rule_ids,
        payout_mode: bucket.payout.clone(),
        default_fallback,
        reclassified_from: (effective_category != category).then_some(category),
    }
}

/// Classifies an employee record and records the decision for the audit trail.
pub fn classify_employee(
    record: &EmployeeRecord,
    config: &IncentiveConfig,
    step_number: u32,
) -> ClassificationResult {
    let profile = classify(
        record.category,
        &record.job_title,
        config.buckets(),
        config.rules(),
    );

    let mut warnings = Vec::new();
    if let Some(declared) = profile.reclassified_from {
        warnings.push(AuditWarning::new(
            &record.employee_id,
            WARN_RECLASSIFIED,
            format!(
                "Title '{}' reclassified from '{}' to '{}'",
                record.job_title,
                declared.as_str(),
                profile.employee_category.as_str()
            ),
            WarningSeverity::Low,
        ));
    }
    if profile.default_fallback {
        warnings.push(AuditWarning::new(
            &record.employee_id,
            WARN_DEFAULT_BUCKET_FALLBACK,
            format!(
                "Title '{}' matched no '{}' bucket; default rules applied",
                record.job_title,
                profile.employee_category.as_str()
            ),
            WarningSeverity::Low,
        ));
    }

    let applicable: Vec<u8> = profile.applicable_rule_ids.iter().map(|id| id.get()).collect();
    let excluded: Vec<u8> = profile.excluded_rule_ids.iter().map(|id| id.get()).collect();

    let reasoning = if profile.default_fallback {
        format!(
            "No pattern matched '{}'; using '{}' default bucket with rules {:?}",
            record.job_title,
            profile.employee_category.as_str(),
            applicable
        )
    } else {
        format!(
            "Title '{}' matched bucket '{}'; rules {:?} apply",
            record.job_title, profile.resolved_bucket, applicable
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "position_classification".to_string(),
        rule_name: "Position Classification".to_string(),
        input: serde_json::json!({
            "employee_id": record.employee_id,
            "category": record.category,
            "job_title": record.job_title
        }),
        output: serde_json::json!({
            "category": profile.employee_category,
            "bucket": profile.resolved_bucket,
            "applicable_rules": applicable,
            "excluded_rules": excluded,
            "default_fallback": profile.default_fallback,
            "reclassified": profile.reclassified_from.is_some()
        }),
        reasoning,
    };

    ClassificationResult {
        profile,
        audit_step,
        warnings,
    }
}
