//! Per-family result rules: what a valid result looks like and how severe it is.

use crate::models::{LabError, LabResult, LabTestKind, ResultStatus};

const MIN_REPORT_CHARS: usize = 10;

const IMAGING_CRITICAL: &[&str] = &[
    "hemorrhage",
    "mass effect",
    "pulmonary embolism",
    "pneumothorax",
    "rupture",
];
const IMAGING_BORDERLINE: &[&str] = &["suspicious", "mild", "borderline"];

const BIOPSY_CRITICAL: &[&str] = &["carcinoma", "malignant", "lymphoma", "melanoma"];
const BIOPSY_BORDERLINE: &[&str] = &["atypia", "dysplasia", "suspicious"];

pub fn validate_order(kind: &LabTestKind) -> Result<(), LabError> {
    let missing = match kind {
        LabTestKind::Blood {
            panel,
            analyte,
            reference,
            ..
        } => {
            if reference.low > reference.high {
                return Err(LabError::ValidationError(format!(
                    "reference range is inverted: {}",
                    reference
                )));
            }
            [("panel", panel), ("analyte", analyte), ("unit", &reference.unit)]
                .into_iter()
                .find(|(_, value)| value.trim().is_empty())
        }
        LabTestKind::Imaging {
            modality,
            body_part,
            ..
        } => [("modality", modality), ("body_part", body_part)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty()),
        LabTestKind::Biopsy {
            specimen_site,
            specimen_type,
        } => [("specimen_site", specimen_site), ("specimen_type", specimen_type)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty()),
    };

    match missing {
        Some((field, _)) => Err(LabError::ValidationError(format!("{} must not be empty", field))),
        None => Ok(()),
    }
}

pub fn validate_result(kind: &LabTestKind, result: &LabResult) -> Result<(), LabError> {
    match (kind, result) {
        (LabTestKind::Blood { reference, .. }, LabResult::Numeric { value, unit }) => {
            if unit.trim() != reference.unit {
                return Err(LabError::ValidationError(format!(
                    "unit mismatch: expected {}, got {}",
                    reference.unit, unit
                )));
            }
            if *value < 0.0 || !value.is_finite() {
                return Err(LabError::ValidationError(format!(
                    "result value must be a non-negative number, got {}",
                    value
                )));
            }
            Ok(())
        }
        (LabTestKind::Blood { .. }, LabResult::Report(_)) => Err(LabError::ValidationError(
            "blood tests take a numeric result".to_string(),
        )),
        (_, LabResult::Report(text)) => {
            if text.trim().chars().count() < MIN_REPORT_CHARS {
                return Err(LabError::ValidationError("report text is too short".to_string()));
            }
            Ok(())
        }
        (_, LabResult::Numeric { .. }) => Err(LabError::ValidationError(format!(
            "{} tests take a written report",
            kind.family()
        ))),
    }
}

/// Classify an already validated result.
///
/// Blood values outside the reference range are Borderline while their
/// relative distance from the nearest bound is at most `tolerance`.
pub fn evaluate(kind: &LabTestKind, result: &LabResult, tolerance: f64) -> ResultStatus {
    match (kind, result) {
        (LabTestKind::Blood { reference, .. }, LabResult::Numeric { value, .. }) => {
            if reference.contains(*value) {
                return ResultStatus::Normal;
            }
            let delta = if *value < reference.low {
                (reference.low - value) / reference.low.max(f64::EPSILON)
            } else {
                (value - reference.high) / reference.high.max(f64::EPSILON)
            };
            if delta <= tolerance {
                ResultStatus::Borderline
            } else {
                ResultStatus::Critical
            }
        }
        (LabTestKind::Imaging { .. }, LabResult::Report(text)) => {
            classify_text(text, IMAGING_CRITICAL, IMAGING_BORDERLINE)
        }
        (LabTestKind::Biopsy { .. }, LabResult::Report(text)) => {
            classify_text(text, BIOPSY_CRITICAL, BIOPSY_BORDERLINE)
        }
        _ => ResultStatus::Unknown,
    }
}

fn classify_text(text: &str, critical: &[&str], borderline: &[&str]) -> ResultStatus {
    let text = text.to_lowercase();
    if critical.iter().any(|keyword| text.contains(keyword)) {
        ResultStatus::Critical
    } else if borderline.iter().any(|keyword| text.contains(keyword)) {
        ResultStatus::Borderline
    } else {
        ResultStatus::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceRange;
    use assert_matches::assert_matches;

    fn glucose() -> LabTestKind {
        LabTestKind::Blood {
            panel: "BIOCHEM".to_string(),
            analyte: "Glucose".to_string(),
            reference: ReferenceRange::new(70.0, 110.0, "mg/dL"),
            fasting_required: true,
        }
    }

    fn chest_xray() -> LabTestKind {
        LabTestKind::Imaging {
            modality: "XRAY".to_string(),
            body_part: "Chest".to_string(),
            contrast_used: false,
        }
    }

    fn skin_biopsy() -> LabTestKind {
        LabTestKind::Biopsy {
            specimen_site: "Skin".to_string(),
            specimen_type: "PUNCH".to_string(),
        }
    }

    #[test]
    fn blood_values_are_graded_against_the_range() {
        let kind = glucose();
        let grade = |value| evaluate(&kind, &LabResult::numeric(value, "mg/dL"), 0.10);

        assert_eq!(grade(95.0), ResultStatus::Normal);
        assert_eq!(grade(118.0), ResultStatus::Borderline);
        assert_eq!(grade(125.0), ResultStatus::Critical);
        assert_eq!(grade(65.0), ResultStatus::Borderline);
        assert_eq!(grade(40.0), ResultStatus::Critical);
    }

    #[test]
    fn report_keywords_drive_imaging_and_biopsy_grades() {
        let xray = chest_xray();
        assert_eq!(
            evaluate(&xray, &LabResult::report("Right sided PNEUMOTHORAX noted"), 0.1),
            ResultStatus::Critical
        );
        assert_eq!(
            evaluate(&xray, &LabResult::report("Mild interstitial changes"), 0.1),
            ResultStatus::Borderline
        );
        assert_eq!(
            evaluate(&xray, &LabResult::report("No acute findings seen"), 0.1),
            ResultStatus::Normal
        );

        let biopsy = skin_biopsy();
        assert_eq!(
            evaluate(&biopsy, &LabResult::report("Superficial spreading melanoma"), 0.1),
            ResultStatus::Critical
        );
        assert_eq!(
            evaluate(&biopsy, &LabResult::report("Low grade dysplasia present"), 0.1),
            ResultStatus::Borderline
        );
    }

    #[test]
    fn results_must_fit_the_test_family() {
        assert!(validate_result(&glucose(), &LabResult::numeric(90.0, "mg/dL")).is_ok());
        assert_matches!(
            validate_result(&glucose(), &LabResult::numeric(90.0, "mmol/L")),
            Err(LabError::ValidationError(_))
        );
        assert_matches!(
            validate_result(&glucose(), &LabResult::numeric(-1.0, "mg/dL")),
            Err(LabError::ValidationError(_))
        );
        assert_matches!(
            validate_result(&chest_xray(), &LabResult::report("short")),
            Err(LabError::ValidationError(_))
        );
        assert_matches!(
            validate_result(&skin_biopsy(), &LabResult::numeric(1.0, "mm")),
            Err(LabError::ValidationError(_))
        );
    }

    #[test]
    fn orders_need_their_descriptive_fields() {
        assert!(validate_order(&glucose()).is_ok());
        assert_matches!(
            validate_order(&LabTestKind::Imaging {
                modality: " ".to_string(),
                body_part: "Chest".to_string(),
                contrast_used: false,
            }),
            Err(LabError::ValidationError(msg)) if msg.contains("modality")
        );
        assert_matches!(
            validate_order(&LabTestKind::Blood {
                panel: "BIOCHEM".to_string(),
                analyte: "Glucose".to_string(),
                reference: ReferenceRange::new(110.0, 70.0, "mg/dL"),
                fasting_required: false,
            }),
            Err(LabError::ValidationError(_))
        );
    }
}
