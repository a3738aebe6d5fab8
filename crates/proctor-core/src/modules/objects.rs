//! Phone and book presence from injected object detections.

use tracing::{debug, warn};

use crate::domain::{Frame, ObjectDetection, Severity, Violation, ViolationType};

/// Configuration for object presence filtering.
#[derive(Debug, Clone)]
pub struct ObjectConfig {
    /// Detections below this confidence are ignored.
    pub min_confidence: f32,
    /// Labels treated as a phone (case-insensitive).
    pub phone_labels: Vec<String>,
    /// Labels treated as a book (case-insensitive).
    pub book_labels: Vec<String>,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.45,
            phone_labels: ["cell phone", "phone", "mobile", "mobile phone"]
                .into_iter()
                .map(String::from)
                .collect(),
            book_labels: vec![String::from("book")],
        }
    }
}

/// Prohibited objects found in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectFindings {
    /// Highest-confidence phone detection.
    pub phone: Option<ObjectDetection>,
    /// Highest-confidence book detection.
    pub book: Option<ObjectDetection>,
}

impl ObjectFindings {
    /// At most one violation per object class.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if let Some(phone) = &self.phone {
            violations.push(
                Violation::new(
                    ViolationType::PhoneDetected,
                    Severity::High,
                    "Mobile phone detected",
                )
                .with_confidence(f64::from(phone.confidence)),
            );
        }
        if let Some(book) = &self.book {
            violations.push(
                Violation::new(ViolationType::BookDetected, Severity::Medium, "Book detected")
                    .with_confidence(f64::from(book.confidence)),
            );
        }
        violations
    }

    /// Detections to draw on evidence.
    #[must_use]
    pub fn detections(&self) -> Vec<&ObjectDetection> {
        self.phone.iter().chain(self.book.iter()).collect()
    }
}

/// Filters object detections down to phones and books.
pub struct ObjectPresenceDetector {
    config: ObjectConfig,
}

impl ObjectPresenceDetector {
    /// Creates a new detector with the given configuration.
    #[must_use]
    pub const fn new(config: ObjectConfig) -> Self {
        Self { config }
    }

    /// Evaluates the object detector's outcome, degrading to no findings on failure.
    #[must_use]
    pub fn scan(&self, frame: &Frame, detected: anyhow::Result<Vec<ObjectDetection>>) -> ObjectFindings {
        match detected {
            Ok(detections) => self.filter(detections),
            Err(e) => {
                warn!("Object detection failed for {}: {e:#}", frame.source);
                ObjectFindings::default()
            }
        }
    }

    /// Keeps the best phone and book detection above the confidence threshold.
    #[must_use]
    pub fn filter(&self, detections: Vec<ObjectDetection>) -> ObjectFindings {
        let mut findings = ObjectFindings::default();
        for detection in detections {
            if detection.confidence < self.config.min_confidence {
                continue;
            }
            let slot = if matches_label(&self.config.phone_labels, &detection.label) {
                &mut findings.phone
            } else if matches_label(&self.config.book_labels, &detection.label) {
                &mut findings.book
            } else {
                continue;
            };
            debug!(label = %detection.label, confidence = detection.confidence, "Prohibited object");
            if slot
                .as_ref()
                .map_or(true, |best| detection.confidence > best.confidence)
            {
                *slot = Some(detection);
            }
        }
        findings
    }
}

impl Default for ObjectPresenceDetector {
    fn default() -> Self {
        Self::new(ObjectConfig::default())
    }
}

fn matches_label(labels: &[String], label: &str) -> bool {
    let label = label.trim();
    labels.iter().any(|l| l.eq_ignore_ascii_case(label))
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::NormalizedBox;

    fn det(label: &str, confidence: f32) -> ObjectDetection {
        ObjectDetection::new(label, confidence, NormalizedBox::new(0.1, 0.1, 0.2, 0.2))
    }

    #[test]
    fn test_phone_labels_case_insensitive() {
        let findings = ObjectPresenceDetector::default().filter(vec![det("Cell Phone", 0.6)]);
        assert!(findings.phone.is_some());
        assert!(findings.book.is_none());
    }

    #[test]
    fn test_below_threshold_ignored() {
        let findings = ObjectPresenceDetector::default().filter(vec![det("phone", 0.44)]);
        assert_eq!(findings, ObjectFindings::default());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let findings = ObjectPresenceDetector::default().filter(vec![det("book", 0.45)]);
        assert!(findings.book.is_some());
    }

    #[test]
    fn test_one_violation_per_class() {
        let findings = ObjectPresenceDetector::default().filter(vec![
            det("phone", 0.5),
            det("mobile", 0.9),
            det("book", 0.7),
            det("cup", 0.99),
        ]);
        let violations = findings.violations();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].violation_type, ViolationType::PhoneDetected);
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(violations[1].violation_type, ViolationType::BookDetected);
        assert_eq!(violations[1].severity, Severity::Medium);
        assert_eq!(findings.phone.map(|p| p.label), Some(String::from("mobile")));
    }

    #[test]
    fn test_failure_degrades_to_nothing() {
        let frame = Frame::new("f", DynamicImage::new_rgb8(4, 4), OffsetDateTime::UNIX_EPOCH);
        let findings =
            ObjectPresenceDetector::default().scan(&frame, Err(anyhow::anyhow!("timeout")));
        assert!(findings.violations().is_empty());
    }
}
