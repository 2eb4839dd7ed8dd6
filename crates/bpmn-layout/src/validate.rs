//! Read-only structural diagnostics over a process model.
//!
//! [`ModelValidator`] never mutates the model and never fails; each check
//! returns the list of [`ValidationWarning`]s it found. Repairs are the job
//! of [`RecoveryStrategy`](crate::recovery::RecoveryStrategy).

use std::{collections::HashSet, fmt};

use log::debug;

use bpmn_layout_core::model::{ElementCategory, Model};

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The model references data that does not exist.
    Error,
    /// The model is usable but likely not what the author meant.
    Warning,
    /// Stylistic remark.
    Info,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Identifies the check that produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    MissingStart,
    MissingEnd,
    InvalidSource,
    InvalidTarget,
    Disconnected,
    Overlap,
    MissingLabel,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingStart => "missing-start",
            Self::MissingEnd => "missing-end",
            Self::InvalidSource => "invalid-source",
            Self::InvalidTarget => "invalid-target",
            Self::Disconnected => "disconnected",
            Self::Overlap => "overlap",
            Self::MissingLabel => "missing-label",
        }
    }
}

/// A single diagnostic about the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    severity: Severity,
    code: WarningCode,
    element_id: Option<String>,
    message: String,
}

impl ValidationWarning {
    fn new(
        severity: Severity,
        code: WarningCode,
        element_id: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            element_id: element_id.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> WarningCode {
        self.code
    }

    /// Id of the element (or flow) the warning is about, if any.
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code.as_str(), self.message)
    }
}

/// Structural checks over a [`Model`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelValidator;

impl ModelValidator {
    pub fn new() -> Self {
        Self
    }

    /// Runs every check and concatenates the results.
    pub fn validate(&self, model: &Model) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        warnings.extend(self.check_start_end(model));
        warnings.extend(self.check_references(model));
        warnings.extend(self.check_connectivity(model));
        warnings.extend(self.check_overlaps(model));
        warnings.extend(self.check_labels(model));
        debug!(warnings = warnings.len(); "Model validated");
        warnings
    }

    /// Reports a missing start event and a missing end event, once each.
    pub fn check_start_end(&self, model: &Model) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        if !model.elements.iter().any(|element| element.kind.is_start()) {
            warnings.push(ValidationWarning::new(
                Severity::Warning,
                WarningCode::MissingStart,
                None,
                "process has no start event",
            ));
        }
        if !model.elements.iter().any(|element| element.kind.is_end()) {
            warnings.push(ValidationWarning::new(
                Severity::Warning,
                WarningCode::MissingEnd,
                None,
                "process has no end event",
            ));
        }
        warnings
    }

    /// Reports flows whose endpoints do not exist.
    pub fn check_references(&self, model: &Model) -> Vec<ValidationWarning> {
        let ids = model.element_ids();
        let mut warnings = Vec::new();
        for flow in &model.flows {
            if !ids.contains(flow.source.as_str()) {
                warnings.push(ValidationWarning::new(
                    Severity::Error,
                    WarningCode::InvalidSource,
                    Some(flow.id.as_str()),
                    format!("flow `{}` has invalid source `{}`", flow.id, flow.source),
                ));
            }
            if !ids.contains(flow.target.as_str()) {
                warnings.push(ValidationWarning::new(
                    Severity::Error,
                    WarningCode::InvalidTarget,
                    Some(flow.id.as_str()),
                    format!("flow `{}` has invalid target `{}`", flow.id, flow.target),
                ));
            }
        }
        warnings
    }

    /// Reports elements with no incident flow in either direction.
    pub fn check_connectivity(&self, model: &Model) -> Vec<ValidationWarning> {
        if model.elements.len() <= 1 {
            return Vec::new();
        }
        let connected: HashSet<&str> = model
            .flows
            .iter()
            .flat_map(|flow| [flow.source.as_str(), flow.target.as_str()])
            .collect();

        model
            .elements
            .iter()
            .filter(|element| !connected.contains(element.id.as_str()))
            .map(|element| {
                ValidationWarning::new(
                    Severity::Warning,
                    WarningCode::Disconnected,
                    Some(element.id.as_str()),
                    format!("element `{}` is disconnected", element.id),
                )
            })
            .collect()
    }

    /// Reports each pair of positioned elements whose boxes intersect.
    ///
    /// Boxes are compared in diagram-absolute coordinates, whatever the
    /// model's frame. Pairs that overlap by construction (a boundary event
    /// and its host, a subprocess and anything nested in it) are skipped.
    pub fn check_overlaps(&self, model: &Model) -> Vec<ValidationWarning> {
        let positioned: Vec<_> = model
            .elements
            .iter()
            .filter_map(|element| {
                model
                    .absolute_bounds(&element.id)
                    .map(|bounds| (element, bounds))
            })
            .collect();

        let mut warnings = Vec::new();
        for (i, (a, a_bounds)) in positioned.iter().enumerate() {
            for (b, b_bounds) in &positioned[i + 1..] {
                let by_construction = a.attached_to.as_deref() == Some(b.id.as_str())
                    || b.attached_to.as_deref() == Some(a.id.as_str())
                    || is_nested_in(model, &a.id, &b.id)
                    || is_nested_in(model, &b.id, &a.id);
                if by_construction {
                    continue;
                }
                if a_bounds.intersects(b_bounds) {
                    warnings.push(ValidationWarning::new(
                        Severity::Warning,
                        WarningCode::Overlap,
                        Some(a.id.as_str()),
                        format!("elements `{}` and `{}` overlap", a.id, b.id),
                    ));
                }
            }
        }
        warnings
    }

    /// Reports unnamed task-category elements. Events may stay unnamed.
    pub fn check_labels(&self, model: &Model) -> Vec<ValidationWarning> {
        model
            .elements
            .iter()
            .filter(|element| element.kind.category() == ElementCategory::Task)
            .filter(|element| element.is_unnamed())
            .map(|element| {
                ValidationWarning::new(
                    Severity::Info,
                    WarningCode::MissingLabel,
                    Some(element.id.as_str()),
                    format!("{} `{}` has no label", element.kind, element.id),
                )
            })
            .collect()
    }
}

/// Returns `true` if `id` sits inside subprocess `ancestor`, directly or
/// through nested subprocesses.
fn is_nested_in(model: &Model, id: &str, ancestor: &str) -> bool {
    let mut current = model.element(id).and_then(|e| e.subprocess_id.as_deref());
    for _ in 0..model.elements.len() {
        match current {
            Some(subprocess_id) if subprocess_id == ancestor => return true,
            Some(subprocess_id) => {
                current = model
                    .element(subprocess_id)
                    .and_then(|e| e.subprocess_id.as_deref());
            }
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use bpmn_layout_core::model::{CoordinateFrame, Element, Flow};

    use super::*;

    fn count(warnings: &[ValidationWarning], code: WarningCode) -> usize {
        warnings.iter().filter(|warning| warning.code() == code).count()
    }

    #[test]
    fn test_missing_start_and_end() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("t", "task").with_name("Work"));

        let warnings = ModelValidator::new().check_start_end(&model);
        assert_eq!(count(&warnings, WarningCode::MissingStart), 1);
        assert_eq!(count(&warnings, WarningCode::MissingEnd), 1);

        model.elements.push(Element::new("s", "startEvent"));
        model.elements.push(Element::new("e", "endEvent"));
        assert!(ModelValidator::new().check_start_end(&model).is_empty());
    }

    #[test]
    fn test_invalid_references() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("a", "task"));
        model.flows.push(Flow::new("f1", "ghost", "a"));
        model.flows.push(Flow::new("f2", "a", "phantom"));
        model.flows.push(Flow::new("f3", "a", "a"));

        let warnings = ModelValidator::new().check_references(&model);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|warning| warning.severity().is_error()));
        assert_eq!(count(&warnings, WarningCode::InvalidSource), 1);
        assert_eq!(count(&warnings, WarningCode::InvalidTarget), 1);
        assert!(warnings[0].message().contains("invalid source"));
        assert!(warnings[1].message().contains("invalid target"));
    }

    #[test]
    fn test_disconnected_element() {
        let mut model = Model::new("p");
        for id in ["a", "b", "c", "lonely"] {
            model.elements.push(Element::new(id, "task"));
        }
        model.flows.push(Flow::new("f1", "a", "b"));
        model.flows.push(Flow::new("f2", "b", "c"));

        let warnings = ModelValidator::new().check_connectivity(&model);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].element_id(), Some("lonely"));
    }

    #[test]
    fn test_single_element_is_not_disconnected() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("a", "task"));
        assert!(ModelValidator::new().check_connectivity(&model).is_empty());
    }

    #[test]
    fn test_overlap_detection() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("a", "task").with_bounds(0.0, 0.0, 100.0, 80.0));
        model.elements.push(Element::new("b", "task").with_bounds(50.0, 40.0, 100.0, 80.0));
        let warnings = ModelValidator::new().check_overlaps(&model);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message().contains("`a`"));
        assert!(warnings[0].message().contains("`b`"));

        model.elements[1] = Element::new("b", "task").with_bounds(200.0, 0.0, 100.0, 80.0);
        assert!(ModelValidator::new().check_overlaps(&model).is_empty());
    }

    #[test]
    fn test_overlap_skips_boundary_host_and_unpositioned() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("host", "task").with_bounds(0.0, 0.0, 120.0, 80.0));
        model.elements.push(
            Element::new("timer", "boundaryEvent")
                .attached_to("host")
                .with_bounds(42.0, 62.0, 36.0, 36.0),
        );
        model.elements.push(Element::new("floating", "task"));
        assert!(ModelValidator::new().check_overlaps(&model).is_empty());
    }

    #[test]
    fn test_overlap_across_lanes_in_absolute_frame() {
        let mut model = Model::new("p");
        model.elements.push(
            Element::new("a", "task")
                .with_parent("l1")
                .with_bounds(0.0, 0.0, 100.0, 80.0),
        );
        model.elements.push(
            Element::new("b", "task")
                .with_parent("l2")
                .with_bounds(50.0, 40.0, 100.0, 80.0),
        );
        assert_eq!(model.frame, CoordinateFrame::Absolute);

        let warnings = ModelValidator::new().check_overlaps(&model);
        assert_eq!(count(&warnings, WarningCode::Overlap), 1);
    }

    #[test]
    fn test_overlap_skips_nested_subprocess_content() {
        let mut model = Model::new("p");
        model.elements.push(
            Element::new("outer", "subProcess").with_bounds(0.0, 0.0, 400.0, 300.0),
        );
        model.elements.push(
            Element::new("inner", "subProcess")
                .with_subprocess("outer")
                .with_bounds(20.0, 20.0, 300.0, 200.0),
        );
        model.elements.push(
            Element::new("t", "task")
                .with_subprocess("inner")
                .with_bounds(40.0, 40.0, 120.0, 80.0),
        );
        model.elements.push(
            Element::new("stray", "task").with_bounds(100.0, 60.0, 120.0, 80.0),
        );

        let warnings = ModelValidator::new().check_overlaps(&model);
        // `stray` crosses all three; the nested pairs are skipped.
        assert_eq!(count(&warnings, WarningCode::Overlap), 3);
        assert!(
            warnings
                .iter()
                .all(|warning| warning.message().contains("`stray`"))
        );
    }

    #[test]
    fn test_missing_labels_only_for_tasks() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("s", "startEvent"));
        model.elements.push(Element::new("t", "userTask"));
        model.elements.push(Element::new("named", "task").with_name("Review"));

        let warnings = ModelValidator::new().check_labels(&model);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Info);
        assert_eq!(warnings[0].element_id(), Some("t"));
    }

    #[test]
    fn test_validate_never_mutates() {
        let mut model = Model::new("p");
        model.elements.push(Element::new("t", "task"));
        model.flows.push(Flow::new("f", "t", "missing"));
        let before = model.clone();
        let warnings = ModelValidator::new().validate(&model);
        assert!(!warnings.is_empty());
        assert_eq!(model, before);
    }
}
