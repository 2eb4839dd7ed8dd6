//! bpmn-layout - position resolution for BPMN process diagrams.
//!
//! Takes a parsed process model that may lack some or all coordinates and
//! produces a complete, non-overlapping geometry: every element, lane and
//! pool gets bounds and every flow gets orthogonal waypoints. Broken input
//! (dangling references, unknown element kinds, missing lanes) is repaired
//! rather than rejected.

pub mod config;
pub mod layout;
pub mod recovery;
pub mod routing;
pub mod validate;

mod error;

pub use bpmn_layout_core::{geometry, model};

pub use error::LayoutError;

use log::{info, trace};

use bpmn_layout_core::model::Model;

use config::AppConfig;
use layout::PositionResolver;
use recovery::{RecoveryReport, RecoveryStrategy};
use validate::{ModelValidator, ValidationWarning};

/// Result of running the layout pipeline on one model.
#[derive(Debug, Clone)]
pub struct LayoutOutput {
    /// The repaired, fully positioned model.
    pub model: Model,
    /// Diagnostics about the model as it was received.
    pub warnings: Vec<ValidationWarning>,
    /// Repairs made before positioning.
    pub report: RecoveryReport,
}

/// Builder for validating, repairing and laying out process models.
///
/// # Examples
///
/// ```rust
/// use bpmn_layout::{LayoutBuilder, config::AppConfig};
/// use bpmn_layout::model::{Element, Flow, Model};
///
/// let mut model = Model::new("process");
/// model.elements.push(Element::new("start", "startEvent"));
/// model.elements.push(Element::new("task", "task").with_name("Review"));
/// model.flows.push(Flow::new("f1", "start", "task"));
///
/// let builder = LayoutBuilder::new(AppConfig::default());
/// let output = builder.layout(model).expect("layout succeeds");
///
/// assert!(output.model.is_resolved());
/// assert!(output.model.flows[0].waypoints.len() >= 2);
/// ```
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bpmn_layout::{LayoutBuilder, config::AppConfig};
    ///
    /// let builder = LayoutBuilder::new(AppConfig::default());
    /// ```
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Validate, repair, position and route a model.
    ///
    /// The validator sees the model as received; its findings are returned,
    /// never acted on. Recovery then repairs the model, the resolver assigns
    /// geometry using the configured mode and direction, and the router adds
    /// waypoints and label anchors.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Input`] if the model carries no process id and
    /// no elements at all, which means the caller handed over an empty or
    /// mis-decoded document.
    pub fn layout(&self, model: Model) -> Result<LayoutOutput, LayoutError> {
        if model.process_id.is_empty() && model.elements.is_empty() && model.pools.is_empty() {
            return Err(LayoutError::Input(
                "model has no process id and no content".to_string(),
            ));
        }

        let layout = self.config.layout();
        info!(
            process = model.process_id,
            elements = model.elements.len(),
            flows = model.flows.len();
            "Laying out process"
        );

        let warnings = ModelValidator::new().validate(&model);

        let (model, report) = RecoveryStrategy::with_config(layout.recovery()).recover_model(model);

        let resolver = PositionResolver::new(layout);
        let mut model = resolver.resolve(model, layout.mode(), layout.direction());

        routing::apply_routes(&mut model, layout.routing());
        trace!(model:?; "Positioned model");

        info!(
            warnings = warnings.len(),
            repairs = report.total();
            "Layout finished"
        );
        Ok(LayoutOutput {
            model,
            warnings,
            report,
        })
    }
}
