//! CLI logic for the bpmn-layout tool.
//!
//! Reads a JSON-serialized process model, runs it through the layout
//! pipeline and writes the positioned model back out as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io};

use log::{info, warn};

use bpmn_layout::{LayoutBuilder, LayoutError, model::Model};

use error_adapter::warning_reportables;

/// Run the bpmn-layout CLI application
///
/// Command-line overrides for mode, direction and engine take precedence
/// over the loaded configuration. Validation findings are rendered as
/// warnings and never fail the run.
///
/// # Errors
///
/// Returns `LayoutError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Input that is not a JSON process model
pub fn run(args: &Args) -> Result<(), LayoutError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing model"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    let layout = app_config.layout_mut();
    if let Some(mode) = args.mode {
        layout.set_mode(mode);
    }
    if let Some(direction) = args.direction {
        layout.set_direction(direction);
    }
    if let Some(engine) = args.engine {
        layout.set_engine(engine);
    }

    let source = fs::read_to_string(&args.input)?;
    let model = decode_model(&source)?;

    let builder = LayoutBuilder::new(app_config);
    let output = builder.layout(model)?;
    report_warnings(&output.warnings);

    let json = serde_json::to_string_pretty(&output.model).map_err(io::Error::other)?;
    fs::write(&args.output, json)?;

    info!(
        output_file = args.output,
        repairs = output.report.total();
        "Positioned model exported successfully"
    );

    Ok(())
}

fn decode_model(source: &str) -> Result<Model, LayoutError> {
    let mut model: Model =
        serde_json::from_str(source).map_err(|err| LayoutError::Input(err.to_string()))?;
    for element in &mut model.elements {
        element.resolve_kind();
    }
    Ok(model)
}

fn report_warnings(warnings: &[bpmn_layout::validate::ValidationWarning]) {
    let reporter = miette::GraphicalReportHandler::new();
    for reportable in warning_reportables(warnings) {
        let mut writer = String::new();
        if reporter.render_report(&mut writer, &reportable).is_ok() {
            warn!("{writer}");
        }
    }
}

#[cfg(test)]
mod tests {
    use bpmn_layout::model::ElementKind;

    use super::*;

    #[test]
    fn test_decode_resolves_kinds() {
        let model = decode_model(
            r#"{
                "process_id": "p",
                "elements": [
                    {"id": "s", "type_tag": "bpmn:startEvent"},
                    {"id": "g", "type_tag": "exclusiveGateway"}
                ]
            }"#,
        )
        .expect("valid model");
        assert_eq!(model.elements[0].kind, ElementKind::StartEvent);
        assert_eq!(model.elements[1].kind, ElementKind::Gateway);
    }

    #[test]
    fn test_decode_rejects_non_model_json() {
        let result = decode_model(r#"{"elements": 3}"#);
        assert!(matches!(result, Err(LayoutError::Input(_))));
    }
}
