//! Primary entry point: orchestrates the full netlist-to-schematic pipeline
//! (Flattener through Drawing Assembler) over a parsed skin and a netlist
//! document, driving the single async layout-engine call in between.

#![warn(missing_docs)]

use schem_common::{Diagnostic, DiagnosticSink, InternalError, Severity};
use schem_ir::netlist::NetlistFile;
use schem_layout::{GeometryError, LayoutEngine, LayoutEngineError};
use schem_skin::query::SkinQuery;
use schem_skin::tree::{SkinNode, SkinParseError};
use thiserror::Error;

/// Everything that can prevent `render` from producing a drawing. Per the
/// pipeline's error handling design, unknown cell types and a missing top
/// module are *not* represented here — they are recoverable fallbacks
/// recorded into a [`DiagnosticSink`] and logged, not failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The skin document could not be parsed.
    #[error("malformed skin document: {0}")]
    Skin(#[from] SkinParseError),
    /// The netlist document could not be parsed.
    #[error("malformed netlist: {0}")]
    Netlist(#[from] serde_json::Error),
    /// The netlist declared no modules at all — there is nothing to render.
    #[error("netlist has no modules to render")]
    NoModules,
    /// A pipeline stage hit an unrecoverable internal error.
    #[error(transparent)]
    Internal(#[from] InternalError),
    /// Reconciliation rejected the layout engine's geometry.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// The layout engine itself failed; propagated verbatim per spec.
    #[error("layout engine failed: {0}")]
    Layout(LayoutEngineError),
    /// The assembled drawing tree could not be serialized.
    #[error("failed to serialize drawing: {0}")]
    Serialize(#[from] quick_xml::Error),
}

/// Renders `netlist`'s top module against `skin_text`, using `engine` for
/// placement and routing, and returns the serialized drawing document.
///
/// This is the pipeline's only async function: everything before the layout
/// call and everything after it runs synchronously on the calling task (see
/// the Concurrency & Resource Model).
pub async fn render(skin_text: &str, netlist: &NetlistFile, engine: &dyn LayoutEngine) -> Result<String, RenderError> {
    let diagnostics = DiagnosticSink::new();

    let skin_root = SkinNode::parse(skin_text)?;
    let skin = SkinQuery::from_document(&skin_root);

    let module_name = netlist.top_module_name().ok_or(RenderError::NoModules)?;
    if !netlist.modules[module_name].is_top() {
        diagnostics.emit(Diagnostic::info(format!("no module marked top; falling back to '{module_name}'")));
    }
    let module = &netlist.modules[module_name];

    let flat = schem_elaborate::elaborate(module_name, module, &skin, &diagnostics)?;
    log::debug!("flattened '{module_name}': {} cells, {} wires", flat.cells.len(), flat.wires.len());

    let request = schem_layout::build_request(&flat, &skin, &diagnostics);
    log::debug!("layout request: {} children, {} edges", request.children.len(), request.edges.len());

    let response = engine.layout(request.clone()).await.map_err(RenderError::Layout)?;
    let reconciled = schem_layout::reconcile(&request, &response, &diagnostics)?;
    log::debug!("reconciled: {} edges, {} junctions", reconciled.edges.len(), reconciled.junctions.len());

    let drawing = schem_draw::assemble_drawing(&flat, &skin, &skin_root, &request, &response, &reconciled, &diagnostics);
    let text = schem_draw::write_xml(&drawing)?;

    log_diagnostics(&diagnostics);
    Ok(text)
}

/// Like [`render`], but also invokes `callback` with the outcome — `Ok` of
/// the rendered text on success, `Err` of the failure on failure — matching
/// the spec's legacy callback interface alongside the returned `Result`.
pub async fn render_with_callback<F>(skin_text: &str, netlist: &NetlistFile, engine: &dyn LayoutEngine, callback: F) -> Result<String, RenderError>
where
    F: FnOnce(Result<&str, &RenderError>),
{
    let result = render(skin_text, netlist, engine).await;
    match &result {
        Ok(text) => callback(Ok(text.as_str())),
        Err(err) => callback(Err(err)),
    }
    result
}

fn log_diagnostics(diagnostics: &DiagnosticSink) {
    for diag in diagnostics.diagnostics() {
        match diag.severity {
            Severity::Warning => log::warn!("{}", diag.message),
            Severity::Info => log::info!("{}", diag.message),
        }
    }
}
