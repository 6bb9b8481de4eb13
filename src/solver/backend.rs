//! One-time capability check of the AC solver.

use std::sync::OnceLock;

use log::{error, info};

use super::AcAnalysis;
use crate::circuit::Circuit;
use crate::dsl::{CircuitAst, ComponentDef, ComponentType};
use crate::error::{DesignError, Result};

static VERDICT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Verify that the solver produces correct results before any job relies
/// on it.
///
/// The check solves an equal-resistor divider, whose output must be exactly
/// half the excitation, and caches the verdict for the rest of the process.
pub fn ensure_available() -> Result<()> {
    cached_verdict(&VERDICT, divider_check)
}

fn cached_verdict(
    cell: &OnceLock<std::result::Result<(), String>>,
    run_check: impl FnOnce() -> std::result::Result<(), String>,
) -> Result<()> {
    cell.get_or_init(|| {
        let verdict = run_check();
        match &verdict {
            Ok(()) => info!("AC solver backend available"),
            Err(reason) => error!("AC solver backend unavailable: {}", reason),
        }
        verdict
    })
    .clone()
    .map_err(|reason| DesignError::BackendUnavailable { reason })
}

fn divider_check() -> std::result::Result<(), String> {
    let mut ast = CircuitAst::new().with_ports("in", "out");
    ast.push(ComponentDef::ac_source("VIN", "in", "0", 1.0));
    ast.push(ComponentDef::passive(ComponentType::Resistor, "R1", "in", "out", 1e3));
    ast.push(ComponentDef::passive(ComponentType::Resistor, "R2", "out", "0", 1e3));

    let circuit = Circuit::from_ast(&ast).map_err(|e| e.to_string())?;
    let mut analysis = AcAnalysis::new(circuit).map_err(|e| e.to_string())?;
    let magnitudes = analysis.magnitudes(&[1e3]).map_err(|e| e.to_string())?;

    match magnitudes.first() {
        Some(m) if (m - 0.5).abs() < 1e-9 => Ok(()),
        Some(m) => Err(format!("divider check returned {} instead of 0.5", m)),
        None => Err("divider check returned no samples".to_string()),
    }
}
