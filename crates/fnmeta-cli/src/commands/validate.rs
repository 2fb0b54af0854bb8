//! `fnmeta validate`: resolve every binding of a provider document the way a host would

use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use fnmeta_manifest::binding_info::resolve_bindings;
use fnmeta_manifest::{read_from_path, ProviderDocument};

use crate::errors::CliError;
use crate::logger;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct ValidateCommand {
    /// Provider document to check
    pub document: PathBuf,
}

/// Per-function failures as `(function name, message)`
pub fn validate_document(document: &ProviderDocument) -> Vec<(String, String)> {
    document
        .functions
        .iter()
        .filter_map(|function| {
            resolve_bindings(function)
                .err()
                .map(|e| (function.name.to_string(), e.to_string()))
        })
        .collect()
}

pub fn handle_validate(cmd: ValidateCommand, opts: GlobalOpts) -> Result<(), CliError> {
    let document = read_from_path(&cmd.document)?;
    let failures = validate_document(&document);

    for (name, message) in &failures {
        logger::error(&format!("{}: {}", name.bold(), message));
    }
    if !failures.is_empty() {
        return Err(CliError::InvalidDocument {
            failed: failures.len(),
            total: document.functions.len(),
        });
    }

    if opts.verbosity_level() > 0 {
        for function in &document.functions {
            logger::debug(&format!(
                "{} ({})",
                function.name,
                if function.is_rich() { "rich" } else { "minimal" }
            ));
        }
    }
    logger::success(&format!(
        "{}: {} function(s) valid",
        document.assembly_name,
        document.functions.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(raw_bindings: &str) -> Option<ProviderDocument> {
        let json = format!(
            r#"{{"namespace":"AzureFunctionInternals.Orders","assemblyName":"Orders","generatedAt":"2026-01-01T00:00:00Z",
               "functions":[{{"language":"dotnet-isolated","name":"Place","entryPoint":"Place","scriptFile":"Orders.dll","rawBindings":{}}}]}}"#,
            raw_bindings
        );
        serde_json::from_str(&json).ok()
    }

    #[test]
    fn test_valid_document() {
        let Some(document) = document(
            r#"["{\"name\":\"req\",\"type\":\"httpTrigger\",\"direction\":\"In\"}"]"#,
        ) else {
            panic!("fixture should parse");
        };
        assert!(validate_document(&document).is_empty());
    }

    #[test]
    fn test_function_without_bindings_fails() {
        let Some(document) = document("[]") else {
            panic!("fixture should parse");
        };
        let failures = validate_document(&document);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "Place");
        assert_eq!(
            failures[0].1,
            "At least one binding must be declared in a Function."
        );
    }
}
