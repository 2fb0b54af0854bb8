//! `fnmeta aggregate`: merge provider documents into one function list

use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use fnmeta_manifest::document::DOCUMENT_SUFFIX;
use fnmeta_manifest::{FileProvider, FunctionMetadata, MetadataAggregator, MetadataProvider};

use crate::errors::CliError;
use crate::logger;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone, Default)]
pub struct AggregateCommand {
    /// Provider documents, or directories searched for `*.metadata.json`
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Write the merged list here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Provider documents named by `paths`, directories expanded in sorted order
pub fn collect_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry.file_type().is_file()
                        && entry
                            .file_name()
                            .to_str()
                            .is_some_and(|name| name.ends_with(DOCUMENT_SUFFIX))
                })
                .map(walkdir::DirEntry::into_path)
                .collect();
            found.sort();
            documents.extend(found);
        } else {
            documents.push(path.clone());
        }
    }
    documents
}

/// Merge every document into one list, provider order preserved
pub fn aggregate(paths: &[PathBuf]) -> Result<Vec<FunctionMetadata>, CliError> {
    let documents = collect_documents(paths);
    if documents.is_empty() {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        return Err(CliError::NoDocuments(names.join(", ")));
    }

    let aggregator = MetadataAggregator::new(documents.into_iter().map(|path| {
        Some(Arc::new(FileProvider::new(path)) as Arc<dyn MetadataProvider>)
    }));
    logger::debug(&format!(
        "Aggregating providers: {}",
        aggregator.provider_names().collect::<Vec<_>>().join(", ")
    ));

    Ok(aggregator.function_metadata()?)
}

pub fn handle_aggregate(cmd: AggregateCommand, _opts: GlobalOpts) -> Result<(), CliError> {
    let functions = aggregate(&cmd.paths)?;
    let json = serde_json::to_string_pretty(&functions)?;

    match cmd.output {
        Some(output) => {
            write_output(&output, &json)?;
            logger::success(&format!(
                "Aggregated {} function(s) into {}",
                functions.len(),
                output.display()
            ));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn write_output(path: &Path, json: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document(assembly: &str, functions: &[&str]) -> String {
        let functions: Vec<String> = functions
            .iter()
            .map(|name| {
                format!(
                    r#"{{"language":"dotnet-isolated","name":"{0}","entryPoint":"{0}","scriptFile":"{1}.dll","rawBindings":[]}}"#,
                    name, assembly
                )
            })
            .collect();
        format!(
            r#"{{"namespace":"AzureFunctionInternals.{0}","assemblyName":"{0}","generatedAt":"2026-01-01T00:00:00Z","functions":[{1}]}}"#,
            assembly,
            functions.join(",")
        )
    }

    #[test]
    fn test_directories_expand_sorted() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        for (file, content) in [
            ("Orders.metadata.json", document("Orders", &["Place"])),
            ("Billing.metadata.json", document("Billing", &["Charge", "Refund"])),
            ("readme.txt", String::new()),
        ] {
            if fs::write(root.join(file), content).is_err() {
                return;
            }
        }

        let found = collect_documents(&[root.to_path_buf()]);
        assert_eq!(
            found,
            vec![root.join("Billing.metadata.json"), root.join("Orders.metadata.json")]
        );

        let names: Vec<String> = aggregate(&[root.to_path_buf()])
            .map(|functions| functions.iter().map(|f| f.name.to_string()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["Charge", "Refund", "Place"]);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let result = aggregate(&[temp_dir.path().to_path_buf()]);
        assert!(matches!(result, Err(CliError::NoDocuments(_))));
    }

    #[test]
    fn test_unreadable_document_fails_aggregation() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let good = temp_dir.path().join("Orders.metadata.json");
        if fs::write(&good, document("Orders", &["Place"])).is_err() {
            return;
        }
        let missing = temp_dir.path().join("Missing.metadata.json");
        let result = aggregate(&[good, missing]);
        assert!(matches!(result, Err(CliError::Manifest(_))));
    }
}
