//! `fnmeta generate`
//!
//! 1. Load the configuration and apply command-line overrides
//! 2. Stop early when the control switches turn generation off
//! 3. Discover symbol documents under the input path
//! 4. Run the binding pipeline per module and print its diagnostics
//! 5. Write one provider document per module into the output directory

use clap::Args;
use std::path::{Path, PathBuf};

use fnmeta_bindings::{discover_modules, load_module, ModuleGenerator, ModuleOutcome};
use fnmeta_config::Config;
use fnmeta_manifest::document::{document_file_name, write_to_path};
use fnmeta_manifest::ModuleContext;

use crate::common::absolute;
use crate::errors::CliError;
use crate::logger;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateCommand {
    /// Symbol document, or a directory searched for `*.symbols.json`
    pub input: PathBuf,

    /// Directory for provider documents (overrides `output-dir`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Namespace root for generated providers (overrides `output-namespace`)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Project execution model (overrides `execution-model`)
    #[arg(long)]
    pub execution_model: Option<String>,

    /// Generate even when `enable-generation` is off
    #[arg(long)]
    pub enable_generation: bool,

    /// Mark generated providers for auto-registration (overrides `auto-register`)
    #[arg(long)]
    pub auto_register: bool,

    /// Script file recorded in the metadata (overrides `script-file` and the symbol document)
    #[arg(long)]
    pub script_file: Option<String>,
}

impl GenerateCommand {
    /// Fold the flags into a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.execution_model {
            config.execution_model = Some(model.clone());
        }
        if self.enable_generation {
            config.enable_generation = Some(true);
        }
        if self.auto_register {
            config.auto_register = Some(true);
        }
        if let Some(namespace) = &self.namespace {
            config.output_namespace = Some(namespace.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.display().to_string());
        }
        if let Some(script_file) = &self.script_file {
            config.script_file = Some(script_file.clone());
        }
    }
}

pub fn handle_generate(cmd: GenerateCommand, _opts: GlobalOpts) -> Result<(), CliError> {
    let mut config = Config::load()?;
    cmd.apply_overrides(&mut config);
    generate(&cmd.input, &config)
}

/// Generate provider documents for every module under `input`
pub fn generate(input: &Path, config: &Config) -> Result<(), CliError> {
    let switches = config.switches();
    if !switches.should_generate() {
        logger::warn(&format!(
            "Metadata generation is disabled (enable-generation = {}, execution-model = {}). Nothing to do.",
            switches.generation_enabled,
            config.execution_model.as_deref().unwrap_or("unset")
        ));
        return Ok(());
    }

    let documents = discover_modules(input);
    if documents.is_empty() {
        return Err(CliError::NoInput(input.to_path_buf()));
    }
    logger::debug(&format!("Found {} symbol document(s)", documents.len()));

    let output_dir = absolute(Path::new(config.output_dir.as_deref().unwrap_or(".")));
    let generator = ModuleGenerator::new();
    let mut error_count = 0;

    for path in documents {
        let module = load_module(&path)?;
        let context = ModuleContext::new(module.assembly_name.as_ref())
            .with_script_file(config.script_file.as_deref().or(module.script_file.as_deref()))
            .with_namespace_root(switches.output_namespace.as_deref())
            .with_auto_register(switches.auto_register);

        logger::spinner_start(&format!("Generating metadata for {}", module.assembly_name));
        let outcome = match generator.run(&module, context) {
            Ok(outcome) => outcome,
            Err(e) => {
                logger::spinner_error(&format!("{} failed", module.assembly_name));
                return Err(e.into());
            }
        };
        logger::spinner_stop();

        report(&outcome);
        error_count += outcome.diagnostics.iter().filter(|d| d.is_error()).count();

        if let Some(document) = &outcome.document {
            let target = output_dir.join(document_file_name(&outcome.assembly_name));
            write_to_path(document, &target)?;
            logger::success(&format!(
                "{}: {} function(s) -> {}",
                outcome.assembly_name,
                outcome.accepted,
                target.display()
            ));
        } else {
            logger::info(&format!(
                "{}: no functions accepted, nothing written",
                outcome.assembly_name
            ));
        }
    }

    if error_count > 0 {
        return Err(CliError::DiagnosticErrors(error_count));
    }
    Ok(())
}

fn report(outcome: &ModuleOutcome) {
    for diagnostic in &outcome.diagnostics {
        logger::diagnostic(diagnostic);
    }
    if outcome.rejected > 0 {
        logger::warn(&format!(
            "{}: {} function(s) rejected",
            outcome.assembly_name, outcome.rejected
        ));
    }
}
