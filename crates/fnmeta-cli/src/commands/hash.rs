use clap::Args;

use fnmeta_manifest::FunctionIdentityHasher;

#[derive(Args, Debug, Clone, Default)]
pub struct HashCommand {
    /// Function name
    pub name: String,

    /// Script file the function is loaded from
    #[arg(long)]
    pub script_file: Option<String>,

    /// Entry point of the function
    #[arg(long)]
    pub entry_point: Option<String>,
}

impl HashCommand {
    /// Decimal function id, the same value emitted into metadata
    pub fn function_id(&self) -> Option<String> {
        FunctionIdentityHasher::function_id(
            Some(self.name.as_str()),
            self.script_file.as_deref(),
            self.entry_point.as_deref(),
        )
    }
}

pub fn handle_hash(cmd: HashCommand) {
    if let Some(id) = cmd.function_id() {
        println!("{}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_matches_emitted_id() {
        let cmd = HashCommand {
            name: "Run".to_string(),
            script_file: Some("TestProject.dll".to_string()),
            entry_point: Some("Run".to_string()),
        };
        assert_eq!(cmd.function_id().as_deref(), Some("2882587761"));
    }

    #[test]
    fn test_hash_skips_absent_fields() {
        let name_only = HashCommand {
            name: "Run".to_string(),
            ..HashCommand::default()
        };
        assert_eq!(
            name_only.function_id(),
            FunctionIdentityHasher::function_id(Some("Run"), None, None)
        );
    }
}
