//! Writing generated code and chat history to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::state::ChatLog;
use crate::template::GeneratedCode;

pub const CHAT_HISTORY_FILE: &str = "cann_assistant_chat_history.json";

/// Write generated code to `dir/<file_name>`, replacing any existing file.
pub fn write_code(dir: &Path, code: &GeneratedCode) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&code.file_name);
    fs::write(&path, &code.source)?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), code.source.len());
    Ok(path)
}

pub fn write_chat_history(dir: &Path, log: &ChatLog) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(CHAT_HISTORY_FILE);
    fs::write(&path, log.export_json()?)?;
    tracing::info!("Exported {} messages to {}", log.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::OperatorPreset;
    use crate::state::ChatMessage;
    use crate::template::{render, TemplateKind};
    use tempfile::TempDir;

    #[test]
    fn test_write_code_uses_file_name() {
        let dir = TempDir::new().unwrap();
        let spec = OperatorPreset::find("relu").unwrap().to_spec();
        let code = render(TemplateKind::AscendKernel, &spec).unwrap();

        let path = write_code(dir.path(), &code).unwrap();
        assert_eq!(path.file_name().unwrap(), "ReLUOperator_kernel.cpp");
        assert_eq!(fs::read_to_string(path).unwrap(), code.source);
    }

    #[test]
    fn test_write_chat_history() {
        let dir = TempDir::new().unwrap();
        let mut log = ChatLog::new();
        log.push(ChatMessage::user("hi"));

        let path = write_chat_history(&dir.path().join("out"), &log).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\"type\": \"user\""));
    }
}
