use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Optional plain-text transcript log. Messages are appended as they are
/// committed; pausing keeps the file path so logging can resume.
pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Self {
        let is_active = log_file.is_some();
        LoggingState {
            file_path: log_file,
            is_active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        self.test_file_access(&path)?;
        self.file_path = Some(path.clone());
        self.is_active = true;
        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Logging resumed to: {path}"))
                } else {
                    Ok(format!("Logging paused (file: {path})"))
                }
            }
            None => {
                Err("No log file specified. Use /log <filename> to enable logging first.".into())
            }
        }
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        for line in content.lines() {
            writeln!(file, "{line}")?;
        }
        // Blank line between messages, matching the on-screen spacing.
        writeln!(file)?;
        file.flush()?;
        Ok(())
    }

    pub fn status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), active) => {
                let name = Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy();
                if active {
                    format!("active ({name})")
                } else {
                    format!("paused ({name})")
                }
            }
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn toggling_without_a_file_is_an_error() {
        let mut logging = LoggingState::new(None);
        assert!(logging.toggle_logging().is_err());
        assert_eq!(logging.status_string(), "disabled");
    }

    #[test]
    fn messages_append_with_blank_separators() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        let logging = LoggingState::new(Some(path.to_string_lossy().into_owned()));

        logging.log_message("You: hello").unwrap();
        logging.log_message("Hi there!").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: hello\n\nHi there!\n\n");
    }

    #[test]
    fn paused_logging_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        let mut logging = LoggingState::new(Some(path.to_string_lossy().into_owned()));

        logging.toggle_logging().unwrap();
        logging.log_message("dropped").unwrap();

        assert!(!path.exists());
    }
}
