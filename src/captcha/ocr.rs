use std::path::Path;

/// Text-recognition capability consumed by the captcha solver
///
/// Implementations wrap whatever OCR engine is available in the deployment;
/// the solver only needs candidate strings back. The image is handed over as
/// a file path because typical engines read from disk; the file is deleted by
/// the caller as soon as this returns.
pub trait TextRecognizer: Send + Sync {
    /// Returns zero or more candidate readings of the image, best first
    fn recognize(&self, image: &Path) -> Vec<String>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&Path) -> Vec<String> + Send + Sync,
{
    fn recognize(&self, image: &Path) -> Vec<String> {
        self(image)
    }
}

/// Recognizer that shells out to an external OCR command
///
/// Invoked as `<command> <image-path> <args...>` (the tesseract calling
/// convention with `stdout` as the output target); each non-empty stdout
/// line becomes one candidate.
pub struct CommandRecognizer {
    command: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl TextRecognizer for CommandRecognizer {
    fn recognize(&self, image: &Path) -> Vec<String> {
        let output = std::process::Command::new(&self.command)
            .arg(image)
            .args(&self.args)
            .output();

        match output {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
            Ok(output) => {
                tracing::warn!("OCR command exited with {}", output.status);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("OCR command {} failed to run: {}", self.command, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_recognizer_collects_stdout_lines() {
        // `echo` ignores the image path and prints a known reading.
        let recognizer = CommandRecognizer::new("echo", vec!["3+4".to_string()]);
        let readings = recognizer.recognize(Path::new("/nonexistent.png"));
        assert_eq!(readings.len(), 1);
        assert!(readings[0].ends_with("3+4"));
    }

    #[test]
    fn test_command_recognizer_missing_binary_is_empty() {
        let recognizer = CommandRecognizer::new("definitely-not-a-real-ocr", vec![]);
        assert!(recognizer
            .recognize(Path::new("/nonexistent.png"))
            .is_empty());
    }
}
