use crate::captcha::TextRecognizer;
use crate::{HarvestError, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Solves the portal's arithmetic image captchas
///
/// Each attempt fetches a fresh challenge for the current session, writes it
/// to a transient file for the recognizer, and deletes the file again whether
/// or not recognition produced anything usable. Attempts that yield no
/// parseable expression are discarded and retried with a new challenge.
pub struct CaptchaSolver {
    recognizer: Arc<dyn TextRecognizer>,
    image_url: Url,
    tmp_dir: PathBuf,
    max_attempts: u32,
    /// Court code, only used to label temp files for debuggability
    label: String,
}

impl CaptchaSolver {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        image_url: Url,
        tmp_dir: PathBuf,
        max_attempts: u32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            recognizer,
            image_url,
            tmp_dir,
            max_attempts,
            label: label.into(),
        }
    }

    /// Fetches and solves one challenge, returning the numeric answer
    ///
    /// The challenge image must be fetched through the session's own client:
    /// the server binds the expected answer to the session cookie.
    pub async fn solve(&self, http: &Client) -> Result<i64> {
        for attempt in 1..=self.max_attempts {
            let bytes = http
                .get(self.image_url.clone())
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;

            let image_path = self.write_challenge(&bytes).await?;
            let candidates = self.recognizer.recognize(&image_path);
            // The image is session-bound and single-use; never leave it behind.
            if let Err(e) = tokio::fs::remove_file(&image_path).await {
                tracing::warn!("Failed to remove captcha temp file: {}", e);
            }

            match candidates.first().and_then(|text| eval_expression(text)) {
                Some(answer) => {
                    tracing::debug!(
                        "Captcha solved on attempt {}: {:?} = {}",
                        attempt,
                        candidates.first(),
                        answer
                    );
                    return Ok(answer);
                }
                None => {
                    tracing::debug!(
                        "Unusable captcha reading on attempt {}/{}: {:?}",
                        attempt,
                        self.max_attempts,
                        candidates.first()
                    );
                }
            }
        }

        Err(HarvestError::CaptchaUnsolvable {
            attempts: self.max_attempts,
        })
    }

    async fn write_challenge(&self, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.tmp_dir).await?;
        let short_id = &uuid::Uuid::new_v4().simple().to_string()[..8];
        let path = self.tmp_dir.join(format!("{}_{}.png", self.label, short_id));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Evaluates a recognized challenge string as `<int><op><int>`
///
/// The recognizer reports multiplication and division with assorted glyphs
/// (`×`, `X`, `x`, `÷`); these are normalized before parsing. Division is
/// floor division. Anything that does not parse to a two-operand expression
/// yields `None`.
pub fn eval_expression(text: &str) -> Option<i64> {
    let expr: String = text
        .trim()
        .chars()
        .map(|c| match c {
            '×' | 'X' | 'x' => '*',
            '÷' => '/',
            other => other,
        })
        .collect();

    for op in ['+', '-', '*', '/'] {
        // Skip the first char so a leading sign is not mistaken for the operator.
        let pos = expr
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == op)
            .map(|(i, _)| i);
        if let Some(pos) = pos {
            let lhs: i64 = expr[..pos].trim().parse().ok()?;
            let rhs: i64 = expr[pos + 1..].trim().parse().ok()?;
            return match op {
                '+' => Some(lhs + rhs),
                '-' => Some(lhs - rhs),
                '*' => Some(lhs * rhs),
                '/' if rhs != 0 => Some(lhs.div_euclid(rhs)),
                _ => None,
            };
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_eval_addition() {
        assert_eq!(eval_expression("3+4"), Some(7));
    }

    #[test]
    fn test_eval_subtraction() {
        assert_eq!(eval_expression("9-2"), Some(7));
    }

    #[test]
    fn test_eval_multiplication_glyphs() {
        assert_eq!(eval_expression("6×7"), Some(42));
        assert_eq!(eval_expression("6X7"), Some(42));
        assert_eq!(eval_expression("6x7"), Some(42));
        assert_eq!(eval_expression("6*7"), Some(42));
    }

    #[test]
    fn test_eval_floor_division() {
        assert_eq!(eval_expression("8÷3"), Some(2));
        assert_eq!(eval_expression("8/3"), Some(2));
        assert_eq!(eval_expression("-7/2"), Some(-4)); // floor, not truncate
    }

    #[test]
    fn test_eval_with_whitespace() {
        assert_eq!(eval_expression(" 3 + 4 "), Some(7));
    }

    #[test]
    fn test_eval_rejects_garbage() {
        assert_eq!(eval_expression("abc"), None);
        assert_eq!(eval_expression("12"), None);
        assert_eq!(eval_expression(""), None);
        assert_eq!(eval_expression("3+"), None);
        assert_eq!(eval_expression("8÷0"), None);
    }

    struct ScriptedRecognizer {
        readings: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRecognizer {
        fn new(readings: Vec<Vec<&str>>) -> Self {
            Self {
                readings: Mutex::new(
                    readings
                        .into_iter()
                        .rev()
                        .map(|r| r.into_iter().map(String::from).collect())
                        .collect(),
                ),
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, _image: &Path) -> Vec<String> {
            self.readings.lock().unwrap().pop().unwrap_or_default()
        }
    }

    async fn challenge_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/captcha.php"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .mount(&server)
            .await;
        server
    }

    fn solver_for(server: &MockServer, recognizer: Arc<dyn TextRecognizer>, dir: &Path) -> CaptchaSolver {
        CaptchaSolver::new(
            recognizer,
            Url::parse(&format!("{}/captcha.php", server.uri())).unwrap(),
            dir.to_path_buf(),
            5,
            "9~13",
        )
    }

    #[tokio::test]
    async fn test_solve_first_attempt() {
        let server = challenge_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let solver = solver_for(
            &server,
            Arc::new(ScriptedRecognizer::new(vec![vec!["3+4"]])),
            tmp.path(),
        );

        let answer = solver.solve(&Client::new()).await.unwrap();
        assert_eq!(answer, 7);
    }

    #[tokio::test]
    async fn test_solve_retries_unreadable_challenges() {
        let server = challenge_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let solver = solver_for(
            &server,
            Arc::new(ScriptedRecognizer::new(vec![
                vec![],           // OCR found nothing
                vec!["scribble"], // no expression
                vec!["6×7"],
            ])),
            tmp.path(),
        );

        let answer = solver.solve(&Client::new()).await.unwrap();
        assert_eq!(answer, 42);
    }

    #[tokio::test]
    async fn test_solve_fails_after_attempt_ceiling() {
        let server = challenge_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let solver = solver_for(
            &server,
            Arc::new(ScriptedRecognizer::new(vec![
                vec!["?"],
                vec!["?"],
                vec!["?"],
                vec!["?"],
                vec!["?"],
            ])),
            tmp.path(),
        );

        let err = solver.solve(&Client::new()).await.unwrap_err();
        assert!(matches!(
            err,
            HarvestError::CaptchaUnsolvable { attempts: 5 }
        ));
    }

    #[tokio::test]
    async fn test_challenge_file_removed_after_attempts() {
        let server = challenge_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let solver = solver_for(
            &server,
            Arc::new(ScriptedRecognizer::new(vec![vec!["junk"], vec!["9-2"]])),
            tmp.path(),
        );

        solver.solve(&Client::new()).await.unwrap();

        // Both the failed and the successful attempt cleaned up after themselves.
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }
}
