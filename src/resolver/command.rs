use crate::helpers::process::run_command;
use crate::resolver::ResolverError;
use crate::resolver::SemanticResolver;
use std::time::Duration;
use tracing::debug;

/// Resolver backed by a local command, e.g. `ollama run mistral`.
///
/// The prompt is written to the command's stdin and its stdout is the answer.
#[derive(Clone, Debug)]
pub struct CommandResolver {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandResolver {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

impl SemanticResolver for CommandResolver {
    fn complete(&self, prompt: &str) -> Result<String, ResolverError> {
        let output = run_command(&self.command, prompt.as_bytes(), self.timeout)?;
        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr.trim(), "Resolver command wrote to stderr");
        }
        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::helpers::process::ProcessError;

    fn resolver(parts: &[&str], timeout: Duration) -> CommandResolver {
        CommandResolver::new(parts.iter().map(|part| part.to_string()).collect(), timeout)
    }

    #[test]
    fn answers_with_command_stdout() {
        let resolver = resolver(
            &["sh", "-c", r#"cat > /dev/null; echo '{"header_text": "Losses", "table_index_under_header": 0}'"#],
            Duration::from_secs(5),
        );
        let answer = resolver.complete("which table?").unwrap();
        assert_eq!(answer.trim(), r#"{"header_text": "Losses", "table_index_under_header": 0}"#);
    }

    #[test]
    fn slow_command_times_out() {
        let resolver = resolver(&["sleep", "5"], Duration::from_millis(100));
        let error = resolver.complete("which table?").unwrap_err();
        assert!(matches!(error, ResolverError::ProcessError(ProcessError::TimedOut { .. })));
    }

    #[test]
    fn missing_program_is_an_error() {
        let resolver = resolver(&["rusty-report-no-such-program"], Duration::from_secs(1));
        let error = resolver.complete("which table?").unwrap_err();
        assert!(matches!(error, ResolverError::ProcessError(ProcessError::SpawnError { .. })));
    }
}
