//! Runnable task contract.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from running a task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid input for task {task}: {reason}")]
    InvalidInput { task: String, reason: String },

    #[error("task {task} failed: {reason}")]
    Failed { task: String, reason: String },
}

/// A named process that can be run with string inputs.
#[async_trait]
pub trait Task: Send + Sync {
    /// Slash-namespaced name, e.g. `Account/Create`.
    fn name(&self) -> &str;

    /// Names of the inputs the task expects, in order.
    fn inputs(&self) -> Vec<String>;

    async fn run(&self, inputs: &[String]) -> Result<(), TaskError>;

    /// Everything before the last `/`, if any.
    fn namespace(&self) -> Option<&str> {
        self.name().rsplit_once('/').map(|(namespace, _)| namespace)
    }

    /// The name with its namespace stripped.
    fn short_name(&self) -> &str {
        self.name()
            .rsplit_once('/')
            .map(|(_, short)| short)
            .unwrap_or_else(|| self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CreateAccount;

    #[async_trait]
    impl Task for CreateAccount {
        fn name(&self) -> &str {
            "Billing/Account/Create"
        }

        fn inputs(&self) -> Vec<String> {
            vec!["owner".to_string(), "currency".to_string()]
        }

        async fn run(&self, inputs: &[String]) -> Result<(), TaskError> {
            if inputs.len() != self.inputs().len() {
                return Err(TaskError::InvalidInput {
                    task: self.name().to_string(),
                    reason: format!("expected {} inputs, got {}", self.inputs().len(), inputs.len()),
                });
            }
            Ok(())
        }
    }

    struct Flat;

    #[async_trait]
    impl Task for Flat {
        fn name(&self) -> &str {
            "Ping"
        }

        fn inputs(&self) -> Vec<String> {
            Vec::new()
        }

        async fn run(&self, _inputs: &[String]) -> Result<(), TaskError> {
            Ok(())
        }
    }

    #[test]
    fn test_name_splitting() {
        assert_eq!(CreateAccount.namespace(), Some("Billing/Account"));
        assert_eq!(CreateAccount.short_name(), "Create");
        assert_eq!(Flat.namespace(), None);
        assert_eq!(Flat.short_name(), "Ping");
    }

    #[tokio::test]
    async fn test_run_validates_inputs() {
        let task: Box<dyn Task> = Box::new(CreateAccount);

        let ok = task.run(&["alice".to_string(), "EUR".to_string()]).await;
        assert!(ok.is_ok());

        let err = task.run(&["alice".to_string()]).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput { .. }));
        assert!(err.to_string().contains("expected 2 inputs, got 1"));
    }
}
