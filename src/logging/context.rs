use crate::cli::Command;
use std::env;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Running inside the Lambda runtime; stdout is collected by CloudWatch.
    Lambda,
    /// Operator commands run from a terminal.
    Local,
}

/// Derive the active execution context from the parsed command and the runtime environment.
pub fn detect_context(command: Option<&Command>) -> ExecutionContext {
    if lambda_environment() {
        return ExecutionContext::Lambda;
    }
    match command {
        None | Some(Command::Lambda) => ExecutionContext::Lambda,
        Some(Command::Invoke(_)) | Some(Command::Gate(_)) | Some(Command::Env) => {
            ExecutionContext::Local
        }
    }
}

fn lambda_environment() -> bool {
    env::var("AWS_LAMBDA_RUNTIME_API")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false)
}
