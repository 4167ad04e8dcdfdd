use thiserror::Error;

/// Failure of a single container engine invocation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to execute {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed with status: {}", display_code(.code))]
    Failed { command: String, code: Option<i32> },

    #[error("{command} produced output that is not valid UTF-8")]
    InvalidOutput {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status: {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl EngineError {
    /// Exit code to propagate when this error aborts the run
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}
