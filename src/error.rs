use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to find some resources for {0}")]
    ResolutionIncomplete(String),

    #[error("Failed to run {program}: {source}")]
    CommandSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to transform resources for {name}: {source}")]
    TransformFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to apply resources for {name}: {source}")]
    ApplyFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to parse the yaml format: {0}")]
    ParseYamlFailed(#[from] serde_yaml::Error),

    #[error("Failed to parse the json format: {0}")]
    ParseJsonFailed(#[from] serde_json::Error),

    #[error("Failed to prepare session workspace: {0}")]
    SessionFailed(#[source] std::io::Error),

    #[error("Failed to update status: {0}")]
    StatusUpdateFailed(#[source] kube::Error),

    #[error("Failed to get status: {0}")]
    StatusGetFailed(#[source] kube::Error),

    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),

    #[error("Stopped retrying {0}")]
    Abandoned(String),
}

impl Error {
    /// Standard error of the failing external command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } => Some(stderr),
            Error::TransformFailed { source, .. } | Error::ApplyFailed { source, .. } => source.stderr(),
            _ => None,
        }
    }

    /// Reduces the error to one display line: the error text, followed by the
    /// body of any API error response nested in it.
    pub fn display_line(&self) -> String {
        let primary = self.to_string();
        let mut parts = vec![primary.clone()];
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = source {
            if let Some(kube_client::Error::Api(kube_core::ErrorResponse { message, .. })) =
                err.downcast_ref::<kube::Error>()
            {
                if !message.is_empty() && !primary.contains(message.as_str()) {
                    parts.push(message.clone());
                }
                break;
            }
            source = err.source();
        }
        parts
            .join(": ")
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
