use outreach_common::error::CommonError;
use outreach_common::openai::OpenAiClientError;

/// Shown verbatim when the extraction response cannot be parsed as a job posting.
pub const CONTEXT_TOO_BIG: &str = "Context too big. Unable to parse jobs.";

/// Shown when a request is missing one of the required fields.
pub const FILL_ALL_FIELDS: &str = "Please fill in all fields to generate the email.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Context too big. Unable to parse jobs.")]
    ContextTooBig,

    #[error("llm error: {0}")]
    Llm(#[from] OpenAiClientError),

    #[error("portfolio error: {0}")]
    Portfolio(String),
}

impl AppError {
    /// The single message a user sees for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingFields(_) => FILL_ALL_FIELDS.to_string(),
            AppError::ContextTooBig => CONTEXT_TOO_BIG.to_string(),
            other => format!("An error occurred: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages() {
        assert_eq!(
            AppError::MissingFields(vec!["url", "name"]).user_message(),
            FILL_ALL_FIELDS
        );
        assert_eq!(AppError::ContextTooBig.user_message(), CONTEXT_TOO_BIG);
        assert_eq!(AppError::ContextTooBig.to_string(), CONTEXT_TOO_BIG);
        assert_eq!(
            AppError::Portfolio("missing column `Links`".to_string()).user_message(),
            "An error occurred: portfolio error: missing column `Links`"
        );
    }

    #[test]
    fn missing_fields_display_lists_names() {
        let err = AppError::MissingFields(vec!["api_key", "company"]);
        assert_eq!(err.to_string(), "missing required fields: api_key, company");
    }
}
