use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricError {
    #[error("Configuration error in metric '{metric}': {detail}")]
    Configuration { metric: String, detail: String },

    #[error("Data error in metric '{metric}': system '{system}' references missing field '{field}'")]
    MissingField {
        metric: String,
        system: String,
        field: String,
    },

    #[error("No data for metric '{metric}', system '{system}'")]
    NoData { metric: String, system: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, MetricError>;
