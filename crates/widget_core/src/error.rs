use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("model catalog is empty")]
    EmptyCatalog,
    #[error("no asset for model {model} clothes {clothes}")]
    NoAsset { model: usize, clothes: usize },
    #[error("failed to load model '{path}': {source}")]
    LoadFailed {
        path: String,
        source: anyhow::Error,
    },
    #[error("invalid word-of-the-day endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
    },
}
