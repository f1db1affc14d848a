use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("targets must not be empty")]
    EmptyTargets,
    #[error("targets must not contain empty entries")]
    EmptyTargetEntry,
    #[error("at least one target must be critical")]
    NoCriticalTargets,
    #[error("duplicate target name '{0}'")]
    DuplicateTargetName(String),
    #[error("invalid target entry '{0}': expected name=url[:optional]")]
    InvalidTargetEntry(String),
    #[error("invalid url '{0}': expected http:// or https://")]
    InvalidUrl(String),
    #[error("attempts must be greater than 0")]
    AttemptsZero,
    #[error("trials must be greater than 0")]
    TrialsZero,
    #[error("{0} timeout must be greater than 0")]
    TimeoutZero(&'static str),
    #[error("instance field must not be empty")]
    EmptyInstanceField,
    #[error("compose command must not be empty")]
    EmptyComposeCommand,
    #[error("required deployment artifact '{0}' not found")]
    MissingArtifact(String),
    #[error("{0}")]
    Compose(String),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
    #[error("failed to serialize report: {0}")]
    Serialize(String),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Cli(String),
}

pub type Result<T> = std::result::Result<T, Error>;
