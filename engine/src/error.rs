use thiserror::Error;

/// Problems with a damage expression such as `2d6+1`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty damage expression")]
    Empty,
    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("no dice in expression: {0}")]
    NoDice(String),
    #[error("invalid die size: d{0}")]
    InvalidDieSize(u32),
}

/// Faults raised while a scene graph runs. They are reported and turned
/// into a failure result at the scene or manager boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene '{0}' is not registered")]
    UnregisteredScene(String),
    #[error("no start scene defined")]
    NoStartScene,
    #[error("combat system is not available")]
    MissingCombatSystem,
    #[error("scene '{0}' has no available choices")]
    NoChoicesAvailable(String),
    #[error("combat in '{0}' produced no enemies")]
    NoEnemies(String),
}

/// Problems converting a content record into an engine value.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("record #{index} is missing field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("record '{id}' has unknown scene type '{kind}'")]
    UnknownSceneType { id: String, kind: String },
    #[error("record '{id}' is malformed: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown character template '{0}'")]
    UnknownTemplate(String),
}

/// Why a purchase was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("merchant does not stock '{0}'")]
    UnknownItem(String),
    #[error("'{0}' is sold out")]
    OutOfStock(String),
    #[error("costs {price} gp but only {gold} gp available")]
    CannotAfford { price: u32, gold: u32 },
}
