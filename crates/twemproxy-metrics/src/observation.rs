//! Labelled numeric observations produced by projection.

use crate::descriptor::{MetricDesc, MetricKind};

/// Label set of an observation, determined by the level it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Labels {
    None,
    Pool { pool: String },
    Server { pool: String, server: String },
}

impl Labels {
    pub fn pool(pool: &str) -> Self {
        Labels::Pool {
            pool: pool.to_string(),
        }
    }

    pub fn server(pool: &str, server: &str) -> Self {
        Labels::Server {
            pool: pool.to_string(),
            server: server.to_string(),
        }
    }

    /// `(name, value)` pairs in exposition order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        match self {
            Labels::None => Vec::new(),
            Labels::Pool { pool } => vec![("pool", pool.as_str())],
            Labels::Server { pool, server } => {
                vec![("pool", pool.as_str()), ("server", server.as_str())]
            }
        }
    }
}

/// One sample: metric, labels, value.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: &'static MetricDesc,
    pub labels: Labels,
    pub value: f64,
}

impl Observation {
    pub fn new(metric: &'static MetricDesc, labels: Labels, value: f64) -> Self {
        Self {
            metric,
            labels,
            value,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.metric.kind
    }
}
