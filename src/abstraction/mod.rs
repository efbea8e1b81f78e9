//! Candidate links between abstract connection points.

use crate::endpoint::EndPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One concrete (src, dst) endpoint pair that may realize a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbstractionLink {
    pub src: EndPoint,
    pub dst: EndPoint,
}

impl AbstractionLink {
    pub fn new(src: EndPoint, dst: EndPoint) -> Self {
        Self { src, dst }
    }
}

impl fmt::Display for AbstractionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.src, self.dst)
    }
}

/// All candidate links between two endpoint sets.
///
/// The result is the full Cartesian product in input order, sources in the
/// outer loop. No pruning or deduplication is applied.
pub fn possible_links(src: &[EndPoint], dst: &[EndPoint]) -> Vec<AbstractionLink> {
    src.iter()
        .flat_map(|s| {
            dst.iter()
                .map(move |d| AbstractionLink::new(s.clone(), d.clone()))
        })
        .collect()
}
