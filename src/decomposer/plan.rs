//! Expansion of an action into the legs that become low-level intents.

use crate::action::{mesh, Action, Subject, Tracker};
use crate::config::DecompositionConfig;

/// One source/destination pair to realize as a single low-level intent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Leg {
    pub source: Subject,
    pub destination: Subject,
    /// The intent carries traffic both ways
    pub bidirectional: bool,
}

impl Leg {
    fn new(source: &Subject, destination: &Subject, bidirectional: bool) -> Self {
        Self {
            source: source.clone(),
            destination: destination.clone(),
            bidirectional,
        }
    }
}

/// Legs for `action` in key order.
///
/// Bidirectional mode wins when both modes are enabled. A connection takes
/// one bidirectional leg or a forward and a reverse leg; a path is always a
/// single leg; a mesh goes through the mesh decomposer first.
pub(crate) fn plan(
    action: &Action,
    config: &DecompositionConfig,
    tracker: &mut Tracker,
) -> Vec<Leg> {
    let bidirectional = config.bidirectional;
    match action {
        Action::Connection(c) if bidirectional => vec![Leg::new(&c.source, &c.destination, true)],
        Action::Connection(c) => vec![
            Leg::new(&c.source, &c.destination, false),
            Leg::new(&c.destination, &c.source, false),
        ],
        Action::Path(p) => vec![Leg::new(&p.source, &p.destination, bidirectional)],
        Action::Mesh(m) if bidirectional => mesh::decompose_bidirectional(m, tracker)
            .into_iter()
            .map(|c| Leg {
                source: c.source,
                destination: c.destination,
                bidirectional: true,
            })
            .collect(),
        Action::Mesh(m) => mesh::decompose(m, tracker)
            .into_iter()
            .map(|p| Leg {
                source: p.source,
                destination: p.destination,
                bidirectional: false,
            })
            .collect(),
    }
}
