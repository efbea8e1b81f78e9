//! Mesh expansion into pairwise connections or paths.

use super::{Connection, Mesh, Path, Tracker};

/// One undirected connection per unordered pair of subjects: C(N,2) results.
pub fn decompose_bidirectional(mesh: &Mesh, tracker: &mut Tracker) -> Vec<Connection> {
    let subjects = &mesh.subjects;
    warn_if_degenerate(mesh);

    let mut connections = Vec::with_capacity(pairs(subjects.len()));
    for (i, a) in subjects.iter().enumerate() {
        for b in &subjects[i + 1..] {
            let mut connection = Connection::new(a.clone(), b.clone());
            connection.id = tracker.next_id();
            connections.push(connection);
        }
    }
    connections
}

/// One directed path per ordered pair of distinct subjects: N(N-1) results.
pub fn decompose(mesh: &Mesh, tracker: &mut Tracker) -> Vec<Path> {
    let subjects = &mesh.subjects;
    warn_if_degenerate(mesh);

    let mut paths = Vec::with_capacity(2 * pairs(subjects.len()));
    for (i, a) in subjects.iter().enumerate() {
        for b in &subjects[i + 1..] {
            let mut forward = Path::new(a.clone(), b.clone());
            forward.id = tracker.next_id();
            let mut reverse = Path::new(b.clone(), a.clone());
            reverse.id = tracker.next_id();
            paths.push(forward);
            paths.push(reverse);
        }
    }
    paths
}

fn pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

fn warn_if_degenerate(mesh: &Mesh) {
    if mesh.subjects.len() < 2 {
        tracing::warn!(
            subjects = mesh.subjects.len(),
            "Mesh has fewer than two subjects, nothing to connect"
        );
    }
}
