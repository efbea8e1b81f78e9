//! Constraint model and per-category constraint selection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A requirement attached to a connection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constraint {
    /// Minimum bandwidth in bits per second
    Bandwidth(f64),
    /// Maximum tolerated latency
    Latency(Duration),
    Encryption,
    HighAvailability,
    Availability,
    Restoration,
    /// The request accepts a degraded alternative when the original
    /// constraints cannot be met
    Negotiable,
}

impl Constraint {
    pub fn bandwidth_mbps(mbps: f64) -> Self {
        Constraint::Bandwidth(mbps * 1_000_000.0)
    }

    pub fn latency_ms(ms: u64) -> Self {
        Constraint::Latency(Duration::from_millis(ms))
    }
}

/// Picks one representative constraint per category out of the source-side,
/// destination-side and request-level candidate lists.
///
/// Selection is deterministic: the same inputs and levels always produce
/// the same list.
///
/// ```
/// use dismi::constraint::{Constraint, ConstraintSelector};
///
/// let src = vec![Constraint::bandwidth_mbps(10.0), Constraint::latency_ms(40)];
/// let dst = vec![Constraint::bandwidth_mbps(100.0), Constraint::Encryption];
/// let selected = ConstraintSelector::new(&src, &dst, &[]).select(0, 0, 0);
///
/// assert_eq!(
///     selected,
///     vec![
///         Constraint::bandwidth_mbps(100.0),
///         Constraint::latency_ms(40),
///         Constraint::Encryption,
///     ]
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConstraintSelector<'a> {
    source: &'a [Constraint],
    destination: &'a [Constraint],
    request: &'a [Constraint],
}

impl<'a> ConstraintSelector<'a> {
    pub fn new(
        source: &'a [Constraint],
        destination: &'a [Constraint],
        request: &'a [Constraint],
    ) -> Self {
        Self {
            source,
            destination,
            request,
        }
    }

    /// Select the `bw_level`-th highest bandwidth, the `delay_level`-th
    /// lowest latency and the first encryption, high-availability and
    /// availability constraint, in that order.
    ///
    /// A level at or beyond the size of its bucket omits that category.
    /// `_security_level` is accepted for symmetry; encryption always takes its
    /// first candidate.
    pub fn select(
        &self,
        bw_level: usize,
        delay_level: usize,
        _security_level: usize,
    ) -> Vec<Constraint> {
        let mut bandwidth: Vec<(f64, &Constraint)> = Vec::new();
        let mut latency: Vec<(Duration, &Constraint)> = Vec::new();
        let mut encryption = None;
        let mut high_availability = None;
        let mut availability = None;

        let all = self
            .source
            .iter()
            .chain(self.destination)
            .chain(self.request);
        for constraint in all {
            match constraint {
                // A NaN bandwidth has no rank
                Constraint::Bandwidth(bps) if bps.is_nan() => {}
                Constraint::Bandwidth(bps) => bandwidth.push((*bps, constraint)),
                Constraint::Latency(d) => latency.push((*d, constraint)),
                Constraint::Encryption => {
                    encryption.get_or_insert(constraint);
                }
                Constraint::HighAvailability => {
                    high_availability.get_or_insert(constraint);
                }
                Constraint::Availability => {
                    availability.get_or_insert(constraint);
                }
                Constraint::Restoration | Constraint::Negotiable => {}
            }
        }

        // Stable sorts keep input order among equal magnitudes
        bandwidth.sort_by(|a, b| b.0.total_cmp(&a.0));
        latency.sort_by_key(|(d, _)| *d);

        let mut selected = Vec::with_capacity(5);
        if let Some((_, c)) = bandwidth.get(bw_level) {
            selected.push((*c).clone());
        }
        if let Some((_, c)) = latency.get(delay_level) {
            selected.push((*c).clone());
        }
        selected.extend(
            [encryption, high_availability, availability]
                .into_iter()
                .flatten()
                .cloned(),
        );
        selected
    }
}
