use crate::errors::ResolveError;

use std::collections::BTreeMap;
use std::fmt;

/// The role under which an entity was processed. A topic bound to both a
/// producer and a consumer yields one entry per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Cluster,
    Producer,
    Consumer,
    ProducerTopic,
    ConsumerTopic,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Cluster => "cluster",
            Role::Producer => "producer",
            Role::Consumer => "consumer",
            Role::ProducerTopic => "producer topic",
            Role::ConsumerTopic => "consumer topic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved,
    Failed(ResolveError),
}

/// Accumulated result of one resolution pass.
///
/// Failures are recorded per entity and never abort the pass. Entries are
/// keyed deterministically, so two passes over unchanged definitions produce
/// structurally equal reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    entries: BTreeMap<(Role, String), Outcome>,
}

impl ResolutionReport {
    pub fn new() -> Self {
        ResolutionReport::default()
    }

    pub fn record_resolved(&mut self, role: Role, id: &str) {
        self.entries.insert((role, id.to_string()), Outcome::Resolved);
    }

    pub fn record_failure(&mut self, role: Role, id: &str, error: ResolveError) {
        self.entries
            .insert((role, id.to_string()), Outcome::Failed(error));
    }

    pub fn outcome(&self, role: Role, id: &str) -> Option<&Outcome> {
        self.entries.get(&(role, id.to_string()))
    }

    pub fn resolved_count(&self) -> usize {
        self.entries
            .values()
            .filter(|outcome| matches!(outcome, Outcome::Resolved))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.resolved_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (Role, &str, &ResolveError)> {
        self.entries.iter().filter_map(|((role, id), outcome)| {
            match outcome {
                Outcome::Failed(error) => Some((*role, id.as_str(), error)),
                Outcome::Resolved => None,
            }
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "resolution: {} resolved, {} failed",
            self.resolved_count(),
            self.failed_count()
        )?;
        for ((role, id), outcome) in &self.entries {
            match outcome {
                Outcome::Resolved => writeln!(f, "  ok   {} '{}'", role.as_str(), id)?,
                Outcome::Failed(error) => {
                    writeln!(f, "  fail {} '{}': {}", role.as_str(), id, error)?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BindError;

    #[test]
    fn counts_and_lookup() {
        let mut report = ResolutionReport::new();
        report.record_resolved(Role::ProducerTopic, "t1");
        report.record_failure(
            Role::Producer,
            "p1",
            ResolveError::Bind(BindError {
                cause: "boom".to_string(),
            }),
        );

        assert_eq!(report.resolved_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_clean());
        assert_eq!(
            report.outcome(Role::ProducerTopic, "t1"),
            Some(&Outcome::Resolved)
        );
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn reports_with_same_entries_are_equal_regardless_of_order() {
        let mut first = ResolutionReport::new();
        first.record_resolved(Role::ProducerTopic, "t1");
        first.record_resolved(Role::Consumer, "c1");

        let mut second = ResolutionReport::new();
        second.record_resolved(Role::Consumer, "c1");
        second.record_resolved(Role::ProducerTopic, "t1");

        assert_eq!(first, second);
    }

    #[test]
    fn display_lists_every_entry() {
        let mut report = ResolutionReport::new();
        report.record_resolved(Role::ProducerTopic, "t1");
        report.record_failure(
            Role::Producer,
            "p1",
            ResolveError::UnresolvedReference {
                target: "cluster",
                target_id: "missing".to_string(),
            },
        );

        let rendered = report.to_string();
        assert!(rendered.contains("1 resolved, 1 failed"));
        assert!(rendered.contains("ok   producer topic 't1'"));
        assert!(rendered.contains("fail producer 'p1'"));
        assert!(rendered.contains("missing cluster 'missing'"));
    }
}
