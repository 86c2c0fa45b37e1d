use chrono::{DateTime, Utc};

/// Outcome signals carried by a candidate decision, as described in §4.9.
/// `completeness_score` is part of the signal set a candidate carries but
/// does not feed the relevance formula below — kept here for callers that
/// want to surface it alongside relevance, not for scoring.
#[derive(Debug, Clone)]
pub struct OutcomeSignals {
    pub precedent_citation_count: u32,
    pub conflict_wins: u32,
    pub conflict_losses: u32,
    pub agreement_count: u32,
    pub supersession_velocity_hours: Option<f64>,
    pub assessment_score: Option<f64>,
    pub completeness_score: f64,
    pub valid_from: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Candidate<T> {
    pub item: T,
    pub raw_similarity: f64,
    pub signals: OutcomeSignals,
}

#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub relevance: f64,
}

fn outcome_weight(signals: &OutcomeSignals) -> f64 {
    let citation_score = (signals.precedent_citation_count as f64 / 5.0).min(1.0);

    let total_decisions = signals.conflict_wins + signals.conflict_losses;
    let conflict_win_rate = if total_decisions > 0 {
        signals.conflict_wins as f64 / total_decisions as f64
    } else {
        0.0
    };

    let agreement_score = (signals.agreement_count as f64 / 3.0).min(1.0);

    let stability_score = match signals.supersession_velocity_hours {
        None => 1.0,
        Some(hours) if hours >= 48.0 => 1.0,
        Some(_) => 0.0,
    };

    let assessment = signals.assessment_score.unwrap_or(0.0);

    0.25 * citation_score
        + 0.10 * conflict_win_rate
        + 0.15 * agreement_score
        + 0.15 * stability_score
        + 0.40 * assessment
}

fn recency_decay(valid_from: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_days = (now - valid_from).num_seconds() as f64 / 86_400.0;
    let age_days = age_days.max(0.0);
    1.0 / (1.0 + age_days / 90.0)
}

/// Pure transform from raw similarities into user-facing relevance: no I/O,
/// `now` supplied by the caller so this stays testable and deterministic.
/// Sorts descending by relevance and truncates to `limit`.
pub fn rerank<T>(candidates: Vec<Candidate<T>>, now: DateTime<Utc>, limit: usize) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .map(|c| {
            let weight = outcome_weight(&c.signals);
            let decay = recency_decay(c.signals.valid_from, now);
            let relevance = (c.raw_similarity * (0.5 + 0.5 * weight) * decay).clamp(0.0, 1.0);
            Ranked { item: c.item, relevance }
        })
        .collect();

    ranked.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signals(valid_from: DateTime<Utc>) -> OutcomeSignals {
        OutcomeSignals {
            precedent_citation_count: 0,
            conflict_wins: 0,
            conflict_losses: 0,
            agreement_count: 0,
            supersession_velocity_hours: None,
            assessment_score: None,
            completeness_score: 0.5,
            valid_from,
        }
    }

    #[test]
    fn relevance_is_bounded() {
        let now = Utc::now();
        let candidates = vec![Candidate {
            item: "a",
            raw_similarity: 1.5, // out-of-range input still clamps output
            signals: signals(now),
        }];
        let ranked = rerank(candidates, now, 10);
        assert!(ranked[0].relevance <= 1.0);
        assert!(ranked[0].relevance >= 0.0);
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let now = Utc::now();
        let candidates = vec![
            Candidate { item: "low", raw_similarity: 0.1, signals: signals(now) },
            Candidate { item: "high", raw_similarity: 0.9, signals: signals(now) },
            Candidate { item: "mid", raw_similarity: 0.5, signals: signals(now) },
        ];
        let ranked = rerank(candidates, now, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item, "high");
        assert_eq!(ranked[1].item, "mid");
    }

    #[test]
    fn conflict_win_rate_is_zero_with_no_history() {
        let mut s = signals(Utc::now());
        s.conflict_wins = 0;
        s.conflict_losses = 0;
        assert_eq!(outcome_weight(&s) - 0.15 /* stability */, 0.0);
    }

    #[test]
    fn older_decisions_decay_toward_lower_relevance() {
        let now = Utc::now();
        let fresh = Candidate { item: "fresh", raw_similarity: 0.8, signals: signals(now) };
        let old = Candidate {
            item: "old",
            raw_similarity: 0.8,
            signals: signals(now - Duration::days(365)),
        };
        let ranked = rerank(vec![fresh, old], now, 10);
        let fresh_score = ranked.iter().find(|r| r.item == "fresh").unwrap().relevance;
        let old_score = ranked.iter().find(|r| r.item == "old").unwrap().relevance;
        assert!(fresh_score > old_score);
    }

    #[test]
    fn stability_requires_48_hours_when_superseded() {
        let now = Utc::now();
        let mut unstable = signals(now);
        unstable.supersession_velocity_hours = Some(2.0);
        let mut stable = signals(now);
        stable.supersession_velocity_hours = Some(72.0);
        assert!(outcome_weight(&stable) > outcome_weight(&unstable));
    }
}
