use super::domain::{BloodGroup, IncidentKind};

const BASE_SCORE: u16 = 10;
const MAX_SCORE: u16 = 100;

/// Keyword groups scanned in the reporter's medical history. Every matching
/// group contributes, they are not mutually exclusive.
const CONDITION_WEIGHTS: &[(&[&str], u16)] = &[
    (&["heart", "cardiac"], 15),
    (&["diabetes", "sugar"], 5),
    (&["asthma", "breathing"], 10),
    (&["pregnant"], 25),
];

/// Rule-based urgency score in `[0, 100]`. Deterministic, no side effects.
pub fn priority_score(
    kind: IncidentKind,
    blood_group: Option<BloodGroup>,
    medical_history: Option<&str>,
) -> u8 {
    let mut score = BASE_SCORE;

    score += kind_weight(kind);

    if let Some(group) = blood_group {
        score += rarity_weight(group);
    }

    if let Some(history) = medical_history {
        let history = history.to_lowercase();
        for (keywords, weight) in CONDITION_WEIGHTS {
            if keywords.iter().any(|keyword| history.contains(keyword)) {
                score += weight;
            }
        }
    }

    score.min(MAX_SCORE) as u8
}

fn kind_weight(kind: IncidentKind) -> u16 {
    match kind {
        IncidentKind::Disaster => 50,
        IncidentKind::Accident => 40,
        IncidentKind::Surgery => 30,
        IncidentKind::BloodRequest => 20,
        IncidentKind::Other => 5,
    }
}

fn rarity_weight(group: BloodGroup) -> u16 {
    match group {
        BloodGroup::AbNegative | BloodGroup::ONegative => 20,
        BloodGroup::ANegative | BloodGroup::BNegative => 10,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disaster_with_rare_blood_and_cardiac_history_scores_95() {
        let score = priority_score(
            IncidentKind::Disaster,
            Some(BloodGroup::ONegative),
            Some("cardiac"),
        );
        assert_eq!(score, 95);
    }

    #[test]
    fn other_without_context_scores_15() {
        assert_eq!(priority_score(IncidentKind::Other, None, None), 15);
    }

    #[test]
    fn score_clamps_at_100() {
        let score = priority_score(
            IncidentKind::Disaster,
            Some(BloodGroup::AbNegative),
            Some("pregnant, known heart condition, asthma"),
        );
        assert_eq!(score, 100);
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let lower = priority_score(IncidentKind::Surgery, None, Some("diabetes"));
        let upper = priority_score(IncidentKind::Surgery, None, Some("DIABETES"));
        assert_eq!(lower, upper);
        assert_eq!(lower, 10 + 30 + 5);
    }

    #[test]
    fn matching_groups_are_additive() {
        let score = priority_score(IncidentKind::Accident, None, Some("asthma and sugar"));
        assert_eq!(score, 10 + 40 + 10 + 5);
    }

    #[test]
    fn common_blood_group_adds_five() {
        let score = priority_score(IncidentKind::BloodRequest, Some(BloodGroup::OPositive), None);
        assert_eq!(score, 10 + 20 + 5);
    }

    #[test]
    fn score_stays_within_bounds_for_all_kinds() {
        for kind in [
            IncidentKind::Accident,
            IncidentKind::Surgery,
            IncidentKind::Disaster,
            IncidentKind::BloodRequest,
            IncidentKind::Other,
        ] {
            let score = priority_score(kind, Some(BloodGroup::AbNegative), Some("pregnant heart"));
            assert!(score <= 100);
        }
    }
}
