use super::domain::{BloodGroup, ResponderCandidate, UserRole};

/// Narrow located candidates to the ones appropriate for the request.
///
/// Without a required blood group every candidate is eligible (a general
/// alert). With one, hospitals always pass (assumed to have supply chains)
/// and donors pass only when their own group serves the requested one —
/// exact match or universal donor O-.
pub fn filter_eligible(
    candidates: Vec<ResponderCandidate>,
    required: Option<BloodGroup>,
) -> Vec<ResponderCandidate> {
    let Some(required) = required else {
        return candidates;
    };

    candidates
        .into_iter()
        .filter(|candidate| match candidate.role {
            UserRole::Hospital => true,
            UserRole::Donor => candidate
                .blood_group
                .is_some_and(|group| group.serves(required)),
            _ => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::geo::GeoPoint;
    use crate::dispatch::domain::UserId;

    fn candidate(id: &str, role: UserRole, blood_group: Option<BloodGroup>) -> ResponderCandidate {
        ResponderCandidate {
            user: UserId(id.to_string()),
            name: id.to_string(),
            role,
            location: GeoPoint::new(22.57, 88.36).expect("valid point"),
            blood_group,
            phone: "+910000000000".to_string(),
            push_token: None,
            distance_km: 1.2,
        }
    }

    #[test]
    fn no_required_group_keeps_everyone() {
        let candidates = vec![
            candidate("hospital-1", UserRole::Hospital, None),
            candidate("donor-1", UserRole::Donor, Some(BloodGroup::BPositive)),
        ];
        let eligible = filter_eligible(candidates.clone(), None);
        assert_eq!(eligible, candidates);
    }

    #[test]
    fn hospitals_are_always_retained() {
        for required in [BloodGroup::APositive, BloodGroup::AbNegative] {
            let eligible = filter_eligible(
                vec![candidate("hospital-1", UserRole::Hospital, None)],
                Some(required),
            );
            assert_eq!(eligible.len(), 1);
        }
    }

    #[test]
    fn donors_must_match_or_be_universal() {
        let eligible = filter_eligible(
            vec![
                candidate("donor-match", UserRole::Donor, Some(BloodGroup::APositive)),
                candidate("donor-mismatch", UserRole::Donor, Some(BloodGroup::BPositive)),
                candidate("donor-universal", UserRole::Donor, Some(BloodGroup::ONegative)),
                candidate("donor-unknown", UserRole::Donor, None),
            ],
            Some(BloodGroup::APositive),
        );

        let ids: Vec<&str> = eligible.iter().map(|c| c.user.0.as_str()).collect();
        assert_eq!(ids, vec!["donor-match", "donor-universal"]);
    }
}
