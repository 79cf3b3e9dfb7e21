use crate::{jwt::SessionData, schema::PlanTier};

const ACTION_TABLE: &[(PlanTier, &[ActionType])] = &[
    (
        PlanTier::Free,
        &[
            ActionType::ManageOwnPantry,
            ActionType::ManageOwnCollection,
            ActionType::GenerateRecipes,
            ActionType::ScanPantry,
        ],
    ),
    (
        PlanTier::Pro,
        &[
            ActionType::ManageOwnPantry,
            ActionType::ManageOwnCollection,
            ActionType::GenerateRecipes,
            ActionType::ScanPantry,
            ActionType::ViewProDetails,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum ActionType {
    GenerateRecipes,
    ScanPantry,

    ManageOwnPantry,
    ManageOwnCollection,

    /// Nutrition facts, tips and substitutions.
    ViewProDetails,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        ACTION_TABLE
            .iter()
            .find_map(|(plan, actions)| {
                if &session.plan != plan {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pro_details_are_gated_by_plan() {
        let free = SessionData::new("a", PlanTier::Free);
        let pro = SessionData::new("b", PlanTier::Pro);

        assert!(!ActionType::ViewProDetails.authenticate(&free));
        assert!(ActionType::ViewProDetails.authenticate(&pro));
        assert!(ActionType::ManageOwnPantry.authenticate(&free));
    }
}
