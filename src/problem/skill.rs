use fixedbitset::FixedBitSet;

/// Set of skills over a problem-wide universe of skill indices.
///
/// Vehicles advertise skills, jobs require them, and the solution-state
/// cache keeps the union of skills present on each route so insertions can
/// be rejected without walking the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillSet(FixedBitSet);

impl SkillSet {
    pub fn empty(universe: usize) -> Self {
        SkillSet(FixedBitSet::with_capacity(universe))
    }

    pub fn from_indices(universe: usize, skills: &[usize]) -> Self {
        let mut set = SkillSet::empty(universe);
        for &skill in skills {
            set.insert(skill);
        }
        set
    }

    pub fn insert(&mut self, skill: usize) {
        if skill >= self.0.len() {
            self.0.grow(skill + 1);
        }
        self.0.insert(skill);
    }

    /// True iff every skill in `required` is present in `self`.
    pub fn covers(&self, required: &SkillSet) -> bool {
        required.0.is_subset(&self.0)
    }

    pub fn union_with(&mut self, other: &SkillSet) {
        self.0.union_with(&other.0);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_clear(&self) -> bool {
        self.0.is_clear()
    }
}
