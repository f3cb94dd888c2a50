use crate::plane::LimitPlane;
use crate::system::ConstraintSystem;

/// On-disk problem description consumed by front-ends.
///
/// Deliberately plain: the planes in entry order, the objective triple and
/// the direction flag. Everything else (solutions, events, pending edits) is
/// runtime state that never leaves the process.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProblemDocument {
    pub planes: Vec<LimitPlane>,
    pub objective: [f64; 3],
    #[serde(default)]
    pub minimize: bool,
}

impl ProblemDocument {
    /// Build a live constraint system out of the description.
    pub fn into_system(self) -> ConstraintSystem {
        let mut system = ConstraintSystem::new();
        for plane in self.planes {
            system.add_limit_plane(plane);
        }
        system.set_objective(self.objective);
        system.minimize = self.minimize;
        system
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_system_drops_degenerate_planes() {
        let document = ProblemDocument {
            planes: vec![
                LimitPlane::le([1.0, 0.0, 0.0], 1.0),
                LimitPlane::le([0.0, 0.0, 0.0], 0.0),
            ],
            objective: [1.0, 2.0, 0.0],
            minimize: true,
        };

        let mut system = document.into_system();
        assert_eq!(system.equation_count(), 1);
        assert_eq!(system.objective(), [1.0, 2.0, 0.0]);
        assert!(system.minimize);
    }
}
