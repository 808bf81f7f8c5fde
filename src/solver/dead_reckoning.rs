//! Reference incremental solver.
//!
//! Integrates constraints directly instead of solving a least-squares
//! system: priors pin poses, between-factors dead-reckon the target pose
//! from the source, and sightings place landmarks/walls from the observing
//! pose. Re-observations blend toward the newest sighting. This gives the
//! demo binary and integration tests meaningful estimates while the real
//! smoother lives behind the same trait in deployments.

use std::collections::HashMap;

use crate::core::types::{Point2D, Pose2D};
use crate::graph::{Constraint, Factor, Solution, Symbol, Value};

use super::{IncrementalSolver, SolverError};

/// Blend weight applied to repeated landmark/wall sightings.
const RESIGHT_BLEND: f32 = 0.5;

/// Constraint-integrating solver with no linear algebra.
#[derive(Debug, Default)]
pub struct DeadReckoningSolver {
    estimates: HashMap<Symbol, Value>,
    factors_seen: u64,
}

impl DeadReckoningSolver {
    /// Create an empty solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total factors folded in since the last reset.
    pub fn factor_count(&self) -> u64 {
        self.factors_seen
    }

    fn pose(&self, sym: Symbol) -> Result<Pose2D, SolverError> {
        self.estimates
            .get(&sym)
            .and_then(Value::as_pose)
            .ok_or(SolverError::UnknownSymbol(sym))
    }

    fn endpoint(factor: &Factor, i: usize) -> Result<Symbol, SolverError> {
        factor.endpoints.get(i).copied().ok_or_else(|| {
            SolverError::Degenerate(format!(
                "factor with {} endpoints, expected at least {}",
                factor.endpoints.len(),
                i + 1
            ))
        })
    }

    fn apply(&mut self, factor: &Factor) -> Result<(), SolverError> {
        // Every endpoint must already hold a value; the mapper defers
        // factors until that is true, so a miss here is a contract breach.
        for &sym in &factor.endpoints {
            if !self.estimates.contains_key(&sym) {
                return Err(SolverError::UnknownSymbol(sym));
            }
        }

        match factor.constraint {
            Constraint::PriorPose { pose, .. } => {
                let sym = Self::endpoint(factor, 0)?;
                self.estimates.insert(sym, Value::Pose(pose));
            }
            Constraint::BetweenPose { delta, .. } => {
                let from = Self::endpoint(factor, 0)?;
                let to = Self::endpoint(factor, 1)?;
                let integrated = self.pose(from)?.compose(&delta);
                self.estimates.insert(to, Value::Pose(integrated));
            }
            Constraint::LandmarkSighting { offset, .. } => {
                let pose_sym = Self::endpoint(factor, 0)?;
                let lm_sym = Self::endpoint(factor, 1)?;
                let observed = self.pose(pose_sym)?.transform_point(&offset);
                let blended = match self.estimates.get(&lm_sym).and_then(Value::as_landmark) {
                    Some(prev) => Point2D::new(
                        prev.x + (observed.x - prev.x) * RESIGHT_BLEND,
                        prev.y + (observed.y - prev.y) * RESIGHT_BLEND,
                    ),
                    None => observed,
                };
                self.estimates.insert(lm_sym, Value::Landmark(blended));
            }
            Constraint::WallSighting { line, .. } => {
                let pose_sym = Self::endpoint(factor, 0)?;
                let wall_sym = Self::endpoint(factor, 1)?;
                let observed = line.transformed(&self.pose(pose_sym)?);
                self.estimates.insert(wall_sym, Value::Wall(observed));
            }
        }
        Ok(())
    }
}

impl IncrementalSolver for DeadReckoningSolver {
    fn submit(
        &mut self,
        values: &[(Symbol, Value)],
        factors: &[Factor],
    ) -> Result<Solution, SolverError> {
        // Validate the whole batch before touching state: a failed batch
        // must not be partially applied.
        for &(sym, _) in values {
            if self.estimates.contains_key(&sym) {
                return Err(SolverError::DuplicateValue(sym));
            }
        }
        let mut staged = self.estimates.clone();
        for &(sym, value) in values {
            staged.insert(sym, value);
        }
        let mut trial = Self {
            estimates: staged,
            factors_seen: self.factors_seen,
        };
        for factor in factors {
            trial.apply(factor)?;
            trial.factors_seen += 1;
        }
        *self = trial;

        let mut solution = Solution::new();
        for (&sym, &value) in &self.estimates {
            solution.insert(sym, value);
        }
        Ok(solution)
    }

    fn reset(&mut self) {
        self.estimates.clear();
        self.factors_seen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Information2D;
    use approx::assert_relative_eq;

    fn info() -> Information2D {
        Information2D::default()
    }

    #[test]
    fn test_prior_pins_pose() {
        let mut solver = DeadReckoningSolver::new();
        let x0 = Symbol::pose(0);
        let sol = solver
            .submit(
                &[(x0, Value::Pose(Pose2D::identity()))],
                &[Factor::prior(x0, Pose2D::new(1.0, 2.0, 0.0), info())],
            )
            .unwrap();
        assert_relative_eq!(sol.get_pose(x0).unwrap().x, 1.0);
        assert_relative_eq!(sol.get_pose(x0).unwrap().y, 2.0);
    }

    #[test]
    fn test_between_dead_reckons() {
        let mut solver = DeadReckoningSolver::new();
        let x0 = Symbol::pose(0);
        let x1 = Symbol::pose(1);
        solver
            .submit(
                &[(x0, Value::Pose(Pose2D::identity()))],
                &[Factor::prior(x0, Pose2D::identity(), info())],
            )
            .unwrap();
        let sol = solver
            .submit(
                &[(x1, Value::Pose(Pose2D::identity()))],
                &[Factor::between(x0, x1, Pose2D::new(1.0, 0.0, 0.0), info())],
            )
            .unwrap();
        assert_relative_eq!(sol.get_pose(x1).unwrap().x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_symbol_rejected_without_partial_apply() {
        let mut solver = DeadReckoningSolver::new();
        let x0 = Symbol::pose(0);
        let err = solver
            .submit(
                &[],
                &[Factor::prior(x0, Pose2D::identity(), info())],
            )
            .unwrap_err();
        assert!(matches!(err, SolverError::UnknownSymbol(s) if s == x0));
        assert_eq!(solver.factor_count(), 0);

        // State unchanged: the value can still be inserted later.
        assert!(solver
            .submit(&[(x0, Value::Pose(Pose2D::identity()))], &[])
            .is_ok());
    }

    #[test]
    fn test_duplicate_value_rejected() {
        let mut solver = DeadReckoningSolver::new();
        let x0 = Symbol::pose(0);
        solver
            .submit(&[(x0, Value::Pose(Pose2D::identity()))], &[])
            .unwrap();
        let err = solver
            .submit(&[(x0, Value::Pose(Pose2D::identity()))], &[])
            .unwrap_err();
        assert!(matches!(err, SolverError::DuplicateValue(s) if s == x0));
    }

    #[test]
    fn test_landmark_resight_blends() {
        let mut solver = DeadReckoningSolver::new();
        let x0 = Symbol::pose(0);
        let l0 = Symbol::landmark(0);
        solver
            .submit(
                &[
                    (x0, Value::Pose(Pose2D::identity())),
                    (l0, Value::Landmark(Point2D::new(2.0, 0.0))),
                ],
                &[Factor::landmark_sighting(x0, l0, Point2D::new(2.0, 0.0), info())],
            )
            .unwrap();
        // Second sighting from the same pose at a shifted offset moves the
        // landmark halfway toward the new observation.
        let sol = solver
            .submit(
                &[],
                &[Factor::landmark_sighting(x0, l0, Point2D::new(3.0, 0.0), info())],
            )
            .unwrap();
        let lm = sol.get(l0).unwrap().as_landmark().unwrap();
        assert_relative_eq!(lm.x, 2.5, epsilon = 1e-6);
    }
}
