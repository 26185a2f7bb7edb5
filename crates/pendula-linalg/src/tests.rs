//! Integration tests for pendula-linalg.

#[cfg(test)]
mod integration_tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::{gauss_eliminate, solve_augmented, DenseMatrix, Pivoting, SolveError, SolverConfig};

    /// A random diagonally dominant (hence well-conditioned) matrix.
    fn well_conditioned(rng: &mut ChaCha8Rng, n: usize) -> DenseMatrix<f64> {
        let mut m = DenseMatrix::zeros(n, n);
        for i in 0..n {
            let mut off_diagonal = 0.0;
            for j in 0..n {
                if i != j {
                    let v: f64 = rng.gen_range(-1.0..1.0);
                    m[(i, j)] = v;
                    off_diagonal += v.abs();
                }
            }
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            m[(i, i)] = sign * (off_diagonal + rng.gen_range(1.0..2.0));
        }
        m
    }

    fn assert_recovers(x: &[f64], expected: &[f64]) {
        for (a, e) in x.iter().zip(expected) {
            assert!(
                (a - e).abs() <= 1e-9 * e.abs().max(1.0),
                "expected {expected:?}, got {x:?}"
            );
        }
    }

    #[test]
    fn test_random_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for n in 1..=8 {
            for _ in 0..10 {
                let a = well_conditioned(&mut rng, n);
                let s: Vec<f64> = (0..n).map(|_| rng.gen_range(-10.0..10.0)).collect();
                let aug = a.augment(&a.mv(&s)).unwrap();

                for pivoting in [Pivoting::Partial, Pivoting::None] {
                    let config = SolverConfig {
                        pivoting,
                        ..SolverConfig::default()
                    };
                    let x = solve_augmented(&aug, &config).unwrap();
                    assert_recovers(&x, &s);
                }
            }
        }
    }

    #[test]
    fn test_permuted_system_needs_pivoting() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut a = well_conditioned(&mut rng, 4);
        // Dropping an off-diagonal entry keeps row 1 dominant; moving it on
        // top leaves a zero in the leading pivot position.
        a[(1, 0)] = 0.0;
        a.swap_rows(0, 1);

        let s = vec![1.0, -2.0, 0.5, 3.0];
        let aug = a.augment(&a.mv(&s)).unwrap();

        assert!(matches!(
            solve_augmented(&aug, &SolverConfig::without_pivoting()),
            Err(SolveError::SingularSystem { column: 0, .. })
        ));
        let x = solve_augmented(&aug, &SolverConfig::default()).unwrap();
        assert_recovers(&x, &s);
    }

    #[test]
    fn test_duplicate_random_rows_are_singular() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for n in 2..=6 {
            let a = well_conditioned(&mut rng, n);
            let mut aug = a.augment(&vec![1.0; n]).unwrap();
            let copy = aug.row(0).to_vec();
            aug.row_mut(n - 1).copy_from_slice(&copy);

            assert!(matches!(
                gauss_eliminate(&mut aug, &SolverConfig::default()),
                Err(SolveError::SingularSystem { .. })
            ));
        }
    }

    #[test]
    fn test_inverse_columns() {
        // Solving against each unit vector builds the inverse.
        let a = DenseMatrix::from_rows(vec![vec![4.0, 7.0], vec![2.0, 6.0]]);
        let config = SolverConfig::default();
        let mut inv = DenseMatrix::zeros(2, 2);
        for j in 0..2 {
            let mut e = vec![0.0; 2];
            e[j] = 1.0;
            let col = a.solve(&e, &config).unwrap();
            for (i, v) in col.into_iter().enumerate() {
                inv[(i, j)] = v;
            }
        }

        let product = a.mm(&inv);
        let id: DenseMatrix<f64> = DenseMatrix::identity(2);
        for i in 0..2 {
            for j in 0..2 {
                assert!((product[(i, j)] - id[(i, j)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_f32_systems() {
        let aug: DenseMatrix<f32> =
            DenseMatrix::from_rows(vec![vec![2.0, 0.0, 1.0], vec![0.0, 4.0, 2.0]]);
        let x = solve_augmented(&aug, &SolverConfig::default()).unwrap();
        assert_eq!(x, vec![0.5f32, 0.5f32]);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use crate::{solve_augmented, DenseMatrix, SolverConfig};

    proptest! {
        #[test]
        fn diagonal_systems_solve_exactly(
            diag in prop::collection::vec(prop_oneof![-100.0f64..-0.5, 0.5f64..100.0], 1..6),
            rhs in prop::collection::vec(-100.0f64..100.0, 6),
        ) {
            let n = diag.len();
            let mut aug = DenseMatrix::zeros(n, n + 1);
            for i in 0..n {
                aug[(i, i)] = diag[i];
                aug[(i, n)] = rhs[i];
            }

            let x = solve_augmented(&aug, &SolverConfig::default()).unwrap();
            for i in 0..n {
                let expected = rhs[i] / diag[i];
                prop_assert!((x[i] - expected).abs() <= 1e-12 * expected.abs().max(1.0));
            }
        }

        #[test]
        fn solution_satisfies_two_by_two(
            a in -10.0f64..10.0, b in -10.0f64..10.0,
            c in -10.0f64..10.0, d in -10.0f64..10.0,
            e in -10.0f64..10.0, f in -10.0f64..10.0,
        ) {
            let det = a * d - b * c;
            prop_assume!(det.abs() > 1e-3);

            let aug = DenseMatrix::from_rows(vec![vec![a, b, e], vec![c, d, f]]);
            let x = solve_augmented(&aug, &SolverConfig::default()).unwrap();

            let expected = [(e * d - b * f) / det, (a * f - e * c) / det];
            for i in 0..2 {
                prop_assert!((x[i] - expected[i]).abs() <= 1e-6 * expected[i].abs().max(1.0));
            }
        }
    }
}
