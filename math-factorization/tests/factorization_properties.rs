//! Structural properties of the factorizations on random and hand-picked
//! matrices.

use approx::assert_relative_eq;
use math_audio_factorization::dense::{
    is_permutation_matrix, is_reduced_row_echelon, is_row_echelon, is_unit_lower_triangular,
    is_upper_triangular, max_abs_diff, orthogonality_error,
};
use math_audio_factorization::{
    FactorizationError, HouseholderWorkspace, LuConfig, Pivoting, TraceEvent, TraceRecorder,
    TraceSink, back_substitution, gauss_jordan_elimination, gaussian_elimination,
    gram_schmidt_qr, gram_schmidt_qr_traced, householder_qr, householder_qr_traced, invert,
    least_squares, lu, lu_solve, lu_traced, plu, plu_traced,
};
use ndarray::{Array1, Array2, array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-10;

fn random_matrix(seed: u64, rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-9.0..=9.0))
}

/// Counts events and can pretend to be switched off.
struct CountingSink {
    enabled: bool,
    events: usize,
}

impl<T> TraceSink<T> for CountingSink {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn record(&mut self, _event: &TraceEvent<'_, T>) {
        self.events += 1;
    }
}

#[test]
fn householder_properties_on_random_matrices() {
    for seed in 0..8 {
        for (m, n) in [(1, 1), (3, 3), (5, 5), (6, 4), (3, 5)] {
            let a = random_matrix(seed, m, n);
            let qr = householder_qr(&a).unwrap();

            assert_eq!(qr.q.dim(), (m, m));
            assert_eq!(qr.r.dim(), (m, n));
            assert!(orthogonality_error(qr.q.view()) < TOL, "Q not orthogonal for {m}x{n}");
            assert!(is_upper_triangular(qr.r.view(), 0.0));
            assert!(max_abs_diff(qr.q.dot(&qr.r).view(), a.view()) < TOL);
        }
    }
}

#[test]
fn gram_schmidt_properties_on_random_matrices() {
    for seed in 0..8 {
        for (m, n) in [(1, 1), (4, 4), (5, 5), (7, 3)] {
            let a = random_matrix(seed, m, n);
            let qr = gram_schmidt_qr(&a).unwrap();

            assert_eq!(qr.q.dim(), (m, n));
            assert_eq!(qr.r.dim(), (n, n));
            assert!(orthogonality_error(qr.q.view()) < 1e-8);
            assert!(is_upper_triangular(qr.r.view(), 0.0));
            assert!(qr.r.diag().iter().all(|&d| d > 0.0));
            assert!(max_abs_diff(qr.q.dot(&qr.r).view(), a.view()) < TOL);
        }
    }
}

#[test]
fn gram_schmidt_flags_dependent_column() {
    let a = array![[1.0_f64, 2.0], [2.0, 4.0], [3.0, 6.0]];
    let mut recorder = TraceRecorder::<f64>::new();
    let qr = gram_schmidt_qr_traced(&a, &mut recorder).unwrap();

    assert_eq!(qr.r[[1, 1]], 0.0);
    assert!(qr.q.column(1).iter().all(|&x| x == 0.0));
    assert!(!qr.is_full_rank(1e-12));
    assert!(max_abs_diff(qr.q.dot(&qr.r).view(), a.view()) < TOL);
    assert_eq!(recorder.len(), 2);
}

#[test]
fn householder_matches_gram_schmidt_up_to_signs() {
    let a = array![[12.0_f64, -51.0, 4.0], [6.0, 167.0, -68.0], [-4.0, 24.0, -41.0]];
    let hh = householder_qr(&a).unwrap();
    let gs = gram_schmidt_qr(&a).unwrap();

    for k in 0..3 {
        assert_relative_eq!(hh.r[[k, k]].abs(), gs.r[[k, k]], epsilon = 1e-9);
    }
    assert_relative_eq!(gs.r[[0, 0]], 14.0, epsilon = 1e-12);
    assert_relative_eq!(gs.r[[1, 1]], 175.0, epsilon = 1e-9);
    assert_relative_eq!(gs.r[[2, 2]], 35.0, epsilon = 1e-9);
}

#[test]
fn householder_workspace_is_reusable() {
    let mut ws = HouseholderWorkspace::<f64>::new(4, 3);
    let first = random_matrix(1, 4, 3);
    let second = random_matrix(2, 4, 3);

    let a = ws.factorize(&first, &mut math_audio_factorization::NoTrace).unwrap();
    let b = ws.factorize(&second, &mut math_audio_factorization::NoTrace).unwrap();
    assert_eq!(a, householder_qr(&first).unwrap());
    assert_eq!(b, householder_qr(&second).unwrap());

    let err = ws
        .factorize(&Array2::zeros((3, 3)), &mut math_audio_factorization::NoTrace)
        .unwrap_err();
    assert_eq!(
        err,
        FactorizationError::DimensionMismatch {
            expected: (4, 3),
            got: (3, 3)
        }
    );
}

#[test]
fn plu_properties_on_random_matrices() {
    for seed in 0..8 {
        for n in 1..=6 {
            let a = random_matrix(seed, n, n);
            let f = plu(&a).unwrap();

            assert!(is_permutation_matrix(f.p.view()));
            assert!(is_unit_lower_triangular(f.l.view(), 0.0));
            assert!(is_upper_triangular(f.u.view(), 0.0));
            assert!(f.l.iter().all(|&x| x.abs() <= 1.0));
            assert!(max_abs_diff(f.p.dot(&a).view(), f.l.dot(&f.u).view()) < TOL);
        }
    }
}

#[test]
fn plain_lu_rejects_zero_leading_entry() {
    let a = array![[0.0_f64, 1.0], [1.0, 1.0]];
    assert_eq!(
        lu(&a).unwrap_err(),
        FactorizationError::SingularMatrix { step: 0 }
    );

    let f = plu(&a).unwrap();
    assert_eq!(f.permutation, vec![1, 0]);
    assert_eq!(f.row_swaps, 1);
}

#[test]
fn lu_reconstructs_diagonally_dominant_matrix() {
    let a = array![[10.0_f64, 2.0, 1.0], [1.0, 8.0, -2.0], [2.0, -1.0, 9.0]];
    let f = lu(&a).unwrap();
    assert!(is_unit_lower_triangular(f.l.view(), 0.0));
    assert!(is_upper_triangular(f.u.view(), 0.0));
    assert!(max_abs_diff(f.l.dot(&f.u).view(), a.view()) < TOL);
}

#[test]
fn lu_solve_and_least_squares_agree_on_square_system() {
    let a = random_matrix(11, 5, 5);
    let x_true = array![1.0_f64, -2.0, 0.5, 3.0, -1.5];
    let b = a.dot(&x_true);

    let x_lu = lu_solve(&a, &b).unwrap();
    let x_ls = least_squares(&a, &b).unwrap();
    for i in 0..5 {
        assert_relative_eq!(x_lu[i], x_true[i], epsilon = 1e-9);
        assert_relative_eq!(x_ls[i], x_true[i], epsilon = 1e-9);
    }
}

#[test]
fn least_squares_on_consistent_tall_system() {
    let a = array![[1.0_f64, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let b = array![1.0_f64, 2.0, 3.0];
    let x = least_squares(&a, &b).unwrap();
    assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);

    let wide = Array2::<f64>::zeros((2, 3));
    assert_eq!(
        least_squares(&wide, &array![1.0, 2.0]).unwrap_err(),
        FactorizationError::Underdetermined { rows: 2, cols: 3 }
    );
}

#[test]
fn elimination_forms_on_random_matrices() {
    for seed in 0..6 {
        let a = random_matrix(seed, 4, 4);
        let b = random_matrix(seed + 100, 4, 2);

        let reff = gaussian_elimination(&a, &b).unwrap();
        assert!(is_row_echelon(reff.a.view(), 0.0));

        let rref = gauss_jordan_elimination(&a, &b).unwrap();
        assert!(is_reduced_row_echelon(rref.a.view(), 1e-12));
        // For nonsingular A the reduced system is I x = A^{-1} b.
        assert!(max_abs_diff(a.dot(&rref.b).view(), b.view()) < 1e-9);
    }
}

#[test]
fn gauss_jordan_inverse() {
    let a = array![[4.0_f64, 7.0, 2.0], [3.0, 6.0, 1.0], [2.0, 5.0, 3.0]];
    let inv = invert(&a).unwrap();
    let eye = Array2::<f64>::eye(3);
    assert!(max_abs_diff(a.dot(&inv).view(), eye.view()) < TOL);
    assert!(max_abs_diff(inv.dot(&a).view(), eye.view()) < TOL);
}

#[test]
fn back_substitution_on_bidiagonal_system() {
    let diagonal = [1.0, 3.0, 1.0, 1.0, 1.0, 8.0, 1.0, 1.0, 2.0, 8.0];
    let superdiagonal = [2.0, 1.0, 4.0, 1.0, 3.0, 2.0, 5.0, 1.0, 3.0];
    let mut a = Array2::<f64>::zeros((10, 10));
    for i in 0..10 {
        a[[i, i]] = diagonal[i];
        if i < 9 {
            a[[i, i + 1]] = superdiagonal[i];
        }
    }
    let b = array![7.0_f64, 8.0, 5.5, 9.7, 9.1, 0.8, 3.1, 0.2, 9.9, 9.0];

    let x = back_substitution(a.view(), b.view()).unwrap();
    assert_relative_eq!(x[9], 9.0 / 8.0, epsilon = 1e-15);
    let residual: Array1<f64> = a.dot(&x) - &b;
    assert!(residual.iter().all(|r| r.abs() < 1e-10));
}

#[test]
fn back_substitution_reports_zero_diagonal() {
    let a = array![[1.0_f64, 2.0], [0.0, 0.0]];
    let b = array![1.0_f64, 1.0];
    assert_eq!(
        back_substitution(a.view(), b.view()).unwrap_err(),
        FactorizationError::ZeroDiagonal { index: 1 }
    );
}

#[test]
fn factorizations_are_deterministic() {
    let a = random_matrix(42, 6, 6);
    assert_eq!(householder_qr(&a).unwrap(), householder_qr(&a).unwrap());
    assert_eq!(gram_schmidt_qr(&a).unwrap(), gram_schmidt_qr(&a).unwrap());
    assert_eq!(plu(&a).unwrap(), plu(&a).unwrap());

    let b = Array2::eye(6);
    assert_eq!(
        gauss_jordan_elimination(&a, &b).unwrap(),
        gauss_jordan_elimination(&a, &b).unwrap()
    );
}

#[test]
fn one_by_one_boundaries() {
    let a = array![[-3.0_f64]];

    let hh = householder_qr(&a).unwrap();
    assert_eq!(hh.q, array![[1.0]]);
    assert_eq!(hh.r, array![[-3.0]]);

    let gs = gram_schmidt_qr(&a).unwrap();
    assert_eq!(gs.q, array![[-1.0]]);
    assert_eq!(gs.r, array![[3.0]]);

    let f = lu(&a).unwrap();
    assert_eq!(f.l, array![[1.0]]);
    assert_eq!(f.u, array![[-3.0]]);

    assert_eq!(invert(&a).unwrap(), array![[-1.0 / 3.0]]);
    assert_eq!(
        lu(&array![[0.0_f64]]).unwrap_err(),
        FactorizationError::SingularMatrix { step: 0 }
    );
}

#[test]
fn empty_input_is_rejected() {
    let a = Array2::<f64>::zeros((0, 3));
    assert_eq!(householder_qr(&a).unwrap_err(), FactorizationError::EmptyMatrix);
    assert_eq!(gram_schmidt_qr(&a).unwrap_err(), FactorizationError::EmptyMatrix);
    assert_eq!(plu(&a).unwrap_err(), FactorizationError::EmptyMatrix);
}

#[test]
fn disabled_sink_receives_nothing() {
    let a = random_matrix(3, 4, 4);

    let mut off = CountingSink {
        enabled: false,
        events: 0,
    };
    householder_qr_traced(&a, &mut off).unwrap();
    gram_schmidt_qr_traced(&a, &mut off).unwrap();
    plu_traced(&a, &mut off).unwrap();
    assert_eq!(off.events, 0);

    let mut on = CountingSink {
        enabled: true,
        events: 0,
    };
    householder_qr_traced(&a, &mut on).unwrap();
    plu_traced(&a, &mut on).unwrap();
    // Three reflections and four pivot steps.
    assert_eq!(on.events, 3 + 4);
}

#[test]
fn closure_sink_observes_lu_steps() {
    let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
    let mut pivots = Vec::new();
    lu_traced(&a, &mut |event: &TraceEvent<'_, f64>| {
        if let TraceEvent::LuStep { pivot, .. } = *event {
            pivots.push(pivot);
        }
    })
    .unwrap();
    assert_eq!(pivots, vec![4.0, -1.5]);
}

#[test]
fn pivot_tolerance_rejects_tiny_pivots() {
    let a = array![[1.0_f64, 2.0], [1.0, 2.0 + 1e-14]];
    assert!(plu(&a).is_ok());

    let config = LuConfig::default().with_pivot_tolerance(1e-10);
    let err = math_audio_factorization::lu::decompose(
        &a,
        &config,
        &mut math_audio_factorization::NoTrace,
    )
    .unwrap_err();
    assert!(err.is_singular());

    let unpivoted = LuConfig::default().with_pivoting(Pivoting::None);
    assert_eq!(unpivoted, LuConfig::unpivoted());
}

#[test]
fn single_precision_factorizations() {
    let a = array![[2.0_f32, 1.0, 1.0], [4.0, -6.0, 0.0], [-2.0, 7.0, 2.0]];

    let f = plu(&a).unwrap();
    assert!(max_abs_diff(f.p.dot(&a).view(), f.l.dot(&f.u).view()) < 1e-5);

    let qr = householder_qr(&a).unwrap();
    assert!(orthogonality_error(qr.q.view()) < 1e-5);
    assert!(max_abs_diff(qr.q.dot(&qr.r).view(), a.view()) < 1e-4);

    let x = lu_solve(&a, &array![5.0_f32, -2.0, 9.0]).unwrap();
    assert_relative_eq!(x[0], 1.0, epsilon = 1e-5);
    assert_relative_eq!(x[1], 1.0, epsilon = 1e-5);
    assert_relative_eq!(x[2], 2.0, epsilon = 1e-5);
}
