//! Factorization demo driver
//!
//! Fills a matrix with seeded pseudo-random values, runs one factorization,
//! prints the factors and the mean absolute reconstruction error.
//!
//! Usage:
//!     cargo run --bin linalg -- qrhh -v
//!     cargo run --bin linalg -- plu --size 6 --seed 7

use anyhow::Context;
use clap::{Parser, ValueEnum};
use math_audio_factorization::dense::{mean_abs_error, orthogonality_error, render};
use math_audio_factorization::{
    EchelonForm, EliminationConfig, LogTrace, NoTrace, TraceSink, back_substitution, eliminate,
    gram_schmidt_qr_traced, householder_qr_traced, lu_traced, plu_traced,
};
use ndarray::{Array1, Array2, array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(
    name = "linalg",
    about = "Factorize a pseudo-random dense matrix and report the reconstruction error"
)]
struct Cli {
    /// Operation to run
    #[arg(value_enum)]
    command: Command,

    /// Print every intermediate factorization step
    #[arg(short, long)]
    verbose: bool,

    /// Size of the square input matrix (ignored by `bs`)
    #[arg(long, default_value_t = 5)]
    size: usize,

    /// Random seed for the input matrix
    #[arg(long, default_value_t = 2)]
    seed: u64,

    /// Decimals shown when printing matrices
    #[arg(long, default_value_t = 4)]
    precision: usize,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Command {
    /// QR factorization with Householder reflections
    Qrhh,
    /// QR factorization with the Gram-Schmidt method
    Qrgs,
    /// LU decomposition without pivoting
    Lu,
    /// LU decomposition with partial pivoting
    Plu,
    /// Gaussian elimination with pivots, augmented with the identity
    Ge,
    /// Gauss-Jordan elimination, augmented with the identity (inverse)
    Gj,
    /// Back substitution on a fixed 10x10 upper-triangular system
    Bs,
}

/// Matrix with entries drawn uniformly from `[-9, 9]`, rounded to one decimal.
fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| {
        (rng.random_range(-9.0..=9.0_f64) * 10.0).round() / 10.0
    })
}

/// Upper-triangular 10x10 system used by the `bs` command.
fn triangular_system() -> (Array2<f64>, Array1<f64>) {
    let diagonal = [1.0, 3.0, 1.0, 1.0, 1.0, 8.0, 1.0, 1.0, 2.0, 8.0];
    let superdiagonal = [2.0, 1.0, 4.0, 1.0, 3.0, 2.0, 5.0, 1.0, 3.0];
    let mut a = Array2::<f64>::zeros((10, 10));
    for i in 0..10 {
        a[[i, i]] = diagonal[i];
        if i < 9 {
            a[[i, i + 1]] = superdiagonal[i];
        }
    }
    let b = array![7.0, 8.0, 5.5, 9.7, 9.1, 0.8, 3.1, 0.2, 9.9, 9.0];
    (a, b)
}

fn print_matrix(label: &str, m: &Array2<f64>, precision: usize) {
    println!("{label}=");
    print!("{}", render(m.view(), precision));
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut sink: Box<dyn TraceSink<f64>> = if cli.verbose {
        Box::new(LogTrace {
            precision: cli.precision,
        })
    } else {
        Box::new(NoTrace)
    };

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let p = cli.precision;

    match cli.command {
        Command::Qrhh | Command::Qrgs => {
            let a = random_matrix(&mut rng, cli.size, cli.size);
            print_matrix("A", &a, p);

            let qr = match cli.command {
                Command::Qrhh => householder_qr_traced(&a, &mut *sink),
                _ => gram_schmidt_qr_traced(&a, &mut *sink),
            }
            .context("QR factorization failed")?;

            print_matrix("Q", &qr.q, p);
            print_matrix("R", &qr.r, p);
            let product = qr.q.dot(&qr.r);
            print_matrix("QR", &product, p);
            println!("Mean Error=\n{:.6e}", mean_abs_error(a.view(), product.view()));
            println!(
                "Orthogonality Error=\n{:.6e}",
                orthogonality_error(qr.q.view())
            );
        }
        Command::Lu => {
            let a = random_matrix(&mut rng, cli.size, cli.size);
            print_matrix("A", &a, p);

            let f = lu_traced(&a, &mut *sink).context("LU decomposition failed")?;
            print_matrix("L", &f.l, p);
            print_matrix("U", &f.u, p);
            let product = f.l.dot(&f.u);
            println!("Mean Error=\n{:.6e}", mean_abs_error(a.view(), product.view()));
        }
        Command::Plu => {
            let a = random_matrix(&mut rng, cli.size, cli.size);
            print_matrix("A", &a, p);

            let f = plu_traced(&a, &mut *sink).context("PLU decomposition failed")?;
            print_matrix("P", &f.p, p);
            print_matrix("L", &f.l, p);
            print_matrix("U", &f.u, p);
            let pa = f.p.dot(&a);
            let product = f.l.dot(&f.u);
            println!("Mean Error=\n{:.6e}", mean_abs_error(pa.view(), product.view()));
            println!("Determinant=\n{:.6}", f.determinant()?);
        }
        Command::Ge | Command::Gj => {
            let a = random_matrix(&mut rng, cli.size, cli.size);
            let b = Array2::<f64>::eye(cli.size);
            print_matrix("A", &a, p);
            print_matrix("B", &b, p);

            let form = match cli.command {
                Command::Ge => EchelonForm::RowEchelon,
                _ => EchelonForm::ReducedRowEchelon,
            };
            let result = eliminate(&a, &b, form, &EliminationConfig::default(), &mut *sink)
                .context("elimination failed")?;
            print_matrix("A^", &result.a, p);
            print_matrix("B^", &result.b, p);

            if let EchelonForm::ReducedRowEchelon = form {
                let product = a.dot(&result.b);
                let eye = Array2::<f64>::eye(cli.size);
                println!("Inverse Error=\n{:.6e}", mean_abs_error(product.view(), eye.view()));
            }
        }
        Command::Bs => {
            let (a, b) = triangular_system();
            print_matrix("A", &a, p);
            println!("b=\n{}", b);

            let x = back_substitution(a.view(), b.view()).context("back substitution failed")?;
            println!("x=\n{}", x);
            let residual = a.dot(&x) - &b;
            let max_residual = residual.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()));
            println!("Max Residual=\n{:.6e}", max_residual);
        }
    }

    Ok(())
}
