use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::DMatrix;
use serde_json::json;
use tracing_subscriber::fmt::SubscriberBuilder;

use sfc::algorithms::{hilbert, morton, peano, sierpinski};
use sfc::config::HullCfg;
use sfc::curve::{CurveInformation, CurveSpecification};
use sfc::geo;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Space-filling curve research toolkit")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Compute the full face lattice of the convex hull of a point set.
    Hull {
        /// Points as `x1,y1,...;x2,y2,...;...` (one vertex per `;`-group).
        #[arg(long)]
        points: String,
    },
    /// Explore a curve specification's reachable states and print the
    /// neighbor/opponent table diagnostics.
    CurveInfo {
        #[arg(long, value_enum)]
        curve: CurveName,
    },
    /// Find a Peano-curve neighbor without materializing the curve.
    PeanoNeighbor {
        #[arg(long, default_value_t = 2)]
        d: usize,
        #[arg(long)]
        pos: u64,
        #[arg(long)]
        dim: usize,
        #[arg(long)]
        backward: bool,
        #[arg(long, default_value_t = 1)]
        levels: u32,
    },
    /// Find a Hilbert-curve neighbor via the table-driven climb.
    HilbertNeighbor {
        #[arg(long, default_value_t = 2)]
        d: usize,
        #[arg(long)]
        level: u32,
        #[arg(long)]
        pos: u64,
        #[arg(long)]
        facet: usize,
    },
    /// Find a Morton-curve neighbor, `O(1)`.
    MortonNeighbor {
        #[arg(long, default_value_t = 2)]
        d: usize,
        #[arg(long)]
        pos: u64,
        #[arg(long)]
        dim: usize,
        #[arg(long)]
        backward: bool,
    },
    /// Find a Sierpinski-curve (2D) neighbor.
    SierpinskiNeighbor {
        #[arg(long)]
        pos: u64,
        #[arg(long)]
        facet: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CurveName {
    Hilbert2,
    Hilbert3,
    Peano2,
    Morton2,
    Sierpinski2,
    Gosper,
    BetaOmega,
}

impl CurveName {
    fn build(self) -> CurveSpecification {
        match self {
            CurveName::Hilbert2 => CurveSpecification::hilbert(2),
            CurveName::Hilbert3 => CurveSpecification::hilbert(3),
            CurveName::Peano2 => CurveSpecification::peano(2, 3),
            CurveName::Morton2 => CurveSpecification::morton(2, 2),
            CurveName::Sierpinski2 => CurveSpecification::sierpinski(2),
            CurveName::Gosper => CurveSpecification::gosper(),
            CurveName::BetaOmega => CurveSpecification::beta_omega(),
        }
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Hull { points } => hull(points),
        Action::CurveInfo { curve } => curve_info(curve),
        Action::PeanoNeighbor { d, pos, dim, backward, levels } => {
            peano_neighbor(d, pos, dim, backward, levels)
        }
        Action::HilbertNeighbor { d, level, pos, facet } => hilbert_neighbor(d, level, pos, facet),
        Action::MortonNeighbor { d, pos, dim, backward } => morton_neighbor(d, pos, dim, backward),
        Action::SierpinskiNeighbor { pos, facet } => sierpinski_neighbor(pos, facet),
    }
}

/// Parses `"x1,y1,...;x2,y2,...;..."` into a `d x n` point matrix.
fn parse_points(points: &str) -> Result<DMatrix<f64>> {
    let rows: Vec<Vec<f64>> = points
        .split(';')
        .filter(|s| !s.trim().is_empty())
        .map(|group| {
            group
                .split(',')
                .map(|c| c.trim().parse::<f64>().context("parsing coordinate"))
                .collect()
        })
        .collect::<Result<_>>()?;

    if rows.is_empty() {
        bail!("no points given");
    }
    let dim = rows[0].len();
    for row in &rows {
        if row.len() != dim {
            bail!("all points must have the same dimension");
        }
    }

    let n = rows.len();
    let mut matrix = DMatrix::zeros(dim, n);
    for (col, row) in rows.iter().enumerate() {
        for (d, &v) in row.iter().enumerate() {
            matrix[(d, col)] = v;
        }
    }
    Ok(matrix)
}

fn hull(points: String) -> Result<()> {
    let matrix = parse_points(&points)?;
    tracing::info!(dim = matrix.nrows(), n = matrix.ncols(), "computing convex hull");
    let polytope = geo::quickhull(&matrix, HullCfg::default())?;
    let face_counts: Vec<usize> = (0..=polytope.dimension())
        .map(|d| polytope.faces_at(d).len())
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!({ "face_counts_by_dim": face_counts }))?);
    Ok(())
}

fn curve_info(curve: CurveName) -> Result<()> {
    let spec = curve.build();
    let num_states = spec.num_states();
    let info = CurveInformation::analyze(spec, HullCfg::default())?;
    let reachable: Vec<bool> = (0..num_states).map(|s| info.is_state_reachable(s)).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "num_states": num_states,
            "num_children": info.num_children(),
            "reachable_states": reachable,
            "has_palindrome_property": info.has_palindrome_property(),
            "opponent_inconsistent": info.opponent_inconsistent(),
        }))?
    );
    Ok(())
}

fn peano_neighbor(d: usize, pos: u64, dim: usize, backward: bool, levels: u32) -> Result<()> {
    let orientation = peano::compute_orientation(d, pos);
    let neighbor = peano::global_neighbor(d, &orientation, pos, dim, backward, levels);
    print_neighbor(neighbor);
    Ok(())
}

fn hilbert_neighbor(d: usize, level: u32, pos: u64, facet: usize) -> Result<()> {
    let b = 1usize << d;
    let spec = match d {
        2 => CurveSpecification::hilbert(2),
        3 => CurveSpecification::hilbert(3),
        _ => bail!("hilbert-neighbor only supports d in {{2, 3}}"),
    };
    let info = CurveInformation::analyze(spec, HullCfg::default())?;
    let finder = hilbert::TableNeighborFinder::new(&info);

    let path = digits_of(pos, b, level);
    match finder.neighbor(&path, facet) {
        Some(neighbor_path) => println!("{}", digits_to_pos(&neighbor_path, b)),
        None => println!("none"),
    }
    Ok(())
}

fn morton_neighbor(d: usize, pos: u64, dim: usize, backward: bool) -> Result<()> {
    println!("{}", morton::neighbor(d, pos, dim, backward));
    Ok(())
}

fn sierpinski_neighbor(pos: u64, facet: u64) -> Result<()> {
    print_neighbor(sierpinski::neighbor(pos, facet));
    Ok(())
}

fn print_neighbor(neighbor: Option<u64>) {
    match neighbor {
        Some(n) => println!("{n}"),
        None => println!("none"),
    }
}

/// `pos`'s base-`b` digits, most-significant (root) first, padded to `level`
/// digits.
fn digits_of(mut pos: u64, b: usize, level: u32) -> Vec<usize> {
    let mut digits = vec![0usize; level as usize];
    for slot in digits.iter_mut().rev() {
        *slot = (pos % b as u64) as usize;
        pos /= b as u64;
    }
    digits
}

fn digits_to_pos(digits: &[usize], b: usize) -> u64 {
    digits.iter().fold(0u64, |acc, &d| acc * b as u64 + d as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_unit_square() {
        let m = parse_points("0,0;1,0;0,1;1,1").unwrap();
        assert_eq!(m.shape(), (2, 4));
        assert_eq!(m[(0, 1)], 1.0);
    }

    #[test]
    fn rejects_ragged_points() {
        assert!(parse_points("0,0;1,0,0").is_err());
    }

    #[test]
    fn digit_roundtrip() {
        let digits = digits_of(0b1011, 2, 4);
        assert_eq!(digits_to_pos(&digits, 2), 0b1011);
    }
}
