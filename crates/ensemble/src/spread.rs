//! Per-cell ensemble mean and spread.

use tracing::{debug, info};
use wx_common::{Field, Variable, VariableMeta, WxError, WxResult};

/// Member variables stacked along an ensemble axis, in input order.
///
/// All members share one shape; cell `c` of member `m` is
/// `members[m].values()[c]`.
#[derive(Debug, Clone)]
pub struct EnsembleStack {
    variable: String,
    members: Vec<Variable>,
}

impl EnsembleStack {
    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn n_members(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[Variable] {
        &self.members
    }

    /// Shape shared by every member.
    pub fn shape(&self) -> &[usize] {
        self.members.first().map_or(&[][..], |m| m.shape())
    }

    /// Number of cells per member.
    pub fn n_cells(&self) -> usize {
        self.members.first().map_or(0, Variable::len)
    }

    /// Every member's value at one flattened cell.
    pub fn cell(&self, index: usize) -> impl Iterator<Item = f32> + '_ {
        self.members.iter().map(move |m| m.values()[index])
    }
}

/// Output of [`compute_spread`].
#[derive(Debug, Clone)]
pub struct Spread {
    /// Per-cell ensemble mean on the first member's coordinates.
    pub mean: Field,
    /// Per-cell population standard deviation on the first member's coordinates.
    pub std: Field,
    pub stack: EnsembleStack,
}

/// Mean and population standard deviation of the finite values of one cell.
///
/// NaN when no value is finite. A cell whose values are all equal has a
/// spread of exactly zero.
pub fn cell_stats(values: impl Iterator<Item = f32>) -> (f32, f32) {
    let finite: Vec<f64> = values.filter(|v| !v.is_nan()).map(f64::from).collect();
    let Some(&first) = finite.first() else {
        return (f32::NAN, f32::NAN);
    };
    if finite.iter().all(|&v| v == first) {
        return (first as f32, 0.0);
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean as f32, var.sqrt() as f32)
}

/// Stack `variable` from every field and compute the per-cell mean and
/// spread.
///
/// Requires at least two fields with identical dimension sizes, each holding
/// `variable`. NaN members are skipped cell by cell.
pub fn compute_spread(fields: &[Field], variable: &str) -> WxResult<Spread> {
    info!(members = fields.len(), variable, "Computing ensemble spread");

    if fields.len() < 2 {
        return Err(WxError::InsufficientMembers(fields.len()));
    }

    let first = &fields[0];
    let reference = first.sizes();
    for (i, field) in fields.iter().enumerate().skip(1) {
        let sizes = field.sizes();
        if sizes != reference {
            return Err(WxError::GridMismatch(format!(
                "member {} has sizes {:?}, member 0 has {:?}",
                i, sizes, reference
            )));
        }
    }

    let mut members = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let var = field
            .variable(variable)
            .ok_or_else(|| WxError::variable_not_found(variable, format!("member {}", i)))?;
        members.push(var.clone());
    }

    if let Some(i) = members.iter().position(|m| m.shape() != members[0].shape()) {
        return Err(WxError::GridMismatch(format!(
            "{} in member {} has shape {:?}, member 0 has {:?}",
            variable,
            i,
            members[i].shape(),
            members[0].shape()
        )));
    }

    let stack = EnsembleStack {
        variable: variable.to_string(),
        members,
    };

    let (mean_values, std_values): (Vec<f32>, Vec<f32>) =
        (0..stack.n_cells()).map(|c| cell_stats(stack.cell(c))).unzip();

    let template = &stack.members[0];
    let n = stack.n_members().to_string();
    let mean = statistic_field(first, template, "ensemble mean", "mean", &n, mean_values)?;
    let std = statistic_field(first, template, "ensemble spread", "std", &n, std_values)?;

    let mean_std = finite_mean(std.variable(variable).map_or(&[][..], Variable::values));
    info!(variable, mean_std, "Ensemble spread computed");
    debug!(shape = ?stack.shape(), "Ensemble stack");

    Ok(Spread { mean, std, stack })
}

fn statistic_field(
    first: &Field,
    template: &Variable,
    label: &str,
    statistic: &str,
    members: &str,
    values: Vec<f32>,
) -> WxResult<Field> {
    let meta = VariableMeta::new(
        template.name(),
        template.units(),
        format!("{} of {}", label, template.long_name()),
    );
    let var = Variable::new(meta, template.dims().to_vec(), template.shape().to_vec(), values)?
        .with_attr("ensemble_statistic", statistic)
        .with_attr("ensemble_members", members);

    Field::new(first.coords().clone(), vec![var], first.attrs().clone())
}

/// Mean of the non-NaN values, NaN when there are none.
pub(crate) fn finite_mean(values: &[f32]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, constant_field, grid_field, regular_axis};

    fn axes() -> (Vec<f64>, Vec<f64>) {
        (regular_axis(40.0, 2.0, 3), regular_axis(-10.0, 5.0, 4))
    }

    #[test]
    fn test_cell_stats() {
        let (mean, std) = cell_stats([1.0, 2.0, 3.0, 4.0].into_iter());
        assert_approx_eq!(mean, 2.5, 1e-6);
        assert_approx_eq!(std, 1.118034, 1e-6);
    }

    #[test]
    fn test_cell_stats_equal_values_zero_spread() {
        let (mean, std) = cell_stats([0.1, 0.1, 0.1].into_iter());
        assert_eq!(mean, 0.1);
        assert_eq!(std, 0.0);
    }

    #[test]
    fn test_cell_stats_skips_nan() {
        let (mean, std) = cell_stats([f32::NAN, 2.0, 4.0].into_iter());
        assert_approx_eq!(mean, 3.0, 1e-6);
        assert_approx_eq!(std, 1.0, 1e-6);

        let (mean, std) = cell_stats([f32::NAN, f32::NAN].into_iter());
        assert!(mean.is_nan() && std.is_nan());
    }

    #[test]
    fn test_insufficient_members() {
        let (lat, lon) = axes();
        let one = vec![constant_field(lat, lon, "t2m", 1.0)];
        assert!(matches!(compute_spread(&one, "t2m"), Err(WxError::InsufficientMembers(1))));
        assert!(matches!(compute_spread(&[], "t2m"), Err(WxError::InsufficientMembers(0))));
    }

    #[test]
    fn test_shape_mismatch() {
        let (lat, lon) = axes();
        let a = constant_field(lat.clone(), lon, "t2m", 1.0);
        let b = constant_field(lat, regular_axis(-10.0, 5.0, 5), "t2m", 1.0);
        assert!(matches!(compute_spread(&[a, b], "t2m"), Err(WxError::GridMismatch(_))));
    }

    #[test]
    fn test_missing_variable() {
        let (lat, lon) = axes();
        let a = constant_field(lat.clone(), lon.clone(), "t2m", 1.0);
        let b = constant_field(lat, lon, "u10", 1.0);
        match compute_spread(&[a, b], "t2m") {
            Err(WxError::VariableNotFound { variable, context }) => {
                assert_eq!(variable, "t2m");
                assert_eq!(context, "member 1");
            }
            other => panic!("expected VariableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_outputs_on_first_member_coordinates() {
        let (lat, lon) = axes();
        let a = grid_field(lat.clone(), lon.clone(), "t2m", (0..12).map(|v| v as f32).collect());
        let b = grid_field(lat.clone(), lon, "t2m", (0..12).map(|v| v as f32 + 2.0).collect());

        let spread = compute_spread(&[a, b], "t2m").unwrap();
        assert_eq!(spread.stack.n_members(), 2);
        assert_eq!(spread.mean.coord("lat").unwrap(), lat.as_slice());

        let mean = spread.mean.variable("t2m").unwrap();
        assert_eq!(mean.values()[0], 1.0);
        assert_eq!(mean.attrs().get("ensemble_statistic").map(String::as_str), Some("mean"));

        let std = spread.std.variable("t2m").unwrap();
        assert!(std.values().iter().all(|&v| v == 1.0));
        assert_eq!(std.attrs().get("ensemble_members").map(String::as_str), Some("2"));
    }
}
