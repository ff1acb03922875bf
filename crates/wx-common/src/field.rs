//! Gridded fields: named coordinate axes plus data variables.
//!
//! A [`Field`] mirrors a small self-describing dataset. Coordinate axes keep
//! the names the data source used (`latitude`, `lon`, `valid_time`, ...) until
//! the coordinate normalizer standardizes them. Every variable stores its
//! values row-major with the spatial axes last, so a variable with dims
//! `[time, lat, lon]` holds `ntime` contiguous lat × lon slices.
//!
//! Fields are immutable: every transformation returns a new field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coords::infer_coordinates;
use crate::error::{WxError, WxResult};
use crate::grid::GeoGrid;

/// Free-form string attributes attached to fields and variables.
pub type Attributes = BTreeMap<String, String>;

/// Descriptive metadata for a data variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMeta {
    pub name: String,
    pub units: String,
    pub long_name: String,
}

impl VariableMeta {
    pub fn new(name: impl Into<String>, units: impl Into<String>, long_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            long_name: long_name.into(),
        }
    }
}

/// An n-dimensional array of `f32` values with named dimensions.
///
/// Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    meta: VariableMeta,
    dims: Vec<String>,
    shape: Vec<usize>,
    values: Vec<f32>,
    attrs: Attributes,
}

impl Variable {
    /// Create a variable, checking that dims, shape and values agree.
    pub fn new(
        meta: VariableMeta,
        dims: Vec<String>,
        shape: Vec<usize>,
        values: Vec<f32>,
    ) -> WxResult<Self> {
        if dims.len() != shape.len() {
            return Err(WxError::InvalidField(format!(
                "variable {} has {} dims but shape {:?}",
                meta.name,
                dims.len(),
                shape
            )));
        }

        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(WxError::InvalidField(format!(
                "variable {} has shape {:?} ({} values) but {} values were given",
                meta.name,
                shape,
                expected,
                values.len()
            )));
        }

        Ok(Self {
            meta,
            dims,
            shape,
            values,
            attrs: Attributes::new(),
        })
    }

    /// Replace the attribute map.
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Set a single attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Same layout and metadata, new name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.meta.name = name.into();
        self
    }

    /// Same layout and metadata with a different value buffer.
    pub fn with_values(&self, values: Vec<f32>) -> WxResult<Self> {
        Variable::new(self.meta.clone(), self.dims.clone(), self.shape.clone(), values)
            .map(|v| v.with_attrs(self.attrs.clone()))
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn units(&self) -> &str {
        &self.meta.units
    }

    pub fn long_name(&self) -> &str {
        &self.meta.long_name
    }

    pub fn meta(&self) -> &VariableMeta {
        &self.meta
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of a named dimension.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Select `indices` along `axis`, in the given order.
    pub fn take(&self, axis: usize, indices: &[usize]) -> WxResult<Self> {
        let n = self.shape[axis];
        if let Some(bad) = indices.iter().find(|&&i| i >= n) {
            return Err(WxError::InvalidField(format!(
                "index {} out of range for dim {} of {} (size {})",
                bad, self.dims[axis], self.meta.name, n
            )));
        }

        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();

        let mut values = Vec::with_capacity(outer * indices.len() * inner);
        for o in 0..outer {
            let base = o * n * inner;
            for &k in indices {
                let start = base + k * inner;
                values.extend_from_slice(&self.values[start..start + inner]);
            }
        }

        let mut shape = self.shape.clone();
        shape[axis] = indices.len();

        Ok(Self {
            meta: self.meta.clone(),
            dims: self.dims.clone(),
            shape,
            values,
            attrs: self.attrs.clone(),
        })
    }

    /// Select a single index along `axis` and drop that dimension.
    pub fn select(&self, axis: usize, index: usize) -> WxResult<Self> {
        let mut taken = self.take(axis, &[index])?;
        taken.dims.remove(axis);
        taken.shape.remove(axis);
        Ok(taken)
    }

    /// Rename a dimension in place of the dims list.
    fn rename_dim(&mut self, from: &str, to: &str) {
        for dim in self.dims.iter_mut().filter(|d| d.as_str() == from) {
            *dim = to.to_string();
        }
    }
}

/// A gridded dataset: coordinate axes, data variables and global attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    coords: BTreeMap<String, Vec<f64>>,
    variables: BTreeMap<String, Variable>,
    attrs: Attributes,
}

impl Field {
    /// Create a field, checking every variable dimension that has a
    /// coordinate axis matches the axis length.
    pub fn new(
        coords: BTreeMap<String, Vec<f64>>,
        variables: Vec<Variable>,
        attrs: Attributes,
    ) -> WxResult<Self> {
        let mut by_name = BTreeMap::new();

        for var in variables {
            for (dim, &size) in var.dims.iter().zip(var.shape.iter()) {
                if let Some(axis) = coords.get(dim) {
                    if axis.len() != size {
                        return Err(WxError::InvalidField(format!(
                            "variable {} has {} points along {} but the coordinate has {}",
                            var.name(),
                            size,
                            dim,
                            axis.len()
                        )));
                    }
                }
            }

            if by_name.insert(var.name().to_string(), var).is_some() {
                return Err(WxError::InvalidField("duplicate variable name".to_string()));
            }
        }

        Ok(Self {
            coords,
            variables: by_name,
            attrs,
        })
    }

    /// Build a field on a grid with coordinates named `lat` and `lon`.
    pub fn on_grid(grid: &GeoGrid, variables: Vec<Variable>, attrs: Attributes) -> WxResult<Self> {
        let mut coords = BTreeMap::new();
        coords.insert("lat".to_string(), grid.lat().to_vec());
        coords.insert("lon".to_string(), grid.lon().to_vec());
        Field::new(coords, variables, attrs)
    }

    pub fn coords(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.coords
    }

    /// Values of a coordinate axis.
    pub fn coord(&self, name: &str) -> Option<&[f64]> {
        self.coords.get(name).map(Vec::as_slice)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Look up a variable, failing with `VariableNotFound`.
    pub fn require_variable(&self, name: &str) -> WxResult<&Variable> {
        self.variables.get(name).ok_or_else(|| {
            WxError::variable_not_found(
                name,
                format!("field with variables {:?}", self.variable_names()),
            )
        })
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// New field with an extra global attribute.
    pub fn with_attr(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut field = self.clone();
        field.attrs.insert(key.into(), value.into());
        field
    }

    /// True when `name` is a coordinate axis or a dimension of any variable.
    pub fn has_axis(&self, name: &str) -> bool {
        self.coords.contains_key(name)
            || self
                .variables
                .values()
                .any(|v| v.dims.iter().any(|d| d == name))
    }

    /// Size of every named dimension (coordinate lengths and variable dims).
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        let mut sizes: BTreeMap<String, usize> = self
            .coords
            .iter()
            .map(|(name, values)| (name.clone(), values.len()))
            .collect();

        for var in self.variables.values() {
            for (dim, &size) in var.dims.iter().zip(var.shape.iter()) {
                sizes.entry(dim.clone()).or_insert(size);
            }
        }

        sizes
    }

    /// Resolve the lat/lon axes and build the field's grid.
    ///
    /// Fails with `GridMismatch` when either axis cannot be resolved and with
    /// `InvalidGrid` when an axis is not a valid grid axis.
    pub fn geo_grid(&self) -> WxResult<GeoGrid> {
        let names = infer_coordinates(self);
        let (lat_name, lon_name) = names.require_spatial()?;

        let lat = self.coord(lat_name).ok_or_else(|| {
            WxError::GridMismatch(format!("latitude dimension {} has no coordinate values", lat_name))
        })?;
        let lon = self.coord(lon_name).ok_or_else(|| {
            WxError::GridMismatch(format!("longitude dimension {} has no coordinate values", lon_name))
        })?;

        GeoGrid::new(lat.to_vec(), lon.to_vec())
    }

    /// Select `indices` along a named dimension in every coordinate and variable.
    pub fn take_axis(&self, dim: &str, indices: &[usize]) -> WxResult<Self> {
        let mut coords = self.coords.clone();
        if let Some(axis) = coords.get_mut(dim) {
            let mut taken = Vec::with_capacity(indices.len());
            for &i in indices {
                let value = axis.get(i).copied().ok_or_else(|| {
                    WxError::InvalidField(format!("index {} out of range for coordinate {}", i, dim))
                })?;
                taken.push(value);
            }
            *axis = taken;
        }

        let variables = self
            .variables
            .values()
            .map(|var| match var.axis_of(dim) {
                Some(axis) => var.take(axis, indices),
                None => Ok(var.clone()),
            })
            .collect::<WxResult<Vec<_>>>()?;

        Field::new(coords, variables, self.attrs.clone())
    }

    /// Select one index along a named dimension, dropping the dimension.
    pub fn select_index(&self, dim: &str, index: usize) -> WxResult<Self> {
        let mut coords = self.coords.clone();
        coords.remove(dim);

        let variables = self
            .variables
            .values()
            .map(|var| match var.axis_of(dim) {
                Some(axis) => var.select(axis, index),
                None => Ok(var.clone()),
            })
            .collect::<WxResult<Vec<_>>>()?;

        Field::new(coords, variables, self.attrs.clone())
    }

    /// Replace the values of one coordinate axis, keeping its length.
    pub fn with_coord(&self, name: &str, values: Vec<f64>) -> WxResult<Self> {
        match self.coords.get(name) {
            Some(existing) if existing.len() == values.len() => {
                let mut field = self.clone();
                field.coords.insert(name.to_string(), values);
                Ok(field)
            }
            Some(existing) => Err(WxError::InvalidField(format!(
                "coordinate {} has {} points, replacement has {}",
                name,
                existing.len(),
                values.len()
            ))),
            None => Err(WxError::InvalidField(format!("no coordinate named {}", name))),
        }
    }

    /// Rename an axis in coordinates and variable dims.
    pub fn rename_axis(&self, from: &str, to: &str) -> WxResult<Self> {
        if from == to {
            return Ok(self.clone());
        }
        if self.has_axis(to) {
            return Err(WxError::InvalidField(format!(
                "cannot rename {} to {}: axis already exists",
                from, to
            )));
        }

        let mut field = self.clone();
        if let Some(values) = field.coords.remove(from) {
            field.coords.insert(to.to_string(), values);
        }
        for var in field.variables.values_mut() {
            var.rename_dim(from, to);
        }
        Ok(field)
    }

    /// Rename a data variable.
    pub fn rename_variable(&self, from: &str, to: &str) -> WxResult<Self> {
        if from == to {
            return Ok(self.clone());
        }
        let mut field = self.clone();
        let var = field
            .variables
            .remove(from)
            .ok_or_else(|| WxError::variable_not_found(from, "field"))?;
        field.variables.insert(to.to_string(), var.renamed(to));
        Ok(field)
    }

    /// Keep only the named variables.
    pub fn retain_variables(&self, names: &[&str]) -> Self {
        let mut field = self.clone();
        field.variables.retain(|name, _| names.contains(&name.as_str()));
        field
    }
}
