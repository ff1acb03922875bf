//! Field regridding onto a target grid.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use wx_common::coords::{normalize, standardize_coordinates};
use wx_common::{Field, GeoGrid, Variable, WxError, WxResult};

use crate::cache::{WeightCache, WeightStore};
use crate::config::RegridConfig;
use crate::types::{RegridMethod, WeightKey};
use crate::weights::{build_weights, RegridWeights};

/// Regrids fields onto target grids, reusing weights through a shared
/// [`WeightCache`] and, when configured, a [`WeightStore`] on disk.
#[derive(Debug, Clone)]
pub struct Regridder {
    cache: Arc<WeightCache>,
    store: Option<WeightStore>,
    config: RegridConfig,
}

impl Regridder {
    /// Create a regridder. Persistence is enabled when the config names a
    /// weights directory and allows reuse.
    pub fn new(cache: Arc<WeightCache>, config: RegridConfig) -> Self {
        let store = config.persistence_dir().map(WeightStore::new);
        Self {
            cache,
            store,
            config,
        }
    }

    pub fn config(&self) -> &RegridConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<WeightCache> {
        &self.cache
    }

    /// Regrid with the configured default method.
    pub fn regrid_default(&self, field: &Field, target: &GeoGrid) -> WxResult<Field> {
        self.regrid(field, target, self.config.method)
    }

    /// Regrid every spatial variable of `field` onto `target`.
    ///
    /// Variables whose trailing dimensions are not (lat, lon) are dropped.
    /// The output names its spatial axes `lat` and `lon` and records the
    /// method and both grid shapes in its attributes.
    #[instrument(skip(self, field, target, method), fields(method = %method))]
    pub fn regrid(&self, field: &Field, target: &GeoGrid, method: RegridMethod) -> WxResult<Field> {
        let prepared = standardize_coordinates(&normalize(field)?)?;
        let source_shape = coord_shape(&prepared);
        let target = target
            .normalized()
            .map_err(|e| grid_failure(e, method, source_shape, target.shape()))?;
        let source = prepared
            .geo_grid()
            .map_err(|e| grid_failure(e, method, source_shape, target.shape()))?;

        info!(
            source_lat = source.shape().0,
            source_lon = source.shape().1,
            target_lat = target.shape().0,
            target_lon = target.shape().1,
            "Regridding field"
        );

        let weights = self.weights_for(&source, &target, method)?;

        let mut variables = Vec::new();
        for var in prepared.variables() {
            match regrid_variable(var, &weights)? {
                Some(v) => variables.push(v),
                None => warn!(
                    variable = var.name(),
                    dims = ?var.dims(),
                    "Dropping variable without trailing lat/lon dimensions"
                ),
            }
        }

        let mut coords: BTreeMap<String, Vec<f64>> = prepared
            .coords()
            .iter()
            .filter(|(name, _)| {
                name.as_str() != "lat"
                    && name.as_str() != "lon"
                    && variables.iter().any(|v| v.dims().contains(*name))
            })
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();
        coords.insert("lat".to_string(), target.lat().to_vec());
        coords.insert("lon".to_string(), target.lon().to_vec());

        let mut attrs = field.attrs().clone();
        attrs.insert("regrid_method".to_string(), method.to_string());
        attrs.insert("regrid_source_shape".to_string(), shape_attr(source.shape()));
        attrs.insert("regrid_target_shape".to_string(), shape_attr(target.shape()));

        let out = Field::new(coords, variables, attrs)?;
        info!(sizes = ?out.sizes(), "Regridding complete");
        Ok(out)
    }

    /// Weights for a grid pair, computed once per signature.
    pub fn weights_for(
        &self,
        source: &GeoGrid,
        target: &GeoGrid,
        method: RegridMethod,
    ) -> WxResult<Arc<RegridWeights>> {
        let key = WeightKey::new(method, source, target, self.config.periodic);

        self.cache.get_or_compute(&key, || {
            if let Some(weights) = self.store.as_ref().and_then(|s| s.load(&key)) {
                return Ok(weights);
            }

            info!(method = %method, "Building regridding weights");
            let weights = build_weights(method, source, target, self.config.periodic)?;

            if let Some(store) = &self.store {
                if let Err(e) = store.save(&key, &weights) {
                    warn!(error = %e, "Failed to persist weights");
                }
            }
            Ok(weights)
        })
    }

    /// Regrid several fields onto one grid, in order. Fails on the first
    /// field that cannot be regridded.
    pub fn regrid_to_common_grid(
        &self,
        fields: &[Field],
        target: &GeoGrid,
        method: RegridMethod,
    ) -> WxResult<Vec<Field>> {
        info!(count = fields.len(), "Regridding fields to common grid");

        fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                info!(index = i + 1, total = fields.len(), "Regridding field");
                self.regrid(field, target, method)
            })
            .collect()
    }
}

fn coord_shape(field: &Field) -> (usize, usize) {
    let len = |name: &str| field.coord(name).map_or(0, <[f64]>::len);
    (len("lat"), len("lon"))
}

/// Turn an invalid grid axis into a regrid failure.
fn grid_failure(
    err: WxError,
    method: RegridMethod,
    source_shape: (usize, usize),
    target_shape: (usize, usize),
) -> WxError {
    match err {
        WxError::InvalidGrid(reason) => WxError::RegridFailure {
            method: method.to_string(),
            source_shape,
            target_shape,
            reason,
        },
        other => other,
    }
}

fn regrid_variable(var: &Variable, weights: &RegridWeights) -> WxResult<Option<Variable>> {
    let dims = var.dims();
    let n = dims.len();
    if n < 2 || dims[n - 2] != "lat" || dims[n - 1] != "lon" {
        return Ok(None);
    }

    let slice_len = weights.n_sources();
    let mut values = Vec::with_capacity(var.len() / slice_len.max(1) * weights.n_targets());
    for slice in var.values().chunks(slice_len.max(1)) {
        values.extend(weights.apply_slice(slice)?);
    }

    let mut shape = var.shape().to_vec();
    let (tl, tn) = weights.target_shape();
    shape[n - 2] = tl;
    shape[n - 1] = tn;

    Variable::new(var.meta().clone(), dims.to_vec(), shape, values)
        .map(|v| Some(v.with_attrs(var.attrs().clone())))
}

fn shape_attr((nlat, nlon): (usize, usize)) -> String {
    format!("{{lat: {}, lon: {}}}", nlat, nlon)
}
