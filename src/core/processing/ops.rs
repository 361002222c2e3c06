//! Named-parameter maps for the engine operators applied to each product.
use std::path::Path;

use crate::core::params::{C2rccParams, ProcessingParams};
use crate::io::engine::{OperatorParams, ParamValue};
use crate::types::OutputLayers;

pub const RESAMPLE_OPERATOR: &str = "Resample";
pub const SUBSET_OPERATOR: &str = "Subset";

/// Regrid all bands to `target_resolution`.
pub fn resample_params(params: &ProcessingParams) -> OperatorParams {
    OperatorParams::new()
        .with(
            "targetResolution",
            ParamValue::Int(i64::from(params.target_resolution)),
        )
        .with("upsampling", ParamValue::Text(params.upsampling.clone()))
        .with("downsampling", ParamValue::Text(params.downsampling.clone()))
        .with(
            "resampleOnPyramidLevels",
            ParamValue::Bool(params.resample_on_pyramid_levels),
        )
}

/// Clip to the vector file at `aoi`.
pub fn subset_params(params: &ProcessingParams, aoi: &Path) -> OperatorParams {
    OperatorParams::new().with(
        &params.subset_parameter,
        ParamValue::Text(aoi.display().to_string()),
    )
}

/// C2RCC physical constants followed by one boolean per output layer.
pub fn retrieval_params(c2rcc: &C2rccParams, layers: &OutputLayers) -> OperatorParams {
    OperatorParams::new()
        .with("salinity", ParamValue::Float(c2rcc.salinity))
        .with("temperature", ParamValue::Float(c2rcc.temperature))
        .with("ozone", ParamValue::Float(c2rcc.ozone))
        .with("press", ParamValue::Float(c2rcc.pressure))
        .with("outputAsRrs", ParamValue::Bool(layers.rrs))
        .with("outputAcReflectance", ParamValue::Bool(layers.ac_reflectance))
        .with("outputIop", ParamValue::Bool(layers.iop))
        .with("outputIopBio", ParamValue::Bool(layers.iop_bio))
        .with("outputKd", ParamValue::Bool(layers.kd))
        .with("outputUncertainties", ParamValue::Bool(layers.uncertainties))
        .with("outputTotalConc", ParamValue::Bool(layers.total_concentrations))
}
