use serde::Deserialize;
use utoipa::IntoParams;

use wristband_monitor_domain::entities::IngestRequest;

/// Query parameters sent by a wristband.
///
/// Values are kept as raw strings; numbers are parsed leniently by the domain layer.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngestQuery {
    /// Device identifier (required)
    pub id: Option<String>,

    /// Heart rate in BPM (required, non-zero)
    pub hr: Option<String>,

    /// Skin temperature in °C (optional, defaults to 0)
    pub temp: Option<String>,

    /// Blood oxygen saturation in percent (required, non-zero)
    pub spo2: Option<String>,
}

impl From<&IngestQuery> for IngestRequest {
    fn from(query: &IngestQuery) -> Self {
        IngestRequest::from_raw(
            query.id.as_deref(),
            query.hr.as_deref(),
            query.temp.as_deref(),
            query.spo2.as_deref(),
        )
    }
}
