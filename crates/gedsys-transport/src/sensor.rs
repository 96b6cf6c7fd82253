//! SensorThings API client.
//!
//! Builds the `$expand`/`$filter` queries that retrieve the latest
//! observation of every Thing inside an event's extent, and follows
//! `@iot.nextLink` pagination when collecting them.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use gedsys_core::domain::error::{GedsysError, Result};
use gedsys_core::store::TransportError;

/// Structural well-formedness check for a WKT polygon.
///
/// Accepts `POLYGON ((x y, x y, ...))` with an outer ring of at least four
/// closed coordinate pairs. Holes after the outer ring are not inspected.
pub fn is_valid_wkt_polygon(text: &str) -> bool {
    let rest = match text.trim().strip_prefix("POLYGON") {
        Some(rest) => rest.trim_start(),
        None => return false,
    };
    let Some(rest) = rest.strip_prefix("((") else {
        return false;
    };
    let Some(interior) = rest.strip_suffix("))") else {
        return false;
    };

    let outer_ring = interior.split("),").next().unwrap_or(interior);
    let points: Vec<&str> = outer_ring.split(',').map(str::trim).collect();
    if points.len() < 4 {
        return false;
    }
    for point in &points {
        let coords: Vec<&str> = point.split_whitespace().collect();
        if coords.len() != 2 || coords.iter().any(|c| c.parse::<f64>().is_err()) {
            return false;
        }
    }
    points.first() == points.last()
}

/// Extract `[x, y]` coordinates from a Thing's expanded location record.
pub fn thing_coordinates(thing: &Value) -> Option<(f64, f64)> {
    let coords = thing
        .get("Locations")?
        .get(0)?
        .get("location")?
        .get("coordinates")?;
    Some((coords.get(0)?.as_f64()?, coords.get(1)?.as_f64()?))
}

/// Data source providing sensor data over the SensorThings API standard.
pub struct SensorApi {
    pub name: String,
    pub root_url: String,
    client: reqwest::Client,
}

impl SensorApi {
    pub fn new(name: impl Into<String>, root_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("gedsys/0.1.0")
            .build()
            .expect("Failed to create HTTP client");
        Self {
            name: name.into(),
            root_url: root_url.into(),
            client,
        }
    }

    /// GET the API root; returns the response status code.
    pub async fn ping(&self) -> std::result::Result<u16, TransportError> {
        let response = self
            .client
            .get(&self.root_url)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(response.status().as_u16())
    }

    /// Build the request URL retrieving the latest observation of every
    /// Thing that intersects `extent` and observes `phenomenon`.
    ///
    /// Page size trades response time against request count; the API caps
    /// it server-side.
    pub fn observations_request(
        &self,
        extent: &str,
        phenomenon: &str,
        page_size: usize,
    ) -> Result<String> {
        if !is_valid_wkt_polygon(extent) {
            return Err(GedsysError::InvalidEventDefinition(format!(
                "extent is not a WKT polygon: {extent}"
            )));
        }
        Ok(format!(
            "{}/Things?$top={page_size}\
             &$select=name,@iot.id\
             &$expand=Datastreams($select=@iot.selflink,unitOfMeasurement;\
             $expand=Observations($orderby=phenomenonTime desc;$top=1)),\
             Locations($select=location)\
             &$filter=geo.intersects(Things/Locations/location,geography'{extent}') \
             and Datastreams/ObservedProperty/name eq '{phenomenon}'",
            self.root_url
        ))
    }

    /// Retrieve all pages of a prepared observations request.
    pub async fn collect_observations(
        &self,
        request_url: &str,
    ) -> std::result::Result<Vec<Value>, TransportError> {
        let mut collected = Vec::new();
        let mut next = Some(request_url.to_string());

        while let Some(url) = next {
            debug!(url = %url, "requesting observations page");
            let page: Value = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?
                .error_for_status()
                .map_err(|e| TransportError::Http(e.to_string()))?
                .json()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;

            if let Some(things) = page.get("value").and_then(Value::as_array) {
                collected.extend(things.iter().cloned());
            }
            next = page
                .get("@iot.nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        Ok(collected)
    }
}

/// Buffers the latest observation batch for one prepared request.
pub struct ObservationsBuffer {
    pub request: String,
    pub data: Vec<Value>,
    pub last_update: Option<DateTime<Utc>>,
}

impl ObservationsBuffer {
    /// Create the buffer and fill it with a first batch.
    pub async fn new(
        api: &SensorApi,
        request: impl Into<String>,
    ) -> std::result::Result<Self, TransportError> {
        let mut buffer = Self {
            request: request.into(),
            data: Vec::new(),
            last_update: None,
        };
        buffer.update(api).await?;
        Ok(buffer)
    }

    /// Refresh the buffered batch.
    pub async fn update(&mut self, api: &SensorApi) -> std::result::Result<(), TransportError> {
        self.data = api.collect_observations(&self.request).await?;
        self.last_update = Some(Utc::now());
        info!(sensors = self.data.len(), "observations buffer updated");
        Ok(())
    }
}
