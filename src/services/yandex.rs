//! Reverse geocoding through the Yandex Geocoder HTTP API.
//!
//! Request: `GET {endpoint}?apikey=…&geocode={lon},{lat}&format=json&lang=…&results=1`
//!
//! Only the parts of the response we read are modelled:
//!
//! ```json
//! {
//!   "response": {
//!     "GeoObjectCollection": {
//!       "featureMember": [
//!         { "GeoObject": { "metaDataProperty": { "GeocoderMetaData": {
//!             "text": "Russia, Moscow, Red Square",
//!             "Address": { "formatted": "Russia, Moscow, Red Square" }
//!         } } } }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::time::Duration;

use futures_lite::FutureExt;
use serde::Deserialize;

use crate::config::GeocoderSettings;
use crate::geo::Coordinate;

use super::{GeocodeError, GeocodedAddress, GeocodingService, ServiceFuture};

#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "metaDataProperty")]
    meta: MetaDataProperty,
}

#[derive(Debug, Deserialize)]
struct MetaDataProperty {
    #[serde(rename = "GeocoderMetaData")]
    geocoder: GeocoderMetaData,
}

#[derive(Debug, Deserialize)]
struct GeocoderMetaData {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "Address", default)]
    address: Option<AddressData>,
}

#[derive(Debug, Deserialize)]
struct AddressData {
    #[serde(default)]
    formatted: Option<String>,
}

/// The geocoder expects "longitude,latitude".
fn geocode_query(at: Coordinate) -> String {
    format!("{},{}", at.lon, at.lat)
}

/// Pick the formatted address of the best match, falling back to its display text.
fn first_address(body: GeocoderResponse) -> Option<GeocodedAddress> {
    let meta = body.response.collection.members.into_iter().next()?.geo_object.meta.geocoder;

    meta.address
        .and_then(|a| a.formatted)
        .filter(|s| !s.trim().is_empty())
        .or(meta.text.filter(|s| !s.trim().is_empty()))
        .map(|formatted| GeocodedAddress { formatted })
}

#[derive(Clone)]
pub struct YandexGeocoder {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    language: String,
}

impl YandexGeocoder {
    pub fn new(settings: &GeocoderSettings, api_key: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent("mapmark-geocoder")
            .build();

        Self {
            agent,
            endpoint: settings.endpoint.clone(),
            api_key,
            language: settings.language.clone(),
        }
    }

    /// Blocking lookup; run it off the main schedule.
    fn lookup(&self, at: Coordinate) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query("apikey", &self.api_key)
            .query("geocode", &geocode_query(at))
            .query("format", "json")
            .query("lang", &self.language)
            .query("results", "1")
            .call();

        match response {
            Ok(resp) => {
                let body = resp
                    .into_json::<GeocoderResponse>()
                    .map_err(|e| GeocodeError::Decode(e.to_string()))?;
                Ok(first_address(body))
            }
            Err(ureq::Error::Status(code @ (401 | 403), _)) => {
                Err(GeocodeError::Unauthorized(code))
            }
            Err(ureq::Error::Status(code, _)) => Err(GeocodeError::Status(code)),
            Err(e) => Err(GeocodeError::Transport(e.to_string())),
        }
    }
}

impl GeocodingService for YandexGeocoder {
    fn reverse_geocode(
        &self,
        at: Coordinate,
    ) -> ServiceFuture<Result<Option<GeocodedAddress>, GeocodeError>> {
        let client = self.clone();
        async move { client.lookup(at) }.boxed()
    }
}
