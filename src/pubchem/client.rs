//! PubChem client shared by every handler
//!
//! Wraps a transport with the lookups the method handlers build on:
//! plain fetches, CID resolution and property tables.

use crate::config::ClientSettings;
use crate::pubchem::request::PubChemRequest;
use crate::pubchem::transport::{HttpTransport, Payload, PubChemTransport};
use crate::types::PubChemError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Properties fetched for search results and the properties resource
pub const DEFAULT_PROPERTIES: &[&str] = &[
    "MolecularFormula",
    "MolecularWeight",
    "CanonicalSMILES",
    "IsomericSMILES",
    "InChI",
    "InChIKey",
    "IUPACName",
    "XLogP",
    "TPSA",
    "HBondDonorCount",
    "HBondAcceptorCount",
    "RotatableBondCount",
    "Complexity",
];

/// Structure identifiers served by the structure resource
pub const STRUCTURE_PROPERTIES: &[&str] = &[
    "MolecularFormula",
    "CanonicalSMILES",
    "IsomericSMILES",
    "InChI",
    "InChIKey",
];

#[derive(Clone)]
pub struct PubChemClient {
    transport: Arc<dyn PubChemTransport>,
}

impl PubChemClient {
    pub fn new(transport: Arc<dyn PubChemTransport>) -> Self {
        Self { transport }
    }

    /// Client backed by the real HTTP transport
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, PubChemError> {
        info!(
            "PubChem client: base_url={} timeout={}s",
            settings.base_url, settings.timeout_secs
        );
        let transport = HttpTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub async fn fetch(&self, request: &PubChemRequest) -> Result<Payload, PubChemError> {
        debug!("Fetching {}", request.path());
        self.transport.send(request).await
    }

    pub async fn fetch_json(&self, request: &PubChemRequest) -> Result<Value, PubChemError> {
        self.fetch(request).await?.into_json()
    }

    /// Runs a `.../cids/JSON` lookup. A 404 or an all-zero list means no match.
    pub async fn resolve_cids(&self, request: &PubChemRequest) -> Result<Vec<u64>, PubChemError> {
        let value = match self.fetch_json(request).await {
            Ok(value) => value,
            Err(e) if e.is_not_found() => {
                debug!("No CIDs for {}", request.path());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        extract_cids(&value)
    }

    /// Property table for a set of CIDs in a single request
    pub async fn properties(&self, cids: &[u64], properties: &[&str]) -> Result<Value, PubChemError> {
        self.fetch_json(&property_request(&join_cids(cids), properties))
            .await
    }
}

pub fn property_request(cid: &str, properties: &[&str]) -> PubChemRequest {
    PubChemRequest::pug([
        "compound".to_string(),
        "cid".to_string(),
        cid.to_string(),
        "property".to_string(),
        properties.join(","),
        "JSON".to_string(),
    ])
}

pub fn join_cids(cids: &[u64]) -> String {
    cids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Reads `IdentifierList.CID`, dropping the `0` PubChem uses for "no match"
pub fn extract_cids(value: &Value) -> Result<Vec<u64>, PubChemError> {
    let list = value
        .get("IdentifierList")
        .and_then(|list| list.get("CID"))
        .ok_or_else(|| {
            PubChemError::UnexpectedResponse("missing IdentifierList.CID".to_string())
        })?;

    let cids = list
        .as_array()
        .ok_or_else(|| PubChemError::UnexpectedResponse("CID is not a list".to_string()))?;

    Ok(cids
        .iter()
        .filter_map(Value::as_u64)
        .filter(|cid| *cid > 0)
        .collect())
}
