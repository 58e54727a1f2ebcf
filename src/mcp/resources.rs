//! MCP resources
//!
//! Six URI templates, each a thin alias for one upstream call. URIs are
//! matched against an ordered routing table; the first pattern that
//! matches wins.

use crate::mcp::protocol::{JsonRpcError, ReadResourceResult, ResourceContents, ResourceTemplate};
use crate::methods::handlers::{annotation_request, compound_request, similarity_request};
use crate::methods::{DEFAULT_MAX_RECORDS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::pubchem::client::{property_request, DEFAULT_PROPERTIES, STRUCTURE_PROPERTIES};
use crate::pubchem::{PubChemClient, PubChemRequest};
use crate::types::PubChemError;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Compound,
    Structure,
    Properties,
    Bioassay,
    Similarity,
    Safety,
}

impl ResourceKind {
    /// Upstream request for the identifier captured from the URI
    pub fn request(&self, id: &str) -> PubChemRequest {
        match self {
            ResourceKind::Compound => compound_request(id, "JSON"),
            ResourceKind::Structure => property_request(id, STRUCTURE_PROPERTIES),
            ResourceKind::Properties => property_request(id, DEFAULT_PROPERTIES),
            ResourceKind::Bioassay => {
                PubChemRequest::pug(["assay", "aid", id, "description", "JSON"])
            }
            ResourceKind::Similarity => {
                similarity_request(id, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_MAX_RECORDS)
            }
            ResourceKind::Safety => annotation_request(id, "Safety and Hazards"),
        }
    }
}

struct Route {
    pattern: Regex,
    kind: ResourceKind,
}

pub struct ResourceRouter {
    routes: Vec<Route>,
}

impl ResourceRouter {
    pub fn new() -> Result<Self, regex::Error> {
        let table = [
            (r"^pubchem://compound/(\d+)$", ResourceKind::Compound),
            (r"^pubchem://structure/(\d+)$", ResourceKind::Structure),
            (r"^pubchem://properties/(\d+)$", ResourceKind::Properties),
            (r"^pubchem://bioassay/(\d+)$", ResourceKind::Bioassay),
            (r"^pubchem://similarity/(.+)$", ResourceKind::Similarity),
            (r"^pubchem://safety/(\d+)$", ResourceKind::Safety),
        ];

        let routes = table
            .into_iter()
            .map(|(pattern, kind)| {
                Ok(Route {
                    pattern: Regex::new(pattern)?,
                    kind,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { routes })
    }

    /// Matching route and its captured identifier, percent-decoded.
    /// A capture that does not decode to UTF-8 matches nothing.
    pub fn resolve(&self, uri: &str) -> Option<(ResourceKind, String)> {
        let (kind, id) = self.routes.iter().find_map(|route| {
            route
                .pattern
                .captures(uri)
                .and_then(|caps| caps.get(1))
                .map(|id| (route.kind, id.as_str()))
        })?;

        let id = percent_decode_str(id).decode_utf8().ok()?;
        Some((kind, id.into_owned()))
    }

    pub async fn read(
        &self,
        uri: &str,
        client: &PubChemClient,
    ) -> Result<ReadResourceResult, JsonRpcError> {
        let Some((kind, id)) = self.resolve(uri) else {
            warn!("No resource matches {}", uri);
            return Err(JsonRpcError::invalid_params(format!("Invalid URI format: {}", uri)));
        };

        debug!("Reading {:?} resource for {}", kind, id);

        let payload = client.fetch(&kind.request(&id)).await.map_err(|e| match e {
            PubChemError::Protocol(e) => e,
            e => JsonRpcError::internal(format!("Failed to fetch resource {}: {}", uri, e)),
        })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: "application/json".to_string(),
                text: payload.to_text(),
            }],
        })
    }
}

pub fn resource_templates() -> Vec<ResourceTemplate> {
    [
        (
            "pubchem://compound/{cid}",
            "PubChem compound record",
            "Full compound record for a PubChem Compound ID",
        ),
        (
            "pubchem://structure/{cid}",
            "Compound structure",
            "Formula, SMILES, InChI and InChIKey for a compound",
        ),
        (
            "pubchem://properties/{cid}",
            "Compound properties",
            "Computed molecular properties for a compound",
        ),
        (
            "pubchem://bioassay/{aid}",
            "BioAssay description",
            "Description of a PubChem BioAssay",
        ),
        (
            "pubchem://similarity/{smiles}",
            "Similar compounds",
            "CIDs with 2D similarity of at least 90% to a SMILES structure (percent-encoded)",
        ),
        (
            "pubchem://safety/{cid}",
            "Safety and hazards",
            "GHS classification and safety annotations for a compound",
        ),
    ]
    .into_iter()
    .map(|(uri_template, name, description)| ResourceTemplate {
        uri_template: uri_template.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        mime_type: "application/json".to_string(),
    })
    .collect()
}
