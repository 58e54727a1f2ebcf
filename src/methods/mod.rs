//! PubChem methods exposed through the `pubchem` tool
//!
//! A call arrives as a `method` tag plus a flat argument bag. It is turned
//! into a [`MethodRequest`] only after the method's predicate in
//! [`validate`] accepted the raw arguments, so handlers never see
//! malformed input.

pub mod handlers;
pub mod validate;

use crate::mcp::protocol::JsonRpcError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_RECORDS: u32 = 100;
pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodName {
    SearchCompounds,
    GetCompoundInfo,
    SearchBySmiles,
    SearchByInchi,
    SearchByCasNumber,
    GetCompoundSynonyms,
    GetCompoundProperties,
    SearchSimilarCompounds,
    SubstructureSearch,
    Get3dConformers,
    GetSafetyData,
    GetToxicityInfo,
    SearchBioassays,
    GetAssayInfo,
    BatchCompoundLookup,
    GetPatentIds,
}

impl MethodName {
    pub const ALL: [MethodName; 16] = [
        MethodName::SearchCompounds,
        MethodName::GetCompoundInfo,
        MethodName::SearchBySmiles,
        MethodName::SearchByInchi,
        MethodName::SearchByCasNumber,
        MethodName::GetCompoundSynonyms,
        MethodName::GetCompoundProperties,
        MethodName::SearchSimilarCompounds,
        MethodName::SubstructureSearch,
        MethodName::Get3dConformers,
        MethodName::GetSafetyData,
        MethodName::GetToxicityInfo,
        MethodName::SearchBioassays,
        MethodName::GetAssayInfo,
        MethodName::BatchCompoundLookup,
        MethodName::GetPatentIds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodName::SearchCompounds => "search_compounds",
            MethodName::GetCompoundInfo => "get_compound_info",
            MethodName::SearchBySmiles => "search_by_smiles",
            MethodName::SearchByInchi => "search_by_inchi",
            MethodName::SearchByCasNumber => "search_by_cas_number",
            MethodName::GetCompoundSynonyms => "get_compound_synonyms",
            MethodName::GetCompoundProperties => "get_compound_properties",
            MethodName::SearchSimilarCompounds => "search_similar_compounds",
            MethodName::SubstructureSearch => "substructure_search",
            MethodName::Get3dConformers => "get_3d_conformers",
            MethodName::GetSafetyData => "get_safety_data",
            MethodName::GetToxicityInfo => "get_toxicity_info",
            MethodName::SearchBioassays => "search_bioassays",
            MethodName::GetAssayInfo => "get_assay_info",
            MethodName::BatchCompoundLookup => "batch_compound_lookup",
            MethodName::GetPatentIds => "get_patent_ids",
        }
    }
}

impl FromStr for MethodName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodName::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Name,
    Smiles,
    Inchi,
    Sdf,
    Cid,
    Formula,
}

impl SearchType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SearchType::Name),
            "smiles" => Some(SearchType::Smiles),
            "inchi" => Some(SearchType::Inchi),
            "sdf" => Some(SearchType::Sdf),
            "cid" => Some(SearchType::Cid),
            "formula" => Some(SearchType::Formula),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Name => "name",
            SearchType::Smiles => "smiles",
            SearchType::Inchi => "inchi",
            SearchType::Sdf => "sdf",
            SearchType::Cid => "cid",
            SearchType::Formula => "formula",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Sdf,
    Xml,
    Asnt,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(OutputFormat::Json),
            "sdf" => Some(OutputFormat::Sdf),
            "xml" => Some(OutputFormat::Xml),
            "asnt" => Some(OutputFormat::Asnt),
            _ => None,
        }
    }

    /// Trailing PUG REST path segment selecting the format
    pub fn segment(&self) -> &'static str {
        match self {
            OutputFormat::Json => "JSON",
            OutputFormat::Sdf => "SDF",
            OutputFormat::Xml => "XML",
            OutputFormat::Asnt => "ASNT",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    #[default]
    Property,
    Synonyms,
    Classification,
    Description,
}

impl BatchOperation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "property" => Some(BatchOperation::Property),
            "synonyms" => Some(BatchOperation::Synonyms),
            "classification" => Some(BatchOperation::Classification),
            "description" => Some(BatchOperation::Description),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOperation::Property => "property",
            BatchOperation::Synonyms => "synonyms",
            BatchOperation::Classification => "classification",
            BatchOperation::Description => "description",
        }
    }
}

/// A validated call, one variant per method
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MethodRequest {
    SearchCompounds {
        query: String,
        #[serde(default)]
        search_type: SearchType,
        #[serde(default = "default_max_records")]
        max_records: u32,
    },
    GetCompoundInfo {
        #[serde(deserialize_with = "identifier")]
        cid: String,
        #[serde(default)]
        format: OutputFormat,
    },
    SearchBySmiles {
        smiles: String,
    },
    SearchByInchi {
        inchi: String,
    },
    SearchByCasNumber {
        cas_number: String,
    },
    GetCompoundSynonyms {
        #[serde(deserialize_with = "identifier")]
        cid: String,
    },
    GetCompoundProperties {
        #[serde(deserialize_with = "identifier")]
        cid: String,
        #[serde(default)]
        properties: Option<Vec<String>>,
    },
    SearchSimilarCompounds {
        smiles: String,
        #[serde(default = "default_threshold")]
        threshold: u8,
        #[serde(default = "default_max_records")]
        max_records: u32,
    },
    SubstructureSearch {
        smiles: String,
        #[serde(default = "default_max_records")]
        max_records: u32,
    },
    #[serde(rename = "get_3d_conformers")]
    Get3dConformers {
        #[serde(deserialize_with = "identifier")]
        cid: String,
    },
    GetSafetyData {
        #[serde(deserialize_with = "identifier")]
        cid: String,
    },
    GetToxicityInfo {
        #[serde(deserialize_with = "identifier")]
        cid: String,
    },
    SearchBioassays {
        #[serde(default)]
        target: Option<String>,
        #[serde(default, deserialize_with = "optional_identifier")]
        cid: Option<String>,
        #[serde(default = "default_max_records")]
        max_records: u32,
    },
    GetAssayInfo {
        #[serde(deserialize_with = "identifier")]
        aid: String,
    },
    BatchCompoundLookup {
        cids: Vec<u64>,
        #[serde(default)]
        operation: BatchOperation,
    },
    GetPatentIds {
        #[serde(default, deserialize_with = "optional_identifier")]
        cid: Option<String>,
        #[serde(default)]
        smiles: Option<String>,
    },
}

fn default_max_records() -> u32 {
    DEFAULT_MAX_RECORDS
}

fn default_threshold() -> u8 {
    DEFAULT_SIMILARITY_THRESHOLD
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Number(u64),
    Text(String),
}

impl From<RawIdentifier> for String {
    fn from(raw: RawIdentifier) -> Self {
        match raw {
            RawIdentifier::Number(n) => n.to_string(),
            RawIdentifier::Text(s) => s,
        }
    }
}

/// PubChem identifiers arrive as numbers or digit strings; both end up in a URL path.
fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawIdentifier::deserialize(deserializer).map(String::from)
}

fn optional_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawIdentifier>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

impl MethodRequest {
    /// Parse a raw argument bag: method tag, then predicate, then typed variant.
    pub fn parse(args: &Value) -> Result<Self, JsonRpcError> {
        let args = args
            .as_object()
            .ok_or_else(|| JsonRpcError::invalid_params("Arguments must be an object"))?;

        let method = args
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                JsonRpcError::invalid_params("Method parameter is required and must be a string")
            })?;

        let name: MethodName = method
            .parse()
            .map_err(|_| JsonRpcError::method_not_found(format!("Unknown method: {}", method)))?;

        if !validate::is_valid(name, args) {
            return Err(JsonRpcError::invalid_params(format!(
                "Invalid parameters for method: {}",
                name
            )));
        }

        // Explicit nulls mean "not provided"
        let cleaned: Map<String, Value> = args
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        serde_json::from_value(Value::Object(cleaned)).map_err(|e| {
            JsonRpcError::invalid_params(format!("Invalid parameters for method: {}: {}", name, e))
        })
    }

    pub fn name(&self) -> MethodName {
        match self {
            MethodRequest::SearchCompounds { .. } => MethodName::SearchCompounds,
            MethodRequest::GetCompoundInfo { .. } => MethodName::GetCompoundInfo,
            MethodRequest::SearchBySmiles { .. } => MethodName::SearchBySmiles,
            MethodRequest::SearchByInchi { .. } => MethodName::SearchByInchi,
            MethodRequest::SearchByCasNumber { .. } => MethodName::SearchByCasNumber,
            MethodRequest::GetCompoundSynonyms { .. } => MethodName::GetCompoundSynonyms,
            MethodRequest::GetCompoundProperties { .. } => MethodName::GetCompoundProperties,
            MethodRequest::SearchSimilarCompounds { .. } => MethodName::SearchSimilarCompounds,
            MethodRequest::SubstructureSearch { .. } => MethodName::SubstructureSearch,
            MethodRequest::Get3dConformers { .. } => MethodName::Get3dConformers,
            MethodRequest::GetSafetyData { .. } => MethodName::GetSafetyData,
            MethodRequest::GetToxicityInfo { .. } => MethodName::GetToxicityInfo,
            MethodRequest::SearchBioassays { .. } => MethodName::SearchBioassays,
            MethodRequest::GetAssayInfo { .. } => MethodName::GetAssayInfo,
            MethodRequest::BatchCompoundLookup { .. } => MethodName::BatchCompoundLookup,
            MethodRequest::GetPatentIds { .. } => MethodName::GetPatentIds,
        }
    }
}
