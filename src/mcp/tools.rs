//! MCP tools implementation
//!
//! Publishes the single `pubchem` tool and routes calls to the method
//! handlers. Handler failures become `isError` results; only
//! protocol-shape problems surface as JSON-RPC errors.

use crate::mcp::protocol::{CallToolResult, JsonRpcError, Tool};
use crate::methods::validate::{BATCH_MAX_INPUT, KNOWN_PROPERTIES, MAX_RECORDS_LIMIT};
use crate::methods::{handlers, MethodName, MethodRequest, DEFAULT_MAX_RECORDS};
use crate::pubchem::PubChemClient;
use crate::types::PubChemError;
use serde_json::{json, Map, Value};
use tracing::{error, info};

pub const TOOL_NAME: &str = "pubchem";

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    let methods: Vec<&str> = MethodName::ALL.iter().map(MethodName::as_str).collect();

    vec![Tool {
        name: TOOL_NAME.to_string(),
        description: "Query the PubChem chemical database. Pick a `method` and supply the \
            fields it needs: compound search by name, SMILES, InChI, CAS number or formula; \
            compound records, synonyms and properties by CID; 2D similarity and substructure \
            search; 3D conformers; safety and toxicity annotations; bioassays; batch lookups \
            (first 10 CIDs are processed); patent identifiers."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "method": {
                    "type": "string",
                    "enum": methods,
                    "description": "PubChem operation to perform"
                },
                "query": {
                    "type": "string",
                    "description": "Search query (compound name, SMILES, InChI, SDF, CID or formula)"
                },
                "search_type": {
                    "type": "string",
                    "enum": ["name", "smiles", "inchi", "sdf", "cid", "formula"],
                    "description": "How to interpret `query` (search_compounds)",
                    "default": "name"
                },
                "cid": {
                    "type": ["integer", "string"],
                    "description": "PubChem Compound ID"
                },
                "aid": {
                    "type": ["integer", "string"],
                    "description": "PubChem BioAssay ID"
                },
                "smiles": {
                    "type": "string",
                    "description": "SMILES string"
                },
                "inchi": {
                    "type": "string",
                    "description": "InChI string or InChIKey"
                },
                "cas_number": {
                    "type": "string",
                    "description": "CAS Registry Number (e.g. 50-78-2)"
                },
                "cids": {
                    "type": "array",
                    "items": { "type": "integer", "minimum": 1 },
                    "minItems": 1,
                    "maxItems": BATCH_MAX_INPUT,
                    "description": "Compound IDs for batch_compound_lookup"
                },
                "properties": {
                    "type": "array",
                    "items": { "type": "string", "enum": KNOWN_PROPERTIES },
                    "description": "Property names for get_compound_properties"
                },
                "threshold": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "Tanimoto similarity threshold in percent",
                    "default": 90
                },
                "max_records": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_RECORDS_LIMIT,
                    "description": "Maximum number of records to return",
                    "default": DEFAULT_MAX_RECORDS
                },
                "format": {
                    "type": "string",
                    "enum": ["json", "sdf", "xml", "asnt"],
                    "description": "Output format for get_compound_info",
                    "default": "json"
                },
                "operation": {
                    "type": "string",
                    "enum": ["property", "synonyms", "classification", "description"],
                    "description": "Per-compound lookup for batch_compound_lookup",
                    "default": "property"
                },
                "target": {
                    "type": "string",
                    "description": "Target gene symbol for search_bioassays"
                }
            },
            "required": ["method"]
        }),
    }]
}

/// Call a tool by name
pub async fn call_tool(
    name: &str,
    arguments: Option<Value>,
    client: &PubChemClient,
) -> Result<CallToolResult, JsonRpcError> {
    if name != TOOL_NAME {
        return Err(JsonRpcError::method_not_found(format!("Unknown tool: {}", name)));
    }

    let args = arguments.unwrap_or_else(|| Value::Object(Map::new()));
    let request = MethodRequest::parse(&args)?;
    let method = request.name();
    info!("Calling {}", method);

    match handlers::execute(&request, client).await {
        Ok(payload) => Ok(CallToolResult::text(payload.to_text())),
        Err(PubChemError::Protocol(e)) => Err(e),
        Err(e) => {
            error!("{} error: {}", method, e);
            Ok(CallToolResult::error(format!(
                "Error executing {}: {}",
                method, e
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{INVALID_PARAMS, METHOD_NOT_FOUND};
    use crate::pubchem::mock::{MockReply, MockTransport};
    use std::sync::Arc;

    fn client_with(mock: MockTransport) -> (Arc<MockTransport>, PubChemClient) {
        let mock = Arc::new(mock);
        let client = PubChemClient::new(mock.clone());
        (mock, client)
    }

    #[test]
    fn test_single_tool_with_required_method() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "pubchem");
        assert_eq!(tools[0].input_schema["required"], json!(["method"]));

        let methods = tools[0].input_schema["properties"]["method"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(methods.len(), MethodName::ALL.len());
        assert!(methods.contains(&json!("batch_compound_lookup")));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let (mock, client) = client_with(MockTransport::new());
        let err = call_tool("chembl", Some(json!({"method": "search_compounds"})), &client)
            .await
            .unwrap_err();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_arguments_is_invalid_params() {
        let (mock, client) = client_with(MockTransport::new());
        let err = call_tool(TOOL_NAME, None, &client).await.unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_type_never_reaches_network() {
        let (mock, client) = client_with(
            MockTransport::new().on("", MockReply::Json(json!({"IdentifierList": {"CID": [1]}}))),
        );

        let bad_calls = [
            json!({"method": "search_compounds", "query": 5}),
            json!({"method": "get_compound_info", "cid": "aspirin"}),
            json!({"method": "search_by_smiles", "smiles": null}),
            json!({"method": "search_by_inchi", "inchi": ["InChI=1S/CH4/h1H4"]}),
            json!({"method": "search_by_cas_number", "cas_number": 50}),
            json!({"method": "get_compound_synonyms", "cid": -1}),
            json!({"method": "get_compound_properties", "cid": 1, "properties": "XLogP"}),
            json!({"method": "search_similar_compounds", "smiles": "CCO", "threshold": 101}),
            json!({"method": "substructure_search", "smiles": "c1ccccc1", "max_records": "10"}),
            json!({"method": "get_3d_conformers", "cid": 1.5}),
            json!({"method": "get_safety_data"}),
            json!({"method": "get_toxicity_info", "cid": {}}),
            json!({"method": "search_bioassays", "target": 12}),
            json!({"method": "get_assay_info", "aid": false}),
            json!({"method": "batch_compound_lookup", "cids": []}),
            json!({"method": "get_patent_ids", "cid": "CCO"}),
        ];

        for args in bad_calls {
            let err = call_tool(TOOL_NAME, Some(args.clone()), &client)
                .await
                .unwrap_err();
            assert_eq!(err.code, INVALID_PARAMS, "{}", args);
            assert!(err.message.starts_with("Invalid parameters for method"));
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_network_failure_becomes_error_result_for_every_method() {
        let (_, client) = client_with(MockTransport::new().on("", MockReply::Timeout));

        let calls = [
            json!({"method": "search_compounds", "query": "aspirin"}),
            json!({"method": "get_compound_info", "cid": 2244}),
            json!({"method": "search_by_smiles", "smiles": "CCO"}),
            json!({"method": "search_by_inchi", "inchi": "InChI=1S/CH4/h1H4"}),
            json!({"method": "search_by_cas_number", "cas_number": "50-78-2"}),
            json!({"method": "get_compound_synonyms", "cid": 2244}),
            json!({"method": "get_compound_properties", "cid": 2244}),
            json!({"method": "search_similar_compounds", "smiles": "CCO"}),
            json!({"method": "substructure_search", "smiles": "c1ccccc1"}),
            json!({"method": "get_3d_conformers", "cid": 2244}),
            json!({"method": "get_safety_data", "cid": 2244}),
            json!({"method": "get_toxicity_info", "cid": 2244}),
            json!({"method": "search_bioassays", "target": "EGFR"}),
            json!({"method": "get_assay_info", "aid": 1000}),
            json!({"method": "get_patent_ids", "cid": 2244}),
        ];

        for args in calls {
            let method = args["method"].as_str().unwrap().to_string();
            let result = call_tool(TOOL_NAME, Some(args), &client).await.unwrap();
            assert_eq!(result.is_error, Some(true), "{}", method);
            let text = result.joined_text();
            assert!(text.starts_with(&format!("Error executing {}", method)), "{}", text);
            assert!(text.contains("timeout"), "{}", text);
        }
    }

    #[tokio::test]
    async fn test_success_is_pretty_printed_upstream_json() {
        let (_, client) = client_with(
            MockTransport::new().on("synonyms", MockReply::Json(json!({"InformationList": {"Information": []}}))),
        );

        let result = call_tool(
            TOOL_NAME,
            Some(json!({"method": "get_compound_synonyms", "cid": 2244})),
            &client,
        )
        .await
        .unwrap();

        assert_eq!(result.is_error, None);
        assert_eq!(
            result.joined_text(),
            "{\n  \"InformationList\": {\n    \"Information\": []\n  }\n}"
        );
    }

    #[tokio::test]
    async fn test_not_found_is_not_an_error() {
        let (_, client) = client_with(
            MockTransport::new().on("cids", MockReply::Json(json!({"IdentifierList": {"CID": [0]}}))),
        );

        let result = call_tool(
            TOOL_NAME,
            Some(json!({"method": "search_by_smiles", "smiles": "C(C)(C)(C)(C)C"})),
            &client,
        )
        .await
        .unwrap();

        assert_eq!(result.is_error, None);
        assert!(result.joined_text().contains("No compounds found"));
    }

    #[tokio::test]
    async fn test_protocol_error_passes_through_unwrapped() {
        let rejection = JsonRpcError::invalid_params("cid is out of range");
        let (_, client) = client_with(
            MockTransport::new().on("synonyms", MockReply::Protocol(rejection.clone())),
        );

        let err = call_tool(
            TOOL_NAME,
            Some(json!({"method": "get_compound_synonyms", "cid": 2244})),
            &client,
        )
        .await
        .unwrap_err();

        assert_eq!(err, rejection);
    }
}
